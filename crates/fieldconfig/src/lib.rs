use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;
pub const MAX_OCTAVES: u32 = 8;
pub const COLOR_STOP_COUNT: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub field: FieldSection,
    #[serde(default)]
    pub drift: DriftSection,
    #[serde(default)]
    pub render: RenderSection,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            field: FieldSection::default(),
            drift: DriftSection::default(),
            render: RenderSection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldSection {
    pub octaves: u32,
    pub scale: f32,
    pub trail_rate: f32,
    pub pointer_radius: f32,
    pub pointer_strength: f32,
    pub shimmer: f32,
    pub shimmer_frequency: f32,
    pub gradient_floor: f32,
    pub stop_weights: [f32; 3],
    pub color_stops: Vec<ColorStop>,
}

impl Default for FieldSection {
    fn default() -> Self {
        Self {
            octaves: 6,
            scale: 3.0,
            trail_rate: 0.08,
            pointer_radius: 1.0,
            pointer_strength: 1.0,
            shimmer: 0.1,
            shimmer_frequency: 10.0,
            gradient_floor: 0.8,
            stop_weights: [1.0, 0.7, 0.5],
            color_stops: vec![
                ColorStop([0.1, 0.1, 0.2]),
                ColorStop([0.2, 0.1, 0.4]),
                ColorStop([0.1, 0.3, 0.8]),
                ColorStop([0.8, 0.2, 0.5]),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DriftSection {
    pub speed: f32,
    pub sway: f32,
    pub frequency: [f32; 2],
}

impl Default for DriftSection {
    fn default() -> Self {
        Self {
            speed: 0.1,
            sway: 0.35,
            frequency: [0.11, 0.07],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    #[default]
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    pub vsync: bool,
    pub power: PowerSetting,
    #[serde(
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub still_time: Option<Duration>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            fps: None,
            vsync: true,
            power: PowerSetting::Low,
            still_time: None,
        }
    }
}

/// Linear RGB color written as `"#rrggbb"` or `[r, g, b]` with channels in
/// `[0, 1]`. Always serialised in the array form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop(pub [f32; 3]);

impl ColorStop {
    pub fn parse_hex(raw: &str) -> Result<Self, String> {
        let digits = raw.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(format!("invalid color '{raw}'; expected '#rrggbb'"));
        }
        let mut rgb = [0.0; 3];
        for (index, channel) in rgb.iter_mut().enumerate() {
            let byte = u8::from_str_radix(&digits[index * 2..index * 2 + 2], 16)
                .map_err(|err| format!("invalid color '{raw}': {err}"))?;
            *channel = byte as f32 / 255.0;
        }
        Ok(Self(rgb))
    }
}

impl<'de> Deserialize<'de> for ColorStop {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Hex(String),
            Rgb([f32; 3]),
        }

        match Helper::deserialize(deserializer)? {
            Helper::Hex(raw) => ColorStop::parse_hex(&raw).map_err(de::Error::custom),
            Helper::Rgb(rgb) => Ok(ColorStop(rgb)),
        }
    }
}

impl Serialize for ColorStop {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Written as floats; a hex string would quantise to 8 bits.
        self.0.serialize(serializer)
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() || v.is_infinite() {
                return Err(E::custom("duration must be a finite non-negative number"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => {
            serializer.serialize_str(&humantime::format_duration(*duration).to_string())
        }
        None => serializer.serialize_none(),
    }
}

impl FieldConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FieldConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Still-frame timestamp in seconds, `0.0` when unset.
    pub fn still_seconds(&self) -> f32 {
        self.render
            .still_time
            .map(|duration| duration.as_secs_f32())
            .unwrap_or(0.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected {CONFIG_VERSION}",
                self.version
            )));
        }

        let field = &self.field;
        if !(1..=MAX_OCTAVES).contains(&field.octaves) {
            return Err(ConfigError::Invalid(format!(
                "field.octaves must be between 1 and {MAX_OCTAVES}, got {}",
                field.octaves
            )));
        }
        require_positive("field.scale", field.scale)?;
        if !(field.trail_rate > 0.0 && field.trail_rate < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "field.trail_rate must be strictly between 0 and 1, got {}",
                field.trail_rate
            )));
        }
        require_positive("field.pointer_radius", field.pointer_radius)?;
        require_non_negative("field.pointer_strength", field.pointer_strength)?;
        require_non_negative("field.shimmer", field.shimmer)?;
        require_non_negative("field.shimmer_frequency", field.shimmer_frequency)?;
        if !(0.0..=1.0).contains(&field.gradient_floor) {
            return Err(ConfigError::Invalid(format!(
                "field.gradient_floor must be within [0, 1], got {}",
                field.gradient_floor
            )));
        }
        for weight in field.stop_weights {
            require_non_negative("field.stop_weights", weight)?;
        }

        if field.color_stops.len() != COLOR_STOP_COUNT {
            return Err(ConfigError::Invalid(format!(
                "field.color_stops must list exactly {COLOR_STOP_COUNT} colors, got {}",
                field.color_stops.len()
            )));
        }
        for (index, stop) in field.color_stops.iter().enumerate() {
            if stop.0.iter().any(|channel| !(0.0..=1.0).contains(channel)) {
                return Err(ConfigError::Invalid(format!(
                    "field.color_stops[{index}] channels must be within [0, 1]"
                )));
            }
        }

        require_non_negative("drift.speed", self.drift.speed)?;
        require_non_negative("drift.sway", self.drift.sway)?;
        for frequency in self.drift.frequency {
            require_finite("drift.frequency", frequency)?;
        }

        if let Some(fps) = self.render.fps {
            if !(fps >= 0.0) || !fps.is_finite() {
                return Err(ConfigError::Invalid("render.fps must be >= 0".into()));
            }
        }

        Ok(())
    }
}

fn require_finite(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be a finite number")))
    }
}

fn require_positive(name: &str, value: f32) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be > 0, got {value}")))
    }
}

fn require_non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
    require_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be >= 0, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"
version = 1

[field]
octaves = 5
trail_rate = 0.12
pointer_radius = 0.5
color_stops = ["#101020", [0.2, 0.1, 0.4], "1a4dcc", "#cc3380"]

[drift]
speed = 0.05

[render]
fps = 30
vsync = false
power = "high"
still_time = "2s 500ms"
"##;

    #[test]
    fn parses_sample_config() {
        let config = FieldConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.field.octaves, 5);
        assert_eq!(config.field.trail_rate, 0.12);
        assert_eq!(config.field.scale, 3.0);
        assert_eq!(config.field.color_stops[1], ColorStop([0.2, 0.1, 0.4]));
        assert_eq!(
            config.field.color_stops[0],
            ColorStop([16.0 / 255.0, 16.0 / 255.0, 32.0 / 255.0])
        );
        assert_eq!(config.drift.speed, 0.05);
        assert_eq!(config.drift.sway, 0.35);
        assert_eq!(config.render.fps, Some(30.0));
        assert!(!config.render.vsync);
        assert_eq!(config.render.power, PowerSetting::High);
        assert_eq!(config.still_seconds(), 2.5);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = FieldConfig::from_toml_str("").unwrap();
        assert_eq!(config, FieldConfig::default());
        assert_eq!(config.still_seconds(), 0.0);
    }

    #[test]
    fn still_time_accepts_plain_seconds() {
        let config = FieldConfig::from_toml_str("[render]\nstill_time = 1.25\n").unwrap();
        assert_eq!(config.still_seconds(), 1.25);
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = FieldConfig::from_toml_str("version = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_octaves() {
        let err = FieldConfig::from_toml_str("[field]\noctaves = 9\n").unwrap_err();
        assert!(err.to_string().contains("octaves"));
        let err = FieldConfig::from_toml_str("[field]\noctaves = 0\n").unwrap_err();
        assert!(err.to_string().contains("octaves"));
    }

    #[test]
    fn rejects_trail_rate_outside_unit_interval() {
        for rate in ["0.0", "1.0", "1.5", "-0.1"] {
            let err = FieldConfig::from_toml_str(&format!("[field]\ntrail_rate = {rate}\n"))
                .unwrap_err();
            assert!(err.to_string().contains("trail_rate"), "rate {rate}");
        }
    }

    #[test]
    fn rejects_wrong_stop_count() {
        let err = FieldConfig::from_toml_str("[field]\ncolor_stops = [\"#000000\"]\n").unwrap_err();
        assert!(err.to_string().contains("exactly 4"));
    }

    #[test]
    fn rejects_malformed_hex_color() {
        let err = FieldConfig::from_toml_str(
            "[field]\ncolor_stops = [\"#zzzzzz\", \"#000000\", \"#000000\", \"#000000\"]\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_negative_fps_and_zero_radius() {
        let err = FieldConfig::from_toml_str("[render]\nfps = -1\n").unwrap_err();
        assert!(err.to_string().contains("render.fps"));
        let err = FieldConfig::from_toml_str("[field]\npointer_radius = 0\n").unwrap_err();
        assert!(err.to_string().contains("pointer_radius"));
    }

    #[test]
    fn serialises_back_to_parseable_toml() {
        let config = FieldConfig::from_toml_str(SAMPLE).unwrap();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("still_time = \"2s 500ms\""));
        let reparsed = FieldConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed.field.octaves, 5);
        assert_eq!(reparsed.render.still_time, config.render.still_time);
        assert_eq!(reparsed, config);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let defaults = FieldConfig::default();
        let rendered = toml::to_string_pretty(&defaults).unwrap();
        let reparsed = FieldConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed, defaults);
    }

    #[test]
    fn color_stops_keep_full_precision() {
        let mut config = FieldConfig::default();
        config.field.color_stops[2] = ColorStop([0.1, 0.333, 0.9]);
        let rendered = toml::to_string_pretty(&config).unwrap();
        let reparsed = FieldConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed.field.color_stops[2], ColorStop([0.1, 0.333, 0.9]));
    }
}
