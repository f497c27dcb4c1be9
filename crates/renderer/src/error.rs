use crate::device::StageKind;

/// Failures a mounted renderer instance can run into.
///
/// None of these escape to the host: the lifecycle controller logs them and
/// settles the instance into an inert state.
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    /// No usable GPU context (missing adapter, surface or device).
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),
    /// A shader stage failed to compile.
    #[error("failed to compile {stage} stage:\n{diagnostics}")]
    Compile {
        stage: StageKind,
        diagnostics: String,
    },
    /// The compiled stages could not be linked into one program.
    #[error("failed to link shader program:\n{diagnostics}")]
    Link { diagnostics: String },
    /// A buffer or program allocation was refused by the device.
    #[error("failed to acquire GPU resource: {0}")]
    ResourceAcquisition(String),
    /// A frame could not be drawn or presented.
    #[error("frame failed: {0}")]
    Frame(String),
}

impl RendererError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RendererError::UnsupportedEnvironment(_) => FailureKind::UnsupportedEnvironment,
            RendererError::Compile { .. } => FailureKind::Compile,
            RendererError::Link { .. } => FailureKind::Link,
            RendererError::ResourceAcquisition(_) => FailureKind::ResourceAcquisition,
            RendererError::Frame(_) => FailureKind::Frame,
        }
    }
}

/// Error category retained after the error itself has been logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UnsupportedEnvironment,
    Compile,
    Link,
    ResourceAcquisition,
    Frame,
}

impl FailureKind {
    /// Whether the renderer itself went wrong, as opposed to the environment
    /// lacking a GPU.
    pub fn is_instance_fault(self) -> bool {
        !matches!(self, FailureKind::UnsupportedEnvironment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_missing_gpu_is_an_environment_fault() {
        let unsupported = RendererError::UnsupportedEnvironment("no adapter".to_string());
        assert!(!unsupported.kind().is_instance_fault());

        let link = RendererError::Link {
            diagnostics: "mismatch".to_string(),
        };
        assert_eq!(link.kind(), FailureKind::Link);
        assert!(link.kind().is_instance_fault());
        assert!(FailureKind::Frame.is_instance_fault());
    }
}
