use std::fmt;

use crate::error::PipelineError;

/// Pipeline stages that own a pending/error flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Generation,
    TryOn,
    Catalog,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generation => f.write_str("avatar generation"),
            Self::TryOn => f.write_str("garment try-on"),
            Self::Catalog => f.write_str("catalog fetch"),
        }
    }
}

/// Flag state of one stage. Pending and failed cannot coexist.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum StageStatus {
    #[default]
    Idle,
    /// A request tagged with `token` is in flight
    Pending { token: u64 },
    Failed(PipelineError),
}

impl StageStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn is_pending_for(&self, token: u64) -> bool {
        matches!(self, Self::Pending { token: t } if *t == token)
    }

    pub fn error(&self) -> Option<&PipelineError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Where the workflow stands, derived from the artifact store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Capturing,
    Generating,
    GeneratedReady,
    Fitting,
    FittedReady,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Capturing => "capturing",
            Self::Generating => "generating",
            Self::GeneratedReady => "avatar ready",
            Self::Fitting => "fitting",
            Self::FittedReady => "fit ready",
        };
        f.write_str(name)
    }
}

/// Wizard step the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    Generate,
    TryOn,
}

impl Step {
    pub fn title(&self) -> &str {
        match self {
            Self::Generate => "Generate 3D-Model",
            Self::TryOn => "Try on clothes with your 3D-Model",
        }
    }
}
