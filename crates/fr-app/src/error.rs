use fr_core::{AssetError, Gender};
use thiserror::Error;

use crate::stage::{PipelineStage, Stage};

/// Every way a pipeline action can fail
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("network error: {0}")]
    Network(String),

    #[error("service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    #[error("unexpected service response: {0}")]
    InvalidResponse(String),

    #[error("malformed asset: {0}")]
    MalformedAsset(#[from] AssetError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0} is already in progress")]
    StagePending(Stage),

    #[error("cannot {action} while {stage}")]
    InvalidTransition {
        stage: PipelineStage,
        action: &'static str,
    },

    #[error("missing {0}")]
    MissingPrerequisite(&'static str),

    #[error("navigation is locked while a request is in flight")]
    NavigationLocked,
}

impl PipelineError {
    /// Failures a fresh user action may fix without a new payload
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Service { .. } | Self::InvalidResponse(_)
        )
    }

    /// Generic, stage-scoped text shown to the user
    pub fn user_message(&self, stage: Stage) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            _ => match stage {
                Stage::Generation => "Error generating 3D model. Please try again.".into(),
                Stage::TryOn => "Error generating the virtual fit. Please try again.".into(),
                Stage::Catalog => "Error fetching previews. Please try again.".into(),
            },
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Service {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => Self::Network(e.to_string()),
        }
    }
}

/// Input rejected before any request is sent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("an image is required")]
    MissingImage,

    #[error("the image is empty")]
    EmptyImage,

    #[error("image size should be less than {max} bytes, got {size}")]
    ImageTooLarge { size: usize, max: usize },

    #[error("invalid image type '{0}', only JPEG and PNG are accepted")]
    UnsupportedImageType(String),

    #[error("gender, height and image are required")]
    MissingProfile,

    #[error("height must be between 140 and 220 cm, got {0}")]
    HeightOutOfRange(f32),

    #[error("weight must be between 40 and 120 kg, got {0}")]
    WeightOutOfRange(f32),

    #[error("select a garment first")]
    MissingGarment,

    #[error("garment '{0}' is not in the catalog")]
    UnknownGarment(String),

    #[error("color must look like #RRGGBB, got '{0}'")]
    InvalidColor(String),

    #[error("no garments exist for gender '{0}'")]
    GenderWithoutGarments(Gender),
}
