use crate::artifacts::{FittedModel, GeneratedModel};
use crate::catalog::PreviewAsset;
use crate::error::PipelineError;
use crate::stage::Stage;

/// A finished service call, tagged with the submission token it answers
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    AvatarGenerated {
        token: u64,
        result: Result<GeneratedModel, PipelineError>,
    },
    GarmentFitted {
        token: u64,
        result: Result<FittedModel, PipelineError>,
    },
    CatalogFetched {
        token: u64,
        result: Result<Vec<PreviewAsset>, PipelineError>,
    },
}

impl PipelineEvent {
    pub fn token(&self) -> u64 {
        match self {
            Self::AvatarGenerated { token, .. }
            | Self::GarmentFitted { token, .. }
            | Self::CatalogFetched { token, .. } => *token,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::AvatarGenerated { .. } => Stage::Generation,
            Self::GarmentFitted { .. } => Stage::TryOn,
            Self::CatalogFetched { .. } => Stage::Catalog,
        }
    }
}
