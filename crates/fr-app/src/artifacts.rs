//! Current pipeline artifacts plus per-stage flags.
//!
//! Every write replaces a whole record and keeps the cross-artifact rules:
//! a new avatar drops any fit, and display scenes are always derived from
//! the artifact they sit next to.

use fr_core::{
    AssetError, DEFAULT_GARMENT_COLOR, GarmentSize, Gender, HEIGHT_RANGE_CM, NormalizedScene,
    Quality, WEIGHT_RANGE_KG, normalize,
};
use image::ImageFormat;

use crate::catalog::Catalog;
use crate::error::ValidationError;
use crate::stage::{Stage, StageStatus};

/// Largest accepted photo
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

const ACCEPTED_IMAGE_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

/// Photo the avatar is generated from
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl SourceImage {
    /// Accepts JPEG or PNG up to `max_bytes`. The format is sniffed from the
    /// bytes; a declared content type must also be one of the accepted ones.
    pub fn new(
        bytes: Vec<u8>,
        content_type: Option<&str>,
        max_bytes: usize,
    ) -> Result<Self, ValidationError> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        if bytes.len() > max_bytes {
            return Err(ValidationError::ImageTooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        if let Some(declared) = content_type {
            if !ACCEPTED_IMAGE_TYPES.contains(&declared) {
                return Err(ValidationError::UnsupportedImageType(declared.to_string()));
            }
        }

        match image::guess_format(&bytes) {
            Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => Ok(Self { bytes, format }),
            Ok(other) => Err(ValidationError::UnsupportedImageType(
                other.to_mime_type().to_string(),
            )),
            Err(_) => Err(ValidationError::UnsupportedImageType("unknown".into())),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn content_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Upload file name matching the sniffed format
    pub fn file_name(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "image.png",
            _ => "image.jpg",
        }
    }
}

/// Body parameters for avatar generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AvatarProfile {
    pub gender: Gender,
    pub height_cm: f32,
    /// Optional hint; the service may ignore it
    pub weight_kg: Option<f32>,
}

impl AvatarProfile {
    pub fn new(
        gender: Gender,
        height_cm: f32,
        weight_kg: Option<f32>,
    ) -> Result<Self, ValidationError> {
        let profile = Self {
            gender,
            height_cm,
            weight_kg,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !HEIGHT_RANGE_CM.contains(&self.height_cm) {
            return Err(ValidationError::HeightOutOfRange(self.height_cm));
        }
        if let Some(weight) = self.weight_kg {
            if !WEIGHT_RANGE_KG.contains(&weight) {
                return Err(ValidationError::WeightOutOfRange(weight));
            }
        }
        Ok(())
    }
}

/// Avatar geometry as returned by the service
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedModel {
    pub geometry: String,
}

/// Avatar wearing a garment, with the material when the service sent one
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub geometry: String,
    pub material: Option<String>,
}

/// Garment choice for the try-on stage
#[derive(Debug, Clone, PartialEq)]
pub struct GarmentSelection {
    pub garment: Option<String>,
    pub size: GarmentSize,
    pub quality: Quality,
    pub color: String,
}

impl Default for GarmentSelection {
    fn default() -> Self {
        Self {
            garment: None,
            size: GarmentSize::default(),
            quality: Quality::default(),
            color: DEFAULT_GARMENT_COLOR.to_string(),
        }
    }
}

impl GarmentSelection {
    pub fn is_complete(&self) -> bool {
        self.garment.as_deref().is_some_and(|g| !g.is_empty())
    }
}

/// Pending/error flags for each stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineState {
    pub generation: StageStatus,
    pub tryon: StageStatus,
    pub catalog: StageStatus,
}

impl PipelineState {
    pub fn get(&self, stage: Stage) -> &StageStatus {
        match stage {
            Stage::Generation => &self.generation,
            Stage::TryOn => &self.tryon,
            Stage::Catalog => &self.catalog,
        }
    }

    fn get_mut(&mut self, stage: Stage) -> &mut StageStatus {
        match stage {
            Stage::Generation => &mut self.generation,
            Stage::TryOn => &mut self.tryon,
            Stage::Catalog => &mut self.catalog,
        }
    }
}

/// Holds the shared workflow state. Pure: no I/O happens here.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    image: Option<SourceImage>,
    profile: Option<AvatarProfile>,
    avatar: Option<(GeneratedModel, NormalizedScene)>,
    selection: GarmentSelection,
    fitted: Option<(FittedModel, NormalizedScene)>,
    catalog: Catalog,
    state: PipelineState,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn set_image(&mut self, image: Option<SourceImage>) {
        self.image = image;
    }

    pub fn profile(&self) -> Option<&AvatarProfile> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: Option<AvatarProfile>) {
        self.profile = profile;
    }

    pub fn avatar(&self) -> Option<&GeneratedModel> {
        self.avatar.as_ref().map(|(model, _)| model)
    }

    pub fn avatar_scene(&self) -> Option<&NormalizedScene> {
        self.avatar.as_ref().map(|(_, scene)| scene)
    }

    /// Store a new avatar. Any existing fit belongs to the old avatar and is
    /// dropped. Geometry that does not normalize leaves the avatar absent.
    pub fn set_avatar(&mut self, model: GeneratedModel) -> Result<(), AssetError> {
        self.fitted = None;
        self.avatar = None;
        let scene = normalize(&model.geometry, None)?;
        self.avatar = Some((model, scene));
        Ok(())
    }

    pub fn clear_avatar(&mut self) {
        self.avatar = None;
        self.fitted = None;
    }

    pub fn fitted(&self) -> Option<&FittedModel> {
        self.fitted.as_ref().map(|(model, _)| model)
    }

    pub fn fitted_scene(&self) -> Option<&NormalizedScene> {
        self.fitted.as_ref().map(|(_, scene)| scene)
    }

    pub fn set_fitted(&mut self, model: FittedModel) -> Result<(), AssetError> {
        self.fitted = None;
        let scene = normalize(&model.geometry, model.material.as_deref())?;
        self.fitted = Some((model, scene));
        Ok(())
    }

    pub fn clear_fitted(&mut self) {
        self.fitted = None;
    }

    pub fn selection(&self) -> &GarmentSelection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: GarmentSelection) {
        self.selection = selection;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn status(&self, stage: Stage) -> &StageStatus {
        self.state.get(stage)
    }

    pub fn set_status(&mut self, stage: Stage, status: StageStatus) {
        *self.state.get_mut(stage) = status;
    }

    /// True while generation or try-on has a request in flight
    pub fn is_busy(&self) -> bool {
        self.state.generation.is_pending() || self.state.tryon.is_pending()
    }

    /// Drop every artifact and flag in one step
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
