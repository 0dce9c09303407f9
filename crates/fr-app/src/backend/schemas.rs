//! Validated request bodies and response shapes for each service endpoint.
//! A request value can only be built from input that passed validation.

use fr_core::{GarmentSize, Gender, Quality, is_hex_color};
use serde::{Deserialize, Serialize};

use crate::artifacts::{AvatarProfile, GarmentSelection, GeneratedModel, SourceImage};
use crate::catalog::Catalog;
use crate::error::ValidationError;

pub const GENERATE_PATH: &str = "generate-3d-model";
pub const PREVIEWS_PATH: &str = "generate-previews";
pub const TRY_ON_PATH: &str = "try-on";

/// `POST /generate-3d-model`
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub image: SourceImage,
    pub gender: Gender,
    pub height_cm: f32,
    pub weight_kg: Option<f32>,
}

impl GenerateRequest {
    pub fn new(
        image: Option<&SourceImage>,
        profile: Option<&AvatarProfile>,
    ) -> Result<Self, ValidationError> {
        let image = image.ok_or(ValidationError::MissingImage)?;
        let profile = profile.ok_or(ValidationError::MissingProfile)?;
        profile.validate()?;

        Ok(Self {
            image: image.clone(),
            gender: profile.gender,
            height_cm: profile.height_cm,
            weight_kg: profile.weight_kg,
        })
    }

    /// Text parts of the multipart body, image excluded
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("gender", self.gender.id().to_string()),
            ("height", self.height_cm.to_string()),
        ];
        if let Some(weight) = self.weight_kg {
            fields.push(("weight", weight.to_string()));
        }
        fields
    }
}

/// `POST /try-on`
#[derive(Debug, Clone, PartialEq)]
pub struct TryOnRequest {
    pub avatar_geometry: String,
    pub garment: String,
    pub gender: Gender,
    pub size: GarmentSize,
    pub quality: Quality,
    pub color: String,
}

impl TryOnRequest {
    /// The garment must be in `catalog` whenever a catalog was loaded
    pub fn new(
        avatar: &GeneratedModel,
        selection: &GarmentSelection,
        gender: Gender,
        catalog: &Catalog,
    ) -> Result<Self, ValidationError> {
        if !gender.has_garments() {
            return Err(ValidationError::GenderWithoutGarments(gender));
        }
        let garment = selection
            .garment
            .as_deref()
            .filter(|g| !g.is_empty())
            .ok_or(ValidationError::MissingGarment)?;
        if !catalog.is_empty() && !catalog.contains(garment) {
            return Err(ValidationError::UnknownGarment(garment.to_string()));
        }
        if !is_hex_color(&selection.color) {
            return Err(ValidationError::InvalidColor(selection.color.clone()));
        }

        Ok(Self {
            avatar_geometry: avatar.geometry.clone(),
            garment: garment.to_string(),
            gender,
            size: selection.size,
            quality: selection.quality,
            color: selection.color.clone(),
        })
    }

    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("garment", self.garment.clone()),
            ("gender", self.gender.id().to_string()),
            ("size", self.size.id().to_string()),
            ("quality", self.quality.get().to_string()),
            ("color", self.color.clone()),
        ]
    }
}

/// `POST /generate-previews`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewsRequest {
    pub gender: Gender,
}

impl PreviewsRequest {
    pub fn new(gender: Gender) -> Result<Self, ValidationError> {
        if !gender.has_garments() {
            return Err(ValidationError::GenderWithoutGarments(gender));
        }
        Ok(Self { gender })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewsResponse {
    pub presigned_urls: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
}
