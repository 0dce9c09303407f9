pub mod bounding_box;
pub mod error;
mod model_types;
pub mod mtl;
pub mod normalize;
pub mod obj;
pub mod scene;
#[cfg(test)]
mod tests;

pub use error::{AssetError, AssetKind};
pub use model_types::{
    DEFAULT_GARMENT_COLOR, GarmentKind, GarmentSize, GarmentSlot, Gender, HEIGHT_RANGE_CM, Quality,
    WEIGHT_RANGE_KG, is_hex_color,
};
pub use normalize::{CANONICAL_ROUGHNESS, NormalizedScene, normalize};
