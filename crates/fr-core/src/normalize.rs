//! Turns returned geometry (and optional material) text into a centered,
//! consistently shaded scene ready for display.

use glam::Vec3;
use log::debug;

use crate::bounding_box::BoundingBox;
use crate::error::Result;
use crate::mtl::parse_mtl;
use crate::obj::parse_obj;
use crate::scene::Scene;

/// Roughness every surface is pinned to when materials are present
pub const CANONICAL_ROUGHNESS: f32 = 0.5;

/// Display-ready view of a returned model. Derived, never edited in place.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedScene {
    pub scene: Scene,
    /// Translation applied to move the bounding-box center to the origin
    pub offset: Vec3,
    /// Bounds after centering
    pub bounds: BoundingBox,
}

impl NormalizedScene {
    pub fn has_materials(&self) -> bool {
        self.scene.surfaces().any(|s| s.material.is_some())
    }

    /// Largest extent, used by viewers to pick a camera distance
    pub fn max_dimension(&self) -> f32 {
        self.bounds.size().max_element()
    }
}

/// Parse, bind and canonicalize materials, then center.
///
/// Pure and deterministic: the same input always yields the same scene, and
/// running it again on [`Scene::to_obj`] output leaves the scene centered.
pub fn normalize(geometry: &str, material: Option<&str>) -> Result<NormalizedScene> {
    let mut scene = parse_obj(geometry)?;

    if let Some(material) = material {
        let library = parse_mtl(material)?;
        scene.bind_materials(&library);
        canonicalize_materials(&mut scene);
    }

    let center = scene.bounds().center();
    let offset = -center;
    scene.translate(offset);
    let bounds = scene.bounds();

    debug!(
        "normalized scene: offset [{:.3}, {:.3}, {:.3}], size [{:.3}, {:.3}, {:.3}]",
        offset.x,
        offset.y,
        offset.z,
        bounds.size().x,
        bounds.size().y,
        bounds.size().z
    );

    Ok(NormalizedScene {
        scene,
        offset,
        bounds,
    })
}

/// Replace every bound material with its flat, non-reflective form
fn canonicalize_materials(scene: &mut Scene) {
    for surface in scene.surfaces_mut() {
        if let Some(material) = surface.material.as_mut() {
            *material = material.canonical(CANONICAL_ROUGHNESS);
        }
    }
}
