//! Wavefront MTL material libraries.
//!
//! Only the statements a renderer needs are kept; everything else is skipped.
//!
//! ```text
//! newmtl Cotton
//! Kd 0.8 0.1 0.1
//! Ks 0.5 0.5 0.5
//! Ns 96.0
//! map_Kd cotton_diffuse.png
//! ```

use glam::Vec3;
use log::debug;

use crate::error::{AssetError, AssetKind, Result};

/// A material as authored, or as rewritten by [`Material::canonical`].
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// Base color (`Kd`)
    pub diffuse: Vec3,
    pub ambient: Option<Vec3>,
    /// Reflective color (`Ks`)
    pub specular: Option<Vec3>,
    pub emissive: Option<Vec3>,
    /// Specular exponent (`Ns`)
    pub shininess: Option<f32>,
    /// PBR roughness (`Pr`)
    pub roughness: Option<f32>,
    /// PBR metalness (`Pm`)
    pub metalness: Option<f32>,
    pub optical_density: Option<f32>,
    /// `d`, or `1 - Tr`
    pub opacity: f32,
    pub illumination: Option<u32>,
    /// Base color texture (`map_Kd`)
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
    pub bump_map: Option<String>,
    pub alpha_map: Option<String>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse: Vec3::ONE,
            ambient: None,
            specular: None,
            emissive: None,
            shininess: None,
            roughness: None,
            metalness: None,
            optical_density: None,
            opacity: 1.0,
            illumination: None,
            diffuse_map: None,
            specular_map: None,
            bump_map: None,
            alpha_map: None,
        }
    }

    /// Flat material keeping only the base color and its texture map.
    ///
    /// Roughness is pinned to `roughness`, metalness to zero, and every
    /// specular or shininess channel is removed.
    pub fn canonical(&self, roughness: f32) -> Self {
        Self {
            name: self.name.clone(),
            diffuse: self.diffuse,
            diffuse_map: self.diffuse_map.clone(),
            roughness: Some(roughness),
            metalness: Some(0.0),
            ..Self::new(self.name.clone())
        }
    }

    /// True when the material carries any specular or shininess channel
    pub fn is_reflective(&self) -> bool {
        self.specular.is_some()
            || self.shininess.is_some()
            || self.specular_map.is_some()
            || self.metalness.is_some_and(|m| m > 0.0)
    }
}

/// Materials in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
}

impl MaterialLibrary {
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    fn push(&mut self, material: Material) {
        // A later definition with the same name wins
        self.materials.retain(|m| m.name != material.name);
        self.materials.push(material);
    }
}

/// Parse MTL text into a library.
pub fn parse_mtl(text: &str) -> Result<MaterialLibrary> {
    if text.trim().is_empty() {
        return Err(AssetError::Empty {
            kind: AssetKind::Material,
        });
    }

    let mut library = MaterialLibrary::default();
    let mut current: Option<Material> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim()),
            None => (line, ""),
        };

        if keyword == "newmtl" {
            if rest.is_empty() {
                return Err(AssetError::malformed(
                    AssetKind::Material,
                    line_no,
                    "newmtl without a name",
                ));
            }
            if let Some(done) = current.take() {
                library.push(done);
            }
            current = Some(Material::new(rest));
            continue;
        }

        let Some(material) = current.as_mut() else {
            return Err(AssetError::malformed(
                AssetKind::Material,
                line_no,
                format!("'{keyword}' before any newmtl"),
            ));
        };

        match keyword {
            "Kd" => material.diffuse = parse_color(rest, line_no)?,
            "Ka" => material.ambient = Some(parse_color(rest, line_no)?),
            "Ks" => material.specular = Some(parse_color(rest, line_no)?),
            "Ke" => material.emissive = Some(parse_color(rest, line_no)?),
            "Ns" => material.shininess = Some(parse_scalar(rest, line_no)?),
            "Pr" => material.roughness = Some(parse_scalar(rest, line_no)?),
            "Pm" => material.metalness = Some(parse_scalar(rest, line_no)?),
            "Ni" => material.optical_density = Some(parse_scalar(rest, line_no)?),
            "d" => material.opacity = parse_scalar(rest, line_no)?,
            "Tr" => material.opacity = 1.0 - parse_scalar(rest, line_no)?,
            "illum" => {
                let illum = rest.parse().map_err(|_| {
                    let message = format!("bad illum '{rest}'");
                    AssetError::malformed(AssetKind::Material, line_no, message)
                })?;
                material.illumination = Some(illum);
            }
            "map_Kd" => material.diffuse_map = Some(parse_map(rest, line_no)?),
            "map_Ks" => material.specular_map = Some(parse_map(rest, line_no)?),
            "map_Bump" | "map_bump" | "bump" => material.bump_map = Some(parse_map(rest, line_no)?),
            "map_d" => material.alpha_map = Some(parse_map(rest, line_no)?),
            other => debug!("mtl line {line_no}: skipping '{other}'"),
        }
    }

    if let Some(done) = current.take() {
        library.push(done);
    }

    Ok(library)
}

fn parse_number(token: &str, line_no: usize) -> Result<f32> {
    let value = token.parse::<f32>().map_err(|_| {
        AssetError::malformed(AssetKind::Material, line_no, format!("bad number '{token}'"))
    })?;
    if !value.is_finite() {
        return Err(AssetError::malformed(
            AssetKind::Material,
            line_no,
            format!("non-finite number '{token}'"),
        ));
    }
    Ok(value)
}

fn parse_scalar(rest: &str, line_no: usize) -> Result<f32> {
    parse_number(rest.split_whitespace().next().unwrap_or(""), line_no)
}

fn parse_color(rest: &str, line_no: usize) -> Result<Vec3> {
    let values = rest
        .split_whitespace()
        .map(|t| parse_number(t, line_no))
        .collect::<Result<Vec<_>>>()?;

    match values.as_slice() {
        [r, g, b, ..] => Ok(Vec3::new(*r, *g, *b)),
        // A single value is a gray level
        [v] => Ok(Vec3::splat(*v)),
        [] => Err(AssetError::malformed(AssetKind::Material, line_no, "missing color")),
        [_, _] => Err(AssetError::malformed(
            AssetKind::Material,
            line_no,
            "expected 1 or 3 color components",
        )),
    }
}

/// Texture statements may carry options (`-bm 1.0 file.png`); the file is the last token.
fn parse_map(rest: &str, line_no: usize) -> Result<String> {
    rest.split_whitespace().last().map(str::to_string).ok_or_else(|| {
        AssetError::malformed(AssetKind::Material, line_no, "texture statement without a file")
    })
}
