//! Wavefront OBJ geometry.
//!
//! The avatar and fitting services both return plain OBJ text. Faces may use
//! any of the `v`, `v/vt`, `v//vn` and `v/vt/vn` corner forms, indices may be
//! negative (relative to the end of the list so far), and polygons with more
//! than three corners are fan-triangulated. Objects (`o`/`g`) become separate
//! meshes and `usemtl` splits a mesh into surfaces.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use log::debug;

use crate::error::{AssetError, AssetKind, Result};
use crate::scene::{Mesh, Scene, Surface};

pub fn parse_obj(text: &str) -> Result<Scene> {
    if text.trim().is_empty() {
        return Err(AssetError::Empty {
            kind: AssetKind::Geometry,
        });
    }

    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Vec<Vec2> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();

    let mut scene = Scene::default();
    let mut builder = MeshBuilder::new("default", None);

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => positions.push(parse_vec3(tokens, line_no)?),
            "vn" => normals.push(parse_vec3(tokens, line_no)?),
            "vt" => {
                let values = parse_floats(tokens, line_no)?;
                match values.as_slice() {
                    [u, v, ..] => uvs.push(Vec2::new(*u, *v)),
                    [u] => uvs.push(Vec2::new(*u, 0.0)),
                    [] => {
                        return Err(AssetError::malformed(
                            AssetKind::Geometry,
                            line_no,
                            "vt without values",
                        ));
                    }
                }
            }
            "f" => {
                let corners = tokens
                    .map(|token| {
                        parse_corner(token, line_no, positions.len(), uvs.len(), normals.len())
                    })
                    .collect::<Result<Vec<_>>>()?;
                if corners.len() < 3 {
                    return Err(AssetError::malformed(
                        AssetKind::Geometry,
                        line_no,
                        format!("face needs at least 3 corners, got {}", corners.len()),
                    ));
                }
                builder.push_polygon(&corners, &positions, &uvs, &normals);
            }
            "o" | "g" => {
                let name = line[keyword.len()..].trim();
                let name = if name.is_empty() { "default" } else { name };
                if builder.is_empty() {
                    builder.name = name.to_string();
                } else {
                    // Material state carries over into the next object
                    let material = builder.current_material();
                    let done = std::mem::replace(&mut builder, MeshBuilder::new(name, material));
                    scene.meshes.push(done.finish());
                }
            }
            "usemtl" => {
                let name = line[keyword.len()..].trim();
                builder.use_material(if name.is_empty() { None } else { Some(name.to_string()) });
            }
            "mtllib" => scene.material_libs.extend(tokens.map(str::to_string)),
            other => debug!("obj line {line_no}: skipping '{other}'"),
        }
    }

    if !builder.is_empty() {
        scene.meshes.push(builder.finish());
    }

    if scene.meshes.is_empty() {
        return Err(AssetError::NoFaces);
    }

    debug!(
        "parsed obj: {} meshes, {} vertices, {} triangles",
        scene.meshes.len(),
        scene.vertex_count(),
        scene.triangle_count()
    );

    Ok(scene)
}

/// Resolved zero-based indices of one face corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    uv: Option<usize>,
    normal: Option<usize>,
}

struct MeshBuilder {
    name: String,
    mesh: Mesh,
    lookup: HashMap<Corner, u32>,
    any_uv: bool,
    any_normal: bool,
}

impl MeshBuilder {
    fn new(name: &str, material: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            mesh: Mesh {
                surfaces: vec![Surface::new(material, 0)],
                ..Mesh::default()
            },
            lookup: HashMap::new(),
            any_uv: false,
            any_normal: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.mesh.indices.is_empty()
    }

    fn current_material(&self) -> Option<String> {
        self.mesh.surfaces.last().and_then(|s| s.material_name.clone())
    }

    fn use_material(&mut self, name: Option<String>) {
        let start = self.mesh.indices.len();
        match self.mesh.surfaces.last_mut() {
            Some(current) if current.count == 0 => current.material_name = name,
            _ => self.mesh.surfaces.push(Surface::new(name, start)),
        }
    }

    fn push_polygon(
        &mut self,
        corners: &[Corner],
        positions: &[Vec3],
        uvs: &[Vec2],
        normals: &[Vec3],
    ) {
        let ids: Vec<u32> = corners
            .iter()
            .map(|c| self.vertex(*c, positions, uvs, normals))
            .collect();

        for i in 1..ids.len() - 1 {
            self.mesh.indices.extend_from_slice(&[ids[0], ids[i], ids[i + 1]]);
        }

        if let Some(surface) = self.mesh.surfaces.last_mut() {
            surface.count = self.mesh.indices.len() - surface.start;
        }
    }

    fn vertex(
        &mut self,
        corner: Corner,
        positions: &[Vec3],
        uvs: &[Vec2],
        normals: &[Vec3],
    ) -> u32 {
        if let Some(id) = self.lookup.get(&corner) {
            return *id;
        }

        let id = self.mesh.positions.len() as u32;
        self.mesh.positions.push(positions[corner.position]);
        self.mesh.uvs.push(corner.uv.map(|i| uvs[i]).unwrap_or(Vec2::ZERO));
        self.mesh.normals.push(corner.normal.map(|i| normals[i]).unwrap_or(Vec3::ZERO));
        self.any_uv |= corner.uv.is_some();
        self.any_normal |= corner.normal.is_some();
        self.lookup.insert(corner, id);
        id
    }

    fn finish(mut self) -> Mesh {
        if !self.any_uv {
            self.mesh.uvs.clear();
        }
        if !self.any_normal {
            self.mesh.normals.clear();
        }
        self.mesh.surfaces.retain(|s| s.count > 0);
        self.mesh.name = self.name;
        self.mesh
    }
}

fn parse_floats<'a>(tokens: impl Iterator<Item = &'a str>, line_no: usize) -> Result<Vec<f32>> {
    tokens
        .map(|t| {
            let value = t.parse::<f32>().map_err(|_| {
                AssetError::malformed(AssetKind::Geometry, line_no, format!("bad number '{t}'"))
            })?;
            if !value.is_finite() {
                return Err(AssetError::malformed(
                    AssetKind::Geometry,
                    line_no,
                    format!("non-finite number '{t}'"),
                ));
            }
            Ok(value)
        })
        .collect()
}

fn parse_vec3<'a>(tokens: impl Iterator<Item = &'a str>, line_no: usize) -> Result<Vec3> {
    // Extra values (w, or per-vertex colors) are ignored
    match parse_floats(tokens, line_no)?.as_slice() {
        [x, y, z, ..] => Ok(Vec3::new(*x, *y, *z)),
        values => Err(AssetError::malformed(
            AssetKind::Geometry,
            line_no,
            format!("expected 3 components, got {}", values.len()),
        )),
    }
}

fn parse_corner(
    token: &str,
    line_no: usize,
    n_pos: usize,
    n_uv: usize,
    n_norm: usize,
) -> Result<Corner> {
    let mut parts = token.split('/');
    let position = parts.next().filter(|p| !p.is_empty()).ok_or_else(|| {
        AssetError::malformed(AssetKind::Geometry, line_no, format!("bad face corner '{token}'"))
    })?;
    let uv = parts.next().filter(|p| !p.is_empty());
    let normal = parts.next().filter(|p| !p.is_empty());

    Ok(Corner {
        position: resolve_index(position, n_pos, line_no)?,
        uv: uv.map(|i| resolve_index(i, n_uv, line_no)).transpose()?,
        normal: normal.map(|i| resolve_index(i, n_norm, line_no)).transpose()?,
    })
}

/// OBJ indices are 1-based; negative values count back from the end.
fn resolve_index(token: &str, len: usize, line_no: usize) -> Result<usize> {
    let raw: i64 = token.parse().map_err(|_| {
        AssetError::malformed(AssetKind::Geometry, line_no, format!("bad index '{token}'"))
    })?;

    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => (len as i64 + r).try_into().ok(),
    };

    resolved.filter(|i| *i < len).ok_or_else(|| {
        AssetError::malformed(
            AssetKind::Geometry,
            line_no,
            format!("index {raw} out of range ({len} defined)"),
        )
    })
}
