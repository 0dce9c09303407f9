use glam::{Vec2, Vec3};

use crate::bounding_box::BoundingBox;
use crate::mtl::{Material, MaterialLibrary};

/// Renderable scene graph produced from returned geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub meshes: Vec<Mesh>,
    /// `mtllib` references found in the geometry
    pub material_libs: Vec<String>,
}

/// Indexed triangle mesh for one `o`/`g` object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    /// Empty when the source had no normals, else one per position
    pub normals: Vec<Vec3>,
    /// Empty when the source had no texture coordinates, else one per position
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub surfaces: Vec<Surface>,
}

/// A run of triangles drawn with a single material
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Name from `usemtl`
    pub material_name: Option<String>,
    /// First index into [`Mesh::indices`]
    pub start: usize,
    /// Number of indices
    pub count: usize,
    /// Bound material, absent until a library is applied
    pub material: Option<Material>,
}

impl Surface {
    pub fn new(material_name: Option<String>, start: usize) -> Self {
        Self {
            material_name,
            start,
            count: 0,
            material: None,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.count / 3
    }
}

impl Mesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_points(&self.positions)
    }
}

impl Scene {
    pub fn bounds(&self) -> BoundingBox {
        self.meshes
            .iter()
            .fold(BoundingBox::empty(), |acc, mesh| acc.union(&mesh.bounds()))
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(Mesh::triangle_count).sum()
    }

    pub fn surfaces(&self) -> impl Iterator<Item = &Surface> {
        self.meshes.iter().flat_map(|m| m.surfaces.iter())
    }

    pub fn surfaces_mut(&mut self) -> impl Iterator<Item = &mut Surface> {
        self.meshes.iter_mut().flat_map(|m| m.surfaces.iter_mut())
    }

    /// Move every vertex by `offset`
    pub fn translate(&mut self, offset: Vec3) {
        for mesh in &mut self.meshes {
            for position in &mut mesh.positions {
                *position += offset;
            }
        }
    }

    /// Attach library materials to surfaces by name.
    ///
    /// Surfaces naming a material the library lacks, or naming none, get a
    /// default white material so every surface ends up bound.
    pub fn bind_materials(&mut self, library: &MaterialLibrary) {
        for surface in self.surfaces_mut() {
            let material = surface
                .material_name
                .as_deref()
                .and_then(|name| library.get(name))
                .cloned()
                .unwrap_or_else(|| {
                    Material::new(surface.material_name.clone().unwrap_or_else(|| "default".into()))
                });
            surface.material = Some(material);
        }
    }

    /// Serialize back to OBJ text
    pub fn to_obj(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        for lib in &self.material_libs {
            let _ = writeln!(out, "mtllib {lib}");
        }

        let (mut v_base, mut vt_base, mut vn_base) = (1usize, 1usize, 1usize);
        for mesh in &self.meshes {
            let _ = writeln!(out, "o {}", mesh.name);
            for p in &mesh.positions {
                let _ = writeln!(out, "v {} {} {}", p.x, p.y, p.z);
            }
            for t in &mesh.uvs {
                let _ = writeln!(out, "vt {} {}", t.x, t.y);
            }
            for n in &mesh.normals {
                let _ = writeln!(out, "vn {} {} {}", n.x, n.y, n.z);
            }

            let has_uv = !mesh.uvs.is_empty();
            let has_normal = !mesh.normals.is_empty();
            let corner = |i: u32| -> String {
                let i = i as usize;
                match (has_uv, has_normal) {
                    (true, true) => format!("{}/{}/{}", v_base + i, vt_base + i, vn_base + i),
                    (true, false) => format!("{}/{}", v_base + i, vt_base + i),
                    (false, true) => format!("{}//{}", v_base + i, vn_base + i),
                    (false, false) => format!("{}", v_base + i),
                }
            };

            for surface in &mesh.surfaces {
                // Explicit on every surface; a bare `usemtl` clears the material
                match &surface.material_name {
                    Some(name) => {
                        let _ = writeln!(out, "usemtl {name}");
                    }
                    None => {
                        let _ = writeln!(out, "usemtl");
                    }
                }
                let range = surface.start..surface.start + surface.count;
                for tri in mesh.indices[range].chunks_exact(3) {
                    let (a, b, c) = (corner(tri[0]), corner(tri[1]), corner(tri[2]));
                    let _ = writeln!(out, "f {a} {b} {c}");
                }
            }

            v_base += mesh.positions.len();
            vt_base += mesh.uvs.len();
            vn_base += mesh.normals.len();
        }
        out
    }
}
