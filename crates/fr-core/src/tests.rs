use glam::Vec3;

use crate::normalize::{CANONICAL_ROUGHNESS, normalize};
use crate::AssetError;

const FITTED_OBJ: &str = "\
mtllib fitted_model.mtl
o Avatar
v -0.3 0.0 5.0
v 0.3 0.0 5.0
v 0.3 1.8 5.0
v -0.3 1.8 5.2
vt 0 0
vt 1 0
vt 1 1
vn 0 0 1
usemtl Skin
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/3/1
o T-Shirt
v -0.35 1.0 4.9
v 0.35 1.0 4.9
v 0.35 1.5 5.3
usemtl Cotton
f 5 6 7
usemtl Unknown
f 5 7 6
";

const FITTED_MTL: &str = "\
newmtl Skin
Kd 0.9 0.7 0.6
Ks 0.2 0.2 0.2
Ns 10
Pr 0.9

newmtl Cotton
Kd 0.76 0.76 0.76
Ks 1 1 1
Ns 500
Pm 0.8
map_Kd cotton.png
map_Ks cotton_spec.png
";

#[test]
fn every_surface_is_flattened_when_material_present() {
    let normalized = normalize(FITTED_OBJ, Some(FITTED_MTL)).unwrap();

    let surfaces: Vec<_> = normalized.scene.surfaces().collect();
    assert_eq!(surfaces.len(), 3);

    for surface in surfaces {
        let material = surface.material.as_ref().expect("surface must be bound");
        assert_eq!(material.roughness, Some(CANONICAL_ROUGHNESS));
        assert!(!material.is_reflective(), "{} still reflective", material.name);
        assert_eq!(material.specular, None);
        assert_eq!(material.shininess, None);
    }
}

#[test]
fn base_color_and_texture_survive_flattening() {
    let normalized = normalize(FITTED_OBJ, Some(FITTED_MTL)).unwrap();
    let cotton = normalized
        .scene
        .surfaces()
        .find(|s| s.material_name.as_deref() == Some("Cotton"))
        .and_then(|s| s.material.as_ref())
        .unwrap();

    assert_eq!(cotton.diffuse, Vec3::splat(0.76));
    assert_eq!(cotton.diffuse_map.as_deref(), Some("cotton.png"));
    assert_eq!(cotton.specular_map, None);
    assert_eq!(cotton.metalness, Some(0.0));
}

#[test]
fn unknown_material_names_get_a_default() {
    let normalized = normalize(FITTED_OBJ, Some(FITTED_MTL)).unwrap();
    let unknown = normalized
        .scene
        .surfaces()
        .find(|s| s.material_name.as_deref() == Some("Unknown"))
        .and_then(|s| s.material.as_ref())
        .unwrap();

    assert_eq!(unknown.diffuse, Vec3::ONE);
    assert_eq!(unknown.roughness, Some(CANONICAL_ROUGHNESS));
}

#[test]
fn normalization_is_idempotent() {
    let first = normalize(FITTED_OBJ, Some(FITTED_MTL)).unwrap();
    assert!(first.bounds.center().length() < 1e-5);

    let second = normalize(&first.scene.to_obj(), Some(FITTED_MTL)).unwrap();
    assert!(second.bounds.center().length() < 1e-5);
    assert!(second.offset.length() < 1e-5);
    assert!((second.bounds.size() - first.bounds.size()).length() < 1e-5);
    assert_eq!(second.scene.triangle_count(), first.scene.triangle_count());
}

#[test]
fn normalization_is_deterministic() {
    let a = normalize(FITTED_OBJ, Some(FITTED_MTL)).unwrap();
    let b = normalize(FITTED_OBJ, Some(FITTED_MTL)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn centering_spans_all_meshes() {
    let normalized = normalize(FITTED_OBJ, None).unwrap();
    // x: -0.35..0.35, y: 0..1.8, z: 4.9..5.3
    assert!((normalized.offset - Vec3::new(0.0, -0.9, -5.1)).length() < 1e-5);
    assert_eq!(normalized.scene.meshes.len(), 2);
}

#[test]
fn malformed_geometry_is_reported() {
    let err = normalize("v 1 2\nf 1 1 1\n", None).unwrap_err();
    assert!(matches!(err, AssetError::Malformed { line: 1, .. }));
}

#[test]
fn material_carries_into_later_groups() {
    let geometry = "\
mtllib garment.mtl
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
usemtl Cotton
g sleeve_left
f 1 2 3
g sleeve_right
f 2 4 3
";
    let material = "newmtl Cotton\nKd 0.2 0.4 0.6\nmap_Kd cotton.png\n";
    let normalized = normalize(geometry, Some(material)).unwrap();

    let surfaces: Vec<_> = normalized.scene.surfaces().collect();
    assert_eq!(surfaces.len(), 2);
    for surface in surfaces {
        let material = surface.material.as_ref().unwrap();
        assert_eq!(surface.material_name.as_deref(), Some("Cotton"));
        assert_eq!(material.diffuse, Vec3::new(0.2, 0.4, 0.6));
        assert_eq!(material.diffuse_map.as_deref(), Some("cotton.png"));
    }
}

#[test]
fn non_finite_geometry_is_malformed() {
    let err = normalize("v inf 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", None).unwrap_err();
    assert!(matches!(err, AssetError::Malformed { line: 1, .. }));
}
