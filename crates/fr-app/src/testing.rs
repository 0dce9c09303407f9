//! Shared test fixtures.

use crate::artifacts::GeneratedModel;

pub const TRIANGLE: &str = "v 0 0 0\nv 2 0 0\nv 0 2 0\nf 1 2 3\n";

pub const FITTED_OBJ: &str = "\
mtllib fitted_model.mtl
v 10 0 0
v 12 0 0
v 10 2 0
v 12 2 1
usemtl Cotton
f 1 2 3
f 2 4 3
";

pub const FITTED_MTL: &str = "\
newmtl Cotton
Kd 0.76 0.76 0.76
Ks 1 1 1
Ns 250
map_Kd cotton.png
";

/// Bytes that sniff as JPEG
pub fn jpeg(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len.max(4)];
    bytes[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
    bytes
}

pub fn avatar(geometry: &str) -> GeneratedModel {
    GeneratedModel {
        geometry: geometry.into(),
    }
}
