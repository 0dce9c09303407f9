//! Files offered for download: the bare avatar, or the fitted model with its
//! material packed together.

use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::artifacts::{FittedModel, GeneratedModel};

pub const BASE_MODEL_NAME: &str = "base_model.obj";
pub const FITTED_MODEL_NAME: &str = "fitted_model.obj";
pub const FITTED_MATERIAL_NAME: &str = "fitted_model.mtl";
pub const FITTED_ARCHIVE_NAME: &str = "fitted_model.zip";

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadBundle {
    file_name: &'static str,
    bytes: Vec<u8>,
}

impl DownloadBundle {
    pub fn for_avatar(model: &GeneratedModel) -> Self {
        Self {
            file_name: BASE_MODEL_NAME,
            bytes: model.geometry.clone().into_bytes(),
        }
    }

    /// A single `.obj` when there is no material, else a zip with both files
    pub fn for_fit(model: &FittedModel) -> io::Result<Self> {
        let Some(material) = &model.material else {
            return Ok(Self {
                file_name: FITTED_MODEL_NAME,
                bytes: model.geometry.clone().into_bytes(),
            });
        };

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        writer.start_file(FITTED_MODEL_NAME, options).map_err(io::Error::other)?;
        writer.write_all(model.geometry.as_bytes())?;
        writer.start_file(FITTED_MATERIAL_NAME, options).map_err(io::Error::other)?;
        writer.write_all(material.as_bytes())?;
        let cursor = writer.finish().map_err(io::Error::other)?;

        Ok(Self {
            file_name: FITTED_ARCHIVE_NAME,
            bytes: cursor.into_inner(),
        })
    }

    pub fn file_name(&self) -> &str {
        self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_archive(&self) -> bool {
        self.file_name == FITTED_ARCHIVE_NAME
    }

    /// Write into `dir`, returning the full path
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}
