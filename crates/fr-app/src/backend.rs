pub mod config;
#[cfg(test)]
pub mod fake;
pub mod schemas;

use std::io::{Cursor, Read};

use async_trait::async_trait;
use fr_core::{AssetError, AssetKind};
use futures::future::try_join_all;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::artifacts::{FittedModel, GeneratedModel};
use crate::backend::config::ServiceConfig;
use crate::backend::schemas::{
    GENERATE_PATH, GenerateRequest, PREVIEWS_PATH, PreviewsRequest, PreviewsResponse, TRY_ON_PATH,
    TryOnRequest,
};
use crate::catalog::{PreviewAsset, garment_from_url};
use crate::error::PipelineError;

/// Remote avatar/try-on service. One call per explicit user action; nothing
/// here retries.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate_avatar(
        &self,
        request: GenerateRequest,
    ) -> Result<GeneratedModel, PipelineError>;

    async fn fit_garment(&self, request: TryOnRequest) -> Result<FittedModel, PipelineError>;

    /// All previews for a gender, or an error. Never a partial list.
    async fn fetch_catalog(
        &self,
        request: PreviewsRequest,
    ) -> Result<Vec<PreviewAsset>, PipelineError>;
}

pub struct HttpBackend {
    client: Client,
    config: ServiceConfig,
}

impl HttpBackend {
    pub fn new(config: ServiceConfig) -> Result<Self, PipelineError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn post(&self, path: &str, form: Form) -> Result<Response, PipelineError> {
        let url = self.config.endpoint(path);
        debug!(%url, "POST");
        let response = self.client.post(&url).multipart(form).send().await?;
        check_status(response).await
    }

    async fn download_preview(&self, url: &str) -> Result<PreviewAsset, PipelineError> {
        let garment = garment_from_url(url).ok_or_else(|| {
            PipelineError::InvalidResponse(format!("cannot name preview from '{url}'"))
        })?;
        let response = check_status(self.client.get(url).send().await?).await?;
        let image = response.bytes().await?.to_vec();
        let format = image::guess_format(&image).ok();

        Ok(PreviewAsset {
            garment,
            url: url.to_string(),
            image,
            format,
        })
    }
}

#[async_trait]
impl GenerationService for HttpBackend {
    async fn generate_avatar(
        &self,
        request: GenerateRequest,
    ) -> Result<GeneratedModel, PipelineError> {
        let image = Part::bytes(request.image.bytes().to_vec())
            .file_name(request.image.file_name())
            .mime_str(request.image.content_type())?;

        let form = request
            .form_fields()
            .into_iter()
            .fold(Form::new().part("image", image), |form, (name, value)| {
                form.text(name, value)
            });

        info!(
            gender = %request.gender,
            bytes = request.image.len(),
            "requesting avatar generation"
        );
        let geometry = self.post(GENERATE_PATH, form).await?.text().await?;
        info!(bytes = geometry.len(), "avatar geometry received");

        Ok(GeneratedModel { geometry })
    }

    async fn fit_garment(&self, request: TryOnRequest) -> Result<FittedModel, PipelineError> {
        let obj = Part::bytes(request.avatar_geometry.clone().into_bytes())
            .file_name("model.obj")
            .mime_str("application/octet-stream")?;

        let form = request
            .form_fields()
            .into_iter()
            .fold(Form::new().part("obj", obj), |form, (name, value)| form.text(name, value));

        info!(
            garment = %request.garment,
            size = %request.size,
            quality = request.quality.get(),
            "requesting try-on"
        );
        let response = self.post(TRY_ON_PATH, form).await?;
        let is_zip_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/zip"));
        let body = response.bytes().await?;

        read_fitted_payload(&body, is_zip_type)
    }

    async fn fetch_catalog(
        &self,
        request: PreviewsRequest,
    ) -> Result<Vec<PreviewAsset>, PipelineError> {
        let form = Form::new().text("gender", request.gender.id().to_string());
        let body = self.post(PREVIEWS_PATH, form).await?.text().await?;
        let previews: PreviewsResponse = serde_json::from_str(&body)
            .map_err(|e| PipelineError::InvalidResponse(format!("previews response: {e}")))?;

        debug!(count = previews.presigned_urls.len(), "downloading previews");
        // Any failed download fails the whole catalog
        try_join_all(previews.presigned_urls.iter().map(|url| self.download_preview(url))).await
    }
}

/// Non-2xx responses become `Service` errors carrying a truncated body
async fn check_status(response: Response) -> Result<Response, PipelineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(512).collect();
    warn!(status = status.as_u16(), %body, "service request failed");
    Err(PipelineError::Service {
        status: status.as_u16(),
        body,
    })
}

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// A try-on body is either bare OBJ text or a zip holding `.obj` and `.mtl`.
pub fn read_fitted_payload(body: &[u8], is_zip_type: bool) -> Result<FittedModel, PipelineError> {
    if is_zip_type || body.starts_with(ZIP_MAGIC) {
        return read_fitted_archive(body);
    }

    let geometry = String::from_utf8(body.to_vec()).map_err(|_| {
        AssetError::malformed(AssetKind::Geometry, 0, "geometry is not UTF-8 text")
    })?;
    Ok(FittedModel {
        geometry,
        material: None,
    })
}

fn read_fitted_archive(body: &[u8]) -> Result<FittedModel, PipelineError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(body))
        .map_err(|e| PipelineError::InvalidResponse(format!("try-on archive: {e}")))?;

    let mut geometry = None;
    let mut material = None;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| PipelineError::InvalidResponse(format!("try-on archive entry: {e}")))?;
        let name = entry.name().to_ascii_lowercase();
        let slot = if name.ends_with(".obj") {
            &mut geometry
        } else if name.ends_with(".mtl") {
            &mut material
        } else {
            continue;
        };

        let mut text = String::new();
        entry.read_to_string(&mut text).map_err(|e| {
            PipelineError::InvalidResponse(format!("try-on archive entry {name}: {e}"))
        })?;
        *slot = Some(text);
    }

    let geometry = geometry
        .ok_or_else(|| PipelineError::InvalidResponse("try-on archive has no .obj".into()))?;
    Ok(FittedModel { geometry, material })
}
