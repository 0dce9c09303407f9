//! In-process stand-in for the generation service.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::artifacts::{FittedModel, GeneratedModel};
use crate::backend::GenerationService;
use crate::backend::schemas::{GenerateRequest, PreviewsRequest, TryOnRequest};
use crate::catalog::PreviewAsset;
use crate::error::PipelineError;
use crate::testing::TRIANGLE;

/// Counts calls, returns canned results, and can hold calls in flight until released.
pub struct FakeService {
    pub generate_calls: AtomicUsize,
    pub fit_calls: AtomicUsize,
    pub catalog_calls: AtomicUsize,
    pub last_try_on: Mutex<Option<TryOnRequest>>,
    generate_result: Mutex<Result<GeneratedModel, PipelineError>>,
    fit_result: Mutex<Result<FittedModel, PipelineError>>,
    catalog_result: Mutex<Result<Vec<PreviewAsset>, PipelineError>>,
    generate_gate: Option<Semaphore>,
    fit_gate: Option<Semaphore>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            generate_calls: AtomicUsize::new(0),
            fit_calls: AtomicUsize::new(0),
            catalog_calls: AtomicUsize::new(0),
            last_try_on: Mutex::new(None),
            generate_result: Mutex::new(Ok(GeneratedModel {
                geometry: TRIANGLE.to_string(),
            })),
            fit_result: Mutex::new(Ok(FittedModel {
                geometry: TRIANGLE.to_string(),
                material: None,
            })),
            catalog_result: Mutex::new(Ok(vec![
                preview("t-shirt"),
                preview("hoodie"),
                preview("pants"),
            ])),
            generate_gate: None,
            fit_gate: None,
        }
    }

    /// Generation calls wait for [`FakeService::release_generation`]
    pub fn hold_generation(mut self) -> Self {
        self.generate_gate = Some(Semaphore::new(0));
        self
    }

    /// Fitting calls wait for [`FakeService::release_fit`]
    pub fn hold_fit(mut self) -> Self {
        self.fit_gate = Some(Semaphore::new(0));
        self
    }

    pub fn with_generate_result(self, result: Result<GeneratedModel, PipelineError>) -> Self {
        *self.generate_result.lock().unwrap() = result;
        self
    }

    pub fn with_fit_result(self, result: Result<FittedModel, PipelineError>) -> Self {
        *self.fit_result.lock().unwrap() = result;
        self
    }

    pub fn with_catalog_result(self, result: Result<Vec<PreviewAsset>, PipelineError>) -> Self {
        *self.catalog_result.lock().unwrap() = result;
        self
    }

    pub fn set_fit_result(&self, result: Result<FittedModel, PipelineError>) {
        *self.fit_result.lock().unwrap() = result;
    }

    pub fn release_generation(&self) {
        if let Some(gate) = &self.generate_gate {
            gate.add_permits(1);
        }
    }

    pub fn release_fit(&self) {
        if let Some(gate) = &self.fit_gate {
            gate.add_permits(1);
        }
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

async fn pass(gate: &Option<Semaphore>) {
    if let Some(gate) = gate {
        gate.acquire().await.unwrap().forget();
    }
}

pub fn preview(garment: &str) -> PreviewAsset {
    PreviewAsset {
        garment: garment.to_string(),
        url: format!("http://minio.localhost/garments/previews/{garment}/male.png"),
        image: vec![0x89, b'P', b'N', b'G'],
        format: None,
    }
}

#[async_trait]
impl GenerationService for FakeService {
    async fn generate_avatar(
        &self,
        _request: GenerateRequest,
    ) -> Result<GeneratedModel, PipelineError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        pass(&self.generate_gate).await;
        self.generate_result.lock().unwrap().clone()
    }

    async fn fit_garment(&self, request: TryOnRequest) -> Result<FittedModel, PipelineError> {
        self.fit_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_try_on.lock().unwrap() = Some(request);
        pass(&self.fit_gate).await;
        self.fit_result.lock().unwrap().clone()
    }

    async fn fetch_catalog(
        &self,
        _request: PreviewsRequest,
    ) -> Result<Vec<PreviewAsset>, PipelineError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog_result.lock().unwrap().clone()
    }
}
