//! Drives the capture → generate → try-on workflow.
//!
//! Service calls run on spawned tasks and report back as [`PipelineEvent`]s.
//! Every submission takes a fresh token and records it in the stage's pending
//! flag; an event is applied only while that flag still carries its token, so
//! responses that outlive a reset or a newer submission are dropped.

use std::io;
use std::sync::Arc;

use fr_core::{Gender, NormalizedScene};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::artifacts::{ArtifactStore, AvatarProfile, GarmentSelection, SourceImage};
use crate::backend::GenerationService;
use crate::backend::schemas::{GenerateRequest, PreviewsRequest, TryOnRequest};
use crate::bundle::DownloadBundle;
use crate::catalog::CatalogLoader;
use crate::error::{PipelineError, ValidationError};
use crate::events::PipelineEvent;
use crate::stage::{PipelineStage, Stage, StageStatus, Step};

pub struct Orchestrator {
    session: Uuid,
    service: Arc<dyn GenerationService>,
    store: ArtifactStore,
    catalog: CatalogLoader,
    step: Step,
    next_token: u64,
    max_image_bytes: usize,
    events_tx: UnboundedSender<PipelineEvent>,
    events_rx: UnboundedReceiver<PipelineEvent>,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn GenerationService>, max_image_bytes: usize) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = Uuid::new_v4();
        info!(%session, "pipeline session started");

        Self {
            session,
            service,
            store: ArtifactStore::new(),
            catalog: CatalogLoader::new(),
            step: Step::default(),
            next_token: 0,
            max_image_bytes,
            events_tx,
            events_rx,
        }
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Current stage, derived from artifacts and pending flags
    pub fn stage(&self) -> PipelineStage {
        let state = self.store.state();
        if state.generation.is_pending() {
            PipelineStage::Generating
        } else if self.store.avatar().is_none() {
            PipelineStage::Capturing
        } else if state.tryon.is_pending() {
            PipelineStage::Fitting
        } else if self.store.fitted().is_some() {
            PipelineStage::FittedReady
        } else {
            PipelineStage::GeneratedReady
        }
    }

    pub fn error(&self, stage: Stage) -> Option<&PipelineError> {
        self.store.status(stage).error()
    }

    /// User-facing text for a failed stage
    pub fn error_message(&self, stage: Stage) -> Option<String> {
        self.error(stage).map(|e| e.user_message(stage))
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// The fit when there is one, else the avatar. Nothing while a request is in flight.
    pub fn display_scene(&self) -> Option<&NormalizedScene> {
        if self.store.is_busy() {
            return None;
        }
        self.store.fitted_scene().or_else(|| self.store.avatar_scene())
    }

    fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn require_capturing(&self, action: &'static str) -> Result<(), PipelineError> {
        let stage = self.stage();
        if stage != PipelineStage::Capturing {
            return Err(PipelineError::InvalidTransition { stage, action });
        }
        Ok(())
    }

    pub fn capture_image(
        &mut self,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<(), PipelineError> {
        self.require_capturing("capture an image")?;
        let image = SourceImage::new(bytes, content_type, self.max_image_bytes)?;

        info!(
            session = %self.session,
            bytes = image.len(),
            content_type = image.content_type(),
            "image captured"
        );
        self.store.set_image(Some(image));
        self.store.set_status(Stage::Generation, StageStatus::Idle);
        Ok(())
    }

    /// Drop the photo along with the avatar and fit made from it. The profile stays.
    pub fn discard_image(&mut self) -> Result<(), PipelineError> {
        if self.store.is_busy() {
            return Err(PipelineError::InvalidTransition {
                stage: self.stage(),
                action: "discard the image",
            });
        }

        info!(session = %self.session, "image discarded");
        self.store.set_image(None);
        self.store.clear_avatar();
        self.store.set_status(Stage::Generation, StageStatus::Idle);
        self.store.set_status(Stage::TryOn, StageStatus::Idle);
        self.step = Step::Generate;
        Ok(())
    }

    /// Editable only before an avatar exists. A gender change refreshes the catalog.
    pub fn set_profile(&mut self, profile: AvatarProfile) -> Result<(), PipelineError> {
        self.require_capturing("edit the profile")?;
        profile.validate()?;

        self.store.set_profile(Some(profile));
        let token = self.issue_token();
        if let Some(token) = self.catalog.request(profile.gender, token, &mut self.store) {
            self.spawn_catalog(profile.gender, token);
        }
        Ok(())
    }

    pub fn retry_catalog(&mut self) -> Result<u64, PipelineError> {
        if self.store.status(Stage::Catalog).is_pending() {
            return Err(PipelineError::StagePending(Stage::Catalog));
        }
        let token = self.issue_token();
        let (gender, token) = self
            .catalog
            .retry(token, &mut self.store)
            .ok_or(PipelineError::MissingPrerequisite("a gender with garments"))?;
        self.spawn_catalog(gender, token);
        Ok(token)
    }

    fn spawn_catalog(&self, gender: Gender, token: u64) {
        let request = match PreviewsRequest::new(gender) {
            Ok(request) => request,
            Err(e) => {
                self.emit(PipelineEvent::CatalogFetched {
                    token,
                    result: Err(e.into()),
                });
                return;
            }
        };

        let service = self.service.clone();
        let tx = self.events_tx.clone();
        let span = info_span!("catalog", session = %self.session, token);
        tokio::spawn(
            async move {
                let result = service.fetch_catalog(request).await;
                if tx.send(PipelineEvent::CatalogFetched { token, result }).is_err() {
                    debug!("orchestrator gone, catalog result dropped");
                }
            }
            .instrument(span),
        );
    }

    /// Send the photo and profile off for avatar generation.
    ///
    /// Rejected while a generation is already in flight, and while a try-on
    /// is in flight since that would orphan its avatar. Any current avatar
    /// and fit are cleared before the request starts.
    pub fn submit_generation(&mut self) -> Result<u64, PipelineError> {
        if self.store.status(Stage::Generation).is_pending() {
            return Err(PipelineError::StagePending(Stage::Generation));
        }
        if self.store.status(Stage::TryOn).is_pending() {
            return Err(PipelineError::InvalidTransition {
                stage: self.stage(),
                action: "generate an avatar",
            });
        }
        let request = GenerateRequest::new(self.store.image(), self.store.profile())?;

        let token = self.issue_token();
        info!(
            session = %self.session,
            token,
            gender = %request.gender,
            height = request.height_cm,
            "submitting avatar generation"
        );
        self.store.clear_avatar();
        self.store.set_status(Stage::Generation, StageStatus::Pending { token });
        self.store.set_status(Stage::TryOn, StageStatus::Idle);

        let service = self.service.clone();
        let tx = self.events_tx.clone();
        let span = info_span!("generate", session = %self.session, token);
        tokio::spawn(
            async move {
                let result = service.generate_avatar(request).await;
                if tx.send(PipelineEvent::AvatarGenerated { token, result }).is_err() {
                    debug!("orchestrator gone, avatar dropped");
                }
            }
            .instrument(span),
        );
        Ok(token)
    }

    /// Replace the garment selection. Locked while a try-on is in flight.
    pub fn update_selection(
        &mut self,
        edit: impl FnOnce(&mut GarmentSelection),
    ) -> Result<(), PipelineError> {
        if self.store.status(Stage::TryOn).is_pending() {
            return Err(PipelineError::StagePending(Stage::TryOn));
        }
        let mut selection = self.store.selection().clone();
        edit(&mut selection);
        self.store.set_selection(selection);
        Ok(())
    }

    pub fn select_garment(&mut self, garment: &str) -> Result<(), PipelineError> {
        self.update_selection(|selection| selection.garment = Some(garment.to_string()))
    }

    pub fn submit_try_on(&mut self) -> Result<u64, PipelineError> {
        if self.store.status(Stage::TryOn).is_pending() {
            return Err(PipelineError::StagePending(Stage::TryOn));
        }
        if self.store.status(Stage::Generation).is_pending() {
            return Err(PipelineError::InvalidTransition {
                stage: self.stage(),
                action: "fit a garment",
            });
        }
        if !self.store.selection().is_complete() {
            return Err(ValidationError::MissingGarment.into());
        }
        let avatar = self
            .store
            .avatar()
            .ok_or(PipelineError::MissingPrerequisite("a generated avatar"))?;
        let profile = self
            .store
            .profile()
            .ok_or(PipelineError::MissingPrerequisite("an avatar profile"))?;
        let request = TryOnRequest::new(
            avatar,
            self.store.selection(),
            profile.gender,
            self.store.catalog(),
        )?;

        let token = self.issue_token();
        info!(
            session = %self.session,
            token,
            garment = %request.garment,
            size = %request.size,
            quality = request.quality.get(),
            color = %request.color,
            "submitting try-on"
        );
        self.store.clear_fitted();
        self.store.set_status(Stage::TryOn, StageStatus::Pending { token });

        let service = self.service.clone();
        let tx = self.events_tx.clone();
        let span = info_span!("try_on", session = %self.session, token);
        tokio::spawn(
            async move {
                let result = service.fit_garment(request).await;
                if tx.send(PipelineEvent::GarmentFitted { token, result }).is_err() {
                    debug!("orchestrator gone, fit dropped");
                }
            }
            .instrument(span),
        );
        Ok(token)
    }

    /// Back to an empty pipeline. Requests still in flight are not cancelled;
    /// their responses no longer match a pending token and get dropped.
    pub fn reset(&mut self) {
        info!(session = %self.session, stage = %self.stage(), "resetting pipeline");
        self.store.reset();
        self.catalog.invalidate();
        self.step = Step::Generate;
    }

    pub fn can_go_next(&self) -> bool {
        !self.store.is_busy() && self.step == Step::Generate && self.store.avatar().is_some()
    }

    pub fn can_go_back(&self) -> bool {
        !self.store.is_busy() && self.step == Step::TryOn
    }

    pub fn next_step(&mut self) -> Result<Step, PipelineError> {
        if self.store.is_busy() {
            return Err(PipelineError::NavigationLocked);
        }
        if self.store.avatar().is_none() {
            return Err(PipelineError::MissingPrerequisite("a generated avatar"));
        }
        self.step = Step::TryOn;
        Ok(self.step)
    }

    pub fn previous_step(&mut self) -> Result<Step, PipelineError> {
        if self.store.is_busy() {
            return Err(PipelineError::NavigationLocked);
        }
        self.step = Step::Generate;
        Ok(self.step)
    }

    fn emit(&self, event: PipelineEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("event channel closed");
        }
    }

    /// Apply a finished call. Returns false when the event was stale and dropped.
    pub fn handle_event(&mut self, event: PipelineEvent) -> bool {
        let token = event.token();
        let stage = event.stage();

        match event {
            PipelineEvent::CatalogFetched { token, result } => {
                self.catalog.apply(token, result, &mut self.store)
            }
            PipelineEvent::AvatarGenerated { result, .. } => {
                if !self.accepts(stage, token) {
                    return false;
                }
                let result = result
                    .and_then(|model| self.store.set_avatar(model).map_err(PipelineError::from));
                self.finish(stage, token, result);
                true
            }
            PipelineEvent::GarmentFitted { result, .. } => {
                if !self.accepts(stage, token) {
                    return false;
                }
                let result = result
                    .and_then(|model| self.store.set_fitted(model).map_err(PipelineError::from));
                self.finish(stage, token, result);
                true
            }
        }
    }

    fn accepts(&self, stage: Stage, token: u64) -> bool {
        let current = self.store.status(stage);
        if current.is_pending_for(token) {
            return true;
        }
        debug!(session = %self.session, %stage, token, ?current, "dropping stale response");
        false
    }

    fn finish(&mut self, stage: Stage, token: u64, result: Result<(), PipelineError>) {
        match result {
            Ok(()) => {
                info!(session = %self.session, %stage, token, "stage complete");
                self.store.set_status(stage, StageStatus::Idle);
            }
            Err(e) => {
                warn!(
                    session = %self.session,
                    %stage,
                    token,
                    error = %e,
                    retryable = e.is_retryable(),
                    "stage failed"
                );
                self.store.set_status(stage, StageStatus::Failed(e));
            }
        }
    }

    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        self.events_rx.recv().await
    }

    /// Wait for one event and apply it
    pub async fn process_next(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => self.handle_event(event),
            None => false,
        }
    }

    /// Apply events until no stage is pending
    pub async fn settle(&mut self) {
        loop {
            let state = self.store.state();
            if !(state.generation.is_pending()
                || state.tryon.is_pending()
                || state.catalog.is_pending())
            {
                return;
            }
            if self.next_event().await.map(|event| self.handle_event(event)).is_none() {
                return;
            }
        }
    }

    /// What the user can save right now: the fit if present, else the avatar
    pub fn download_bundle(&self) -> io::Result<Option<DownloadBundle>> {
        if let Some(fitted) = self.store.fitted() {
            return DownloadBundle::for_fit(fitted).map(Some);
        }
        Ok(self.store.avatar().map(DownloadBundle::for_avatar))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::artifacts::{DEFAULT_MAX_IMAGE_BYTES, FittedModel, GeneratedModel, PipelineState};
    use crate::backend::fake::FakeService;
    use crate::testing::{FITTED_MTL, FITTED_OBJ, jpeg};

    fn orchestrator(service: &Arc<FakeService>) -> Orchestrator {
        Orchestrator::new(service.clone(), DEFAULT_MAX_IMAGE_BYTES)
    }

    fn prepare(orchestrator: &mut Orchestrator) {
        orchestrator
            .capture_image(jpeg(2 * 1024 * 1024), Some("image/jpeg"))
            .unwrap();
        orchestrator
            .set_profile(AvatarProfile::new(Gender::Female, 165.0, None).unwrap())
            .unwrap();
    }

    async fn generated(service: &Arc<FakeService>) -> Orchestrator {
        let mut orchestrator = orchestrator(service);
        prepare(&mut orchestrator);
        orchestrator.submit_generation().unwrap();
        orchestrator.settle().await;
        assert_eq!(orchestrator.stage(), PipelineStage::GeneratedReady);
        orchestrator
    }

    #[tokio::test]
    async fn test_photo_to_avatar() {
        let service = FakeService::new().into_arc();
        let mut orchestrator = orchestrator(&service);
        assert_eq!(orchestrator.stage(), PipelineStage::Capturing);

        prepare(&mut orchestrator);
        orchestrator.submit_generation().unwrap();
        assert_eq!(orchestrator.stage(), PipelineStage::Generating);
        assert!(orchestrator.display_scene().is_none());

        orchestrator.settle().await;
        assert_eq!(orchestrator.stage(), PipelineStage::GeneratedReady);
        assert!(orchestrator.error(Stage::Generation).is_none());

        let scene = orchestrator.display_scene().unwrap();
        assert!(scene.bounds.center().length() < 1e-6);
        assert!(orchestrator.can_go_next());
        assert_eq!(service.generate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.store().catalog().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_generation_rejected() {
        let service = FakeService::new().hold_generation().into_arc();
        let mut orchestrator = orchestrator(&service);
        prepare(&mut orchestrator);

        orchestrator.submit_generation().unwrap();
        assert_eq!(
            orchestrator.submit_generation(),
            Err(PipelineError::StagePending(Stage::Generation))
        );

        service.release_generation();
        orchestrator.settle().await;
        assert_eq!(service.generate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(orchestrator.stage(), PipelineStage::GeneratedReady);
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_response() {
        let service = FakeService::new().hold_generation().into_arc();
        let mut orchestrator = orchestrator(&service);
        prepare(&mut orchestrator);
        orchestrator.settle().await;

        orchestrator.submit_generation().unwrap();
        orchestrator.reset();
        assert_eq!(orchestrator.stage(), PipelineStage::Capturing);

        service.release_generation();
        assert!(!orchestrator.process_next().await);

        let store = orchestrator.store();
        assert!(store.image().is_none());
        assert!(store.profile().is_none());
        assert!(store.avatar().is_none());
        assert!(store.catalog().is_empty());
        assert_eq!(store.state(), &PipelineState::default());
    }

    #[tokio::test]
    async fn test_generation_needs_inputs() {
        let service = FakeService::new().into_arc();
        let mut orchestrator = orchestrator(&service);

        assert_eq!(
            orchestrator.submit_generation(),
            Err(PipelineError::Validation(ValidationError::MissingImage))
        );
        assert_eq!(
            orchestrator.capture_image(jpeg(DEFAULT_MAX_IMAGE_BYTES + 1), None),
            Err(PipelineError::Validation(ValidationError::ImageTooLarge {
                size: DEFAULT_MAX_IMAGE_BYTES + 1,
                max: DEFAULT_MAX_IMAGE_BYTES,
            }))
        );
        orchestrator.capture_image(jpeg(128), None).unwrap();
        assert_eq!(
            orchestrator.submit_generation(),
            Err(PipelineError::Validation(ValidationError::MissingProfile))
        );
        assert_eq!(service.generate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_avatar() {
        let service = FakeService::new()
            .with_generate_result(Ok(GeneratedModel {
                geometry: "<html>upstream timeout</html>".into(),
            }))
            .into_arc();
        let mut orchestrator = orchestrator(&service);
        prepare(&mut orchestrator);
        orchestrator.submit_generation().unwrap();
        orchestrator.settle().await;

        assert_eq!(orchestrator.stage(), PipelineStage::Capturing);
        assert!(orchestrator.store().avatar().is_none());
        let error = orchestrator.error(Stage::Generation).unwrap();
        assert!(matches!(error, PipelineError::MalformedAsset(_)));
        assert!(!error.is_retryable());
        assert_eq!(
            orchestrator.error_message(Stage::Generation).as_deref(),
            Some("Error generating 3D model. Please try again.")
        );
    }

    #[tokio::test]
    async fn test_try_on_failure_then_retry() {
        let service = FakeService::new()
            .with_fit_result(Err(PipelineError::Service {
                status: 500,
                body: "simulation crashed".into(),
            }))
            .into_arc();
        let mut orchestrator = generated(&service).await;
        orchestrator.next_step().unwrap();
        orchestrator.select_garment("hoodie").unwrap();

        orchestrator.submit_try_on().unwrap();
        orchestrator.settle().await;

        assert_eq!(orchestrator.stage(), PipelineStage::GeneratedReady);
        assert!(orchestrator.store().fitted().is_none());
        assert!(matches!(
            orchestrator.error(Stage::TryOn),
            Some(PipelineError::Service { status: 500, .. })
        ));
        assert_eq!(
            orchestrator.error_message(Stage::TryOn).as_deref(),
            Some("Error generating the virtual fit. Please try again.")
        );

        service.set_fit_result(Ok(FittedModel {
            geometry: FITTED_OBJ.into(),
            material: Some(FITTED_MTL.into()),
        }));
        orchestrator.submit_try_on().unwrap();
        orchestrator.settle().await;

        assert_eq!(orchestrator.stage(), PipelineStage::FittedReady);
        assert!(orchestrator.error(Stage::TryOn).is_none());
        assert!(orchestrator.display_scene().unwrap().has_materials());
        assert_eq!(service.fit_calls.load(Ordering::SeqCst), 2);

        let sent = service.last_try_on.lock().unwrap().clone().unwrap();
        assert_eq!(sent.garment, "hoodie");
        assert_eq!(sent.gender, Gender::Female);
        assert_eq!(sent.color, "#C2C2C2");

        let bundle = orchestrator.download_bundle().unwrap().unwrap();
        assert_eq!(bundle.file_name(), "fitted_model.zip");
    }

    #[tokio::test]
    async fn test_selection_locked_while_fitting() {
        let service = FakeService::new().hold_fit().into_arc();
        let mut orchestrator = generated(&service).await;
        orchestrator.select_garment("t-shirt").unwrap();
        orchestrator.submit_try_on().unwrap();

        assert_eq!(orchestrator.stage(), PipelineStage::Fitting);
        assert_eq!(
            orchestrator.update_selection(|s| s.size = fr_core::GarmentSize::XL),
            Err(PipelineError::StagePending(Stage::TryOn))
        );
        assert_eq!(orchestrator.submit_try_on(), Err(PipelineError::StagePending(Stage::TryOn)));
        assert!(matches!(
            orchestrator.submit_generation(),
            Err(PipelineError::InvalidTransition { .. })
        ));
        assert!(orchestrator.display_scene().is_none());

        service.release_fit();
        orchestrator.settle().await;
        assert_eq!(orchestrator.stage(), PipelineStage::FittedReady);
    }

    #[tokio::test]
    async fn test_new_avatar_clears_fit() {
        let service = FakeService::new().into_arc();
        let mut orchestrator = generated(&service).await;
        orchestrator.select_garment("pants").unwrap();
        orchestrator.submit_try_on().unwrap();
        orchestrator.settle().await;
        assert_eq!(orchestrator.stage(), PipelineStage::FittedReady);

        orchestrator.submit_generation().unwrap();
        assert!(orchestrator.store().fitted().is_none());
        orchestrator.settle().await;

        assert_eq!(orchestrator.stage(), PipelineStage::GeneratedReady);
        assert!(orchestrator.store().fitted().is_none());
        assert_eq!(
            orchestrator.download_bundle().unwrap().unwrap().file_name(),
            "base_model.obj"
        );
    }

    #[tokio::test]
    async fn test_navigation_gating() {
        let service = FakeService::new().hold_generation().into_arc();
        let mut orchestrator = orchestrator(&service);
        assert!(!orchestrator.can_go_next());
        assert_eq!(
            orchestrator.next_step(),
            Err(PipelineError::MissingPrerequisite("a generated avatar"))
        );

        prepare(&mut orchestrator);
        orchestrator.submit_generation().unwrap();
        assert_eq!(orchestrator.next_step(), Err(PipelineError::NavigationLocked));
        assert_eq!(orchestrator.previous_step(), Err(PipelineError::NavigationLocked));

        service.release_generation();
        orchestrator.settle().await;
        assert_eq!(orchestrator.next_step(), Ok(Step::TryOn));
        assert!(orchestrator.can_go_back());
        assert_eq!(orchestrator.previous_step(), Ok(Step::Generate));
    }

    #[tokio::test]
    async fn test_catalog_failure_leaves_no_items() {
        let service = FakeService::new()
            .with_catalog_result(Err(PipelineError::Service {
                status: 404,
                body: "NoSuchKey".into(),
            }))
            .into_arc();
        let mut orchestrator = generated(&service).await;

        assert!(orchestrator.store().catalog().is_empty());
        assert_eq!(
            orchestrator.error_message(Stage::Catalog).as_deref(),
            Some("Error fetching previews. Please try again.")
        );
        assert!(orchestrator.error(Stage::Generation).is_none());

        orchestrator.retry_catalog().unwrap();
        orchestrator.settle().await;
        assert_eq!(service.catalog_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_catalog_fetched_once_per_gender() {
        let service = FakeService::new().into_arc();
        let mut orchestrator = generated(&service).await;

        orchestrator.discard_image().unwrap();
        assert_eq!(orchestrator.stage(), PipelineStage::Capturing);
        assert!(orchestrator.store().profile().is_some());

        orchestrator
            .set_profile(AvatarProfile::new(Gender::Female, 170.0, None).unwrap())
            .unwrap();
        orchestrator.settle().await;
        assert_eq!(service.catalog_calls.load(Ordering::SeqCst), 1);

        orchestrator
            .set_profile(AvatarProfile::new(Gender::Male, 170.0, None).unwrap())
            .unwrap();
        orchestrator.settle().await;
        assert_eq!(service.catalog_calls.load(Ordering::SeqCst), 2);

        orchestrator
            .set_profile(AvatarProfile::new(Gender::Neutral, 170.0, None).unwrap())
            .unwrap();
        assert!(orchestrator.store().catalog().is_empty());
        assert_eq!(service.catalog_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_profile_locked_after_generation() {
        let service = FakeService::new().into_arc();
        let mut orchestrator = generated(&service).await;
        assert!(matches!(
            orchestrator.set_profile(AvatarProfile::new(Gender::Male, 180.0, None).unwrap()),
            Err(PipelineError::InvalidTransition {
                stage: PipelineStage::GeneratedReady,
                ..
            })
        ));
        assert!(orchestrator.capture_image(jpeg(64), None).is_err());
    }

    #[tokio::test]
    async fn test_try_on_needs_avatar() {
        let service = FakeService::new().into_arc();
        let mut orchestrator = orchestrator(&service);
        orchestrator.select_garment("hoodie").unwrap();

        assert_eq!(
            orchestrator.submit_try_on(),
            Err(PipelineError::MissingPrerequisite("a generated avatar"))
        );
        assert_eq!(service.fit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_try_on_needs_garment() {
        let service = FakeService::new().into_arc();
        let mut orchestrator = generated(&service).await;
        orchestrator.next_step().unwrap();

        assert_eq!(
            orchestrator.submit_try_on(),
            Err(PipelineError::Validation(ValidationError::MissingGarment))
        );
        orchestrator.update_selection(|s| s.garment = Some(String::new())).unwrap();
        assert_eq!(
            orchestrator.submit_try_on(),
            Err(PipelineError::Validation(ValidationError::MissingGarment))
        );
        assert_eq!(orchestrator.stage(), PipelineStage::GeneratedReady);
        assert_eq!(service.fit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_garment_rejected() {
        let service = FakeService::new().into_arc();
        let mut orchestrator = generated(&service).await;
        orchestrator.select_garment("scarf").unwrap();

        assert_eq!(
            orchestrator.submit_try_on(),
            Err(PipelineError::Validation(ValidationError::UnknownGarment("scarf".into())))
        );
        assert!(orchestrator.error(Stage::TryOn).is_none());
    }
}
