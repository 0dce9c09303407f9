//! Garment preview catalog, fetched once per gender.

use fr_core::{GarmentKind, GarmentSlot, Gender};
use image::ImageFormat;
use tracing::{debug, info, warn};

use crate::artifacts::ArtifactStore;
use crate::error::PipelineError;
use crate::stage::{Stage, StageStatus};

/// One downloaded garment preview
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewAsset {
    /// Garment id, e.g. `t-shirt`
    pub garment: String,
    /// Presigned URL the image came from
    pub url: String,
    pub image: Vec<u8>,
    pub format: Option<ImageFormat>,
}

impl PreviewAsset {
    pub fn slot(&self) -> GarmentSlot {
        GarmentKind::slot_for(&self.garment)
    }
}

/// Complete list of previews; never partially populated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    items: Vec<PreviewAsset>,
}

impl Catalog {
    pub fn new(items: Vec<PreviewAsset>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[PreviewAsset] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, garment: &str) -> bool {
        self.items.iter().any(|item| item.garment == garment)
    }

    pub fn in_slot(&self, slot: GarmentSlot) -> Vec<&PreviewAsset> {
        self.items.iter().filter(|item| item.slot() == slot).collect()
    }

    /// Tops and bottoms always, plus `Other` when something unrecognised showed up
    pub fn categories(&self) -> Vec<(GarmentSlot, Vec<&PreviewAsset>)> {
        GarmentSlot::all()
            .into_iter()
            .map(|slot| (slot, self.in_slot(slot)))
            .filter(|(slot, items)| *slot != GarmentSlot::Other || !items.is_empty())
            .collect()
    }
}

/// Decides when the catalog is fetched and applies the results.
///
/// A fetch happens exactly when the chosen gender differs from the one the
/// current catalog was requested for. Results carry the token of the request
/// that produced them; anything but the latest token is dropped.
#[derive(Debug, Default)]
pub struct CatalogLoader {
    requested_for: Option<Gender>,
    token: u64,
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requested_for(&self) -> Option<Gender> {
        self.requested_for
    }

    /// Pure trigger condition
    pub fn should_fetch(&self, gender: Gender) -> bool {
        gender.has_garments() && self.requested_for != Some(gender)
    }

    /// Start a fetch if the gender changed. Returns the token to tag the request with.
    pub fn request(
        &mut self,
        gender: Gender,
        token: u64,
        store: &mut ArtifactStore,
    ) -> Option<u64> {
        if !self.should_fetch(gender) {
            if !gender.has_garments() {
                // Nothing to offer; make sure a previous gender's catalog is not shown
                self.invalidate();
                store.set_catalog(Catalog::default());
                store.set_status(Stage::Catalog, StageStatus::Idle);
            }
            return None;
        }
        Some(self.begin(gender, token, store))
    }

    /// Refetch for the current gender after a failure
    pub fn retry(&mut self, token: u64, store: &mut ArtifactStore) -> Option<(Gender, u64)> {
        let gender = self.requested_for?;
        if store.status(Stage::Catalog).is_pending() {
            return None;
        }
        Some((gender, self.begin(gender, token, store)))
    }

    fn begin(&mut self, gender: Gender, token: u64, store: &mut ArtifactStore) -> u64 {
        info!(%gender, token, "fetching garment catalog");
        self.requested_for = Some(gender);
        self.token = token;
        store.set_catalog(Catalog::default());
        store.set_status(Stage::Catalog, StageStatus::Pending { token });
        token
    }

    /// Apply a finished fetch. Returns false when the result was stale.
    pub fn apply(
        &mut self,
        token: u64,
        result: Result<Vec<PreviewAsset>, PipelineError>,
        store: &mut ArtifactStore,
    ) -> bool {
        if token != self.token || !store.status(Stage::Catalog).is_pending_for(token) {
            debug!(token, current = self.token, "dropping stale catalog result");
            return false;
        }

        match result {
            Ok(items) => {
                info!(count = items.len(), "catalog ready");
                store.set_catalog(Catalog::new(items));
                store.set_status(Stage::Catalog, StageStatus::Idle);
            }
            Err(e) => {
                warn!(error = %e, "catalog fetch failed");
                store.set_catalog(Catalog::default());
                store.set_status(Stage::Catalog, StageStatus::Failed(e));
            }
        }
        true
    }

    /// Forget the current gender so the next request fetches again
    pub fn invalidate(&mut self) {
        self.requested_for = None;
        self.token = 0;
    }
}

/// Garment id from a presigned URL: `.../previews/<garment>/<gender>.png?...`
pub fn garment_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 {
        return None;
    }
    Some(segments[segments.len() - 2].to_string())
}
