//! Last-request-wins exporter

use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Duration;

use super::capture::{CaptureBackend, SoftwareCapture};
use super::preprocess::{preprocess, PreprocessReport};
use super::providers::{DefaultProviders, PreprocessProviders};
use super::{ExportOptions, ExportPhase, ExportProgress};
use crate::config::model::CondensedCardConfig;
use crate::rendering::raster::RasterImage;
use crate::rendering::tree::{LayoutTree, LiveOverrides};
use crate::rendering::view::export_view;
use crate::sections::{ProfileData, SectionRegistry};
use crate::{Error, Result};

/// A committed export result
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// Request token that produced this artifact
    pub request: u64,
    pub image: RasterImage,
    pub report: PreprocessReport,
}

impl ExportArtifact {
    pub fn data_url(&self) -> String {
        self.image.to_data_url()
    }
}

type ProgressHandler = Arc<dyn Fn(ExportProgress) + Send + Sync>;

/// Runs exports and owns the single output slot.
///
/// Every call to [`CardExporter::export`] takes a new request token. When a
/// request finishes it commits to the output slot only if its token is still
/// the latest; otherwise it returns [`Error::Superseded`] and leaves the slot
/// alone. Clones share the token counter and the slot.
#[derive(Clone)]
pub struct CardExporter {
    backend: Arc<dyn CaptureBackend>,
    providers: Arc<dyn PreprocessProviders>,
    latest: Arc<AtomicU64>,
    output: Arc<Mutex<Option<Arc<ExportArtifact>>>>,
    progress: Option<ProgressHandler>,
}

impl Default for CardExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CardExporter {
    /// Software capture with the default providers.
    pub fn new() -> Self {
        Self::with_backend(Arc::new(SoftwareCapture), Arc::new(DefaultProviders::default()))
    }

    pub fn with_backend(backend: Arc<dyn CaptureBackend>, providers: Arc<dyn PreprocessProviders>) -> Self {
        Self {
            backend,
            providers,
            latest: Arc::new(AtomicU64::new(0)),
            output: Arc::new(Mutex::new(None)),
            progress: None,
        }
    }

    pub fn on_progress<F>(mut self, handler: F) -> Self
    where
        F: Fn(ExportProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(handler));
        self
    }

    /// Invalidate every in-flight request without starting a new one.
    pub fn cancel_pending(&self) {
        let token = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("export requests before {} cancelled", token);
    }

    /// The most recently committed artifact.
    pub fn latest_artifact(&self) -> Option<Arc<ExportArtifact>> {
        self.output.lock().ok().and_then(|slot| slot.clone())
    }

    fn report(&self, request: u64, phase: ExportPhase, fraction: f64) {
        if let Some(handler) = &self.progress {
            handler(ExportProgress { request, phase, fraction });
        }
    }

    fn ensure_current(&self, request: u64) -> Result<()> {
        if self.latest.load(Ordering::SeqCst) == request {
            Ok(())
        } else {
            debug!("export request {} superseded", request);
            Err(Error::Superseded(request))
        }
    }

    /// Export an already rendered tree.
    pub async fn export(&self, tree: &LayoutTree, options: &ExportOptions) -> Result<Arc<ExportArtifact>> {
        let request = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        self.report(request, ExportPhase::Preprocessing, 0.0);
        let (prepared, report) = preprocess(tree, options, self.providers.as_ref()).await;
        self.ensure_current(request)?;

        self.report(request, ExportPhase::Capture, 0.5);
        let timeout = Duration::from_millis(options.capture_timeout_ms);
        let captured = tokio::time::timeout(timeout, self.backend.capture(&prepared, options.pixel_ratio)).await;
        // A stale request reports supersession, not whatever its capture did.
        self.ensure_current(request)?;
        let image = match captured {
            Ok(Ok(image)) => image,
            Ok(Err(Error::ExportFailed(reason))) => return Err(self.failed(request, reason)),
            Ok(Err(other)) => return Err(self.failed(request, other.to_string())),
            Err(_) => {
                return Err(self.failed(request, format!("capture timed out after {} ms", options.capture_timeout_ms)))
            }
        };

        let artifact = Arc::new(ExportArtifact { request, image, report });
        {
            let mut slot = self.output.lock().map_err(|_| Error::Other("export output slot poisoned".to_string()))?;
            // Checked under the lock so an older request can never overwrite a newer commit.
            self.ensure_current(request)?;
            *slot = Some(Arc::clone(&artifact));
        }
        self.report(request, ExportPhase::Completion, 1.0);
        info!(
            "export {} complete: {}x{} ({} bytes, {} degraded)",
            request,
            artifact.image.width,
            artifact.image.height,
            artifact.image.png_data.len(),
            artifact.report.degraded.len()
        );
        Ok(artifact)
    }

    fn failed(&self, request: u64, reason: String) -> Error {
        warn!("export {} failed: {}", request, reason);
        Error::ExportFailed(reason)
    }

    /// Render `config` through the export view and export it.
    pub async fn export_card(
        &self,
        config: &CondensedCardConfig,
        profile: &ProfileData,
        registry: &SectionRegistry,
        overrides: &LiveOverrides,
        options: &ExportOptions,
    ) -> Result<Arc<ExportArtifact>> {
        let tree = export_view(config, profile, registry, overrides);
        self.export(&tree, options).await
    }
}
