use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cardlayout::export::{
    capture_blocking, CaptureBackend, DefaultProviders, NoopProviders, SoftwareCapture,
};
use cardlayout::rendering::raster::{decode_png, RasterImage};
use cardlayout::sections::Location;
use cardlayout::{
    export_view, CardExporter, CondensedCardSectionInstance, DimensionValue, Error, ExportOptions, ExportPhase,
    LayoutTree, LiveOverrides, PositionConfig, ProfileData, Result, SectionRegistry, SectionType,
};
use futures::future::{BoxFuture, FutureExt};
use tokio::sync::Notify;

fn card() -> LayoutTree {
    let mut cfg = cardlayout::CondensedCardConfig::default();
    cfg.dimensions = cardlayout::CondensedCardDimensions::custom(120, 160);
    cfg.sections.push(CondensedCardSectionInstance::new("h", SectionType::Header, PositionConfig::band(0.0, 30.0)));
    cfg.sections.push(CondensedCardSectionInstance::new("m", SectionType::Map, PositionConfig::band(30.0, 40.0)));
    cfg.sections.push(CondensedCardSectionInstance::new("v", SectionType::Video, PositionConfig::band(70.0, 30.0)));
    let profile = ProfileData {
        name: "Dana".into(),
        locations: vec![Location { label: "Office".into(), address: "1 Main St".into(), lat: 40.7, lng: -74.0 }],
        ..Default::default()
    };
    export_view(&cfg, &profile, &SectionRegistry::standard(), &LiveOverrides::new())
}

/// Holds its first capture until released, then captures normally.
struct GatedCapture {
    gate: Arc<Notify>,
    calls: AtomicUsize,
}

impl CaptureBackend for GatedCapture {
    fn capture<'a>(&'a self, tree: &'a LayoutTree, pixel_ratio: f64) -> BoxFuture<'a, Result<RasterImage>> {
        let first = self.calls.fetch_add(1, Ordering::SeqCst) == 0;
        async move {
            if first {
                self.gate.notified().await;
            }
            capture_blocking(tree, pixel_ratio)
        }
        .boxed()
    }
}

struct FailingCapture;

impl CaptureBackend for FailingCapture {
    fn capture<'a>(&'a self, _tree: &'a LayoutTree, _pixel_ratio: f64) -> BoxFuture<'a, Result<RasterImage>> {
        async { Err(Error::Other("backend crashed".into())) }.boxed()
    }
}

struct HangingCapture;

impl CaptureBackend for HangingCapture {
    fn capture<'a>(&'a self, _tree: &'a LayoutTree, _pixel_ratio: f64) -> BoxFuture<'a, Result<RasterImage>> {
        futures::future::pending().boxed()
    }
}

#[tokio::test]
async fn second_request_wins_and_first_is_discarded() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(GatedCapture { gate: Arc::clone(&gate), calls: AtomicUsize::new(0) });
    let exporter = CardExporter::with_backend(backend, Arc::new(DefaultProviders::default()));
    let tree = card();
    let options = ExportOptions::default();

    let first = exporter.export(&tree, &options);
    let second = async {
        let result = exporter.export(&tree, &options).await;
        gate.notify_one();
        result
    };
    let (first, second) = tokio::join!(first, second);

    assert!(matches!(first, Err(Error::Superseded(1))));
    let second = second.expect("second export");
    assert_eq!(second.request, 2);
    let committed = exporter.latest_artifact().expect("artifact committed");
    assert_eq!(committed.request, 2);
    assert_eq!(committed.image, second.image);
}

#[tokio::test]
async fn cancel_pending_discards_in_flight_request() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(GatedCapture { gate: Arc::clone(&gate), calls: AtomicUsize::new(0) });
    let exporter = CardExporter::with_backend(backend, Arc::new(DefaultProviders::default()));
    let tree = card();

    let options = ExportOptions::default();
    let pending = exporter.export(&tree, &options);
    let cancel = async {
        tokio::task::yield_now().await;
        exporter.cancel_pending();
        gate.notify_one();
    };
    let (result, ()) = tokio::join!(pending, cancel);
    assert!(matches!(result, Err(Error::Superseded(_))));
    assert!(exporter.latest_artifact().is_none());
}

#[tokio::test]
async fn dynamic_content_is_frozen_before_capture() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let exporter = CardExporter::new().on_progress(move |p| sink.lock().unwrap().push((p.phase, p.fraction)));

    let artifact = exporter.export(&card(), &ExportOptions { pixel_ratio: 2.0, ..Default::default() }).await.unwrap();
    assert_eq!((artifact.image.width, artifact.image.height), (240, 320));
    assert_eq!(artifact.report.replaced, 1);
    // the video has no poster, so it degrades instead of failing the export
    assert_eq!(artifact.report.degraded.len(), 1);
    assert_eq!(artifact.report.degraded[0].section_id, "v");

    let bitmap = decode_png(&artifact.image.png_data).unwrap();
    assert_eq!((bitmap.width, bitmap.height), (240, 320));
    assert!(artifact.data_url().starts_with("data:image/png;base64,"));

    let events = events.lock().unwrap();
    let phases: Vec<ExportPhase> = events.iter().map(|e| e.0).collect();
    assert_eq!(phases, vec![ExportPhase::Preprocessing, ExportPhase::Capture, ExportPhase::Completion]);
    assert!(events.windows(2).all(|w| w[0].1 <= w[1].1));
}

#[tokio::test]
async fn every_provider_failing_still_exports() {
    let exporter = CardExporter::with_backend(Arc::new(SoftwareCapture), Arc::new(NoopProviders));
    let artifact = exporter.export(&card(), &ExportOptions::default()).await.unwrap();
    assert_eq!(artifact.report.replaced, 0);
    assert_eq!(artifact.report.degraded.len(), 2);
}

#[tokio::test]
async fn capture_failure_yields_no_artifact() {
    let exporter = CardExporter::with_backend(Arc::new(FailingCapture), Arc::new(DefaultProviders::default()));
    let err = exporter.export(&card(), &ExportOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::ExportFailed(ref reason) if reason.contains("backend crashed")));
    assert!(exporter.latest_artifact().is_none());
}

#[tokio::test]
async fn capture_timeout_is_an_export_failure() {
    let exporter = CardExporter::with_backend(Arc::new(HangingCapture), Arc::new(DefaultProviders::default()));
    let options = ExportOptions { capture_timeout_ms: 20, ..Default::default() };
    let err = exporter.export(&card(), &options).await.unwrap_err();
    assert!(matches!(err, Error::ExportFailed(ref reason) if reason.contains("timed out")));
}

#[tokio::test]
async fn identical_trees_export_identical_bytes() {
    let exporter = CardExporter::new();
    let a = exporter.export(&card(), &ExportOptions::default()).await.unwrap();
    let b = exporter.export(&card(), &ExportOptions::default()).await.unwrap();
    assert_eq!(a.image.digest, b.image.digest);
}

#[tokio::test]
async fn oversized_bleed_map_degrades_instead_of_aborting() {
    let mut cfg = cardlayout::CondensedCardConfig::default();
    cfg.dimensions = cardlayout::CondensedCardDimensions::custom(200, 200);
    let bleed = PositionConfig {
        x: DimensionValue::pixels(0.0),
        y: DimensionValue::pixels(0.0),
        width: DimensionValue::pixels(5e9),
        height: DimensionValue::pixels(5e9),
        ..PositionConfig::default()
    };
    cfg.sections.push(CondensedCardSectionInstance::new("m", SectionType::Map, bleed));
    let profile = ProfileData {
        locations: vec![Location { label: "Office".into(), address: "1 Main St".into(), lat: 40.7, lng: -74.0 }],
        ..Default::default()
    };
    let tree = export_view(&cfg, &profile, &SectionRegistry::standard(), &LiveOverrides::new());

    let artifact = CardExporter::new().export(&tree, &ExportOptions::default()).await.unwrap();
    assert_eq!((artifact.image.width, artifact.image.height), (200, 200));
    assert_eq!(artifact.report.replaced, 0);
    assert_eq!(artifact.report.degraded.len(), 1);
    assert_eq!(artifact.report.degraded[0].section_id, "m");
}
