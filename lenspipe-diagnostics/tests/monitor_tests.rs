//! Observer tests against real output sets

use lenspipe_core::*;
use lenspipe_diagnostics::*;
use lenspipe_media::*;
use std::sync::Arc;

fn capabilities() -> StaticCapabilities {
    StaticCapabilities::new().with_camera(
        "0",
        StreamConfiguration::new()
            .with_format(PixelFormat::Private, vec![Size::FULL_HD, Size::HD])
            .with_format(PixelFormat::Jpeg, vec![Size::new(4032, 3024)]),
    )
}

fn builder(config: OutputConfig) -> OutputSetBuilder {
    let photo: Arc<dyn PhotoSink> = Arc::new(|frame: FrameBuffer| frame.release());
    let video: Arc<dyn VideoSink> = Arc::new(|frame: FrameBuffer| frame.release());
    OutputSet::builder("0", config).photo_sink(photo).video_sink(video)
}

#[test]
fn test_monitor_tracks_source_lifecycle() {
    let monitor = Arc::new(DeliveryMonitor::new());
    let config = OutputConfig::new()
        .with_preview(SurfaceHandle(1))
        .with_photo(PhotoRequest::default())
        .with_video(VideoRequest::default());

    let mut set = builder(config)
        .observer(monitor.clone())
        .build(&capabilities())
        .unwrap();

    assert_eq!(monitor.configurations_applied(), 1);
    assert_eq!(monitor.open_sources(), 2);

    set.close();
    assert_eq!(monitor.open_sources(), 0);
    assert_eq!(monitor.counters(OutputKind::Photo).closed, 1);
    assert_eq!(monitor.counters(OutputKind::Video).closed, 1);
    assert_eq!(monitor.counters(OutputKind::Preview), StreamCounters::default());
}

#[test]
fn test_monitor_sees_rollback() {
    let monitor = Arc::new(DeliveryMonitor::new());
    let config = OutputConfig::new()
        .with_photo(PhotoRequest::default())
        .with_video(VideoRequest {
            format: PixelFormat::Nv12,
            ..VideoRequest::default()
        });

    let result = builder(config).observer(monitor.clone()).build(&capabilities());

    assert!(result.is_err());
    assert_eq!(monitor.configurations_failed(), 1);
    assert_eq!(monitor.configurations_applied(), 0);
    assert_eq!(monitor.open_sources(), 0);
}

#[test]
fn test_tracing_observer_accepts_every_event() {
    let _ = DebugLogger::new().with_default_directive("debug").install();

    let set = builder(OutputConfig::new().with_photo(PhotoRequest::default()))
        .observer(Arc::new(TracingObserver::new()))
        .build(&capabilities())
        .unwrap();
    drop(set);
}
