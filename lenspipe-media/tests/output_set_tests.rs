//! Unit tests for output set construction, identity and teardown
//!
//! These tests build output sets against an in-memory capability table and
//! check negotiation results, value equality, rollback on failure and
//! close semantics.

use lenspipe_core::*;
use lenspipe_media::*;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn capabilities() -> StaticCapabilities {
    StaticCapabilities::new().with_camera(
        "0",
        StreamConfiguration::new()
            .with_format(
                PixelFormat::Private,
                vec![Size::new(3840, 2160), Size::FULL_HD, Size::HD, Size::VGA],
            )
            .with_format(
                PixelFormat::Jpeg,
                vec![Size::new(4032, 3024), Size::FULL_HD, Size::VGA],
            )
            .with_format(PixelFormat::Yuv420, vec![Size::VGA, Size::HD, Size::FULL_HD])
            .with_format(PixelFormat::Raw16, vec![]),
    )
}

fn photo_sink() -> Arc<dyn PhotoSink> {
    Arc::new(|frame: FrameBuffer| frame.release())
}

fn video_sink() -> Arc<dyn VideoSink> {
    Arc::new(|frame: FrameBuffer| frame.release())
}

fn full_config() -> OutputConfig {
    OutputConfig::new()
        .with_preview(SurfaceHandle(1))
        .with_photo(PhotoRequest::default())
        .with_video(VideoRequest {
            target_size: Some(Size::new(1000, 700)),
            format: PixelFormat::Yuv420,
            ..VideoRequest::default()
        })
}

fn build(camera_id: &str, config: OutputConfig) -> LensResult<OutputSet> {
    OutputSet::builder(camera_id, config)
        .photo_sink(photo_sink())
        .video_sink(video_sink())
        .build(&capabilities())
}

/// Records every observed event
#[derive(Default)]
struct RecordingObserver {
    events: Mutex<Vec<OutputEvent>>,
}

impl RecordingObserver {
    fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(OutputEvent::event_type).collect()
    }
}

impl OutputObserver for RecordingObserver {
    fn on_event(&self, event: &OutputEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Threaded factory that refuses to open sources for one stream
struct FailingFactory {
    inner: ThreadedSourceFactory,
    fail_on: OutputKind,
}

impl BufferSourceFactory for FailingFactory {
    fn open(
        &self,
        spec: SourceSpec,
        observer: Arc<dyn OutputObserver>,
        deliver: DeliveryFn,
    ) -> LensResult<BufferSource> {
        if spec.stream == self.fail_on {
            return Err(LensError::SourceCreation {
                stream: spec.stream.to_string(),
                reason: "no buffers left".to_string(),
            });
        }
        self.inner.open(spec, observer, deliver)
    }

    fn open_sources(&self) -> usize {
        self.inner.open_sources()
    }
}

// ============================================================================
// CONSTRUCTION TESTS
// ============================================================================

#[test]
fn test_empty_config_has_no_outputs() {
    let set = build("0", OutputConfig::new()).unwrap();
    assert_eq!(set.size(), 0);
    assert!(set.is_empty());
    assert_eq!(set.to_string(), "[]");
}

#[test]
fn test_full_config_resolves_every_output() {
    let set = build("0", full_config()).unwrap();

    assert_eq!(set.size(), 3);
    assert_eq!(set.preview().unwrap().size, Size::FULL_HD);
    assert_eq!(set.photo().unwrap().size, Size::new(4032, 3024));
    assert_eq!(set.video().unwrap().size, Size::HD);
    assert_eq!(set.preview_surface(), Some(SurfaceHandle(1)));
    assert_eq!(
        set.to_string(),
        "[PREVIEW 1920x1080 (Private), PHOTO 4032x3024 (Jpeg), VIDEO 1280x720 (Yuv420)]"
    );
}

#[test]
fn test_size_counts_only_requested_outputs() {
    let set = build("0", OutputConfig::new().with_photo(PhotoRequest::default())).unwrap();
    assert_eq!(set.size(), 1);
    assert!(set.preview().is_none());
    assert!(set.video().is_none());
    assert!(set.photo_producer().is_some());
    assert!(set.video_producer().is_none());
}

#[test]
fn test_unknown_camera() {
    let err = build("42", full_config()).unwrap_err();
    assert_eq!(
        err.configuration(),
        Some(&ConfigurationError::UnknownCamera {
            camera_id: "42".to_string()
        })
    );
}

#[test]
fn test_missing_sink_is_rejected() {
    let factory = Arc::new(ThreadedSourceFactory::default());
    let err = OutputSet::builder("0", OutputConfig::new().with_video(VideoRequest::default()))
        .source_factory(factory.clone())
        .build(&capabilities())
        .unwrap_err();
    assert!(matches!(err, LensError::InvalidState { .. }));
    assert_eq!(factory.open_sources(), 0);
}

// ============================================================================
// ROLLBACK TESTS
// ============================================================================

#[test]
fn test_video_negotiation_failure_closes_photo_source() {
    let factory = Arc::new(ThreadedSourceFactory::new("rollback"));
    let observer = Arc::new(RecordingObserver::default());
    let config = OutputConfig::new()
        .with_photo(PhotoRequest::default())
        .with_video(VideoRequest {
            format: PixelFormat::Raw16,
            ..VideoRequest::default()
        });

    let err = OutputSet::builder("0", config)
        .photo_sink(photo_sink())
        .video_sink(video_sink())
        .observer(observer.clone())
        .source_factory(factory.clone())
        .build(&capabilities())
        .unwrap_err();

    assert_eq!(
        err.configuration(),
        Some(&ConfigurationError::NoSizesAvailable {
            format: "Raw16".to_string()
        })
    );
    assert_eq!(factory.open_sources(), 0);
    assert_eq!(
        observer.event_types(),
        vec!["source_opened", "source_closed", "configuration_failed"]
    );
}

#[test]
fn test_unsupported_video_format_rolls_back() {
    let factory = Arc::new(ThreadedSourceFactory::default());
    let config = OutputConfig::new()
        .with_preview(SurfaceHandle(3))
        .with_photo(PhotoRequest::default())
        .with_video(VideoRequest {
            format: PixelFormat::Rgba8888,
            ..VideoRequest::default()
        });

    let err = OutputSet::builder("0", config)
        .photo_sink(photo_sink())
        .video_sink(video_sink())
        .source_factory(factory.clone())
        .build(&capabilities())
        .unwrap_err();

    assert!(matches!(
        err.configuration(),
        Some(ConfigurationError::UnsupportedFormat { .. })
    ));
    assert_eq!(factory.open_sources(), 0);
}

#[test]
fn test_source_creation_failure_closes_earlier_sources() {
    let factory = Arc::new(FailingFactory {
        inner: ThreadedSourceFactory::default(),
        fail_on: OutputKind::Video,
    });

    let err = OutputSet::builder("0", full_config())
        .photo_sink(photo_sink())
        .video_sink(video_sink())
        .source_factory(factory.clone())
        .build(&capabilities())
        .unwrap_err();

    assert!(matches!(err, LensError::SourceCreation { .. }));
    assert_eq!(factory.open_sources(), 0);
}

// ============================================================================
// IDENTITY TESTS
// ============================================================================

#[test]
fn test_equal_when_requested_the_same_way() {
    let a = build("0", full_config()).unwrap();
    let b = build("0", full_config().with_preview(SurfaceHandle(99))).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.key(), OutputSetKey::new("0", &full_config()));

    let mut keys = HashSet::new();
    keys.insert(a.key());
    assert!(keys.contains(&b.key()));
}

#[test]
fn test_any_field_change_breaks_equality() {
    let base = full_config();
    let key = OutputSetKey::new("0", &base);

    let mut no_preview = base.clone();
    no_preview.preview = None;

    let mut photo_format = base.clone();
    photo_format.photo = Some(PhotoRequest {
        format: PixelFormat::Yuv420,
        ..PhotoRequest::default()
    });

    let mut photo_size = base.clone();
    photo_size.photo = Some(PhotoRequest {
        target_size: Some(Size::VGA),
        ..PhotoRequest::default()
    });

    let mut recording = base.clone();
    if let Some(video) = recording.video.as_mut() {
        video.enable_recording = true;
    }

    let mut video_size = base.clone();
    if let Some(video) = video_size.video.as_mut() {
        video.target_size = None;
    }

    let mut video_format = base.clone();
    if let Some(video) = video_format.video.as_mut() {
        video.format = PixelFormat::Private;
    }

    assert_ne!(key, OutputSetKey::new("1", &base));
    for changed in [no_preview, photo_format, photo_size, recording, video_size, video_format] {
        assert_ne!(key, OutputSetKey::new("0", &changed));
    }
}

#[test]
fn test_hdr_and_frame_processor_do_not_affect_identity() {
    let mut config = full_config();
    if let Some(video) = config.video.as_mut() {
        video.hdr_profile = Some(HdrProfile::Hdr10);
        video.frame_processor = Some(FrameProcessorHandle(5));
    }

    let set = build("0", config).unwrap();
    assert_eq!(set.hdr_profile(), Some(HdrProfile::Hdr10));
    assert_eq!(set.frame_processor(), Some(FrameProcessorHandle(5)));
    assert_eq!(set.key(), OutputSetKey::new("0", &full_config()));
}

// ============================================================================
// DELIVERY AND CLOSE TESTS
// ============================================================================

#[test]
fn test_sinks_receive_their_own_stream() {
    let (photo_tx, photo_rx) = std::sync::mpsc::channel();
    let (video_tx, video_rx) = std::sync::mpsc::channel();
    let photo_tx = Mutex::new(photo_tx);
    let video_tx = Mutex::new(video_tx);

    let photo: Arc<dyn PhotoSink> = Arc::new(move |frame: FrameBuffer| {
        let _ = photo_tx.lock().send((frame.format(), frame.timestamp()));
    });
    let video: Arc<dyn VideoSink> = Arc::new(move |frame: FrameBuffer| {
        let _ = video_tx.lock().send((frame.format(), frame.timestamp()));
    });

    let set = OutputSet::builder("0", full_config())
        .photo_sink(photo)
        .video_sink(video)
        .build(&capabilities())
        .unwrap();

    set.photo_producer().unwrap().submit(10, bytes::Bytes::new());
    set.video_producer().unwrap().submit(20, bytes::Bytes::new());

    let timeout = Duration::from_secs(2);
    assert_eq!(photo_rx.recv_timeout(timeout).unwrap(), (PixelFormat::Jpeg, 10));
    assert_eq!(video_rx.recv_timeout(timeout).unwrap(), (PixelFormat::Yuv420, 20));
}

#[test]
fn test_close_twice_is_harmless() {
    let factory = Arc::new(ThreadedSourceFactory::default());
    let observer = Arc::new(RecordingObserver::default());
    let mut set = OutputSet::builder("0", full_config())
        .photo_sink(photo_sink())
        .video_sink(video_sink())
        .observer(observer.clone())
        .source_factory(factory.clone())
        .build(&capabilities())
        .unwrap();
    assert_eq!(factory.open_sources(), 2);

    set.close();
    let after_first = (set.size(), set.key(), observer.event_types());
    assert_eq!(factory.open_sources(), 0);

    set.close();
    assert!(set.is_closed());
    assert_eq!((set.size(), set.key(), observer.event_types()), after_first);
    assert_eq!(factory.open_sources(), 0);
}

#[test]
fn test_drop_closes_sources() {
    let factory = Arc::new(ThreadedSourceFactory::default());
    {
        let _set = OutputSet::builder("0", full_config())
            .photo_sink(photo_sink())
            .video_sink(video_sink())
            .source_factory(factory.clone())
            .build(&capabilities())
            .unwrap();
        assert_eq!(factory.open_sources(), 2);
    }
    assert_eq!(factory.open_sources(), 0);
}

#[test]
fn test_configuration_applied_event() {
    let observer = Arc::new(RecordingObserver::default());
    let _set = OutputSet::builder("0", full_config())
        .photo_sink(photo_sink())
        .video_sink(video_sink())
        .observer(observer.clone())
        .build(&capabilities())
        .unwrap();

    let events = observer.events.lock();
    match events.last() {
        Some(OutputEvent::ConfigurationApplied { camera_id, outputs }) => {
            assert_eq!(camera_id, "0");
            let kinds: Vec<OutputKind> = outputs.iter().map(|o| o.kind).collect();
            assert_eq!(
                kinds,
                vec![OutputKind::Preview, OutputKind::Photo, OutputKind::Video]
            );
        }
        other => panic!("Expected ConfigurationApplied, got {:?}", other),
    }
}
