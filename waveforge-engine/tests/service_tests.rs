//! Service facade integration tests
//!
//! Drives UpdateEdl / RenderEdlWindow / LoadFile / RenderFile through
//! the facade the way the HTTP layer does: blocking calls on a
//! blocking thread, events collected from the per-call channel and the
//! broadcast bus.

mod helpers;

use helpers::audio_generator::*;
use helpers::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use waveforge_common::events::EngineEvent;
use waveforge_common::model::{Edl, TimeRange};
use waveforge_engine::error::Error;
use waveforge_engine::service::{EngineService, RenderFileParams, RenderWindowParams};

const RATE: u32 = 48000;
const RECV_TIMEOUT: Duration = Duration::from_secs(10);

struct Setup {
    dir: TempDir,
    media: PathBuf,
    service: Arc<EngineService>,
}

fn setup() -> Setup {
    let dir = TempDir::new().unwrap();
    let media = dir.path().join("tone.wav");
    generate_constant_wav(&media, RATE, 9600, 0.5).unwrap();
    Setup {
        dir,
        media,
        service: Arc::new(EngineService::new()),
    }
}

fn session_edl(media: &std::path::Path) -> Edl {
    edl(
        "session",
        RATE,
        vec![media_ref("m1", media)],
        vec![track("t1", vec![clip("c1", "m1", 0, 9600, 0)])],
    )
}

async fn install(service: &Arc<EngineService>, doc: Edl) {
    let svc = service.clone();
    tokio::task::spawn_blocking(move || svc.update_edl(doc, false))
        .await
        .unwrap()
        .unwrap();
}

async fn recv(rx: &mut mpsc::Receiver<EngineEvent>) -> Option<EngineEvent> {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv()).await.unwrap()
}

#[tokio::test]
async fn update_edl_broadcasts_applied_event() {
    let s = setup();
    let mut bus = s.service.events().subscribe();

    install(&s.service, session_edl(&s.media)).await;

    let event = tokio::time::timeout(RECV_TIMEOUT, bus.recv()).await.unwrap().unwrap();
    match event {
        EngineEvent::EdlApplied { edl_id, revision, track_count, clip_count } => {
            assert_eq!(edl_id, "session");
            assert_eq!(revision.len(), 12);
            assert_eq!(track_count, 1);
            assert_eq!(clip_count, 1);
        }
        other => panic!("expected EdlApplied, got {:?}", other),
    }
    assert!(s.service.has_edl());
}

#[tokio::test]
async fn invalid_update_broadcasts_error_and_keeps_store_empty() {
    let s = setup();
    let mut bus = s.service.events().subscribe();

    let mut doc = session_edl(&s.media);
    doc.sample_rate = 12345;
    let svc = s.service.clone();
    let result = tokio::task::spawn_blocking(move || svc.update_edl(doc, false))
        .await
        .unwrap();
    assert!(matches!(result, Err(Error::Validation(_))));

    let event = tokio::time::timeout(RECV_TIMEOUT, bus.recv()).await.unwrap().unwrap();
    match event {
        EngineEvent::EdlError { edl_id, reason } => {
            assert_eq!(edl_id, "session");
            assert!(reason.contains("Sample rate"));
        }
        other => panic!("expected EdlError, got {:?}", other),
    }
    assert!(!s.service.has_edl());
}

#[tokio::test]
async fn render_window_streams_progress_then_complete() {
    let s = setup();
    install(&s.service, session_edl(&s.media)).await;

    let out_path = s.dir.path().join("window.wav");
    let params = RenderWindowParams {
        edl_id: "session".to_string(),
        range: TimeRange { start_samples: 0, duration_samples: 24000 },
        out_path: out_path.clone(),
        bit_depth: 16,
    };

    let (tx, mut rx) = mpsc::channel(64);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_edl_window(&params, &tx));

    let mut events = Vec::new();
    while let Some(event) = recv(&mut rx).await {
        events.push(event);
    }
    let summary = handle.await.unwrap().unwrap();

    let progress_count = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::Progress { .. }))
        .count();
    assert!(progress_count >= 1);

    match events.last().unwrap() {
        EngineEvent::Complete { out_path: reported, duration_sec, sha256 } => {
            assert_eq!(reported, &out_path.display().to_string());
            assert_eq!(*duration_sec, 0.5);
            assert_eq!(sha256.len(), 64);
            assert_eq!(sha256, &summary.sha256);
        }
        other => panic!("expected terminal Complete, got {:?}", other),
    }

    assert!(out_path.is_file());
}

#[tokio::test]
async fn render_events_are_mirrored_on_the_bus() {
    let s = setup();
    install(&s.service, session_edl(&s.media)).await;

    let mut bus = s.service.events().subscribe();
    let params = RenderWindowParams {
        edl_id: "session".to_string(),
        range: TimeRange { start_samples: 0, duration_samples: 9600 },
        out_path: s.dir.path().join("mirrored.wav"),
        bit_depth: 16,
    };

    let (tx, mut rx) = mpsc::channel(64);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_edl_window(&params, &tx));
    while recv(&mut rx).await.is_some() {}
    handle.await.unwrap().unwrap();

    let mut saw_progress = false;
    let mut saw_complete = false;
    while let Ok(Ok(event)) =
        tokio::time::timeout(Duration::from_millis(200), bus.recv()).await
    {
        match event {
            EngineEvent::Progress { .. } => saw_progress = true,
            EngineEvent::Complete { .. } => saw_complete = true,
            _ => {}
        }
    }
    assert!(saw_progress && saw_complete);
}

#[tokio::test]
async fn render_with_wrong_edl_id_fails_with_edl_error() {
    let s = setup();
    install(&s.service, session_edl(&s.media)).await;

    let params = RenderWindowParams {
        edl_id: "someone-else".to_string(),
        range: TimeRange { start_samples: 0, duration_samples: 4800 },
        out_path: s.dir.path().join("mismatch.wav"),
        bit_depth: 16,
    };

    let (tx, mut rx) = mpsc::channel(8);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_edl_window(&params, &tx));

    let event = recv(&mut rx).await.unwrap();
    assert!(matches!(event, EngineEvent::EdlError { .. }));
    assert!(recv(&mut rx).await.is_none(), "terminal event must be the last");

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(Error::EdlIdMismatch { .. })));
}

#[tokio::test]
async fn render_without_edl_fails_with_no_edl_loaded() {
    let s = setup();
    let params = RenderWindowParams {
        edl_id: "session".to_string(),
        range: TimeRange { start_samples: 0, duration_samples: 4800 },
        out_path: s.dir.path().join("none.wav"),
        bit_depth: 16,
    };

    let (tx, mut rx) = mpsc::channel(8);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_edl_window(&params, &tx));

    assert!(matches!(recv(&mut rx).await, Some(EngineEvent::EdlError { .. })));
    assert!(matches!(handle.await.unwrap(), Err(Error::NoEdlLoaded)));
}

#[tokio::test]
async fn dropping_the_stream_cancels_the_render() {
    let s = setup();
    install(&s.service, session_edl(&s.media)).await;

    // A long window with a tiny channel so the renderer parks on send
    let params = RenderWindowParams {
        edl_id: "session".to_string(),
        range: TimeRange { start_samples: 0, duration_samples: 60 * RATE as i64 },
        out_path: s.dir.path().join("cancelled.wav"),
        bit_depth: 16,
    };

    let (tx, mut rx) = mpsc::channel(1);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_edl_window(&params, &tx));

    let first = recv(&mut rx).await.unwrap();
    assert!(matches!(first, EngineEvent::Progress { .. }));
    drop(rx);

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
    // No Complete was emitted; the output may be absent or truncated
}

#[tokio::test]
async fn unknown_bit_depth_degrades_to_float32() {
    let s = setup();
    install(&s.service, session_edl(&s.media)).await;

    let out_path = s.dir.path().join("degraded.wav");
    let params = RenderWindowParams {
        edl_id: "session".to_string(),
        range: TimeRange { start_samples: 0, duration_samples: 4800 },
        out_path: out_path.clone(),
        bit_depth: 20,
    };

    let (tx, mut rx) = mpsc::channel(64);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_edl_window(&params, &tx));
    while recv(&mut rx).await.is_some() {}
    handle.await.unwrap().unwrap();

    let reader = hound::WavReader::open(&out_path).unwrap();
    assert_eq!(reader.spec().bits_per_sample, 32);
    assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
}

#[tokio::test]
async fn load_file_reports_probe_info() {
    let s = setup();
    let svc = s.service.clone();
    let media = s.media.clone();
    let info = tokio::task::spawn_blocking(move || svc.load_file(&media))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(info.sample_rate, RATE);
    assert_eq!(info.channels, 1);
    assert_eq!(info.duration_seconds, 0.2);
    assert!(info.size_bytes > 0);
}

#[tokio::test]
async fn render_file_without_load_reports_no_file_loaded() {
    let s = setup();
    let params = RenderFileParams {
        path: None,
        start_sec: None,
        duration_sec: None,
        out_path: s.dir.path().join("raw.wav"),
    };

    let (tx, mut rx) = mpsc::channel(8);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_file(&params, &tx));

    match recv(&mut rx).await.unwrap() {
        EngineEvent::Error { code, .. } => assert_eq!(code, "NO_FILE_LOADED"),
        other => panic!("expected Error event, got {:?}", other),
    }
    assert!(matches!(handle.await.unwrap(), Err(Error::NoFileLoaded)));
}

#[tokio::test]
async fn render_file_lazily_loads_and_completes() {
    let s = setup();
    let out_path = s.dir.path().join("raw.wav");
    let params = RenderFileParams {
        path: Some(s.media.clone()),
        start_sec: None,
        duration_sec: None,
        out_path: out_path.clone(),
    };

    let (tx, mut rx) = mpsc::channel(64);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_file(&params, &tx));

    let mut events = Vec::new();
    while let Some(event) = recv(&mut rx).await {
        events.push(event);
    }
    handle.await.unwrap().unwrap();

    match events.last().unwrap() {
        EngineEvent::Complete { duration_sec, sha256, .. } => {
            assert_eq!(*duration_sec, 0.2);
            assert_eq!(sha256.len(), 64);
        }
        other => panic!("expected Complete, got {:?}", other),
    }

    // One-shot renders are always 32-bit float
    let reader = hound::WavReader::open(&out_path).unwrap();
    assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
    assert_eq!(reader.spec().sample_rate, RATE);
    assert_eq!(reader.duration(), 9600);
}

#[tokio::test]
async fn render_file_rejects_out_of_range_window() {
    let s = setup();
    let params = RenderFileParams {
        path: Some(s.media.clone()),
        start_sec: Some(1.0), // file holds only 0.2 s
        duration_sec: None,
        out_path: s.dir.path().join("raw.wav"),
    };

    let (tx, mut rx) = mpsc::channel(8);
    let svc = s.service.clone();
    let handle = tokio::task::spawn_blocking(move || svc.render_file(&params, &tx));

    match recv(&mut rx).await.unwrap() {
        EngineEvent::Error { code, .. } => assert_eq!(code, "INVALID_RANGE"),
        other => panic!("expected Error event, got {:?}", other),
    }
    assert!(matches!(handle.await.unwrap(), Err(Error::InvalidRange)));
}
