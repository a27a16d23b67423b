//! Threaded frame driver tests against the recording device

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sable_app::{DriverConfig, DriverState, FrameDriver, FrameStats};
use sable_core::{Color, Rect};
use sable_gpu::{Quad, RecordingDevice};
use sable_paint::PixelBuffer;

fn config(target_fps: u32) -> DriverConfig {
    let mut config = DriverConfig::default();
    config.frame.target_fps = target_fps;
    config.frame.clear_color = Color::rgb(16, 32, 48);
    config
}

/// Poll `condition` until it holds or a generous deadline passes
fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn presented_sequences_strictly_increase() {
    let device = RecordingDevice::new(64, 64).with_frame_delay(Duration::from_millis(1));
    let mut driver = FrameDriver::new(config(0));
    driver.attach_context(device, 1.0).unwrap();
    driver
        .start(|ctx| {
            let x = (ctx.frame_number() % 32) as f32;
            ctx.draw_quad(&Quad::solid(Rect::new(x, 0.0, 8.0, 8.0), Color::RED));
        })
        .unwrap();
    assert_eq!(driver.state(), DriverState::Running);

    let mut presented = Vec::new();
    assert!(wait_until(|| {
        if let Some(sequence) = driver.present_latest(|_frame| {
            thread::sleep(Duration::from_micros(300));
        }) {
            if presented.last() != Some(&sequence) {
                presented.push(sequence);
            }
        }
        presented.len() >= 20
    }));
    driver.terminate();

    assert!(
        presented.windows(2).all(|w| w[0] < w[1]),
        "presented out of order: {:?}",
        presented
    );
}

#[test]
fn completion_stats_follow_recorded_frames() {
    let device = RecordingDevice::new(32, 32);
    let log = device.log();
    let stats: Arc<Mutex<Vec<FrameStats>>> = Arc::default();

    let mut driver = FrameDriver::new(config(0));
    let sink = Arc::clone(&stats);
    driver
        .on_frame_complete(move |s| sink.lock().push(s))
        .unwrap();
    driver.attach_context(device, 1.0).unwrap();
    driver
        .start(|ctx| {
            ctx.draw_quad(&Quad::solid(Rect::new(0.0, 0.0, 4.0, 4.0), Color::BLUE));
            ctx.draw_quad(&Quad::solid(Rect::new(4.0, 0.0, 4.0, 4.0), Color::BLUE));
        })
        .unwrap();

    assert!(wait_until(|| stats.lock().len() >= 10));
    driver.terminate();

    let stats = stats.lock().clone();
    for (i, s) in stats.iter().enumerate() {
        assert_eq!(s.sequence, i as u64 + 1);
    }

    let frames = log.frames();
    assert!(frames.len() >= stats.len());
    for (frame, s) in frames.iter().zip(&stats) {
        assert_eq!(frame.slot, s.slot);
        assert_eq!(frame.clear, Color::rgb(16, 32, 48));
        // Two quads with the same state make one batch of 12 vertices
        assert_eq!(frame.batches.len(), 1);
        assert_eq!(frame.batches[0].vertices.len(), 12);
    }
    assert_eq!(log.stray_batches(), 0);
}

#[test]
fn request_terminate_abandons_the_frame() {
    let device = RecordingDevice::new(16, 16);
    let log = device.log();
    let stats: Arc<Mutex<Vec<FrameStats>>> = Arc::default();

    let mut driver = FrameDriver::new(config(0));
    let sink = Arc::clone(&stats);
    driver
        .on_frame_complete(move |s| sink.lock().push(s))
        .unwrap();
    driver.attach_context(device, 1.0).unwrap();
    driver
        .start(|ctx| {
            if ctx.frame_number() == 4 {
                ctx.request_terminate();
            }
        })
        .unwrap();

    assert!(wait_until(|| driver.is_terminate_requested()));
    driver.terminate();

    assert_eq!(stats.lock().len(), 4);
    assert_eq!(log.frame_count(), 5);
    assert_eq!(driver.latest_sequence(), Some(4));
}

#[test]
fn target_fps_paces_frames() {
    let device = RecordingDevice::new(16, 16);
    let log = device.log();
    let mut driver = FrameDriver::new(config(50));
    driver.attach_context(device, 1.0).unwrap();

    let start = Instant::now();
    driver.start(|_ctx| {}).unwrap();
    assert!(wait_until(|| log.frame_count() >= 5));
    let elapsed = start.elapsed();
    driver.terminate();

    // First frame is immediate, the next four wait 20ms each
    assert!(elapsed >= Duration::from_millis(80), "elapsed {:?}", elapsed);
}

#[test]
fn textures_uploaded_in_a_frame_are_batched() {
    let device = RecordingDevice::new(32, 32);
    let log = device.log();
    let mut driver = FrameDriver::new(config(0));
    driver.attach_context(device, 1.0).unwrap();

    let mut texture = None;
    driver
        .start(move |ctx| {
            let handle = *texture.get_or_insert_with(|| {
                let mut buffer = PixelBuffer::new(4, 4);
                buffer.clear(Color::GREEN);
                ctx.upload(&buffer)
            });
            ctx.draw_quad(&Quad::textured(Rect::new(0.0, 0.0, 16.0, 16.0), handle));
        })
        .unwrap();

    assert!(wait_until(|| log.frame_count() >= 3));
    driver.terminate();

    assert_eq!(log.live_textures(), 1);
    let frames = log.frames();
    let handle = frames[0].batches[0].textures[0];
    assert_eq!(handle.size(), (4, 4));
    assert!(frames
        .iter()
        .all(|f| f.batches.iter().all(|b| b.textures == vec![handle])));
}

#[test]
fn drop_stops_the_render_thread() {
    let device = RecordingDevice::new(8, 8);
    let log = device.log();
    {
        let mut driver = FrameDriver::new(config(0));
        driver.attach_context(device, 1.0).unwrap();
        driver.start(|_ctx| {}).unwrap();
        assert!(wait_until(|| log.frame_count() >= 1));
    }
    let after_drop = log.frame_count();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(log.frame_count(), after_drop);
    assert!(!log.frame_in_progress());
}

#[test]
fn scale_factor_changes_reach_the_render_thread() {
    let device = RecordingDevice::new(16, 16).with_frame_delay(Duration::from_millis(1));
    let seen: Arc<Mutex<Vec<f64>>> = Arc::default();

    let mut driver = FrameDriver::new(config(0));
    driver.attach_context(device, 1.0).unwrap();
    let frames = Arc::clone(&seen);
    driver
        .start(move |ctx| frames.lock().push(ctx.scale_factor()))
        .unwrap();

    assert!(wait_until(|| !seen.lock().is_empty()));
    driver.set_scale_factor(2.0);
    assert_eq!(driver.scale_factor(), 2.0);
    assert!(wait_until(|| seen.lock().last() == Some(&2.0)));
    driver.terminate();

    let seen = seen.lock();
    assert_eq!(seen[0], 1.0);
    let first_new = seen.iter().position(|&s| s == 2.0).unwrap();
    assert!(seen[first_new..].iter().all(|&s| s == 2.0));
}
