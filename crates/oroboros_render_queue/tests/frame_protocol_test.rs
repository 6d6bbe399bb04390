//! # Frame Protocol Tests
//!
//! Recording order, snapshotting, capacity fallback and flush-before-call
//! on a live render thread.

mod common;

use common::{log_blob_sum, log_value, logged, tag, window, Tagged};
use oroboros_render_queue::{
    HeadlessBackend, RenderQueue, RenderQueueError, RenderThreadConfig, WindowId,
};

fn start(window: WindowId, config: RenderThreadConfig) -> (RenderQueue, HeadlessBackend) {
    let backend = HeadlessBackend::new();
    let queue = RenderQueue::start(window, config, backend.clone()).unwrap();
    (queue, backend)
}

#[test]
fn test_commands_execute_in_recorded_order() {
    let (w, tag) = (window(), tag());
    let (queue, _) = start(w, RenderThreadConfig::default());

    queue.begin_frame(w).unwrap();
    for value in 0..100 {
        queue.record_async(log_value, &Tagged { tag, value }).unwrap();
    }
    queue.submit_frame(w).unwrap();

    assert_eq!(logged(tag), (0..100).collect::<Vec<_>>());
    let stats = queue.frame_stats(w).unwrap();
    assert_eq!(stats.last_command_count, 100);
    assert!(stats.last_command_bytes >= 100 * 8);
}

#[test]
fn test_blob_is_snapshotted_at_record_time() {
    let (w, tag) = (window(), tag());
    let (queue, _) = start(w, RenderThreadConfig::default());

    queue.begin_frame(w).unwrap();
    let mut indices = vec![1u32, 2, 3, 4];
    queue
        .record_async_blob(log_blob_sum, &Tagged { tag, value: 0 }, &indices)
        .unwrap();

    // Caller reuses and frees its buffer before the frame executes.
    indices.iter_mut().for_each(|i| *i = 9999);
    drop(indices);

    queue.submit_frame(w).unwrap();
    assert_eq!(logged(tag), vec![10]);
}

#[test]
fn test_capacity_exceeded_falls_back_to_sync() {
    let (w, tag) = (window(), tag());
    let config = RenderThreadConfig::default()
        .with_capacity(2, 256)
        .with_wait_on_submit(true);
    let (queue, backend) = start(w, config);

    queue.begin_frame(w).unwrap();
    queue.record_async(log_value, &Tagged { tag, value: 0 }).unwrap();
    queue.record_async(log_value, &Tagged { tag, value: 1 }).unwrap();

    let err = queue
        .record_async(log_value, &Tagged { tag, value: 2 })
        .unwrap_err();
    assert_eq!(
        err,
        RenderQueueError::CapacityExceeded {
            resource: "command",
            capacity: 2,
            requested: 3,
        }
    );
    assert!(logged(tag).is_empty());

    // The fallback flushes the two recorded commands first.
    queue.dispatch(log_value, &Tagged { tag, value: 2 }).unwrap();
    assert_eq!(logged(tag), vec![0, 1, 2]);

    queue.submit_frame(w).unwrap();
    let stats = queue.frame_stats(w).unwrap();
    assert_eq!(stats.submitted_frames, 1);
    assert_eq!(stats.presented_frames, 1);
    assert_eq!(stats.queue_depth, 0);
    assert_eq!(backend.stats().presents(), 1);
}

#[test]
fn test_byte_capacity_falls_back_to_sync() {
    let (w, tag) = (window(), tag());
    let config = RenderThreadConfig::default().with_capacity(64, 32);
    let (queue, _) = start(w, config);

    queue.begin_frame(w).unwrap();
    let blob = [5u32; 16];
    let err = queue
        .record_async_blob(log_blob_sum, &Tagged { tag, value: 0 }, &blob)
        .unwrap_err();
    assert!(matches!(
        err,
        RenderQueueError::CapacityExceeded { resource: "byte", capacity: 32, .. }
    ));

    queue
        .dispatch_blob(log_blob_sum, &Tagged { tag, value: 0 }, &blob)
        .unwrap();
    assert_eq!(logged(tag), vec![80]);
    queue.submit_frame(w).unwrap();
}

#[test]
fn test_recording_requires_open_frame() {
    let (w, tag) = (window(), tag());
    let (queue, _) = start(w, RenderThreadConfig::default());

    let err = queue
        .record_async(log_value, &Tagged { tag, value: 7 })
        .unwrap_err();
    assert!(matches!(err, RenderQueueError::Unsupported(_)));

    // Outside a frame, dispatch still executes the command.
    queue.dispatch(log_value, &Tagged { tag, value: 7 }).unwrap();
    assert_eq!(logged(tag), vec![7]);
}

#[test]
fn test_begin_frame_twice_is_unsupported() {
    let (w, tag) = (window(), tag());
    let (queue, _) = start(w, RenderThreadConfig::default());

    queue.begin_frame(w).unwrap();
    queue.record_async(log_value, &Tagged { tag, value: 1 }).unwrap();

    let err = queue.begin_frame(w).unwrap_err();
    assert!(matches!(err, RenderQueueError::Unsupported(_)));

    // The open packet is untouched.
    queue.record_async(log_value, &Tagged { tag, value: 2 }).unwrap();
    queue.submit_frame(w).unwrap();
    assert_eq!(logged(tag), vec![1, 2]);
}

#[test]
fn test_submit_without_frame_is_unsupported() {
    let w = window();
    let (queue, _) = start(w, RenderThreadConfig::default());

    let err = queue.submit_frame(w).unwrap_err();
    assert!(matches!(err, RenderQueueError::Unsupported(_)));
    assert_eq!(queue.frame_stats(w).unwrap().submitted_frames, 0);
}

#[test]
fn test_overaligned_blob_is_invalid() {
    #[derive(Clone, Copy, bytemuck::Zeroable, bytemuck::Pod)]
    #[repr(C, align(16))]
    struct Wide([u32; 4]);

    let (w, tag) = (window(), tag());
    let (queue, _) = start(w, RenderThreadConfig::default());

    queue.begin_frame(w).unwrap();
    let err = queue
        .record_async_blob(log_blob_sum, &Tagged { tag, value: 0 }, &[Wide([1; 4])])
        .unwrap_err();
    assert!(matches!(err, RenderQueueError::InvalidArgument(_)));

    let err = queue
        .dispatch_blob(log_blob_sum, &Tagged { tag, value: 0 }, &[Wide([1; 4])])
        .unwrap_err();
    assert!(matches!(err, RenderQueueError::InvalidArgument(_)));
    queue.submit_frame(w).unwrap();
    assert!(logged(tag).is_empty());
}

#[test]
fn test_call_sync_observes_recorded_commands() {
    let (w, tag) = (window(), tag());
    let (queue, _) = start(w, RenderThreadConfig::default());

    queue.begin_frame(w).unwrap();
    for value in 0..3 {
        queue.record_async(log_value, &Tagged { tag, value }).unwrap();
    }

    let seen = queue.call_sync(move || logged(tag)).unwrap();
    assert_eq!(seen, vec![0, 1, 2]);

    queue.submit_frame(w).unwrap();
    assert_eq!(logged(tag), vec![0, 1, 2]);
}

#[test]
fn test_flush_executes_without_presenting() {
    let (w, tag) = (window(), tag());
    let (queue, backend) = start(w, RenderThreadConfig::default());

    queue.begin_frame(w).unwrap();
    queue.record_async(log_value, &Tagged { tag, value: 0 }).unwrap();
    queue.record_async(log_value, &Tagged { tag, value: 1 }).unwrap();

    let answer = queue.call_sync_sized(|| 42u64, 8).unwrap();
    assert_eq!(answer, 42);

    // Flushed commands ran, but no frame was counted or presented.
    assert_eq!(logged(tag), vec![0, 1]);
    let diagnostics = queue.diagnostics(w).unwrap();
    assert_eq!(diagnostics.frames.submitted_frames, 0);
    assert_eq!(diagnostics.frames.presented_frames, 0);
    assert_eq!(backend.stats().presents(), 0);
    assert!(diagnostics.frame_open);
    assert_eq!(diagnostics.open_frame_commands, 1);
    assert_eq!(diagnostics.open_frame_bytes, 8);

    // The frame is still open and records into the emptied packet.
    queue.record_async(log_value, &Tagged { tag, value: 2 }).unwrap();
    queue.submit_frame(w).unwrap();

    assert_eq!(logged(tag), vec![0, 1, 2]);
    let stats = queue.frame_stats(w).unwrap();
    assert_eq!(stats.submitted_frames, 1);
    assert_eq!(stats.presented_frames, 1);
    assert_eq!(stats.last_command_count, 1);
    assert_eq!(backend.stats().presents(), 1);
}

#[test]
fn test_call_sync_outside_frame() {
    let w = window();
    let (queue, _) = start(w, RenderThreadConfig::default());

    let name = queue
        .call_sync(|| std::thread::current().name().map(str::to_owned))
        .unwrap();
    assert_eq!(name.as_deref(), Some(oroboros_render_queue::RENDER_THREAD_NAME));
    assert!(!queue.is_render_thread());
    assert!(queue.call_sync(|| 1 + 1).unwrap() == 2);
}

#[test]
fn test_many_frames_reuse_packets() {
    let (w, tag) = (window(), tag());
    let config = RenderThreadConfig::pipelined().with_capacity(4, 64);
    let (queue, backend) = start(w, config);

    for frame in 0..50 {
        queue.begin_frame(w).unwrap();
        queue.record_async(log_value, &Tagged { tag, value: frame }).unwrap();
        queue.submit_frame(w).unwrap();
    }
    queue.wait_presented(w);

    assert_eq!(logged(tag), (0..50).collect::<Vec<_>>());
    let stats = queue.frame_stats(w).unwrap();
    assert_eq!(stats.submitted_frames, 50);
    assert_eq!(stats.presented_frames, 50);
    assert_eq!(backend.stats().presents(), 50);
}
