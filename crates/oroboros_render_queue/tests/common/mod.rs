//! Shared helpers for render queue integration tests.
//!
//! Commands are plain fn pointers, so they report through a process-wide
//! log. Each test tags its payloads with a unique id and reads back only
//! its own entries, which keeps parallel tests independent.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytemuck::{Pod, Zeroable};
use crossbeam_channel::{unbounded, Receiver, Sender};
use oroboros_render_queue::{CommandArgs, RenderBackend, RenderQueueResult, WindowId};
use parking_lot::Mutex;

static LOG: Mutex<Vec<(u32, u32)>> = parking_lot::const_mutex(Vec::new());
static NEXT_TAG: AtomicU32 = AtomicU32::new(1);
static NEXT_WINDOW: AtomicU32 = AtomicU32::new(100);

/// Payload of the logging commands.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct Tagged {
    pub tag: u32,
    pub value: u32,
}

/// A fresh tag for one test.
pub fn tag() -> u32 {
    NEXT_TAG.fetch_add(1, Ordering::Relaxed)
}

/// A window id no other test uses.
pub fn window() -> WindowId {
    WindowId::new(u64::from(NEXT_WINDOW.fetch_add(1, Ordering::Relaxed)))
}

/// Values logged under `tag`, in execution order.
pub fn logged(tag: u32) -> Vec<u32> {
    LOG.lock()
        .iter()
        .filter(|(t, _)| *t == tag)
        .map(|(_, v)| *v)
        .collect()
}

pub fn push(tag: u32, value: u32) {
    LOG.lock().push((tag, value));
}

/// Logs the payload value.
pub fn log_value(args: &CommandArgs<'_>) {
    let payload: Tagged = args.payload();
    push(payload.tag, payload.value);
}

/// Logs the sum of a `u32` blob.
pub fn log_blob_sum(args: &CommandArgs<'_>) {
    let payload: Tagged = args.payload();
    push(payload.tag, args.blob::<u32>().iter().sum());
}

/// Panics on the render thread.
pub fn explode(_args: &CommandArgs<'_>) {
    panic!("command exploded on the render thread");
}

/// A backend whose presents block until the test releases them.
pub struct GatedBackend {
    gate: Receiver<()>,
    presented: Arc<AtomicU32>,
}

/// Test side of a [`GatedBackend`].
pub struct Gate {
    release: Sender<()>,
    pub presented: Arc<AtomicU32>,
}

impl Gate {
    /// Lets one present through.
    pub fn release_one(&self) {
        let _ = self.release.send(());
    }

    pub fn presented(&self) -> u32 {
        self.presented.load(Ordering::Acquire)
    }
}

pub fn gated_backend() -> (GatedBackend, Gate) {
    let (release, gate) = unbounded();
    let presented = Arc::new(AtomicU32::new(0));
    (
        GatedBackend {
            gate,
            presented: Arc::clone(&presented),
        },
        Gate { release, presented },
    )
}

impl RenderBackend for GatedBackend {
    fn render_thread_attach(&mut self, _window: WindowId) -> RenderQueueResult<()> {
        Ok(())
    }

    fn render_thread_detach(&mut self) {}

    fn render_thread_present(&mut self, _window: WindowId) {
        // Bounded so a broken test fails instead of hanging.
        let _ = self.gate.recv_timeout(Duration::from_secs(5));
        self.presented.fetch_add(1, Ordering::AcqRel);
    }
}

/// Polls `condition` for up to two seconds.
pub fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}
