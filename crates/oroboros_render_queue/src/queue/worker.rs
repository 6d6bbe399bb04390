//! The render thread loop.
//!
//! ```text
//!   Initializing ──attach ok──> Running ──stopping──> Terminated
//!        │
//!        └──attach failed──> Failed
//! ```
//!
//! The thread sleeps on `work_ready` and serves, in priority order:
//! the pending sync call, then the pending packet and present. Commands
//! and presents run with the runtime lock released.

use std::thread;
use std::time::Instant;

use tracing::{debug, error};

use super::state::{elapsed_ms, Shared, SyncJob};
use crate::backend::{RenderBackend, WindowId};
use crate::packet::CommandPacket;

enum Work {
    Sync(SyncJob),
    Frame {
        packet: Option<(usize, CommandPacket)>,
        present: bool,
    },
    Stop,
}

/// Owns the backend for the life of the render thread.
///
/// Dropped on every exit path, unwinding included: the backend detaches
/// first, then the runtime is marked stopped (and failed on a panic) so no
/// producer waits on a thread that is gone.
struct RenderThreadGuard<'a, B: RenderBackend> {
    shared: &'a Shared,
    window: WindowId,
    backend: B,
}

impl<B: RenderBackend> Drop for RenderThreadGuard<'_, B> {
    fn drop(&mut self) {
        let panicked = thread::panicking();
        self.backend.render_thread_detach();

        let mut state = self.shared.state.lock();
        if panicked {
            error!(window = %self.window, "render thread panicked; queue marked failed");
            state.failed = true;
        }
        state.running = false;
        state.sync_pending = false;
        state.sync_completed = true;
        state.present_pending = false;
        state.pending_packet = None;
        for packet in state.packets.iter_mut().flatten() {
            packet.set_submitted(false);
        }
        self.shared.wake_waiters();
        debug!(window = %self.window, "render thread exiting");
    }
}

pub(super) fn run<B: RenderBackend>(shared: &Shared, window: WindowId, mut backend: B) {
    let attached = backend.render_thread_attach(window);
    {
        let mut state = shared.state.lock();
        state.started_signal = true;
        if let Err(e) = attached {
            error!(%window, error = %e, "render thread failed to attach");
            state.failed = true;
            state.running = false;
            state.stopping = true;
            shared.started.notify_all();
            return;
        }
        state.render_thread = Some(thread::current().id());
        state.running = true;
        shared.started.notify_all();
    }

    let mut guard = RenderThreadGuard {
        shared,
        window,
        backend,
    };

    loop {
        match next_work(shared) {
            Work::Sync(job) => {
                let begin = Instant::now();
                job();
                let execute_ms = elapsed_ms(begin);

                let mut state = shared.state.lock();
                state.counters.last_execute_ms = execute_ms;
                state.sync_completed = true;
                shared.sync_done.notify_all();
            }
            Work::Frame { packet, present } => {
                let execute_ms = packet.as_ref().map(|(_, packet)| {
                    let begin = Instant::now();
                    packet.execute();
                    elapsed_ms(begin)
                });
                let present_ms = present.then(|| {
                    let begin = Instant::now();
                    guard.backend.render_thread_present(window);
                    elapsed_ms(begin)
                });

                let mut state = shared.state.lock();
                if let Some(execute_ms) = execute_ms {
                    state.counters.last_execute_ms = execute_ms;
                }
                if let Some(present_ms) = present_ms {
                    state.counters.last_present_ms = present_ms;
                    state.counters.presented_frames += 1;
                }
                if let Some((index, mut packet)) = packet {
                    packet.set_submitted(false);
                    state.packets[index] = Some(packet);
                }
                debug!(
                    %window,
                    presented = state.counters.presented_frames,
                    "frame presented"
                );
                shared.present_done.notify_all();
            }
            Work::Stop => break,
        }
    }
}

fn next_work(shared: &Shared) -> Work {
    let mut state = shared.state.lock();
    loop {
        while !state.stopping
            && !state.sync_pending
            && state.pending_packet.is_none()
            && !state.present_pending
        {
            shared.work_ready.wait(&mut state);
        }

        if state.sync_pending {
            state.sync_pending = false;
            if let Some(job) = state.sync_job.take() {
                return Work::Sync(job);
            }
            state.sync_completed = true;
            shared.sync_done.notify_all();
            continue;
        }

        if state.pending_packet.is_some() || state.present_pending {
            let index = state.pending_packet.take();
            let packet = index.and_then(|i| state.packets[i].take().map(|packet| (i, packet)));
            let present = std::mem::take(&mut state.present_pending);
            return Work::Frame { packet, present };
        }

        return Work::Stop;
    }
}
