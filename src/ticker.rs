use std::{
    sync::{Arc, Mutex, Weak, mpsc},
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;

use crate::{anim::FrameClock, error::StageResult};

/// Fixed sleep quantum between ticker passes. Shorter than the fastest
/// expected animation interval, so a frame can slip by at most one quantum.
pub(crate) const TICK_QUANTUM: Duration = Duration::from_millis(15);

/// Background thread that advances every live animation clock.
///
/// Animations register a weak reference to their clock; releasing an
/// animation drops the owning `Arc`, and the ticker prunes the dead entry on
/// its next pass. The thread is joined on `stop`, so it can never outlive
/// the stage that spawned it.
pub(crate) struct AnimationTicker {
    clocks: Arc<Mutex<Vec<Weak<FrameClock>>>>,
    epoch: Instant,
    stop_tx: Option<mpsc::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl AnimationTicker {
    pub(crate) fn spawn(quantum: Duration) -> StageResult<Self> {
        let clocks: Arc<Mutex<Vec<Weak<FrameClock>>>> = Arc::new(Mutex::new(Vec::new()));
        let epoch = Instant::now();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let thread_clocks = Arc::clone(&clocks);
        let thread = thread::Builder::new()
            .name("pixelstage-ticker".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(quantum) {
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                        Err(mpsc::RecvTimeoutError::Timeout) => {}
                    }

                    // capture the time once per pass
                    let now_ms = epoch.elapsed().as_millis() as u64;
                    let mut clocks = lock_clocks(&thread_clocks);
                    clocks.retain(|weak| match weak.upgrade() {
                        Some(clock) => {
                            clock.tick(now_ms);
                            true
                        }
                        None => false,
                    });
                }
            })
            .context("spawn animation ticker thread")?;

        tracing::debug!(quantum_ms = quantum.as_millis() as u64, "animation ticker started");

        Ok(Self {
            clocks,
            epoch,
            stop_tx: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Milliseconds since the ticker's epoch; the timebase for all clocks.
    pub(crate) fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub(crate) fn register(&self, clock: &Arc<FrameClock>) {
        lock_clocks(&self.clocks).push(Arc::downgrade(clock));
    }

    /// Signal the thread and wait for it to exit. Idempotent.
    pub(crate) fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
            tracing::debug!("animation ticker stopped");
        }
    }
}

impl Drop for AnimationTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_clocks(
    clocks: &Mutex<Vec<Weak<FrameClock>>>,
) -> std::sync::MutexGuard<'_, Vec<Weak<FrameClock>>> {
    // the ticker holds the lock only to walk the list; a poisoned lock just
    // means another pass panicked mid-walk, and the list is still usable
    clocks.lock().unwrap_or_else(|e| e.into_inner())
}
