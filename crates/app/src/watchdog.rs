//! Selection timeout

use crossbeam_channel::{after, bounded, select, Sender};
use overlay::CancellationToken;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Cancels `token` unless dropped before `timeout` elapses
pub struct Watchdog {
    done: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    pub fn arm(timeout: Duration, token: CancellationToken) -> Self {
        let (done_tx, done_rx) = bounded::<()>(1);

        let handle = thread::spawn(move || {
            select! {
                recv(done_rx) -> _ => {}
                recv(after(timeout)) -> _ => {
                    log::warn!("No selection after {}s, giving up", timeout.as_secs());
                    token.cancel();
                }
            }
        });

        Self {
            done: Some(done_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        // Disconnecting the channel wakes the thread too
        drop(self.done.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Watchdog thread panicked");
            }
        }
    }
}
