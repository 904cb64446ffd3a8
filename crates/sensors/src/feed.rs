//! Background samplers publishing into most-recent-value feeds
//!
//! Each feed has exactly one writer (the sampler thread or task) and any
//! number of readers. Readers always see a whole value, possibly stale.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

/// Reader side of a sampler; dropping it stops the sampler
pub struct SamplerHandle<T> {
    receiver: watch::Receiver<T>,
    shutdown: Arc<AtomicBool>,
}

impl<T: Clone> SamplerHandle<T> {
    pub(crate) fn new(receiver: watch::Receiver<T>, shutdown: Arc<AtomicBool>) -> Self {
        Self { receiver, shutdown }
    }

    /// Most recently published value
    pub fn latest(&self) -> T {
        self.receiver.borrow().clone()
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

impl<T> Drop for SamplerHandle<T> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

/// Spawns polling threads for blocking sensor drivers
pub struct SamplerService;

impl SamplerService {
    /// Poll `read` every `interval` on a dedicated thread
    ///
    /// `read` returns `None` when the device has nothing usable; that is
    /// published too, so readers never act on a value older than one poll.
    pub fn spawn<T, F>(name: &str, interval: Duration, initial: T, mut read: F) -> SamplerHandle<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut() -> T + Send + 'static,
    {
        let (tx, rx) = watch::channel(initial);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let name = name.to_string();

        info!("Starting {} sampler every {:?}", name, interval);
        std::thread::spawn(move || {
            while !shutdown_clone.load(Ordering::SeqCst) {
                let value = read();
                if tx.send(value).is_err() {
                    debug!("{} sampler receiver dropped", name);
                    break;
                }
                std::thread::sleep(interval);
            }
            debug!("{} sampler stopped", name);
        });

        SamplerHandle::new(rx, shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_latest_value_published() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let handle = SamplerService::spawn("test", Duration::from_millis(1), None, move || {
            Some(c.fetch_add(1, Ordering::SeqCst) + 1)
        });

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while handle.latest().is_none() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(handle.latest().unwrap() >= 1);
    }

    #[test]
    fn test_stop_halts_polling() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let handle = SamplerService::spawn("test", Duration::from_millis(1), 0u32, move || {
            c.fetch_add(1, Ordering::SeqCst)
        });
        std::thread::sleep(Duration::from_millis(20));
        handle.stop();
        std::thread::sleep(Duration::from_millis(20));
        let after_stop = counter.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(counter.load(Ordering::SeqCst), after_stop);
    }
}
