//! Published status channel.
//!
//! The pipeline writes the current `MonitoringStatus` here; UI layers read it
//! through a `StatusHandle` or get pushed updates through an observer. Only
//! the latest value is kept.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::status::MonitoringStatus;

/// Rendered before the first status arrives.
pub const PENDING_STATUS: &str = "...";

type Observer = Box<dyn FnMut(MonitoringStatus) + Send>;

struct Shared {
    current: Option<MonitoringStatus>,
    updates: u64,
    closed: bool,
    observers: Vec<Observer>,
}

/// Write side of the status channel. Owned by the pipeline coordinator.
pub struct StatusPublisher {
    shared: Arc<Mutex<Shared>>,
}

/// Cloneable read side of the status channel.
#[derive(Clone)]
pub struct StatusHandle {
    shared: Arc<Mutex<Shared>>,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    // Every write leaves the status consistent, so a poisoned lock is still usable.
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                current: None,
                updates: 0,
                closed: false,
                observers: Vec::new(),
            })),
        }
    }

    pub fn handle(&self) -> StatusHandle {
        StatusHandle {
            shared: self.shared.clone(),
        }
    }

    /// Register a callback invoked with every published status.
    pub fn on_update<F>(&self, observer: F)
    where
        F: FnMut(MonitoringStatus) + Send + 'static,
    {
        lock(&self.shared).observers.push(Box::new(observer));
    }

    /// Overwrite the current status. Returns false once the channel is closed.
    ///
    /// Observers run after the lock is released, so they may read a
    /// `StatusHandle` for this channel.
    pub fn publish(&self, status: MonitoringStatus) -> bool {
        let mut observers = {
            let mut shared = lock(&self.shared);
            if shared.closed {
                return false;
            }
            if shared.current != Some(status) {
                log::info!("monitoring status: {}", status);
            }
            shared.current = Some(status);
            shared.updates += 1;
            std::mem::take(&mut shared.observers)
        };
        for observer in observers.iter_mut() {
            observer(status);
        }
        let mut shared = lock(&self.shared);
        if !shared.closed {
            // Keep registration order; observers added during the callbacks go last.
            observers.append(&mut shared.observers);
            shared.observers = observers;
        }
        true
    }

    /// Stop accepting updates and drop observers. The last status stays readable.
    pub fn close(&self) {
        let mut shared = lock(&self.shared);
        shared.closed = true;
        shared.observers.clear();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusHandle {
    pub fn current(&self) -> Option<MonitoringStatus> {
        lock(&self.shared).current
    }

    /// Number of statuses published so far.
    pub fn updates(&self) -> u64 {
        lock(&self.shared).updates
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared).closed
    }

    /// Display text for the current status.
    pub fn render(&self) -> String {
        match self.current() {
            Some(status) => status.to_string(),
            None => PENDING_STATUS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_renders_pending_before_first_status() {
        let publisher = StatusPublisher::new();
        let handle = publisher.handle();
        assert_eq!(handle.render(), "...");
        assert_eq!(handle.updates(), 0);

        publisher.publish(MonitoringStatus::FaceDetected);
        assert_eq!(handle.render(), "Face detected");
        assert_eq!(handle.updates(), 1);
    }

    #[test]
    fn every_publish_overwrites_and_notifies() {
        let publisher = StatusPublisher::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        publisher.on_update(move |status| sink.lock().unwrap().push(status));

        publisher.publish(MonitoringStatus::FaceDetected);
        publisher.publish(MonitoringStatus::FaceDetected);
        publisher.publish(MonitoringStatus::LookingLeft);

        assert_eq!(publisher.handle().current(), Some(MonitoringStatus::LookingLeft));
        assert_eq!(publisher.handle().updates(), 3);
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn observer_can_read_its_own_handle() {
        let publisher = StatusPublisher::new();
        let handle = publisher.handle();
        let rendered = Arc::new(Mutex::new(Vec::new()));
        let sink = rendered.clone();
        let reader = handle.clone();
        publisher.on_update(move |_| {
            sink.lock()
                .unwrap()
                .push((reader.render(), reader.updates()));
        });

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let worker = std::thread::spawn(move || {
            publisher.publish(MonitoringStatus::FaceDetected);
            publisher.publish(MonitoringStatus::LookingRight);
            let _ = done_tx.send(());
        });
        done_rx
            .recv_timeout(std::time::Duration::from_secs(2))
            .expect("publish returned while observer read the handle");
        worker.join().unwrap();

        assert_eq!(
            *rendered.lock().unwrap(),
            vec![
                ("Face detected".to_string(), 1),
                ("Looking right - possible cheating".to_string(), 2),
            ]
        );
    }

    #[test]
    fn observer_registered_during_publish_is_kept() {
        let publisher = Arc::new(StatusPublisher::new());
        let late_calls = Arc::new(Mutex::new(0u32));
        let registrar = publisher.clone();
        let counter = late_calls.clone();
        let mut registered = false;
        publisher.on_update(move |_| {
            if !registered {
                registered = true;
                let counter = counter.clone();
                registrar.on_update(move |_| *counter.lock().unwrap() += 1);
            }
        });

        publisher.publish(MonitoringStatus::FaceDetected);
        publisher.publish(MonitoringStatus::FaceDetected);
        assert_eq!(*late_calls.lock().unwrap(), 1);
    }

    #[test]
    fn closed_channel_ignores_updates() {
        let publisher = StatusPublisher::new();
        let handle = publisher.handle();
        let calls = Arc::new(Mutex::new(0u32));
        let counter = calls.clone();
        publisher.on_update(move |_| *counter.lock().unwrap() += 1);

        assert!(publisher.publish(MonitoringStatus::FaceNotDetected));
        publisher.close();
        assert!(!publisher.publish(MonitoringStatus::MultipleFaces));

        assert_eq!(handle.current(), Some(MonitoringStatus::FaceNotDetected));
        assert_eq!(handle.updates(), 1);
        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(handle.is_closed());
    }
}
