use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Receives the number of successfully completed units of a batch.
///
/// `completed` never decreases within one batch. It counts successes only,
/// so it can stop short of `total`.
pub trait ProgressObserver {
    fn on_progress(&self, completed: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize),
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

/// Forwards progress counts to a reporter task over an unbounded channel.
pub struct ChannelProgress {
    tx: UnboundedSender<(usize, usize)>,
}

impl ChannelProgress {
    pub fn new() -> (Self, UnboundedReceiver<(usize, usize)>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        // the reporter may already be gone
        let _ = self.tx.send((completed, total));
    }
}

/// Spawn a task that calls `report` for every new count seen on `rx`.
///
/// The task drains `rx` and finishes once every sender is dropped, so
/// awaiting the handle after dropping the [`ChannelProgress`] reports the
/// final count. Aborting the handle stops it early.
pub fn spawn_reporter<F>(mut rx: UnboundedReceiver<(usize, usize)>, mut report: F) -> JoinHandle<()>
where
    F: FnMut(usize, usize) + Send + 'static,
{
    tokio::spawn(async move {
        let mut last = 0usize;
        while let Some((completed, total)) = rx.recv().await {
            if completed != last {
                report(completed, total);
                last = completed;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn reporter_skips_repeated_counts_and_can_be_aborted() {
        let (progress, rx) = ChannelProgress::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = spawn_reporter(rx, move |done, total| {
            sink.lock().unwrap().push((done, total));
        });
        progress.on_progress(1, 3);
        progress.on_progress(1, 3);
        progress.on_progress(2, 3);
        tokio::task::yield_now().await;
        while seen.lock().unwrap().len() < 2 {
            tokio::task::yield_now().await;
        }
        handle.abort();
        let result = handle.await;
        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3)]);
    }

    #[tokio::test]
    async fn reporter_drains_queued_counts_after_the_sender_is_dropped() {
        let (progress, rx) = ChannelProgress::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = spawn_reporter(rx, move |done, total| {
            sink.lock().unwrap().push((done, total));
        });
        progress.on_progress(1, 3);
        progress.on_progress(2, 3);
        progress.on_progress(3, 3);
        drop(progress);
        handle.await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn closures_are_observers() {
        let calls = Mutex::new(Vec::new());
        let observer = |done: usize, total: usize| calls.lock().unwrap().push((done, total));
        observer.on_progress(1, 2);
        assert_eq!(*calls.lock().unwrap(), vec![(1, 2)]);
        NoProgress.on_progress(5, 5);
    }
}
