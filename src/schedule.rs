use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Handle to a running periodic schedule
///
/// Cancelling is idempotent and dropping the handle cancels too, so a schedule
/// never outlives its owner.
#[derive(Debug, Default)]
pub struct ScheduleHandle {
    task: Option<JoinHandle<()>>,
}

impl ScheduleHandle {
    /// A handle with nothing scheduled
    pub fn inactive() -> Self {
        Self { task: None }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for ScheduleHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Send `message` on `tx` once per `period`, first delivery one period from now
///
/// The schedule ends by itself once the receiving side is gone.
pub fn every<T>(period: Duration, tx: mpsc::UnboundedSender<T>, message: T) -> ScheduleHandle
where
    T: Clone + Send + 'static,
{
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if tx.send(message.clone()).is_err() {
                tracing::debug!("Schedule receiver gone, stopping");
                break;
            }
        }
    });

    ScheduleHandle { task: Some(task) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<u32>) -> usize {
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = every(Duration::from_secs(1), tx, 7u32);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(drain(&mut rx), 0);

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(drain(&mut rx), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_idempotent_and_stops_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut handle = every(Duration::from_millis(500), tx, 1u32);

        tokio::time::sleep(Duration::from_millis(1250)).await;
        assert_eq!(drain(&mut rx), 2);
        assert!(handle.is_active());

        handle.cancel();
        handle.cancel();
        assert!(!handle.is_active());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(drain(&mut rx), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        drop(every(Duration::from_secs(1), tx, 1u32));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(drain(&mut rx), 0);
    }

    #[test]
    fn test_inactive_handle() {
        let mut handle = ScheduleHandle::inactive();
        assert!(!handle.is_active());
        handle.cancel();
    }
}
