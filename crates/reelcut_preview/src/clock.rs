use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One frame of the transport clock, tagged with the run it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub epoch: u64,
}

/// Cancellable frame clock. Each `start` opens a new epoch; `stop` aborts the
/// task and closes the epoch, so ticks already queued are recognisably stale.
#[derive(Debug)]
pub struct FrameClock {
    period: Duration,
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

impl FrameClock {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            period: Duration::from_secs(1) / frame_rate.max(1),
            epoch: 0,
            task: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Whether `tick` was emitted by the clock's current run.
    pub fn is_current(&self, tick: Tick) -> bool {
        self.task.is_some() && tick.epoch == self.epoch
    }

    /// Start emitting ticks into `tx`. Must be called inside a tokio runtime.
    pub fn start(&mut self, tx: UnboundedSender<Tick>) {
        self.stop();
        self.epoch += 1;
        let epoch = self.epoch;
        let period = self.period;
        self.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(Tick { epoch }).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!(epoch, "Frame clock started");
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.epoch += 1;
            tracing::debug!(epoch = self.epoch, "Frame clock stopped");
        }
    }
}

impl Drop for FrameClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn period_from_rate() {
        assert_eq!(FrameClock::new(60).period(), Duration::from_secs(1) / 60);
        assert_eq!(FrameClock::new(0).period(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn emits_current_ticks() {
        let mut clock = FrameClock::new(120);
        let (tx, mut rx) = mpsc::unbounded_channel();
        clock.start(tx);

        let tick = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(clock.is_current(tick));
        clock.stop();
    }

    #[tokio::test]
    async fn ticks_are_stale_after_stop() {
        let mut clock = FrameClock::new(120);
        let (tx, mut rx) = mpsc::unbounded_channel();
        clock.start(tx.clone());
        let tick = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();

        clock.stop();
        assert!(!clock.is_running());
        assert!(!clock.is_current(tick));

        clock.start(tx);
        assert!(!clock.is_current(tick));
        clock.stop();
    }
}
