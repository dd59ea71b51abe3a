use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A cooldown that releases itself: once engaged, a spawned timer clears it
/// after `hold`. Must be engaged from within a tokio runtime.
#[derive(Clone, Debug)]
pub struct TimedLatch {
    engaged: Arc<AtomicBool>,
    hold: Duration,
}

impl TimedLatch {
    pub fn new(hold: Duration) -> Self {
        Self {
            engaged: Arc::new(AtomicBool::new(false)),
            hold,
        }
    }

    /// Engages the latch and schedules its release. Returns false when the
    /// latch was already engaged.
    pub fn try_engage(&self) -> bool {
        if self
            .engaged
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let engaged = self.engaged.clone();
        let hold = self.hold;
        tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            engaged.store(false, Ordering::Release);
        });
        true
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn latch_releases_after_hold() {
        let latch = TimedLatch::new(Duration::from_secs(5));
        assert!(latch.try_engage());
        assert!(!latch.try_engage());

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert!(latch.is_engaged());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!latch.is_engaged());
        assert!(latch.try_engage());
    }
}
