use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{FlagKind, FlagState};
use crate::config::FlagSettings;
use crate::pipeline::advisory::AdvisoryQueue;
use crate::pipeline::RunState;

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagEvent {
    Set(FlagKind),
    Label(String),
}

/// Fired when both flags become active together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeEvent {
    pub label: Option<String>,
    pub at: Instant,
}

/// Producer side of the monitor. Posting never blocks; events are dropped
/// with a warning if the monitor is falling behind.
#[derive(Clone, Debug)]
pub struct FlagMonitorHandle {
    event_tx: mpsc::Sender<FlagEvent>,
}

impl FlagMonitorHandle {
    /// A handle wired to a bare receiver instead of a running monitor.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<FlagEvent>) {
        let (event_tx, event_rx) = mpsc::channel(buffer);
        (Self { event_tx }, event_rx)
    }

    pub fn notify(&self, kind: FlagKind) {
        self.post(FlagEvent::Set(kind));
    }

    pub fn report_label(&self, label: impl Into<String>) {
        self.post(FlagEvent::Label(label.into()));
    }

    fn post(&self, event: FlagEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!("Flag monitor is behind, dropping {:?}", event);
            }
            Err(TrySendError::Closed(event)) => {
                debug!("Flag monitor has stopped, dropping {:?}", event);
            }
        }
    }
}

/// Two independently timed flags and the rising-edge detector over their AND.
pub struct FlagMonitor {
    gesture: FlagState,
    detection: FlagState,
    previous_combined: bool,
    last_detected_class: Option<String>,
}

impl FlagMonitor {
    pub fn new(gesture_hold: Duration, detection_hold: Duration) -> Self {
        Self {
            gesture: FlagState::new(gesture_hold),
            detection: FlagState::new(detection_hold),
            previous_combined: false,
            last_detected_class: None,
        }
    }

    pub fn set(&mut self, kind: FlagKind, now: Instant) -> bool {
        let flag = self.flag_mut(kind);
        let hold = flag.hold();
        let activated = flag.set(now);
        if activated {
            info!("{} flag set for {:?}", kind, hold);
        } else {
            debug!("{} flag already active, keeping its first expiry", kind);
        }
        activated
    }

    pub fn report_label(&mut self, label: String) {
        self.last_detected_class = Some(label);
    }

    pub fn is_active(&self, kind: FlagKind, now: Instant) -> bool {
        match kind {
            FlagKind::Gesture => self.gesture.is_active(now),
            FlagKind::Detection => self.detection.is_active(now),
        }
    }

    pub fn last_detected_class(&self) -> Option<&str> {
        self.last_detected_class.as_deref()
    }

    /// Earliest pending expiry across both flags.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.gesture.deadline(), self.detection.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn expire_due(&mut self, now: Instant) {
        for kind in [FlagKind::Gesture, FlagKind::Detection] {
            if self.flag_mut(kind).expire(now) {
                info!("{} flag ended", kind);
            }
        }
    }

    /// Samples both flags; returns an event only when their AND goes from
    /// false to true since the previous tick.
    pub fn tick(&mut self, now: Instant) -> Option<CompositeEvent> {
        let combined = self.gesture.is_active(now) && self.detection.is_active(now);
        let rising = combined && !self.previous_combined;
        self.previous_combined = combined;
        if !rising {
            return None;
        }
        Some(CompositeEvent {
            label: self.last_detected_class.clone(),
            at: now,
        })
    }

    fn flag_mut(&mut self, kind: FlagKind) -> &mut FlagState {
        match kind {
            FlagKind::Gesture => &mut self.gesture,
            FlagKind::Detection => &mut self.detection,
        }
    }
}

/// Runs a [`FlagMonitor`] as its own task: applies producer events, expires
/// flags on their deadlines and turns composite edges into priority advisories.
pub struct FlagMonitorTask {
    monitor: FlagMonitor,
    event_rx: mpsc::Receiver<FlagEvent>,
    advisories: Arc<AdvisoryQueue>,
    tick: Duration,
    run_state: RunState,
}

pub fn flag_monitor(
    settings: &FlagSettings,
    advisories: Arc<AdvisoryQueue>,
    run_state: RunState,
) -> (FlagMonitorTask, FlagMonitorHandle) {
    let (handle, event_rx) = FlagMonitorHandle::channel(EVENT_BUFFER);
    let task = FlagMonitorTask {
        monitor: FlagMonitor::new(settings.gesture_hold(), settings.detection_hold()),
        event_rx,
        advisories,
        tick: settings.tick(),
        run_state,
    };
    (task, handle)
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}

impl FlagMonitorTask {
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        info!("Flag monitor started");
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.monitor.next_deadline();
            tokio::select! {
                _ = self.run_state.stopped() => break,
                Some(event) = self.event_rx.recv() => self.apply(event),
                _ = sleep_until_deadline(deadline) => self.monitor.expire_due(Instant::now()),
                _ = ticker.tick() => {
                    if let Some(event) = self.monitor.tick(Instant::now()) {
                        self.on_composite(event);
                    }
                }
            }
        }
        info!("Flag monitor stopped");
    }

    fn apply(&mut self, event: FlagEvent) {
        match event {
            FlagEvent::Set(kind) => {
                self.monitor.set(kind, Instant::now());
            }
            FlagEvent::Label(label) => self.monitor.report_label(label),
        }
    }

    fn on_composite(&self, event: CompositeEvent) {
        info!("Catch and detection flags are both active");
        let Some(label) = event.label else {
            debug!("No detected class yet, dropping composite event");
            return;
        };
        if self.advisories.is_priority_busy() {
            debug!("Priority advisory in flight, dropping '{} catch'", label);
            return;
        }
        let outcome = self.advisories.enqueue(format!("{label} catch"), true);
        debug!("Composite advisory for {}: {:?}", label, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_secs(5);

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn joint_rising_edge_fires_once() {
        let t0 = Instant::now();
        let mut monitor = FlagMonitor::new(HOLD, HOLD);
        monitor.report_label("cider".to_string());

        monitor.set(FlagKind::Gesture, t0);
        assert_eq!(monitor.tick(t0 + secs(0.1)), None);

        monitor.set(FlagKind::Detection, t0 + secs(1.0));
        let event = monitor.tick(t0 + secs(1.1)).expect("edge should fire");
        assert_eq!(event.label.as_deref(), Some("cider"));

        // Re-trigger while both stay active: level is high, no new edge.
        assert!(!monitor.set(FlagKind::Detection, t0 + secs(2.0)));
        assert_eq!(monitor.tick(t0 + secs(2.1)), None);
        assert_eq!(monitor.tick(t0 + secs(3.0)), None);
    }

    #[test]
    fn new_edge_after_combined_state_drops() {
        let t0 = Instant::now();
        let mut monitor = FlagMonitor::new(HOLD, Duration::from_secs(2));
        monitor.set(FlagKind::Gesture, t0);
        monitor.set(FlagKind::Detection, t0);
        assert!(monitor.tick(t0 + secs(0.1)).is_some());

        // Detection expires at 2s while the gesture flag holds until 5s.
        monitor.expire_due(t0 + secs(2.0));
        assert_eq!(monitor.tick(t0 + secs(2.1)), None);

        monitor.set(FlagKind::Detection, t0 + secs(3.0));
        assert!(monitor.tick(t0 + secs(3.1)).is_some());
    }

    #[test]
    fn edge_without_label_carries_none() {
        let t0 = Instant::now();
        let mut monitor = FlagMonitor::new(HOLD, HOLD);
        monitor.set(FlagKind::Gesture, t0);
        monitor.set(FlagKind::Detection, t0);
        let event = monitor.tick(t0).expect("edge should fire");
        assert!(event.label.is_none());
    }

    #[test]
    fn next_deadline_is_earliest_expiry() {
        let t0 = Instant::now();
        let mut monitor = FlagMonitor::new(HOLD, Duration::from_secs(2));
        assert_eq!(monitor.next_deadline(), None);
        monitor.set(FlagKind::Gesture, t0);
        monitor.set(FlagKind::Detection, t0 + secs(1.0));
        assert_eq!(monitor.next_deadline(), Some(t0 + secs(3.0)));
        monitor.expire_due(t0 + secs(3.0));
        assert_eq!(monitor.next_deadline(), Some(t0 + HOLD));
    }

    fn start(advisories: &Arc<AdvisoryQueue>) -> (RunState, FlagMonitorHandle, JoinHandle<()>) {
        let run_state = RunState::new();
        let (task, handle) = flag_monitor(
            &FlagSettings::default(),
            advisories.clone(),
            run_state.clone(),
        );
        (run_state, handle, task.spawn())
    }

    #[tokio::test(start_paused = true)]
    async fn composite_edge_enqueues_priority_catch() {
        let advisories = Arc::new(AdvisoryQueue::default());
        advisories.enqueue("Balanced", false);
        let (run_state, handle, task) = start(&advisories);

        handle.report_label("cider");
        handle.notify(FlagKind::Gesture);
        handle.notify(FlagKind::Detection);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(advisories.pending(), vec!["cider catch".to_string()]);

        // Still combined: another detection set must not add a second alert.
        advisories.begin_next();
        advisories.finish_current();
        handle.notify(FlagKind::Detection);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(advisories.is_empty());

        run_state.stop("test finished");
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn flags_expire_on_their_own() {
        let advisories = Arc::new(AdvisoryQueue::default());
        let (run_state, handle, task) = start(&advisories);

        handle.report_label("cider");
        handle.notify(FlagKind::Gesture);
        tokio::time::sleep(Duration::from_secs(6)).await;

        // The gesture flag has lapsed, so detection alone is not a match.
        handle.notify(FlagKind::Detection);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(advisories.is_empty());

        run_state.stop("test finished");
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn composite_dropped_while_priority_is_playing() {
        let advisories = Arc::new(AdvisoryQueue::default());
        advisories.enqueue("water catch", true);
        advisories.begin_next();
        assert!(advisories.is_priority_busy());
        let (run_state, handle, task) = start(&advisories);

        handle.report_label("cider");
        handle.notify(FlagKind::Gesture);
        handle.notify(FlagKind::Detection);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(advisories.is_empty());

        run_state.stop("test finished");
        task.await.unwrap();
    }
}
