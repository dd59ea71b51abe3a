use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indexmap::IndexMap;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use crate::config::AdvisorySettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryMessage {
    pub text: String,
    pub priority: bool,
    pub created_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Accepted,
    /// The same text is already waiting in the queue.
    Duplicate,
    /// A message of the rate-limited category was accepted too recently.
    RateLimited,
    /// Empty text.
    Rejected,
}

impl EnqueueOutcome {
    pub fn is_accepted(self) -> bool {
        self == EnqueueOutcome::Accepted
    }
}

#[derive(Debug, Clone)]
pub struct AdvisoryPolicy {
    pub rate_limited_category: String,
    pub rate_limit: Duration,
}

impl Default for AdvisoryPolicy {
    fn default() -> Self {
        Self::from(&AdvisorySettings::default())
    }
}

impl From<&AdvisorySettings> for AdvisoryPolicy {
    fn from(settings: &AdvisorySettings) -> Self {
        Self {
            rate_limited_category: settings.rate_limited_category.clone(),
            rate_limit: settings.rate_limit(),
        }
    }
}

#[derive(Default)]
struct QueueState {
    // Keyed by text, which gives dedup for free; insertion order is playback order.
    pending: IndexMap<String, AdvisoryMessage>,
    playing: Option<AdvisoryMessage>,
    last_category_accept: Option<Instant>,
}

/// Priority, dedup and rate-limited queue of spoken advisories.
///
/// Any producer may enqueue; exactly one [`SpeechWorker`](super::SpeechWorker)
/// drains it. Every operation takes the lock once and never holds it across
/// an await.
pub struct AdvisoryQueue {
    state: Mutex<QueueState>,
    wake: Notify,
    policy: AdvisoryPolicy,
}

impl AdvisoryQueue {
    pub fn new(policy: AdvisoryPolicy) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            wake: Notify::new(),
            policy,
        }
    }

    pub fn enqueue(&self, text: impl Into<String>, priority: bool) -> EnqueueOutcome {
        let text = text.into();
        if text.trim().is_empty() {
            debug!("Ignoring empty advisory");
            return EnqueueOutcome::Rejected;
        }

        let now = Instant::now();
        let message = AdvisoryMessage {
            text: text.clone(),
            priority,
            created_at: now,
        };

        {
            let mut state = self.lock();
            if priority {
                // Preempts everything still waiting; the current utterance plays on.
                let dropped = state.pending.len();
                state.pending.clear();
                state.pending.insert(text.clone(), message);
                debug!("Priority advisory '{}' replaced {} pending", text, dropped);
            } else {
                if state.pending.contains_key(&text) {
                    return EnqueueOutcome::Duplicate;
                }
                if self.is_rate_limited(&text) {
                    let within_window = state
                        .last_category_accept
                        .map(|last| now.duration_since(last) < self.policy.rate_limit)
                        .unwrap_or(false);
                    if within_window {
                        return EnqueueOutcome::RateLimited;
                    }
                    state.last_category_accept = Some(now);
                }
                state.pending.insert(text, message);
            }
        }

        self.wake.notify_one();
        EnqueueOutcome::Accepted
    }

    /// Texts waiting to be spoken, front first. Excludes the one playing.
    pub fn pending(&self) -> Vec<String> {
        self.lock().pending.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// True while an utterance is being spoken.
    pub fn is_busy(&self) -> bool {
        self.lock().playing.is_some()
    }

    pub fn is_priority_busy(&self) -> bool {
        self.lock()
            .playing
            .as_ref()
            .map(|message| message.priority)
            .unwrap_or(false)
    }

    pub fn now_playing(&self) -> Option<String> {
        self.lock()
            .playing
            .as_ref()
            .map(|message| message.text.clone())
    }

    /// Pops the front message and marks it as playing.
    pub(crate) fn begin_next(&self) -> Option<AdvisoryMessage> {
        let mut state = self.lock();
        let (_, message) = state.pending.shift_remove_index(0)?;
        state.playing = Some(message.clone());
        Some(message)
    }

    pub(crate) fn finish_current(&self) {
        self.lock().playing = None;
    }

    pub(crate) async fn wait_for_message(&self) {
        self.wake.notified().await
    }

    fn is_rate_limited(&self, text: &str) -> bool {
        !self.policy.rate_limited_category.is_empty()
            && text.contains(self.policy.rate_limited_category.as_str())
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // The state stays consistent even if a holder panicked; every
        // critical section is a handful of map operations.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for AdvisoryQueue {
    fn default() -> Self {
        Self::new(AdvisoryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_rejected() {
        let queue = AdvisoryQueue::default();
        assert_eq!(queue.enqueue("", false), EnqueueOutcome::Rejected);
        assert_eq!(queue.enqueue("   ", true), EnqueueOutcome::Rejected);
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicate_text_is_queued_once() {
        let queue = AdvisoryQueue::default();
        assert_eq!(queue.enqueue("Balanced", false), EnqueueOutcome::Accepted);
        assert_eq!(queue.enqueue("Balanced", false), EnqueueOutcome::Duplicate);
        assert_eq!(queue.pending(), vec!["Balanced".to_string()]);
    }

    #[test]
    fn text_can_be_queued_again_once_taken() {
        let queue = AdvisoryQueue::default();
        queue.enqueue("Balanced", false);
        let taken = queue.begin_next().map(|m| m.text);
        assert_eq!(taken.as_deref(), Some("Balanced"));
        assert_eq!(queue.enqueue("Balanced", false), EnqueueOutcome::Accepted);
    }

    #[test]
    fn messages_play_in_fifo_order() {
        let queue = AdvisoryQueue::default();
        queue.enqueue("first", false);
        queue.enqueue("second", false);
        assert_eq!(queue.begin_next().map(|m| m.text).as_deref(), Some("first"));
        assert_eq!(queue.now_playing().as_deref(), Some("first"));
        queue.finish_current();
        assert_eq!(queue.begin_next().map(|m| m.text).as_deref(), Some("second"));
    }

    #[test]
    fn priority_purges_pending_messages() {
        let queue = AdvisoryQueue::default();
        queue.enqueue("A", false);
        queue.enqueue("B", false);
        assert_eq!(queue.enqueue("C", true), EnqueueOutcome::Accepted);
        assert_eq!(queue.pending(), vec!["C".to_string()]);
    }

    #[test]
    fn priority_leaves_current_utterance_alone() {
        let queue = AdvisoryQueue::default();
        queue.enqueue("A", false);
        queue.enqueue("B", false);
        let playing = queue.begin_next().expect("A should be taken");
        assert_eq!(playing.text, "A");

        queue.enqueue("C", true);
        assert_eq!(queue.now_playing().as_deref(), Some("A"));
        assert!(queue.is_busy());
        assert!(!queue.is_priority_busy());
        assert_eq!(queue.pending(), vec!["C".to_string()]);

        queue.finish_current();
        let next = queue.begin_next().expect("C should follow");
        assert!(next.priority);
        assert!(queue.is_priority_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn avoid_category_is_rate_limited() {
        let queue = AdvisoryQueue::default();
        assert!(queue.enqueue("Avoid to Left", false).is_accepted());
        queue.begin_next();
        queue.finish_current();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(
            queue.enqueue("Avoid to Left", false),
            EnqueueOutcome::RateLimited
        );
        // The limit covers the whole category, not just identical text.
        assert_eq!(
            queue.enqueue("Avoid to Right", false),
            EnqueueOutcome::RateLimited
        );
        // Other advisories are unaffected.
        assert!(queue.enqueue("Balanced", false).is_accepted());
    }

    #[tokio::test(start_paused = true)]
    async fn avoid_category_accepted_after_window() {
        let queue = AdvisoryQueue::default();
        assert!(queue.enqueue("Avoid to Left", false).is_accepted());
        queue.begin_next();
        queue.finish_current();

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(queue.enqueue("Avoid to Left", false).is_accepted());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_messages_do_not_restart_the_window() {
        let queue = AdvisoryQueue::default();
        assert!(queue.enqueue("Avoid to Left", false).is_accepted());
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(
            queue.enqueue("Avoid to Right", false),
            EnqueueOutcome::RateLimited
        );
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(queue.enqueue("Avoid to Right", false).is_accepted());
    }
}
