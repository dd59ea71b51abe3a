use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    /// Set by the gesture producer when a catch gesture starts.
    Gesture,
    /// Set by the detection producer when objects start being detected.
    Detection,
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagKind::Gesture => write!(f, "catch"),
            FlagKind::Detection => write!(f, "detection"),
        }
    }
}

/// A timed boolean: active over `[set_at, set_at + hold)` after each set.
#[derive(Debug, Clone)]
pub struct FlagState {
    active: bool,
    set_at: Option<Instant>,
    hold: Duration,
}

impl FlagState {
    pub fn new(hold: Duration) -> Self {
        Self {
            active: false,
            set_at: None,
            hold,
        }
    }

    /// Activates the flag. A set while already active is ignored, so the
    /// first set decides when the flag expires.
    pub fn set(&mut self, now: Instant) -> bool {
        if self.is_active(now) {
            return false;
        }
        self.active = true;
        self.set_at = Some(now);
        true
    }

    pub fn is_active(&self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) => now < deadline,
            None => false,
        }
    }

    /// When the current activation ends, if the flag is active.
    pub fn deadline(&self) -> Option<Instant> {
        if !self.active {
            return None;
        }
        self.set_at.map(|set_at| set_at + self.hold)
    }

    /// Clears an activation whose hold has run out. Returns true on the
    /// active → idle transition.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if deadline <= now => {
                self.active = false;
                true
            }
            _ => false,
        }
    }

    pub fn hold(&self) -> Duration {
        self.hold
    }
}
