use tokio::sync::watch;

use crate::common::Frame;

/// Single-slot, overwrite-on-write holder of the most recent frame.
///
/// One producer publishes, any number of readers look at whatever is newest.
/// Nothing is buffered: a slow reader skips frames, and a reader that polls
/// `latest` faster than frames arrive sees the same frame again.
#[derive(Clone)]
pub struct FrameHub {
    slot: watch::Sender<Option<Frame>>,
}

impl FrameHub {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    /// Replaces the slot unconditionally. Never waits on readers.
    pub fn publish(&self, frame: Frame) {
        self.slot.send_replace(Some(frame));
    }

    pub fn latest(&self) -> Option<Frame> {
        self.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> FrameSubscriber {
        FrameSubscriber {
            slot: self.slot.subscribe(),
        }
    }
}

impl Default for FrameHub {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FrameSubscriber {
    slot: watch::Receiver<Option<Frame>>,
}

impl FrameSubscriber {
    /// Waits until a frame this subscriber has not seen yet is published and
    /// returns the newest one. Returns `None` once the hub has been dropped.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            self.slot.changed().await.ok()?;
            if let Some(frame) = self.slot.borrow_and_update().clone() {
                return Some(frame);
            }
        }
    }
}
