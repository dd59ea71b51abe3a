use tokio_util::sync::CancellationToken;

/// Process-wide "keep running" signal shared by every task.
///
/// Stopping is advisory: tasks observe it at their next suspension point and
/// finish the unit of work they are in before exiting.
#[derive(Clone, Debug, Default)]
pub struct RunState {
    token: CancellationToken,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Requests shutdown. Idempotent; the first caller wins and is logged.
    pub fn stop(&self, reason: &str) {
        if self.is_running() {
            tracing::info!("Stopping pipeline: {}", reason);
        }
        self.token.cancel();
    }

    /// Resolves once `stop` has been called by anyone.
    pub async fn stopped(&self) {
        self.token.cancelled().await
    }
}
