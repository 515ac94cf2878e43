use async_trait::async_trait;
use tokio::sync::Mutex;

/// Destructive-action confirmation capability. Front ends supply the
/// actual dialog; the session only sees "asked, answered".
#[async_trait]
pub trait ConfirmDelete: Send + Sync {
    async fn confirm(&self, message: &str) -> anyhow::Result<bool>;
}

/// Wraps a confirmer with the single-instance invariant: only one
/// confirmation dialog may be active at a time. A second request waits
/// for the first to resolve instead of stacking overlays.
pub struct DialogGate {
    inner: Box<dyn ConfirmDelete>,
    gate: Mutex<()>,
}

impl DialogGate {
    pub fn new(inner: Box<dyn ConfirmDelete>) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }

    pub async fn confirm(&self, message: &str) -> anyhow::Result<bool> {
        let _guard = self.gate.lock().await;
        self.inner.confirm(message).await
    }
}

/// Fixed-answer confirmer for scripted use (`--yes`) and tests.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmDelete for AutoConfirm {
    async fn confirm(&self, _message: &str) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}
