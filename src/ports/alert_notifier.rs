//! AlertNotifier port - operator notifications for capacity events.

use async_trait::async_trait;

/// Fire-and-forget operator alerts. Implementations must never let a failed
/// alert fail the request that raised it.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Raised when an analysis provider reports overload.
    async fn notify_overload(&self, service: &str, detail: &str);
}
