use std::sync::Arc;

use async_trait::async_trait;
use seicon_store::ResourceHandle;

/// A live object bound to one engine identifier that displays an icon.
pub trait IconConsumer: Send + Sync {
    /// The identifier this consumer resolves icons for.
    fn identifier(&self) -> &str;

    /// Install a freshly downloaded icon. The consumer takes ownership of the
    /// handle and is responsible for releasing it.
    fn update_icon(&self, handle: ResourceHandle);
}

/// Enumerates the consumers that are alive right now.
#[async_trait]
pub trait ConsumerRegistry: Send + Sync {
    async fn live_consumers(&self) -> Vec<Arc<dyn IconConsumer>>;
}

/// Registry with no consumers, for handlers that only prefetch.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoConsumers;

#[async_trait]
impl ConsumerRegistry for NoConsumers {
    async fn live_consumers(&self) -> Vec<Arc<dyn IconConsumer>> {
        Vec::new()
    }
}
