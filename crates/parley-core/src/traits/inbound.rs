use async_trait::async_trait;

use crate::models::DirectMessage;

/// Receives inbound events after the router resolved the owning identity.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn on_direct_message(&self, identity_id: &str, message: DirectMessage);

    /// New activity is available in `group_id`; the handler pulls it.
    async fn on_group_activity(&self, identity_id: &str, group_id: &str);
}
