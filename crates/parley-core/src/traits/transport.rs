use async_trait::async_trait;

use crate::errors::TransportError;
use crate::models::{Aid, GroupMessage};

/// Network transport bound to one identity.
///
/// Delivery and ordering guarantees are the implementation's concern.
/// Status changes are reported back through the engine's status entry point.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Send a one-to-one message. `session_id` is echoed to the peer when set.
    async fn send(
        &self,
        target: &Aid,
        session_id: Option<&str>,
        content: &str,
    ) -> Result<(), TransportError>;

    async fn send_group(&self, group_id: &str, content: &str) -> Result<(), TransportError>;

    /// Messages with `msg_id > after_id`, in any order.
    async fn pull_group_messages(
        &self,
        group_id: &str,
        after_id: u64,
    ) -> Result<Vec<GroupMessage>, TransportError>;
}
