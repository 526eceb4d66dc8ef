use async_trait::async_trait;

use hookrelay_core::error::Result;

use super::dispatcher::{Contact, MessageTransport};

/// Emits every delivery as a tracing event. Stands in for a chat runtime
/// when the gateway runs on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTransport;

#[async_trait]
impl MessageTransport for LogTransport {
    async fn send(&self, self_id: &str, contact: &Contact, message: &str) -> Result<()> {
        tracing::info!(
            self_id,
            scene = contact.scene.as_str(),
            peer = %contact.peer,
            chars = message.chars().count(),
            "message delivered"
        );
        tracing::debug!(%message, "message body");
        Ok(())
    }
}
