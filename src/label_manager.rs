//! Resolution of the "already answered" label
use crate::client::MailClient;
use crate::error::Result;
use crate::models::LabelInfo;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Finds a label by name, creating it when the mailbox does not have it yet.
///
/// Nothing is cached: every call lists the mailbox's labels again.
pub struct LabelManager {
    client: Arc<dyn MailClient>,
}

impl LabelManager {
    pub fn new(client: Arc<dyn MailClient>) -> Self {
        Self { client }
    }

    /// Look up `name` (exact match, first wins) or create it.
    ///
    /// # Returns
    /// * `Ok(Some(label))` - existing or newly created label
    /// * `Ok(None)` - the label was missing and could not be created; the
    ///   failure has been logged and callers skip labeling
    /// * `Err(GmailError)` - listing the labels failed
    pub async fn resolve(&self, name: &str) -> Result<Option<LabelInfo>> {
        let labels = self.client.list_labels().await?;

        if let Some(label) = labels.into_iter().find(|label| label.name == name) {
            debug!("Label '{}' exists with ID {}", name, label.id);
            return Ok(Some(label));
        }

        match self.client.create_label(name).await {
            Ok(label) => {
                info!("Created label '{}' with ID: {}", name, label.id);
                Ok(Some(label))
            }
            Err(e) => {
                error!("Error creating label '{}': {}", name, e);
                Ok(None)
            }
        }
    }
}
