//! Reply decision, composition and delivery for a single message

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::client::MailClient;
use crate::config::ResponderConfig;
use crate::error::Result;
use crate::label_manager::LabelManager;
use crate::models::{
    MailMessage, OutgoingReply, HEADER_FROM, HEADER_IN_REPLY_TO, HEADER_MESSAGE_ID,
    HEADER_SUBJECT, INBOX_LABEL,
};

/// Line appended to every automated reply
pub const DISCLAIMER: &str = "This reply is automated. Please do not reply back!";

pub const SUBJECT_PREFIX: &str = "Re: ";

/// Marker in front of the quoted original body
pub const QUOTE_PREFIX: &str = "-- ";

/// Why a message was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The message carries `In-Reply-To`, so it is part of a conversation
    AlreadyAReply,
    /// The message was sent by the mailbox owner
    FromOwner,
}

/// Which remote call failed after a reply was due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStage {
    Send,
    Label,
}

impl fmt::Display for DeliveryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStage::Send => write!(f, "send"),
            DeliveryStage::Label => write!(f, "label"),
        }
    }
}

/// Result of processing one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Replied { recipient: String, labeled: bool },
    Skipped(SkipReason),
    /// Send or label failed; already logged
    DeliveryFailed { stage: DeliveryStage, error: String },
}

/// Decide whether `message` should be left unanswered
pub fn skip_reason(message: &MailMessage, owner_address: &str) -> Option<SkipReason> {
    if message.headers.contains(HEADER_IN_REPLY_TO) {
        return Some(SkipReason::AlreadyAReply);
    }
    if message.header(HEADER_FROM) == Some(owner_address) {
        return Some(SkipReason::FromOwner);
    }
    None
}

/// True when the message has no `In-Reply-To` header and is not from the owner
pub fn should_reply(message: &MailMessage, owner_address: &str) -> bool {
    skip_reason(message, owner_address).is_none()
}

/// Build the acknowledgement for `message`.
///
/// Fails with `MalformedMessage` when `From`, `Message-ID`, `Subject` or the
/// first body part is missing.
pub fn compose(message: &MailMessage) -> Result<OutgoingReply> {
    let to = message.require_header(HEADER_FROM)?;
    let subject = message.require_header(HEADER_SUBJECT)?;
    let original_id = message.require_header(HEADER_MESSAGE_ID)?;
    let original_body = message.first_part_text()?;

    Ok(OutgoingReply {
        thread_id: message.thread_id.clone(),
        to: to.to_string(),
        subject: format!("{}{}", SUBJECT_PREFIX, subject),
        in_reply_to: original_id.to_string(),
        references: original_id.to_string(),
        body: format!(
            "{}{}\r\n\r\n{}\r\n",
            QUOTE_PREFIX, original_body, DISCLAIMER
        ),
    })
}

/// Answers unanswered mail once and files it under the reply label
pub struct AutoResponder {
    client: Arc<dyn MailClient>,
    labels: LabelManager,
    owner_address: String,
    label_name: String,
}

impl AutoResponder {
    pub fn new(client: Arc<dyn MailClient>, config: &ResponderConfig) -> Self {
        Self {
            labels: LabelManager::new(Arc::clone(&client)),
            client,
            owner_address: config.owner_address.clone(),
            label_name: config.label_name.clone(),
        }
    }

    pub fn client(&self) -> &Arc<dyn MailClient> {
        &self.client
    }

    /// Process one message by ID.
    ///
    /// Errors fetching the message, listing labels, or reading a malformed
    /// message are returned. Send and label failures are logged and reported
    /// as `DeliveryFailed`.
    pub async fn execute(&self, message_id: &str) -> Result<ReplyOutcome> {
        let message = self.client.get_message(message_id).await?;
        let label = self.labels.resolve(&self.label_name).await?;
        let recipient = message.require_header(HEADER_FROM)?.to_string();

        if let Some(reason) = skip_reason(&message, &self.owner_address) {
            debug!("Skipping message {}: {:?}", message_id, reason);
            return Ok(ReplyOutcome::Skipped(reason));
        }

        let reply = compose(&message)?;

        if let Err(e) = self.client.send_reply(&reply).await {
            error!("Failed to send reply to {}: {}", recipient, e);
            return Ok(ReplyOutcome::DeliveryFailed {
                stage: DeliveryStage::Send,
                error: e.to_string(),
            });
        }

        let mut labeled = false;
        if let Some(label) = label.filter(|label| !label.id.is_empty()) {
            let add = [label.id];
            let remove = [INBOX_LABEL.to_string()];
            if let Err(e) = self.client.modify_labels(message_id, &add, &remove).await {
                error!(
                    "Reply sent to {} but labeling message {} failed: {}",
                    recipient, message_id, e
                );
                return Ok(ReplyOutcome::DeliveryFailed {
                    stage: DeliveryStage::Label,
                    error: e.to_string(),
                });
            }
            labeled = true;
        }

        info!("Successfully sent to {}", recipient);
        Ok(ReplyOutcome::Replied { recipient, labeled })
    }
}
