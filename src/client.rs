//! Gmail API client surface used by the responder

use async_trait::async_trait;
use google_gmail1::{
    api::{Label, Message, MessagePart, ModifyMessageRequest},
    hyper_rustls, hyper_util, Gmail,
};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

use crate::error::{GmailError, Result};
use crate::models::{BodyPart, LabelInfo, MailMessage, MessageHeaders, OutgoingReply};

const SCOPE_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";
const SCOPE_SEND: &str = "https://www.googleapis.com/auth/gmail.send";
const SCOPE_LABELS: &str = "https://www.googleapis.com/auth/gmail.labels";
const SCOPE_MODIFY: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Visibility flags given to labels this crate creates
pub const LABEL_LIST_VISIBILITY: &str = "labelShow";
pub const MESSAGE_LIST_VISIBILITY: &str = "show";

/// Trait defining the mailbox operations the responder needs, for easier testing
#[async_trait]
pub trait MailClient: Send + Sync {
    /// List message IDs carrying all of `label_ids`, newest first
    async fn list_message_ids(&self, label_ids: &[String], max_results: u32)
        -> Result<Vec<String>>;

    /// Fetch a message with its full payload
    async fn get_message(&self, id: &str) -> Result<MailMessage>;

    /// List all labels in the account
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a new label
    async fn create_label(&self, name: &str) -> Result<LabelInfo>;

    /// Send a reply into its thread, returning the sent message ID
    async fn send_reply(&self, reply: &OutgoingReply) -> Result<String>;

    /// Add and remove labels on a single message in one call
    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()>;

    /// Email address of the authenticated account
    async fn profile_email(&self) -> Result<String>;
}

/// Gmail client backed by the generated `google-gmail1` hub
pub struct ProductionMailClient {
    hub: Gmail<hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>>,
}

impl ProductionMailClient {
    pub fn new(
        hub: Gmail<
            hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
        >,
    ) -> Self {
        Self { hub }
    }
}

/// Convert an API label, dropping labels the API returned without ID or name
fn label_info(label: Label) -> Option<LabelInfo> {
    match (label.id, label.name) {
        (Some(id), Some(name)) => Some(LabelInfo {
            id,
            name,
            label_list_visibility: label.label_list_visibility,
            message_list_visibility: label.message_list_visibility,
        }),
        _ => None,
    }
}

/// Parse a Gmail API Message into our MailMessage structure
fn parse_mail_message(requested_id: &str, msg: Message) -> MailMessage {
    let payload = msg.payload.unwrap_or_default();

    let headers: MessageHeaders = payload
        .headers
        .unwrap_or_default()
        .into_iter()
        .filter_map(|header| match (header.name, header.value) {
            (Some(name), Some(value)) => Some((name, value)),
            _ => None,
        })
        .collect();

    let parts = payload
        .parts
        .unwrap_or_default()
        .into_iter()
        .map(body_part)
        .collect();

    MailMessage {
        id: msg.id.unwrap_or_else(|| requested_id.to_string()),
        thread_id: msg.thread_id,
        headers,
        parts,
    }
}

fn body_part(part: MessagePart) -> BodyPart {
    BodyPart {
        mime_type: part.mime_type,
        data: part.body.and_then(|body| body.data),
    }
}

#[async_trait]
impl MailClient for ProductionMailClient {
    async fn list_message_ids(
        &self,
        label_ids: &[String],
        max_results: u32,
    ) -> Result<Vec<String>> {
        let mut call = self
            .hub
            .users()
            .messages_list("me")
            .max_results(max_results);

        for label_id in label_ids {
            call = call.add_label_ids(label_id);
        }

        let (_, response) = call.add_scope(SCOPE_READONLY).doit().await?;

        let ids: Vec<String> = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg_ref| msg_ref.id)
            .collect();

        debug!("Listed {} message(s)", ids.len());
        Ok(ids)
    }

    async fn get_message(&self, id: &str) -> Result<MailMessage> {
        let (_, msg) = self
            .hub
            .users()
            .messages_get("me", id)
            .format("full")
            .add_scope(SCOPE_READONLY)
            .doit()
            .await?;

        Ok(parse_mail_message(id, msg))
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        let (_, response) = self
            .hub
            .users()
            .labels_list("me")
            .add_scope(SCOPE_LABELS)
            .doit()
            .await?;

        let labels: Vec<LabelInfo> = response
            .labels
            .unwrap_or_default()
            .into_iter()
            .filter_map(label_info)
            .collect();

        debug!("Successfully parsed {} labels", labels.len());
        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> Result<LabelInfo> {
        let label = Label {
            name: Some(name.to_string()),
            label_list_visibility: Some(LABEL_LIST_VISIBILITY.to_string()),
            message_list_visibility: Some(MESSAGE_LIST_VISIBILITY.to_string()),
            ..Default::default()
        };

        let (_, created_label) = self
            .hub
            .users()
            .labels_create(label, "me")
            .add_scope(SCOPE_LABELS)
            .doit()
            .await?;

        label_info(created_label)
            .ok_or_else(|| GmailError::LabelError("Created label has no ID".to_string()))
    }

    async fn send_reply(&self, reply: &OutgoingReply) -> Result<String> {
        let metadata = Message {
            thread_id: reply.thread_id.clone(),
            ..Default::default()
        };
        let mime_type: mime::Mime = "message/rfc822"
            .parse()
            .map_err(|e: mime::FromStrError| GmailError::ApiError(e.to_string()))?;
        let raw = Cursor::new(reply.to_rfc2822().into_bytes());

        let (_, sent) = self
            .hub
            .users()
            .messages_send(metadata, "me")
            .add_scope(SCOPE_SEND)
            .upload(raw, mime_type)
            .await?;

        Ok(sent.id.unwrap_or_default())
    }

    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        let modify_request = ModifyMessageRequest {
            add_label_ids: Some(add_label_ids.to_vec()),
            remove_label_ids: Some(remove_label_ids.to_vec()),
        };

        self.hub
            .users()
            .messages_modify(modify_request, "me", message_id)
            .add_scope(SCOPE_MODIFY)
            .doit()
            .await?;

        Ok(())
    }

    async fn profile_email(&self) -> Result<String> {
        let (_, profile) = self
            .hub
            .users()
            .get_profile("me")
            .add_scope(SCOPE_READONLY)
            .doit()
            .await?;

        Ok(profile.email_address.unwrap_or_default())
    }
}

// Implement MailClient for Arc<T> to allow shared ownership
#[async_trait]
impl<T: MailClient + ?Sized> MailClient for Arc<T> {
    async fn list_message_ids(
        &self,
        label_ids: &[String],
        max_results: u32,
    ) -> Result<Vec<String>> {
        self.as_ref().list_message_ids(label_ids, max_results).await
    }

    async fn get_message(&self, id: &str) -> Result<MailMessage> {
        self.as_ref().get_message(id).await
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        self.as_ref().list_labels().await
    }

    async fn create_label(&self, name: &str) -> Result<LabelInfo> {
        self.as_ref().create_label(name).await
    }

    async fn send_reply(&self, reply: &OutgoingReply) -> Result<String> {
        self.as_ref().send_reply(reply).await
    }

    async fn modify_labels(
        &self,
        message_id: &str,
        add_label_ids: &[String],
        remove_label_ids: &[String],
    ) -> Result<()> {
        self.as_ref()
            .modify_labels(message_id, add_label_ids, remove_label_ids)
            .await
    }

    async fn profile_email(&self) -> Result<String> {
        self.as_ref().profile_email().await
    }
}
