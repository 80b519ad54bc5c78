//! Common test utilities and fixtures
#![allow(dead_code)]

use gmail_autoreply::client::{MailClient, LABEL_LIST_VISIBILITY, MESSAGE_LIST_VISIBILITY};
use gmail_autoreply::config::{PollConfig, ResponderConfig};
use gmail_autoreply::error::Result;
use gmail_autoreply::models::{BodyPart, LabelInfo, MailMessage, OutgoingReply};
use mockall::mock;

pub const OWNER: &str = "owner@example.com";
pub const REPLY_LABEL_ID: &str = "Label_9";

/// Create a test message with a single text part
pub fn create_test_message(id: &str, headers: &[(&str, &str)], body: &str) -> MailMessage {
    MailMessage {
        id: id.to_string(),
        thread_id: Some(format!("thread_{}", id)),
        headers: headers.iter().copied().collect(),
        parts: vec![BodyPart {
            mime_type: Some("text/plain".to_string()),
            data: Some(body.as_bytes().to_vec()),
        }],
    }
}

/// Message that should be answered: `From: x@y.com`, `Subject: Hi`, `Message-ID: <1>`
pub fn create_new_conversation(id: &str) -> MailMessage {
    create_test_message(
        id,
        &[("From", "x@y.com"), ("Subject", "Hi"), ("Message-ID", "<1>")],
        "Can we talk tomorrow?",
    )
}

/// Same as `create_new_conversation` but already part of a thread
pub fn create_reply_message(id: &str) -> MailMessage {
    create_test_message(
        id,
        &[
            ("From", "x@y.com"),
            ("Subject", "Hi"),
            ("Message-ID", "<2>"),
            ("In-Reply-To", "<1>"),
        ],
        "Following up",
    )
}

/// Create a test LabelInfo with the visibility the responder uses
pub fn create_test_label_info(id: &str, name: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: name.to_string(),
        label_list_visibility: Some(LABEL_LIST_VISIBILITY.to_string()),
        message_list_visibility: Some(MESSAGE_LIST_VISIBILITY.to_string()),
    }
}

pub fn responder_config() -> ResponderConfig {
    ResponderConfig {
        owner_address: OWNER.to_string(),
        label_name: "replied".to_string(),
    }
}

/// Poll settings with a fixed wait so loop timing is predictable
pub fn fixed_poll_config(interval_ms: u64) -> PollConfig {
    PollConfig {
        min_interval_ms: interval_ms,
        max_interval_ms: interval_ms,
        ..PollConfig::default()
    }
}

// Mock implementation of MailClient for testing
mock! {
    pub MailClient {}

    #[async_trait::async_trait]
    impl MailClient for MailClient {
        async fn list_message_ids(&self, label_ids: &[String], max_results: u32) -> Result<Vec<String>>;
        async fn get_message(&self, id: &str) -> Result<MailMessage>;
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn create_label(&self, name: &str) -> Result<LabelInfo>;
        async fn send_reply(&self, reply: &OutgoingReply) -> Result<String>;
        async fn modify_labels(
            &self,
            message_id: &str,
            add_label_ids: &[String],
            remove_label_ids: &[String],
        ) -> Result<()>;
        async fn profile_email(&self) -> Result<String>;
    }
}

/// Mock whose label listing already contains the reply label
pub fn mock_with_reply_label() -> MockMailClient {
    let mut mock_client = MockMailClient::new();
    mock_client.expect_list_labels().returning(|| {
        Ok(vec![
            create_test_label_info("INBOX", "INBOX"),
            create_test_label_info(REPLY_LABEL_ID, "replied"),
        ])
    });
    mock_client.expect_create_label().never();
    mock_client
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_new_conversation() {
        let msg = create_new_conversation("m1");
        assert_eq!(msg.header("From"), Some("x@y.com"));
        assert_eq!(msg.header("In-Reply-To"), None);
        assert_eq!(msg.thread_id.as_deref(), Some("thread_m1"));
    }

    #[test]
    fn test_create_reply_message() {
        let msg = create_reply_message("m2");
        assert_eq!(msg.header("In-Reply-To"), Some("<1>"));
    }

    #[test]
    fn test_fixed_poll_config() {
        let config = fixed_poll_config(60_000);
        assert_eq!(config.min_interval_ms, config.max_interval_ms);
        assert_eq!(config.batch_size, 1);
    }
}
