use crate::error::{GmailError, Result};

/// System label carried by every message shown in the inbox
pub const INBOX_LABEL: &str = "INBOX";

pub const HEADER_FROM: &str = "From";
pub const HEADER_SUBJECT: &str = "Subject";
pub const HEADER_MESSAGE_ID: &str = "Message-ID";
pub const HEADER_IN_REPLY_TO: &str = "In-Reply-To";

/// Header list of a message, in the order the API returned it.
///
/// Names are matched case-sensitively and exactly; when a name repeats, the
/// first occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHeaders(Vec<(String, String)>);

impl MessageHeaders {
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self(headers)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(header, _)| header == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for MessageHeaders {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// One MIME part of a message payload, body already base64url-decoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyPart {
    pub mime_type: Option<String>,
    pub data: Option<Vec<u8>>,
}

/// A message fetched in `full` format, reduced to what the responder reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailMessage {
    pub id: String,
    pub thread_id: Option<String>,
    pub headers: MessageHeaders,
    pub parts: Vec<BodyPart>,
}

impl MailMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Header value, or `MalformedMessage` naming the missing header
    pub fn require_header(&self, name: &str) -> Result<&str> {
        self.header(name)
            .ok_or_else(|| GmailError::malformed(&self.id, name))
    }

    /// Text of the first body part (lossy UTF-8)
    pub fn first_part_text(&self) -> Result<String> {
        let part = self
            .parts
            .first()
            .ok_or_else(|| GmailError::malformed(&self.id, "body parts"))?;
        let data = part
            .data
            .as_ref()
            .ok_or_else(|| GmailError::malformed(&self.id, "body data"))?;
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
    pub label_list_visibility: Option<String>,
    pub message_list_visibility: Option<String>,
}

/// Reply built from an incoming message; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingReply {
    pub thread_id: Option<String>,
    pub to: String,
    pub subject: String,
    pub in_reply_to: String,
    pub references: String,
    pub body: String,
}

impl OutgoingReply {
    pub const CONTENT_TYPE: &'static str = "text/plain; charset=\"UTF-8\"";
    pub const TRANSFER_ENCODING: &'static str = "7bit";

    /// Render as an RFC 2822 message with CRLF line endings
    pub fn to_rfc2822(&self) -> String {
        format!(
            "To: {}\r\n\
             Subject: {}\r\n\
             In-Reply-To: {}\r\n\
             References: {}\r\n\
             Content-Type: {}\r\n\
             Content-Transfer-Encoding: {}\r\n\
             \r\n\
             {}",
            self.to,
            self.subject,
            self.in_reply_to,
            self.references,
            Self::CONTENT_TYPE,
            Self::TRANSFER_ENCODING,
            self.body
        )
    }
}
