//! Gmail Auto-Responder
//!
//! Watches a single Gmail inbox and answers each new conversation once with a
//! short automated acknowledgement, then files the message under a
//! "replied" label and out of the inbox.
//!
//! # Overview
//!
//! - **Authentication**: OAuth2 consent with a saved refresh-token credential
//! - **Label Management**: Find-or-create of the "already answered" label
//! - **Responder**: Reply decision, RFC 2822 composition and delivery
//! - **Polling**: Randomly jittered polls of the newest inbox messages
//!
//! # Example Usage
//!
//! ```no_run
//! use gmail_autoreply::{
//!     auth::CredentialStore, client::ProductionMailClient, config::Config, AutoResponder,
//!     Poller,
//! };
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("autoreply.toml".as_ref()).await?;
//!     config.validate()?;
//!
//!     let hub = CredentialStore::new("credentials.json", "token.json")
//!         .authorize()
//!         .await?;
//!     let responder = AutoResponder::new(
//!         Arc::new(ProductionMailClient::new(hub)),
//!         &config.responder,
//!     );
//!
//!     let mut poller = Poller::new(responder, &config.poll, StdRng::from_entropy());
//!     poller.run_until(async { tokio::signal::ctrl_c().await.ok(); }).await;
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 credential storage and Gmail API initialization
//! - [`client`] - Gmail API client trait and production implementation
//! - [`cli`] - Command-line interface and output formatting
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`label_manager`] - Resolution of the reply label
//! - [`models`] - Core data structures
//! - [`poller`] - Jittered poll loop
//! - [`responder`] - Reply decision, composition and delivery

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod label_manager;
pub mod models;
pub mod poller;
pub mod responder;

// Re-export commonly used types for convenience
pub use error::{GmailError, Result};

// Core data models
pub use models::{BodyPart, LabelInfo, MailMessage, MessageHeaders, OutgoingReply};

// Config types
pub use config::{Config, PollConfig, ResponderConfig};

// Client traits
pub use client::{MailClient, ProductionMailClient};

pub use label_manager::LabelManager;
pub use poller::{PollInterval, PollReport, Poller};
pub use responder::{AutoResponder, DeliveryStage, ReplyOutcome, SkipReason};

// CLI types (for binary usage)
pub use cli::{Cli, Commands};
