//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::LabelInfo;
use crate::poller::PollReport;

#[derive(Parser, Debug)]
#[command(name = "gmail-autoreply")]
#[command(version = "0.1.0")]
#[command(about = "Replies once to new Gmail messages and files them away", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "autoreply.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 client registration downloaded from Google Cloud
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to the saved refresh-token credential
    #[arg(long, default_value = "token.json")]
    pub token: PathBuf,

    /// Mailbox owner's address (overrides the config file and AUTOREPLY_OWNER)
    #[arg(long)]
    pub owner: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Poll the inbox and reply until interrupted
    Run,

    /// Run a single poll and exit
    Once,

    /// Authenticate with Gmail API
    Auth {
        /// Force re-authentication even if token exists
        #[arg(long)]
        force: bool,
    },

    /// List the mailbox's labels
    Labels,

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "autoreply.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Render label names one per line, or a notice when there are none
pub fn format_labels(labels: &[LabelInfo]) -> String {
    if labels.is_empty() {
        return "No labels found.".to_string();
    }

    let mut out = String::from("Labels:");
    for label in labels {
        out.push_str("\n- ");
        out.push_str(&label.name);
    }
    out
}

/// Summary printed after `once`
pub fn format_report(report: &PollReport) -> String {
    let duration = report.finished_at - report.started_at;
    format!(
        "========================================\n\
         Poll Summary\n\
         ========================================\n\
         Poll ID: {}\n\
         Started: {}\n\
         Duration: {} ms\n\
         Messages listed: {}\n\
         Replies sent: {}\n\
         Skipped: {}\n\
         Failed: {}\n\
         ========================================",
        report.poll_id,
        report.started_at.format("%Y-%m-%d %H:%M:%S"),
        duration.num_milliseconds(),
        report.listed,
        report.replied,
        report.skipped,
        report.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn label(name: &str) -> LabelInfo {
        LabelInfo {
            id: format!("id-{}", name),
            name: name.to_string(),
            label_list_visibility: None,
            message_list_visibility: None,
        }
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["gmail-autoreply", "run"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("autoreply.toml"));
        assert_eq!(cli.credentials, PathBuf::from("credentials.json"));
        assert_eq!(cli.token, PathBuf::from("token.json"));
        assert!(cli.owner.is_none());
        assert!(!cli.verbose);
        assert_eq!(cli.command, Commands::Run);
    }

    #[test]
    fn test_parse_global_flags_and_subcommand() {
        let cli = Cli::try_parse_from([
            "gmail-autoreply",
            "--owner",
            "me@example.com",
            "-v",
            "--token",
            "/tmp/t.json",
            "auth",
            "--force",
        ])
        .unwrap();
        assert_eq!(cli.owner.as_deref(), Some("me@example.com"));
        assert!(cli.verbose);
        assert_eq!(cli.token, PathBuf::from("/tmp/t.json"));
        assert_eq!(cli.command, Commands::Auth { force: true });
    }

    #[test]
    fn test_parse_init_config() {
        let cli =
            Cli::try_parse_from(["gmail-autoreply", "init-config", "-o", "x.toml"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::InitConfig {
                output: PathBuf::from("x.toml"),
                force: false
            }
        );
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["gmail-autoreply"]).is_err());
    }

    #[test]
    fn test_format_labels() {
        assert_eq!(format_labels(&[]), "No labels found.");
        assert_eq!(
            format_labels(&[label("INBOX"), label("replied")]),
            "Labels:\n- INBOX\n- replied"
        );
    }

    #[test]
    fn test_format_report() {
        let started_at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let report = PollReport {
            poll_id: Uuid::nil(),
            started_at,
            finished_at: started_at + Duration::milliseconds(250),
            listed: 3,
            replied: 1,
            skipped: 1,
            failed: 1,
        };

        let text = format_report(&report);
        assert!(text.contains("Started: 2024-05-01 09:30:00"));
        assert!(text.contains("Duration: 250 ms"));
        assert!(text.contains("Messages listed: 3"));
        assert!(text.contains("Replies sent: 1"));
        assert!(text.contains("Failed: 1"));
    }
}
