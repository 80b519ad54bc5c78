use anyhow::Result;
use clap::Parser;
use gmail_autoreply::auth::CredentialStore;
use gmail_autoreply::cli::{self, Cli, Commands};
use gmail_autoreply::client::{MailClient, ProductionMailClient};
use gmail_autoreply::config::Config;
use gmail_autoreply::error::GmailError;
use gmail_autoreply::poller::Poller;
use gmail_autoreply::responder::AutoResponder;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Exit with proper code on error
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        eprintln!("\nFor help, run: gmail-autoreply --help");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Several dependencies pull in rustls; pick the provider explicitly
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_autoreply=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("gmail_autoreply=info,warn,error"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let store = CredentialStore::new(&cli.credentials, &cli.token);

    match &cli.command {
        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");

            let hub = if *force {
                store.authorize_fresh().await?
            } else {
                store.authorize().await?
            };

            println!("Successfully authenticated with Gmail API");
            println!("Token saved at: {:?}", store.token_path());

            let client = ProductionMailClient::new(hub);
            println!("Connected to account: {}", client.profile_email().await?);

            Ok(())
        }

        Commands::Labels => {
            let client = ProductionMailClient::new(store.authorize().await?);
            let labels = client.list_labels().await?;
            println!("{}", cli::format_labels(&labels));
            Ok(())
        }

        Commands::InitConfig { output, force } => {
            tracing::info!("Generating example configuration file");

            if output.exists() && !*force {
                return Err(GmailError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nPlease edit this file before running.");
            println!("Key settings to review:");
            println!("  - responder.owner_address: mail from this address is never answered");
            println!("  - poll.min_interval_ms / poll.max_interval_ms: wait between polls");

            Ok(())
        }

        command @ (Commands::Run | Commands::Once) => {
            let mut config = Config::load(&cli.config).await?;
            config.apply_owner_override(cli.owner.as_deref());
            config.validate()?;

            let hub = store.authorize().await?;
            let client: Arc<dyn MailClient> = Arc::new(ProductionMailClient::new(hub));
            let responder = AutoResponder::new(client, &config.responder);
            let mut poller = Poller::new(responder, &config.poll, StdRng::from_entropy());

            if *command == Commands::Once {
                let report = poller.run_once().await;
                println!("{}", cli::format_report(&report));
                return Ok(());
            }

            tracing::info!(
                "Auto-responder started for {} (label '{}')",
                config.responder.owner_address,
                config.responder.label_name
            );
            poller
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                })
                .await;

            Ok(())
        }
    }
}
