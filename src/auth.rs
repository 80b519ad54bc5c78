//! OAuth2 credential storage and Gmail API initialization

use google_gmail1::{hyper_rustls, hyper_util, yup_oauth2, Gmail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::authorized_user::AuthorizedUserSecret;

use crate::error::{GmailError, Result};

/// Gmail API scopes requested during consent
///
/// If these change, delete the token file so consent is asked again.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.labels",
    "https://www.googleapis.com/auth/gmail.modify",
];

/// `type` written to the token file, as understood by Google client libraries
pub const AUTHORIZED_USER_TYPE: &str = "authorized_user";

/// Type alias for Gmail Hub to simplify type signatures
pub type GmailHub = Gmail<HttpsConnector>;

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;

/// Token file contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(rename = "type")]
    pub key_type: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Application registration file (`credentials.json`) as downloaded from Google Cloud
#[derive(Debug, Deserialize)]
struct ApplicationRegistration {
    installed: Option<ClientKeys>,
    web: Option<ClientKeys>,
}

#[derive(Debug, Deserialize)]
struct ClientKeys {
    client_id: String,
    client_secret: String,
}

/// Loads and saves the refresh-capable credential next to the registration file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    credentials_path: PathBuf,
    token_path: PathBuf,
}

impl CredentialStore {
    pub fn new(credentials_path: impl Into<PathBuf>, token_path: impl Into<PathBuf>) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
        }
    }

    pub fn credentials_path(&self) -> &Path {
        &self.credentials_path
    }

    pub fn token_path(&self) -> &Path {
        &self.token_path
    }

    /// Where the installed flow caches tokens while consent is in progress
    fn consent_cache_path(&self) -> PathBuf {
        self.token_path.with_extension("consent.json")
    }

    /// Read the saved credential. A missing or unreadable token file is `None`.
    pub async fn load_if_exists(&self) -> Option<AuthorizedUserSecret> {
        match yup_oauth2::read_authorized_user_secret(&self.token_path).await {
            Ok(secret) => Some(secret),
            Err(e) => {
                debug!("No usable token at {:?}: {}", self.token_path, e);
                None
            }
        }
    }

    /// Pair the registration's client keys with `refresh_token` and write the token file
    pub async fn save(&self, refresh_token: &str) -> Result<StoredCredential> {
        let content = tokio::fs::read_to_string(&self.credentials_path).await?;
        let registration: ApplicationRegistration = serde_json::from_str(&content)?;
        let keys = registration.installed.or(registration.web).ok_or_else(|| {
            GmailError::AuthError(format!(
                "{:?} has neither an 'installed' nor a 'web' client",
                self.credentials_path
            ))
        })?;

        let credential = StoredCredential {
            key_type: AUTHORIZED_USER_TYPE.to_string(),
            client_id: keys.client_id,
            client_secret: keys.client_secret,
            refresh_token: refresh_token.to_string(),
        };

        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.token_path, serde_json::to_string(&credential)?).await?;
        secure_token_file(&self.token_path).await?;

        info!("Saved credential to {:?}", self.token_path);
        Ok(credential)
    }

    /// Remove the token file so the next authorization asks for consent again
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.token_path).await {
            Ok(()) => {
                info!("Removed existing token {:?}", self.token_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Return an authorized Gmail hub, asking for consent in the browser when no
    /// saved credential exists.
    ///
    /// A credential is saved only when consent produced a refresh token. When it
    /// did not, the hub runs on the consent session and nothing is written.
    pub async fn authorize(&self) -> Result<GmailHub> {
        if let Some(secret) = self.load_if_exists().await {
            return initialize_gmail_hub(secret).await;
        }

        let flow_auth = self.run_consent_flow().await?;
        if self.store_consent().await?.is_some() {
            if let Some(secret) = self.load_if_exists().await {
                return initialize_gmail_hub(secret).await;
            }
        }

        warn!(
            "Consent returned no refresh token; continuing without saving {:?}",
            self.token_path
        );
        Ok(Gmail::new(https_client()?, flow_auth))
    }

    /// Forget any saved credential, then authorize
    pub async fn authorize_fresh(&self) -> Result<GmailHub> {
        self.clear().await?;
        self.authorize().await
    }

    /// Run the installed-app flow, leaving its tokens in the consent cache
    async fn run_consent_flow(&self) -> Result<DefaultAuthenticator> {
        let secret = yup_oauth2::read_application_secret(&self.credentials_path)
            .await
            .map_err(|e| GmailError::AuthError(format!("Failed to read credentials: {}", e)))?;

        // HTTPRedirect opens a browser for user authorization; account
        // selection adds prompt=consent so re-consent still yields a refresh token
        let auth = yup_oauth2::InstalledFlowAuthenticator::builder(
            secret,
            yup_oauth2::InstalledFlowReturnMethod::HTTPRedirect,
        )
        .persist_tokens_to_disk(self.consent_cache_path())
        .force_account_selection(true)
        .build()
        .await
        .map_err(|e| GmailError::AuthError(format!("Failed to build authenticator: {}", e)))?;

        auth.token(SCOPES)
            .await
            .map_err(|e| GmailError::AuthError(format!("Failed to obtain token: {}", e)))?;

        Ok(auth)
    }

    /// Move the refresh token out of the consent cache into the token file.
    ///
    /// Returns `Ok(None)` and writes nothing when the cache is missing or holds
    /// no refresh token.
    async fn store_consent(&self) -> Result<Option<StoredCredential>> {
        let cache_path = self.consent_cache_path();
        let cached = match tokio::fs::read_to_string(&cache_path).await {
            Ok(cached) => cached,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if let Err(e) = tokio::fs::remove_file(&cache_path).await {
            warn!("Could not remove consent cache {:?}: {}", cache_path, e);
        }

        let value: serde_json::Value = serde_json::from_str(&cached)?;
        match find_refresh_token(&value) {
            Some(refresh_token) => Ok(Some(self.save(&refresh_token).await?)),
            None => Ok(None),
        }
    }
}

/// Find the first non-empty `refresh_token` string anywhere in a token cache document
fn find_refresh_token(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(token)) = map.get("refresh_token") {
                if !token.is_empty() {
                    return Some(token.clone());
                }
            }
            map.values().find_map(find_refresh_token)
        }
        serde_json::Value::Array(items) => items.iter().find_map(find_refresh_token),
        _ => None,
    }
}

/// Initialize Gmail API hub from a saved refresh-token credential
///
/// The access token is fetched once up front so that a revoked credential
/// fails at startup rather than on the first poll.
pub async fn initialize_gmail_hub(secret: AuthorizedUserSecret) -> Result<GmailHub> {
    let auth = yup_oauth2::AuthorizedUserAuthenticator::builder(secret)
        .build()
        .await
        .map_err(|e| GmailError::AuthError(format!("Failed to build authenticator: {}", e)))?;

    let _token = auth
        .token(SCOPES)
        .await
        .map_err(|e| GmailError::AuthError(format!("Failed to obtain token: {}", e)))?;

    Ok(Gmail::new(https_client()?, auth))
}

fn https_client() -> Result<google_gmail1::common::Client<HttpsConnector>> {
    // Use HTTP/1 for compatibility (HTTP/1 works better with google-gmail1)
    Ok(
        hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new()).build(
            hyper_rustls::HttpsConnectorBuilder::new()
                .with_native_roots()
                .map_err(|e| GmailError::AuthError(format!("Failed to load TLS roots: {}", e)))?
                .https_or_http()
                .enable_http1()
                .build(),
        ),
    )
}

/// Restrict the token file to its owner (0600)
#[cfg(unix)]
pub async fn secure_token_file(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;
    Ok(())
}

/// Windows uses ACLs instead of mode bits; the file keeps its inherited ACL
#[cfg(windows)]
pub async fn secure_token_file(_path: &Path) -> Result<()> {
    Ok(())
}
