//! Google OAuth2 token exchange and refresh.
//!
//! The refresh token obtained during the one-time `auth` flow is kept
//! in a JSON file on disk. Access tokens are short-lived and fetched
//! from the refresh token on demand, never stored.

use std::path::Path;

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
    pub token_type: Option<String>,
}

/// The long-lived credential persisted after `auth` completes.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredToken {
    pub user_email: String,
    pub refresh_token: String,
}

pub fn load_token(path: &Path) -> Result<StoredToken> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("No stored token at {}. Run `auth` first.", path.display()))?;
    let token = serde_json::from_str(&raw)
        .with_context(|| format!("Malformed token file at {}", path.display()))?;
    Ok(token)
}

pub fn save_token(path: &Path, token: &StoredToken) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(token)?)
        .with_context(|| format!("Failed to write token file at {}", path.display()))?;
    Ok(())
}

/// Trade the one-time authorization code for an access + refresh token
/// pair.
pub async fn exchange_code_for_token(
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> Result<TokenResponse> {
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("code", code),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code"),
    ];
    token_request(TOKEN_ENDPOINT, &params).await
}

/// Mint a fresh access token from the stored refresh token.
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    token_request(TOKEN_ENDPOINT, &params).await
}

async fn token_request(url: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
    let client = Client::new();
    let res = client.post(url).form(params).send().await?;
    let status = res.status();
    let text = res.text().await.unwrap_or_default();
    if !status.is_success() {
        bail!("Token request failed: {} ({})", status, text);
    }
    let token: TokenResponse = serde_json::from_str(&text)?;
    Ok(token)
}

/// The consent URL the user opens in a browser during `auth`.
pub fn authorization_url(client_id: &str, redirect_uri: &str) -> String {
    let scope = "https://www.googleapis.com/auth/gmail.modify \
                 https://www.googleapis.com/auth/calendar.events.readonly";
    format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(scope)
    )
}
