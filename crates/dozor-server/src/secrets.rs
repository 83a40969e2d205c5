use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::config::ServerConfig;

const SECRETS_TOKEN_HEADER: &str = "X-Aws-Parameters-Secrets-Token";

#[derive(Debug, Deserialize)]
struct SecretResponse {
    #[serde(rename = "SecretString")]
    secret_string: String,
}

/// The bot token, taken from `DOZOR_BOT_TOKEN` or fetched from the
/// secrets endpoint when that is configured instead.
pub async fn resolve_bot_token(config: &ServerConfig) -> Result<String> {
    if let Some(token) = &config.bot_token {
        return Ok(token.clone());
    }

    let Some(url) = &config.secrets_url else {
        bail!("no bot token: set DOZOR_BOT_TOKEN or DOZOR_SECRETS_URL");
    };

    let mut request = Client::new().get(url);
    if let Some(token) = &config.secrets_token {
        request = request.header(SECRETS_TOKEN_HEADER, token);
    }

    let secret: SecretResponse = request
        .send()
        .await
        .context("secrets endpoint unreachable")?
        .error_for_status()?
        .json()
        .await
        .context("secrets endpoint returned an unexpected body")?;

    let token = secret.secret_string.trim().to_string();
    if token.is_empty() {
        bail!("secrets endpoint returned an empty bot token");
    }
    info!("Bot token loaded from secrets endpoint");
    Ok(token)
}
