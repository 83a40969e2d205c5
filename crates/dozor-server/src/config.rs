use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dozor_engine::{AnswerGroup, GameConfig};

const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Everything the binary reads from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub bot_token: Option<String>,
    pub secrets_url: Option<String>,
    pub secrets_token: Option<String>,
    pub telegram_api: String,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` on ingestion requests
    pub webhook_secret: Option<String>,
    pub purge_interval_secs: u64,
    pub busy_timeout: Duration,
    pub game: GameConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Unset and blank mean the same thing
        let var = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port: u16 = var("DOZOR_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("DOZOR_PORT is not a port number")?;
        let purge_interval_secs: u64 = var("DOZOR_PURGE_INTERVAL_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("DOZOR_PURGE_INTERVAL_SECS is not a number")?
            .unwrap_or(600);
        if purge_interval_secs == 0 {
            bail!("DOZOR_PURGE_INTERVAL_SECS must be positive");
        }
        let busy_timeout_ms: u64 = var("DOZOR_STORE_BUSY_TIMEOUT_MS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("DOZOR_STORE_BUSY_TIMEOUT_MS is not a number")?
            .unwrap_or(5000);

        let mut game = GameConfig::default();
        if let Some(teams) = var("DOZOR_TEAMS") {
            game.teams = parse_list(&teams);
        }
        if let Some(digest) = var("DOZOR_ADMIN_SECRET_SHA256") {
            game.admin_secret_sha256 = digest.to_lowercase();
        }
        if let Some(window) = var("DOZOR_PENDING_WINDOW_SECS") {
            game.pending_window_secs = window
                .parse::<i64>()
                .context("DOZOR_PENDING_WINDOW_SECS is not a number")?;
        }
        if let Some(groups) = var("DOZOR_ANSWER_GROUPS") {
            game.answer_groups = parse_answer_groups(&groups)?;
        }

        Ok(Self {
            db_path: var("DOZOR_DB_PATH").unwrap_or_else(|| "dozor.db".into()).into(),
            host: var("DOZOR_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            bot_token: var("DOZOR_BOT_TOKEN"),
            secrets_url: var("DOZOR_SECRETS_URL"),
            secrets_token: var("DOZOR_SECRETS_TOKEN"),
            telegram_api: var("DOZOR_TELEGRAM_API")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API.into())
                .trim_end_matches('/')
                .to_string(),
            webhook_secret: var("DOZOR_WEBHOOK_SECRET"),
            purge_interval_secs,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
            game,
        })
    }
}

/// Comma separated, blanks dropped.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `a3:PairA,b1:PairB`
pub fn parse_answer_groups(raw: &str) -> Result<Vec<AnswerGroup>> {
    parse_list(raw)
        .iter()
        .map(|entry| {
            let Some((command, table)) = entry.split_once(':') else {
                bail!("answer group '{}' is not in command:table form", entry);
            };
            let (command, table) = (command.trim(), table.trim());
            if command.is_empty() || table.is_empty() {
                bail!("answer group '{}' is not in command:table form", entry);
            }
            Ok(AnswerGroup::new(command.trim_start_matches('/'), table))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("dozor.db"));
        assert_eq!(config.port, 3000);
        assert_eq!(config.telegram_api, DEFAULT_TELEGRAM_API);
        assert_eq!(config.purge_interval_secs, 600);
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
        assert_eq!(config.bot_token, None);
        assert_eq!(config.webhook_secret, None);
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    fn game_overrides() {
        let config = load(&[
            ("DOZOR_TEAMS", "red, blue,,green "),
            ("DOZOR_PENDING_WINDOW_SECS", "60"),
            ("DOZOR_ANSWER_GROUPS", "q1:Quiz1, /q2 : Quiz2"),
            ("DOZOR_BOT_TOKEN", "  "),
            ("DOZOR_TELEGRAM_API", "http://localhost:8081/"),
            ("DOZOR_WEBHOOK_SECRET", " s3cret "),
        ])
        .unwrap();
        assert_eq!(config.game.teams, vec!["red", "blue", "green"]);
        assert_eq!(config.game.pending_window_secs, 60);
        assert_eq!(
            config.game.answer_groups,
            vec![AnswerGroup::new("q1", "Quiz1"), AnswerGroup::new("q2", "Quiz2")]
        );
        assert_eq!(config.bot_token, None);
        assert_eq!(config.telegram_api, "http://localhost:8081");
        assert_eq!(config.webhook_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(load(&[("DOZOR_PORT", "http")]).is_err());
        assert!(load(&[("DOZOR_ANSWER_GROUPS", "a3")]).is_err());
        assert!(load(&[("DOZOR_ANSWER_GROUPS", "a3:")]).is_err());
        assert!(load(&[("DOZOR_PENDING_WINDOW_SECS", "soon")]).is_err());
        assert!(load(&[("DOZOR_PURGE_INTERVAL_SECS", "0")]).is_err());
    }
}
