use dozor_types::models::{PlayerId, PlayerProfile};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::Engine;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered { username: String },
    /// Nothing was written
    MissingUsername,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeamOutcome {
    Joined { team: String },
    InvalidTeam,
    NotRegistered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    Granted,
    Revoked,
    WrongSecret,
    NotRegistered,
}

/// What `/whoami` shows about a player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub username: String,
    pub team: Option<String>,
}

impl Engine {
    pub fn register(&self, player_id: PlayerId, username: &str) -> Result<RegisterOutcome> {
        let username = username.trim();
        if username.is_empty() {
            return Ok(RegisterOutcome::MissingUsername);
        }

        self.db.upsert_username(player_id, username)?;
        info!(player_id, username, "Player registered");
        Ok(RegisterOutcome::Registered {
            username: username.to_string(),
        })
    }

    pub fn set_team(&self, player_id: PlayerId, team: &str) -> Result<TeamOutcome> {
        let team = team.trim();
        if !self.config.is_valid_team(team) {
            return Ok(TeamOutcome::InvalidTeam);
        }

        if !self.db.set_team(player_id, team)? {
            return Ok(TeamOutcome::NotRegistered);
        }
        info!(player_id, team, "Player joined team");
        Ok(TeamOutcome::Joined {
            team: team.to_string(),
        })
    }

    /// Toggles the admin flag when the presented secret hashes to the configured digest.
    pub fn grant_admin(&self, player_id: PlayerId, secret: &str, enable: bool) -> Result<AdminOutcome> {
        if !self.is_registered(player_id)? {
            return Ok(AdminOutcome::NotRegistered);
        }

        if !self.secret_matches(secret) {
            return Ok(AdminOutcome::WrongSecret);
        }

        if !self.db.set_admin(player_id, enable)? {
            return Ok(AdminOutcome::NotRegistered);
        }
        info!(player_id, enable, "Admin flag changed");
        Ok(if enable {
            AdminOutcome::Granted
        } else {
            AdminOutcome::Revoked
        })
    }

    pub fn is_admin(&self, player_id: PlayerId) -> Result<bool> {
        Ok(self.profile(player_id)?.is_some_and(|p| p.is_admin))
    }

    pub fn is_registered(&self, player_id: PlayerId) -> Result<bool> {
        Ok(self.profile(player_id)?.is_some())
    }

    /// `None` means the player never registered.
    pub fn describe(&self, player_id: PlayerId) -> Result<Option<PlayerSummary>> {
        Ok(self.profile(player_id)?.map(|p| PlayerSummary {
            username: p.username,
            team: p.team,
        }))
    }

    /// Username for listings, falling back to the raw id for unknown players.
    pub fn display_name(&self, player_id: PlayerId) -> Result<String> {
        Ok(self
            .profile(player_id)?
            .map(|p| p.username)
            .unwrap_or_else(|| player_id.to_string()))
    }

    fn profile(&self, player_id: PlayerId) -> Result<Option<PlayerProfile>> {
        Ok(self.db.get_profile(player_id)?)
    }

    fn secret_matches(&self, presented: &str) -> bool {
        let digest = hex::encode(Sha256::digest(presented.trim().as_bytes()));
        digest.eq_ignore_ascii_case(&self.config.admin_secret_sha256)
    }
}
