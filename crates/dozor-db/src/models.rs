//! Row types as read from SQLite.
//! Conversion into the dozor-types models is where rows get validated.

use anyhow::{Error, anyhow};
use dozor_types::models::{
    AnswerPair, ExpectedCommand, PendingConversation, PlayerId, PlayerProfile, RedeemableCode,
};

pub struct ProfileRow {
    pub player_id: PlayerId,
    pub username: String,
    pub team: Option<String>,
    pub is_admin: bool,
}

pub struct CodeRow {
    pub code: String,
    pub room: String,
    pub note: Option<String>,
    pub hint: Option<String>,
    pub finder_id: Option<PlayerId>,
}

pub struct AnswerRow {
    pub group_id: String,
    pub answer: String,
    pub finder_id: Option<PlayerId>,
}

pub struct PendingRow {
    pub player_id: PlayerId,
    pub command: String,
    pub issued_at: i64,
}

/// Older rows stored "" where nothing was given.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<ProfileRow> for PlayerProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            player_id: row.player_id,
            username: row.username,
            team: non_empty(row.team),
            is_admin: row.is_admin,
        }
    }
}

impl From<CodeRow> for RedeemableCode {
    fn from(row: CodeRow) -> Self {
        Self {
            code: row.code,
            room: row.room,
            note: non_empty(row.note),
            hint: non_empty(row.hint),
            finder: row.finder_id,
        }
    }
}

impl From<AnswerRow> for AnswerPair {
    fn from(row: AnswerRow) -> Self {
        Self {
            group: row.group_id,
            answer: row.answer,
            finder: row.finder_id,
        }
    }
}

impl TryFrom<PendingRow> for PendingConversation {
    type Error = Error;

    fn try_from(row: PendingRow) -> Result<Self, Self::Error> {
        let command = ExpectedCommand::from_tag(&row.command).ok_or_else(|| {
            anyhow!(
                "Corrupt pending command '{}' for player {}",
                row.command,
                row.player_id
            )
        })?;
        Ok(Self {
            player_id: row.player_id,
            command,
            issued_at: row.issued_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_optional_text_collapses() {
        let code: RedeemableCode = CodeRow {
            code: "X1".into(),
            room: "hall".into(),
            note: Some("".into()),
            hint: Some("  ".into()),
            finder_id: None,
        }
        .into();
        assert_eq!(code.note, None);
        assert_eq!(code.hint, None);
    }

    #[test]
    fn unknown_pending_tag_is_rejected() {
        let row = PendingRow {
            player_id: 3,
            command: "juggle".into(),
            issued_at: 0,
        };
        assert!(PendingConversation::try_from(row).is_err());
    }
}
