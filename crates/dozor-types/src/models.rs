use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable numeric identity assigned by the messaging platform.
pub type PlayerId = i64;

/// Conversation the reply goes back to.
pub type ChatId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub username: String,
    pub team: Option<String>,
    pub is_admin: bool,
}

/// A hunt code hidden somewhere in a room. `finder` is set at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemableCode {
    pub code: String,
    pub room: String,
    /// Admin-only annotation, never shown to players.
    pub note: Option<String>,
    /// Shown to whoever redeems the code first.
    pub hint: Option<String>,
    pub finder: Option<PlayerId>,
}

impl RedeemableCode {
    pub fn is_found(&self) -> bool {
        self.finder.is_some()
    }
}

/// One correct answer inside a shared puzzle group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPair {
    pub group: String,
    /// Stored already normalized (trimmed, lowercase).
    pub answer: String,
    pub finder: Option<PlayerId>,
}

impl AnswerPair {
    pub fn is_found(&self) -> bool {
        self.finder.is_some()
    }
}

/// Which operation the next plain-text message from a player completes.
///
/// Answer groups are configurable, so their tags carry the group command
/// (`a3`, `b1`, ...) rather than being fixed variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpectedCommand {
    Register,
    Team,
    Code,
    Admin,
    StopAdmin,
    AddCode,
    RemoveCode,
    Answer(String),
    AddAnswer(String),
}

impl ExpectedCommand {
    /// Tag persisted in the pending conversation row.
    pub fn tag(&self) -> String {
        match self {
            Self::Register => "register".into(),
            Self::Team => "team".into(),
            Self::Code => "code".into(),
            Self::Admin => "admin".into(),
            Self::StopAdmin => "stopadmin".into(),
            Self::AddCode => "addcode".into(),
            Self::RemoveCode => "removecode".into(),
            Self::Answer(group) => format!("answer:{}", group),
            Self::AddAnswer(group) => format!("addanswer:{}", group),
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        if let Some(group) = tag.strip_prefix("answer:") {
            return (!group.is_empty()).then(|| Self::Answer(group.to_string()));
        }
        if let Some(group) = tag.strip_prefix("addanswer:") {
            return (!group.is_empty()).then(|| Self::AddAnswer(group.to_string()));
        }
        match tag {
            "register" => Some(Self::Register),
            "team" => Some(Self::Team),
            "code" => Some(Self::Code),
            "admin" => Some(Self::Admin),
            "stopadmin" => Some(Self::StopAdmin),
            "addcode" => Some(Self::AddCode),
            "removecode" => Some(Self::RemoveCode),
            _ => None,
        }
    }
}

impl fmt::Display for ExpectedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}

/// A prompted follow-up waiting for the player's next plain message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConversation {
    pub player_id: PlayerId,
    pub command: ExpectedCommand,
    /// Unix seconds of the message that armed the follow-up.
    pub issued_at: i64,
}

impl PendingConversation {
    /// Strictly greater than the window expires; exactly the window is still honored.
    /// Dates come from the transport, so extreme values saturate instead of overflowing.
    pub fn is_expired(&self, now: i64, window_secs: i64) -> bool {
        now.saturating_sub(self.issued_at) > window_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_command_tags_parse_back() {
        let commands = [
            ExpectedCommand::Register,
            ExpectedCommand::StopAdmin,
            ExpectedCommand::Answer("a3".into()),
            ExpectedCommand::AddAnswer("b1".into()),
        ];
        for command in commands {
            assert_eq!(ExpectedCommand::from_tag(&command.tag()), Some(command));
        }
        assert_eq!(ExpectedCommand::from_tag("answer:"), None);
        assert_eq!(ExpectedCommand::from_tag("dance"), None);
    }

    #[test]
    fn pending_expiry_boundary() {
        let pending = PendingConversation {
            player_id: 1,
            command: ExpectedCommand::Code,
            issued_at: 1_000,
        };
        assert!(!pending.is_expired(1_299, 300));
        assert!(!pending.is_expired(1_300, 300));
        assert!(pending.is_expired(1_301, 300));
    }

    #[test]
    fn extreme_dates_do_not_overflow() {
        let old = PendingConversation {
            player_id: 1,
            command: ExpectedCommand::Code,
            issued_at: i64::MIN,
        };
        assert!(old.is_expired(i64::MAX, 300));

        let recent = PendingConversation {
            issued_at: 1_000,
            ..old
        };
        assert!(!recent.is_expired(i64::MIN, 300));
    }
}
