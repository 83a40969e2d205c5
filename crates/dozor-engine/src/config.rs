use std::collections::HashSet;

use crate::error::EngineError;

/// Digest of the shared admin secret shipped with the last deployed event.
pub const DEFAULT_ADMIN_SECRET_SHA256: &str =
    "9cfc73c0ff8498aa083c2be9c7449f7894e9c0a9621422fec74c3361ab8633dc";

/// Commands the router handles before looking at answer groups.
pub const BUILTIN_COMMANDS: &[&str] = &[
    "start", "what", "register", "team", "code", "codes", "top", "whoami", "admin", "stopadmin",
    "addcode", "removecode",
];

/// How long a prompted follow-up stays answerable, in seconds.
pub const DEFAULT_PENDING_WINDOW_SECS: i64 = 300;

/// A puzzle group players submit answers to.
///
/// `command` is what players type (`/a3`), `table` names the group in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerGroup {
    pub command: String,
    pub table: String,
}

impl AnswerGroup {
    pub fn new(command: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            table: table.into(),
        }
    }

    /// Admin command that adds a correct answer, e.g. `a3answer`.
    pub fn add_command(&self) -> String {
        format!("{}answer", self.command)
    }

    /// Admin command that lists the group, e.g. `lista3`.
    pub fn list_command(&self) -> String {
        format!("list{}", self.command)
    }
}

/// Event-wide settings handed to the engine at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub teams: Vec<String>,
    /// Lowercase hex SHA-256 of the admin secret. Players present the raw secret.
    pub admin_secret_sha256: String,
    pub pending_window_secs: i64,
    pub answer_groups: Vec<AnswerGroup>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            teams: ["A", "B", "C", "D"].iter().map(|t| t.to_string()).collect(),
            admin_secret_sha256: DEFAULT_ADMIN_SECRET_SHA256.to_string(),
            pending_window_secs: DEFAULT_PENDING_WINDOW_SECS,
            answer_groups: vec![AnswerGroup::new("a3", "PairA"), AnswerGroup::new("b1", "PairB")],
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.teams.is_empty() {
            return Err(EngineError::Config("at least one team is required".into()));
        }
        if self.teams.iter().any(|t| t.trim().is_empty()) {
            return Err(EngineError::Config("team names must not be blank".into()));
        }
        if self.admin_secret_sha256.len() != 64
            || !self.admin_secret_sha256.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(EngineError::Config(
                "admin secret digest must be 64 hex characters".into(),
            ));
        }
        if self.pending_window_secs <= 0 {
            return Err(EngineError::Config("pending window must be positive".into()));
        }

        // Every name a group answers to must reach that group and nothing else
        let mut taken: HashSet<String> = BUILTIN_COMMANDS.iter().map(|c| c.to_string()).collect();
        for group in &self.answer_groups {
            if group.command.is_empty() || group.table.is_empty() {
                return Err(EngineError::Config("answer group needs a command and a table".into()));
            }
            for name in [group.command.clone(), group.add_command(), group.list_command()] {
                if !taken.insert(name.clone()) {
                    return Err(EngineError::Config(format!(
                        "answer group '{}' uses command '{}', which is already taken",
                        group.command, name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn is_valid_team(&self, team: &str) -> bool {
        self.teams.iter().any(|t| t == team)
    }

    pub fn answer_group(&self, command: &str) -> Option<&AnswerGroup> {
        self.answer_groups.iter().find(|g| g.command == command)
    }

    /// Team picker rows, two buttons per row.
    pub fn team_keyboard(&self) -> Vec<Vec<String>> {
        self.teams.chunks(2).map(|row| row.to_vec()).collect()
    }
}
