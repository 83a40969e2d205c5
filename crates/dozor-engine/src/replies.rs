//! Player-facing text. Everything the bot says is built here.

use crate::GameConfig;
use crate::answers::{AddAnswerOutcome, AnswerListing, SubmitOutcome};
use crate::codes::{CodeListing, CodeSpec, CodeSpecError, RedeemOutcome, RemoveOutcome, UpsertOutcome};
use crate::leaderboard::LeaderboardEntry;
use crate::profiles::{AdminOutcome, PlayerSummary, RegisterOutcome, TeamOutcome};

pub const NOT_UNDERSTOOD: &str = "I don't understand you";
pub const UNKNOWN_COMMAND: &str = "I don't know that command";
pub const REGISTER_FIRST: &str = "Please register first";
pub const NOT_ADMIN: &str = "You are not an admin";
pub const NOT_REGISTERED: &str = "You are not registered";

pub const PROMPT_USERNAME: &str = "Please provide your username";
pub const PROMPT_TEAM: &str = "Please choose your team";
pub const PROMPT_CODE: &str = "Please provide the code";
pub const PROMPT_SECRET: &str = "Please provide the secret";
pub const PROMPT_ANSWER: &str = "Please provide the answer";
pub const PROMPT_CODE_SPEC: &str =
    "Please provide the code, room, note and hint separated by -";

pub const MISSING_USERNAME: &str = "Please provide a username";
pub const MISSING_CODE: &str = "Please provide a code";
pub const MISSING_ROOM: &str = "Please provide a room";
pub const MISSING_ANSWER: &str = "Please provide an answer";

pub fn greeting(first_name: &str) -> String {
    format!(
        "Hello, {}!\nPlease register with /register <username> and /team <team>",
        first_name
    )
}

pub fn help(config: &GameConfig, is_admin: bool) -> String {
    let mut text = String::from("I can help you with the following commands:\n");
    text.push_str("/register - set your username\n");
    text.push_str("/team - set your team\n");
    text.push_str("/code - send the code\n");
    text.push_str("/codes - get the codes\n");
    text.push_str("/top - get the top\n");
    text.push_str("/whoami - get your username and team\n");
    for group in &config.answer_groups {
        text.push_str(&format!("/{} - enter the answer for {}\n", group.command, group.command));
    }
    text.push_str("/what - show this message\n");

    if is_admin {
        text.push_str("/admin - become an admin\n");
        text.push_str("/stopadmin - stop being an admin\n");
        text.push_str("/addcode - add a code\n");
        text.push_str("/removecode - remove a code\n");
        for group in &config.answer_groups {
            text.push_str(&format!("/{} - add a {} answer\n", group.add_command(), group.command));
            text.push_str(&format!("/{} - list {}\n", group.list_command(), group.command));
        }
    }
    text
}

pub fn register(outcome: &RegisterOutcome) -> String {
    match outcome {
        RegisterOutcome::Registered { username } => format!("Nice to meet you, {}!", username),
        RegisterOutcome::MissingUsername => MISSING_USERNAME.to_string(),
    }
}

pub fn team(outcome: &TeamOutcome, config: &GameConfig) -> String {
    match outcome {
        TeamOutcome::Joined { team } => format!("Welcome to team {}!", team),
        TeamOutcome::InvalidTeam => {
            let teams: Vec<String> = config.teams.iter().map(|t| format!("'{}'", t)).collect();
            format!("Please provide a valid team. Valid teams are {}", teams.join(" "))
        }
        TeamOutcome::NotRegistered => REGISTER_FIRST.to_string(),
    }
}

pub fn admin(outcome: &AdminOutcome) -> String {
    match outcome {
        AdminOutcome::Granted => "You are now an admin".to_string(),
        AdminOutcome::Revoked => "You are not an admin anymore".to_string(),
        AdminOutcome::WrongSecret => NOT_ADMIN.to_string(),
        AdminOutcome::NotRegistered => REGISTER_FIRST.to_string(),
    }
}

pub fn whoami(summary: Option<&PlayerSummary>) -> String {
    match summary {
        Some(PlayerSummary {
            username,
            team: Some(team),
        }) => format!("You are {} from team {}", username, team),
        Some(PlayerSummary { username, team: None }) => format!("You are {}", username),
        None => NOT_REGISTERED.to_string(),
    }
}

/// `finder_name` is only read for [`RedeemOutcome::AlreadyFound`].
pub fn redeem(code: &str, outcome: &RedeemOutcome, player_name: &str, finder_name: &str) -> String {
    match outcome {
        RedeemOutcome::Redeemed { hint: Some(hint) } => format!(
            "Congratulations, {}! You found the code {}\nHint: {}",
            player_name, code, hint
        ),
        RedeemOutcome::Redeemed { hint: None } => {
            format!("Congratulations, {}! You found the code {}", player_name, code)
        }
        RedeemOutcome::AlreadyFound { .. } => {
            format!("Code {} was already found by {}", code, finder_name)
        }
        RedeemOutcome::NoSuchCode => format!("Code {} does not exist", code),
    }
}

pub fn code_spec_error(error: CodeSpecError) -> String {
    match error {
        CodeSpecError::MissingCode => MISSING_CODE.to_string(),
        CodeSpecError::MissingRoom => MISSING_ROOM.to_string(),
    }
}

pub fn code_saved(spec: &CodeSpec, outcome: UpsertOutcome) -> String {
    let mut text = match outcome {
        UpsertOutcome::Created => format!("Code {} was added to room {}", spec.code, spec.room),
        UpsertOutcome::Updated => format!("Code {} was updated with room {}", spec.code, spec.room),
    };
    if let Some(note) = &spec.note {
        text.push_str(&format!(" with note {}", note));
    }
    if let Some(hint) = &spec.hint {
        text.push_str(&format!(" with hint {}", hint));
    }
    text
}

pub fn code_removed(code: &str, outcome: RemoveOutcome) -> String {
    match outcome {
        RemoveOutcome::Removed => format!("Code {} was removed", code),
        RemoveOutcome::NoSuchCode => format!("Code {} does not exist", code),
    }
}

pub fn code_listing(listing: &CodeListing) -> String {
    if listing.total == 0 {
        return "No codes were added yet".to_string();
    }

    let mut text = format!(
        "Found: {} codes\nLeft: {} codes\nTotal: {} codes\n",
        listing.found,
        listing.left(),
        listing.total
    );

    for room in &listing.rooms {
        text.push_str(&format!("\n{}:\n", room.room));
        for entry in &room.entries {
            text.push_str(&entry.code);
            if let Some(finder) = &entry.finder {
                text.push_str(&format!(" found by {}", finder));
            }
            if let Some(note) = &entry.note {
                text.push_str(&format!(" note: {}", note));
            }
            text.push('\n');
        }
        if room.unfound > 0 {
            text.push_str(&format!("Not found: {} codes\n", room.unfound));
        }
    }
    text
}

pub fn leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "No codes were found yet".to_string();
    }

    let mut text = String::new();
    for (i, entry) in entries.iter().enumerate() {
        text.push_str(&format!("{}. {} {}", i + 1, entry.username, entry.count));
        if let Some(team) = &entry.team {
            text.push_str(&format!(" (team {})", team));
        }
        text.push('\n');
    }
    text
}

/// `finder_name` is only read for [`SubmitOutcome::AlreadyFound`].
pub fn submit(outcome: &SubmitOutcome, player_name: &str, finder_name: &str) -> String {
    match outcome {
        SubmitOutcome::AlreadyAllSolved => "All answers were found".to_string(),
        SubmitOutcome::Wrong => "Wrong answer".to_string(),
        SubmitOutcome::AlreadyFound { answer, .. } => {
            format!("Answer {} was already found by {}", answer, finder_name)
        }
        SubmitOutcome::FirstSolve { answer } => {
            format!("Congratulations, {}! You found the answer {}", player_name, answer)
        }
        SubmitOutcome::AllSolvedNow { answer } => format!(
            "Congratulations, {}! You found the answer {}\nAll answers were found",
            player_name, answer
        ),
    }
}

pub fn answer_added(outcome: &AddAnswerOutcome) -> String {
    match outcome {
        AddAnswerOutcome::Added { answer } => format!("Answer {} was added", answer),
        AddAnswerOutcome::Duplicate { answer } => format!("Answer {} already exists", answer),
        AddAnswerOutcome::Empty => MISSING_ANSWER.to_string(),
    }
}

pub fn answer_listing(listing: &AnswerListing) -> String {
    let mut text = format!(
        "Found: {} answers\nLeft: {} answers\n\n",
        listing.found, listing.left
    );
    if listing.entries.is_empty() {
        text.push_str("No answers were added yet");
        return text;
    }
    for entry in &listing.entries {
        let line = match &entry.finder {
            Some(finder) => format!("{}: found by {}\n", entry.answer, finder),
            None => format!("{}: not found\n", entry.answer),
        };
        text.push_str(&line);
    }
    text
}

pub fn unhandled_follow_up(tag: &str) -> String {
    format!(
        "Wrong behavior. Cannot handle command {}. Please contact the admin",
        tag
    )
}

pub fn store_failure(error: &impl std::fmt::Display) -> String {
    format!("Something went wrong. Error: {}", error)
}
