use serde::{Deserialize, Serialize};

use crate::models::{ChatId, PlayerId};

/// Someone who just joined the chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub id: PlayerId,
    pub first_name: String,
}

/// A slash command split into its name and the rest of the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub name: String,
    pub args: String,
}

impl CommandInvocation {
    /// Parses `/name@bot rest of line`. Returns `None` for plain text.
    pub fn parse(text: &str) -> Option<Self> {
        let body = text.trim_start().strip_prefix('/')?;
        let (head, rest) = match body.find(char::is_whitespace) {
            Some(idx) => (&body[..idx], &body[idx..]),
            None => (body, ""),
        };
        // Group chats address commands as /code@SomeBot
        let name = head.split('@').next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            args: rest.trim().to_string(),
        })
    }
}

/// One inbound chat message, already decoded from the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub sender_id: PlayerId,
    pub chat_id: ChatId,
    /// Unix seconds as reported by the platform.
    pub date: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub command: Option<CommandInvocation>,
    #[serde(default)]
    pub new_members: Vec<NewMember>,
}

impl InboundMessage {
    /// Builds a message from raw text, detecting a leading slash command.
    pub fn from_text(sender_id: PlayerId, chat_id: ChatId, date: i64, text: &str) -> Self {
        Self {
            sender_id,
            chat_id,
            date,
            text: text.to_string(),
            command: CommandInvocation::parse(text),
            new_members: Vec::new(),
        }
    }
}

/// Reply keyboard attached to an outbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows")]
pub enum ReplyKeyboard {
    /// Leave whatever keyboard the client shows untouched
    #[default]
    Keep,

    /// Show a fixed set of choices, one inner vec per row
    Choices(Vec<Vec<String>>),

    /// Remove a previously shown keyboard
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReply {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(default)]
    pub keyboard: ReplyKeyboard,
}

impl OutboundReply {
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: ReplyKeyboard::Keep,
        }
    }

    pub fn with_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.keyboard = keyboard;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_bot_suffix_and_args() {
        let cmd = CommandInvocation::parse("/addcode@DozorBot  X1 - hall - under the desk ").unwrap();
        assert_eq!(cmd.name, "addcode");
        assert_eq!(cmd.args, "X1 - hall - under the desk");
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(CommandInvocation::parse("hello there"), None);
        assert_eq!(CommandInvocation::parse("/"), None);
        assert_eq!(CommandInvocation::parse("/ spaced"), None);
    }

    #[test]
    fn bare_command_has_empty_args() {
        let msg = InboundMessage::from_text(7, 70, 100, "/top");
        let cmd = msg.command.unwrap();
        assert_eq!(cmd.name, "top");
        assert!(cmd.args.is_empty());
    }
}
