//! Telegram Bot API: decoding incoming updates and sending replies.

use std::time::Duration;

use anyhow::{Result, anyhow};
use dozor_engine::GameConfig;
use dozor_types::events::{InboundMessage, NewMember, OutboundReply, ReplyKeyboard};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

// ── Incoming updates ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub new_chat_members: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// `None` for updates the game has nothing to say about: edits,
    /// callbacks, and channel posts without a sender.
    pub fn into_inbound(self) -> Option<InboundMessage> {
        let message = self.message?;
        let sender = message.from?;
        let text = message.text.unwrap_or_default();

        let mut inbound = InboundMessage::from_text(sender.id, message.chat.id, message.date, &text);
        inbound.new_members = message
            .new_chat_members
            .into_iter()
            .map(|u| NewMember {
                id: u.id,
                first_name: u.first_name,
            })
            .collect();
        Some(inbound)
    }
}

// ── Outgoing calls ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    fn new(command: &str, description: &str) -> Self {
        Self {
            command: command.to_string(),
            description: description.to_string(),
        }
    }
}

/// The player-facing command menu. Admin commands stay out of it.
pub fn command_menu(config: &GameConfig) -> Vec<BotCommand> {
    let mut menu = vec![
        BotCommand::new("register", "set your username"),
        BotCommand::new("team", "set your team"),
        BotCommand::new("code", "send the code"),
        BotCommand::new("codes", "get the codes"),
        BotCommand::new("top", "get the top"),
    ];
    for group in &config.answer_groups {
        menu.push(BotCommand::new(
            &group.command,
            &format!("send the answer for {}", group.command),
        ));
    }
    menu.push(BotCommand::new("what", "get the list of commands"));
    menu.push(BotCommand::new("whoami", "get your username and team"));
    menu
}

fn reply_markup(keyboard: &ReplyKeyboard) -> Option<Value> {
    match keyboard {
        ReplyKeyboard::Keep => None,
        ReplyKeyboard::Choices(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| row.iter().map(|label| json!({ "text": label })).collect())
                .collect();
            Some(json!({
                "keyboard": rows,
                "one_time_keyboard": true,
                "resize_keyboard": true,
            }))
        }
        ReplyKeyboard::Remove => Some(json!({ "remove_keyboard": true })),
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    /// `https://api.telegram.org/bot<token>`
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{}", api_url, token),
        })
    }

    pub async fn send_message(&self, reply: &OutboundReply) -> Result<()> {
        let mut body = json!({
            "chat_id": reply.chat_id,
            "text": reply.text,
        });
        if let Some(markup) = reply_markup(&reply.keyboard) {
            body["reply_markup"] = markup;
        }
        self.call("sendMessage", &body).await
    }

    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        self.call("setMyCommands", &json!({ "commands": commands })).await
    }

    async fn call(&self, method: &str, body: &Value) -> Result<()> {
        let response: ApiResponse = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(anyhow!(
                "{} rejected: {}",
                method,
                response.description.unwrap_or_else(|| "no description".into())
            ));
        }
        Ok(())
    }
}
