//! # Command Router
//!
//! Turns one inbound message into replies. A slash command either runs at
//! once, or (when it needs an argument that was not given inline) prompts
//! the player and arms a follow-up. Plain text is only meaningful as the
//! answer to such a prompt.

use dozor_types::events::{CommandInvocation, InboundMessage, OutboundReply, ReplyKeyboard};
use dozor_types::models::{ExpectedCommand, PlayerId};
use tracing::{error, info};

use crate::Engine;
use crate::answers::SubmitOutcome;
use crate::codes::{CodeSpec, RedeemOutcome};
use crate::config::AnswerGroup;
use crate::error::Result;
use crate::replies;

/// What an explicit command asks for.
enum Intent<'a> {
    Help,
    /// Needs an argument: given inline it runs now, otherwise the player is prompted
    WithArgument(ExpectedCommand),
    Codes,
    Top,
    WhoAmI,
    ListAnswers(&'a AnswerGroup),
    Unknown,
}

#[derive(Clone)]
pub struct CommandRouter {
    engine: Engine,
}

impl CommandRouter {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Runs every message of a batch. A failing message gets an error reply;
    /// the rest of the batch still runs.
    pub fn handle_batch(&self, messages: &[InboundMessage]) -> Vec<OutboundReply> {
        messages.iter().flat_map(|m| self.handle(m)).collect()
    }

    pub fn handle(&self, message: &InboundMessage) -> Vec<OutboundReply> {
        match self.try_handle(message) {
            Ok(replies) => replies,
            Err(e) => {
                error!(
                    player_id = message.sender_id,
                    chat_id = message.chat_id,
                    "Failed to handle message: {}",
                    e
                );
                vec![
                    OutboundReply::text(message.chat_id, replies::store_failure(&e))
                        .with_keyboard(ReplyKeyboard::Remove),
                ]
            }
        }
    }

    fn try_handle(&self, message: &InboundMessage) -> Result<Vec<OutboundReply>> {
        if !message.new_members.is_empty() {
            return Ok(message
                .new_members
                .iter()
                .map(|m| OutboundReply::text(message.chat_id, replies::greeting(&m.first_name)))
                .collect());
        }

        match &message.command {
            Some(command) => self.on_command(message, command),
            None => self.on_plain_text(message),
        }
    }

    fn on_plain_text(&self, message: &InboundMessage) -> Result<Vec<OutboundReply>> {
        let Some(expected) = self.engine.consume(message.sender_id, message.date)? else {
            return Ok(vec![
                OutboundReply::text(message.chat_id, replies::NOT_UNDERSTOOD)
                    .with_keyboard(ReplyKeyboard::Remove),
            ]);
        };

        info!(player_id = message.sender_id, command = %expected, "Completing follow-up");
        Ok(vec![self.complete(message, &expected, &message.text)?])
    }

    fn on_command(
        &self,
        message: &InboundMessage,
        command: &CommandInvocation,
    ) -> Result<Vec<OutboundReply>> {
        info!(
            "Router dispatching cmd='{}' args='{}' sender='{}'",
            command.name, command.args, message.sender_id
        );

        let player_id = message.sender_id;
        let chat_id = message.chat_id;

        let text = match self.resolve(&command.name) {
            Intent::Help => replies::help(self.engine.config(), self.engine.is_admin(player_id)?),
            Intent::WithArgument(expected) => {
                if !command.args.is_empty() {
                    return Ok(vec![self.complete(message, &expected, &command.args)?]);
                }
                self.engine.arm(player_id, expected.clone(), message.date)?;
                return Ok(vec![self.prompt(chat_id, &expected)]);
            }
            Intent::Codes => {
                if !self.engine.is_registered(player_id)? {
                    replies::REGISTER_FIRST.to_string()
                } else {
                    replies::code_listing(&self.engine.list_codes(player_id)?)
                }
            }
            Intent::Top => {
                if !self.engine.is_registered(player_id)? {
                    replies::REGISTER_FIRST.to_string()
                } else {
                    replies::leaderboard(&self.engine.top()?)
                }
            }
            Intent::WhoAmI => replies::whoami(self.engine.describe(player_id)?.as_ref()),
            Intent::ListAnswers(group) => {
                if !self.engine.is_admin(player_id)? {
                    replies::NOT_ADMIN.to_string()
                } else {
                    replies::answer_listing(&self.engine.list_answers(group)?)
                }
            }
            Intent::Unknown => replies::UNKNOWN_COMMAND.to_string(),
        };

        Ok(vec![OutboundReply::text(chat_id, text)])
    }

    fn resolve(&self, name: &str) -> Intent<'_> {
        match name {
            "start" | "what" => Intent::Help,
            "register" => Intent::WithArgument(ExpectedCommand::Register),
            "team" => Intent::WithArgument(ExpectedCommand::Team),
            "code" => Intent::WithArgument(ExpectedCommand::Code),
            "codes" => Intent::Codes,
            "top" => Intent::Top,
            "whoami" => Intent::WhoAmI,
            "admin" => Intent::WithArgument(ExpectedCommand::Admin),
            "stopadmin" => Intent::WithArgument(ExpectedCommand::StopAdmin),
            "addcode" => Intent::WithArgument(ExpectedCommand::AddCode),
            "removecode" => Intent::WithArgument(ExpectedCommand::RemoveCode),
            _ => {
                for group in &self.engine.config().answer_groups {
                    if name == group.command {
                        return Intent::WithArgument(ExpectedCommand::Answer(group.command.clone()));
                    }
                    if name == group.add_command() {
                        return Intent::WithArgument(ExpectedCommand::AddAnswer(
                            group.command.clone(),
                        ));
                    }
                    if name == group.list_command() {
                        return Intent::ListAnswers(group);
                    }
                }
                Intent::Unknown
            }
        }
    }

    fn prompt(&self, chat_id: i64, expected: &ExpectedCommand) -> OutboundReply {
        let text = match expected {
            ExpectedCommand::Register => replies::PROMPT_USERNAME,
            ExpectedCommand::Team => {
                return OutboundReply::text(chat_id, replies::PROMPT_TEAM).with_keyboard(
                    ReplyKeyboard::Choices(self.engine.config().team_keyboard()),
                );
            }
            ExpectedCommand::Code | ExpectedCommand::RemoveCode => replies::PROMPT_CODE,
            ExpectedCommand::Admin | ExpectedCommand::StopAdmin => replies::PROMPT_SECRET,
            ExpectedCommand::AddCode => replies::PROMPT_CODE_SPEC,
            ExpectedCommand::Answer(_) | ExpectedCommand::AddAnswer(_) => replies::PROMPT_ANSWER,
        };
        OutboundReply::text(chat_id, text)
    }

    /// Runs an argument-taking command with its argument, whether it came
    /// inline or as a follow-up message.
    fn complete(
        &self,
        message: &InboundMessage,
        expected: &ExpectedCommand,
        argument: &str,
    ) -> Result<OutboundReply> {
        let player_id = message.sender_id;
        let chat_id = message.chat_id;
        let argument = argument.trim();
        let config = self.engine.config();

        let text = match expected {
            ExpectedCommand::Register => replies::register(&self.engine.register(player_id, argument)?),
            ExpectedCommand::Team => {
                let outcome = self.engine.set_team(player_id, argument)?;
                return Ok(OutboundReply::text(chat_id, replies::team(&outcome, config))
                    .with_keyboard(ReplyKeyboard::Remove));
            }
            ExpectedCommand::Code => self.redeem(player_id, argument)?,
            ExpectedCommand::Admin => replies::admin(&self.engine.grant_admin(player_id, argument, true)?),
            ExpectedCommand::StopAdmin => {
                replies::admin(&self.engine.grant_admin(player_id, argument, false)?)
            }
            ExpectedCommand::AddCode => self.add_code(player_id, argument)?,
            ExpectedCommand::RemoveCode => self.remove_code(player_id, argument)?,
            ExpectedCommand::Answer(command) => match config.answer_group(command) {
                Some(group) => self.submit(group, player_id, argument)?,
                None => replies::unhandled_follow_up(&expected.tag()),
            },
            ExpectedCommand::AddAnswer(command) => match config.answer_group(command) {
                Some(group) => self.add_answer(group, player_id, argument)?,
                None => replies::unhandled_follow_up(&expected.tag()),
            },
        };

        Ok(OutboundReply::text(chat_id, text))
    }

    fn redeem(&self, player_id: PlayerId, code: &str) -> Result<String> {
        if !self.engine.is_registered(player_id)? {
            return Ok(replies::REGISTER_FIRST.to_string());
        }
        if code.is_empty() {
            return Ok(replies::MISSING_CODE.to_string());
        }

        let outcome = self.engine.redeem(code, player_id)?;
        let finder_name = match &outcome {
            RedeemOutcome::AlreadyFound { finder } => self.engine.display_name(*finder)?,
            _ => String::new(),
        };
        let player_name = self.engine.display_name(player_id)?;
        Ok(replies::redeem(code, &outcome, &player_name, &finder_name))
    }

    fn add_code(&self, player_id: PlayerId, argument: &str) -> Result<String> {
        if !self.engine.is_admin(player_id)? {
            return Ok(replies::NOT_ADMIN.to_string());
        }
        let spec = match CodeSpec::parse(argument) {
            Ok(spec) => spec,
            Err(e) => return Ok(replies::code_spec_error(e)),
        };
        let outcome = self.engine.upsert_code(&spec)?;
        Ok(replies::code_saved(&spec, outcome))
    }

    fn remove_code(&self, player_id: PlayerId, code: &str) -> Result<String> {
        if !self.engine.is_admin(player_id)? {
            return Ok(replies::NOT_ADMIN.to_string());
        }
        if code.is_empty() {
            return Ok(replies::MISSING_CODE.to_string());
        }
        let outcome = self.engine.remove_code(code)?;
        Ok(replies::code_removed(code, outcome))
    }

    fn submit(&self, group: &AnswerGroup, player_id: PlayerId, answer: &str) -> Result<String> {
        if !self.engine.is_registered(player_id)? {
            return Ok(replies::REGISTER_FIRST.to_string());
        }
        if answer.is_empty() {
            return Ok(replies::MISSING_ANSWER.to_string());
        }

        let outcome = self.engine.submit_answer(group, player_id, answer)?;
        let finder_name = match &outcome {
            SubmitOutcome::AlreadyFound { finder, .. } => self.engine.display_name(*finder)?,
            _ => String::new(),
        };
        let player_name = self.engine.display_name(player_id)?;
        Ok(replies::submit(&outcome, &player_name, &finder_name))
    }

    fn add_answer(&self, group: &AnswerGroup, player_id: PlayerId, answer: &str) -> Result<String> {
        if !self.engine.is_admin(player_id)? {
            return Ok(replies::NOT_ADMIN.to_string());
        }
        Ok(replies::answer_added(&self.engine.add_answer(group, answer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::engine;

    fn router() -> CommandRouter {
        CommandRouter::new(engine())
    }

    #[test]
    fn resolves_answer_group_commands() {
        let router = router();
        assert!(matches!(
            router.resolve("a3"),
            Intent::WithArgument(ExpectedCommand::Answer(g)) if g == "a3"
        ));
        assert!(matches!(
            router.resolve("b1answer"),
            Intent::WithArgument(ExpectedCommand::AddAnswer(g)) if g == "b1"
        ));
        assert!(matches!(router.resolve("listb1"), Intent::ListAnswers(g) if g.table == "PairB"));
        assert!(matches!(router.resolve("c9"), Intent::Unknown));
    }

    #[test]
    fn builtin_list_matches_resolution() {
        let router = router();
        for name in crate::config::BUILTIN_COMMANDS {
            assert!(!matches!(router.resolve(name), Intent::Unknown), "{} is not routed", name);
        }
    }

    #[test]
    fn start_and_what_are_the_same_help() {
        let router = router();
        let help = |text: &str| router.handle(&InboundMessage::from_text(1, 1, 0, text))[0].text.clone();
        assert_eq!(help("/start"), help("/what"));
    }

    #[test]
    fn prompt_arms_the_expected_command() {
        let router = router();
        let replies = router.handle(&InboundMessage::from_text(1, 5, 100, "/code"));
        assert_eq!(replies[0].chat_id, 5);
        assert_eq!(replies[0].text, replies::PROMPT_CODE);
        assert_eq!(
            router.engine().consume(1, 101).unwrap(),
            Some(ExpectedCommand::Code)
        );
    }
}
