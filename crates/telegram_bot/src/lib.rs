//! Telegram bot.
//!
//! A personal expense tracker: the owner records items with `/add` and lists
//! the items of a day with `/show`. Updates arrive by long polling
//! ([`Bot::run`]) or one at a time from a webhook payload
//! ([`Bot::handle_payload`]); either way they go through the same
//! [`Dialogue`].

use std::{path::PathBuf, sync::Arc};

use chrono_tz::Tz;
use ledger::Repository;
use teloxide::{
    prelude::*,
    types::{AllowedUpdate, ParseMode, UpdateKind},
    utils::command::BotCommands,
};

pub use commands::Command;
pub use error::BotError;
pub use handlers::{Dialogue, Inbound, Input, Sender};
pub use parsing::{DATE_FORMATS, DateFormat, parse_date};
pub use state::{AddStep, Clock, Conversation, ShowStep};
pub use teloxide::types::{ChatId, UserId};
pub use ui::{Keyboard, Reply};

mod commands;
mod error;
mod handlers;
mod parsing;
mod state;
mod ui;

pub struct Bot {
    token: String,
    dialogue: Dialogue,
}

impl Bot {
    pub fn builder() -> BotBuilder {
        BotBuilder::default()
    }

    pub fn dialogue(&self) -> &Dialogue {
        &self.dialogue
    }

    fn client(&self) -> teloxide::Bot {
        teloxide::Bot::new(&self.token)
    }

    /// Long polling until Ctrl-C.
    pub async fn run(&self) {
        tracing::info!("Starting telegram bot...");

        let bot = self.client();
        if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
            tracing::warn!("Could not register bot commands: {err}");
        }

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(on_message))
            .branch(Update::filter_callback_query().endpoint(on_callback));

        Dispatcher::builder(bot, handler)
            .dependencies(dptree::deps![self.dialogue.clone()])
            .default_handler(|upd| async move {
                tracing::warn!("Unhandled update: {:?}", upd);
            })
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    /// Handles a single update, e.g. the body of a webhook request.
    pub async fn handle_update(&self, update: Update) -> Result<(), BotError> {
        let bot = self.client();
        let id = update.id;
        match update.kind {
            UpdateKind::Message(msg) => on_message(bot, msg, self.dialogue.clone()).await?,
            UpdateKind::CallbackQuery(q) => on_callback(bot, q, self.dialogue.clone()).await?,
            other => tracing::warn!("Unhandled update {}: {other:?}", id.0),
        }
        Ok(())
    }

    /// Decodes a JSON update and handles it.
    pub async fn handle_payload(&self, payload: &str) -> Result<(), BotError> {
        let update: Update = serde_json::from_str(payload)
            .map_err(|err| BotError::Validation(format!("invalid update payload: {err}")))?;
        self.handle_update(update).await
    }

    pub async fn set_webhook(&self, url: &str) -> Result<(), BotError> {
        let url = reqwest::Url::parse(url)
            .map_err(|err| BotError::Configuration(format!("invalid webhook url: {err}")))?;

        let bot = self.client();
        bot.set_webhook(url)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::CallbackQuery])
            .await?;
        let info = bot.get_webhook_info().await?;
        tracing::info!("Webhook set: {info:?}");
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), BotError> {
        let bot = self.client();
        bot.delete_webhook().drop_pending_updates(true).await?;
        tracing::info!("Webhook deleted");
        Ok(())
    }
}

async fn on_message(bot: teloxide::Bot, msg: Message, dialogue: Dialogue) -> ResponseResult<()> {
    deliver(&bot, &dialogue, &Inbound::from_message(&msg)).await
}

async fn on_callback(
    bot: teloxide::Bot,
    q: CallbackQuery,
    dialogue: Dialogue,
) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;
    match Inbound::from_callback(&q) {
        Some(event) => deliver(&bot, &dialogue, &event).await,
        None => Ok(()),
    }
}

async fn deliver(bot: &teloxide::Bot, dialogue: &Dialogue, event: &Inbound) -> ResponseResult<()> {
    for reply in dialogue.process(event).await {
        send(bot, event.chat_id, reply).await?;
    }
    Ok(())
}

async fn send(bot: &teloxide::Bot, chat_id: ChatId, reply: Reply) -> ResponseResult<()> {
    let mut req = bot.send_message(chat_id, reply.text);
    if reply.html {
        req = req.parse_mode(ParseMode::Html);
    }
    if reply.protected {
        req = req.protect_content(true);
    }
    if let Some(keyboard) = reply.keyboard {
        req = req.reply_markup(ui::reply_markup(keyboard));
    }
    req.await?;
    Ok(())
}

#[derive(Default)]
pub struct BotBuilder {
    token: String,
    owner: Option<UserId>,
    repository: Option<Arc<dyn Repository>>,
    income_labels: Option<Vec<String>>,
    clock: Clock,
    session_file: Option<PathBuf>,
}

impl BotBuilder {
    pub fn token(mut self, token: &str) -> BotBuilder {
        self.token = token.to_string();
        self
    }

    /// The only user allowed to talk to the bot.
    pub fn owner(mut self, owner: UserId) -> BotBuilder {
        self.owner = Some(owner);
        self
    }

    pub fn repository(mut self, repository: Arc<dyn Repository>) -> BotBuilder {
        self.repository = Some(repository);
        self
    }

    pub fn income_labels(mut self, labels: Vec<String>) -> BotBuilder {
        self.income_labels = Some(labels);
        self
    }

    /// Timezone deciding what "today" is.
    pub fn timezone(mut self, tz: Tz) -> BotBuilder {
        self.clock = Clock::Zone(tz);
        self
    }

    pub fn clock(mut self, clock: Clock) -> BotBuilder {
        self.clock = clock;
        self
    }

    /// JSON file keeping conversations between processes.
    pub fn session_file(mut self, path: PathBuf) -> BotBuilder {
        self.session_file = Some(path);
        self
    }

    pub fn build(self) -> Result<Bot, BotError> {
        tracing::info!("Initializing telegram bot...");
        if self.token.trim().is_empty() {
            return Err(BotError::Configuration("Bot token is missing".to_string()));
        }
        let owner = self
            .owner
            .ok_or_else(|| BotError::Configuration("Owner id is missing".to_string()))?;
        let repository = self.repository.ok_or_else(|| {
            BotError::Configuration("Repository is not configured".to_string())
        })?;
        tracing::info!("Using {} repository", repository.name());

        let mut dialogue = Dialogue::new(repository, owner).with_clock(self.clock);
        if let Some(labels) = self.income_labels {
            dialogue = dialogue.with_income_labels(labels);
        }
        if let Some(path) = self.session_file {
            dialogue = dialogue.with_session_file(path);
        }

        Ok(Bot {
            token: self.token,
            dialogue,
        })
    }
}
