//! Conversation handling, independent of the Telegram transport.
//!
//! Every update goes through [`Dialogue::handle`]: the sender is authorized
//! first, then the update is routed by the conversation state of its chat.
//! Commands are understood in any state. A failing handler leaves the state
//! as it was.

use std::{path::PathBuf, sync::Arc};

use ledger::Repository;
use teloxide::types::{CallbackQuery, ChatId, Message, MessageId, User, UserId};

use crate::{
    commands::{Command, parse_command},
    error::BotError,
    state::{AddStep, Clock, Conversation, SessionStore, ShowStep},
    ui::{self, Reply},
};

mod add;
mod show;
mod start;

/// Literal text accepted as `/cancel`.
const CANCEL_TEXT: &str = "cancel";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub full_name: String,
}

impl From<&User> for Sender {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Text(String),
    /// Data of a pressed inline button.
    Callback(String),
    /// Stickers, photos and anything else without text.
    Unsupported,
}

/// An incoming message or button press.
#[derive(Clone, Debug)]
pub struct Inbound {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub sender: Option<Sender>,
    pub input: Input,
}

impl Inbound {
    pub fn from_message(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id,
            message_id: msg.id,
            sender: msg.from.as_ref().map(Sender::from),
            input: msg
                .text()
                .map_or(Input::Unsupported, |text| Input::Text(text.to_string())),
        }
    }

    /// `None` when the message of the button is no longer known.
    pub fn from_callback(q: &CallbackQuery) -> Option<Self> {
        let message = q.message.as_ref()?;
        Some(Self {
            chat_id: message.chat().id,
            message_id: message.id(),
            sender: Some(Sender::from(&q.from)),
            input: q
                .data
                .clone()
                .map_or(Input::Unsupported, Input::Callback),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route<'a> {
    Start,
    Cancel,
    AddBegin(&'a str),
    AddAmount(&'a str),
    AddDescription(&'a str),
    ShowNow(&'a str),
    ShowAsk,
    ShowDate(&'a str),
    ShowSelected(&'a str),
    Unrecognized,
    Ignored,
}

impl Route<'_> {
    fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Cancel => "cancel",
            Self::AddBegin(_) => "add",
            Self::AddAmount(_) => "add_amount",
            Self::AddDescription(_) => "add_description",
            Self::ShowNow(_) | Self::ShowAsk => "show",
            Self::ShowDate(_) | Self::ShowSelected(_) => "show_date",
            Self::Unrecognized => "unrecognized",
            Self::Ignored => "ignored",
        }
    }
}

fn route<'a>(state: &Conversation, input: &'a Input) -> Route<'a> {
    match input {
        Input::Text(text) => {
            match parse_command(text) {
                Some(Command::Start) => return Route::Start,
                Some(Command::Cancel) => return Route::Cancel,
                Some(Command::Add(_)) => return Route::AddBegin(command_arg(text)),
                Some(Command::Show(_)) if command_arg(text).is_empty() => return Route::ShowAsk,
                Some(Command::Show(_)) => return Route::ShowNow(command_arg(text)),
                None => {}
            }
            if text.trim() == CANCEL_TEXT {
                return Route::Cancel;
            }
            match state {
                Conversation::Idle => Route::Unrecognized,
                Conversation::Add(AddStep::AwaitingAmount { .. }) => Route::AddAmount(text),
                Conversation::Add(AddStep::AwaitingDescription { .. }) => {
                    Route::AddDescription(text)
                }
                Conversation::Show(ShowStep::AwaitingDate) => Route::ShowDate(text),
            }
        }
        Input::Callback(data) => match state {
            Conversation::Add(AddStep::AwaitingDescription { .. }) => Route::AddDescription(data),
            Conversation::Show(ShowStep::AwaitingDate) => Route::ShowSelected(data),
            _ => Route::Ignored,
        },
        Input::Unsupported => match state {
            Conversation::Idle => Route::Unrecognized,
            _ => Route::Ignored,
        },
    }
}

/// Text after the command name, borrowed from the message.
fn command_arg(text: &str) -> &str {
    text.trim()
        .split_once(char::is_whitespace)
        .map_or("", |(_, arg)| arg.trim())
}

/// Handles updates of every chat. Cheap to clone.
#[derive(Clone)]
pub struct Dialogue {
    repository: Arc<dyn Repository>,
    owner: UserId,
    income_labels: Arc<[String]>,
    clock: Clock,
    sessions: SessionStore,
}

impl Dialogue {
    pub fn new(repository: Arc<dyn Repository>, owner: UserId) -> Self {
        Self {
            repository,
            owner,
            income_labels: Arc::from(default_income_labels()),
            clock: Clock::default(),
            sessions: SessionStore::default(),
        }
    }

    /// Descriptions recorded as earnings; also offered as quick replies.
    #[must_use]
    pub fn with_income_labels(mut self, labels: Vec<String>) -> Self {
        self.income_labels = Arc::from(labels);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Keeps conversations in a JSON file, so an operation started by one
    /// process can be finished by the next one.
    #[must_use]
    pub fn with_session_file(mut self, path: PathBuf) -> Self {
        tracing::info!("Loading conversations from {}", path.display());
        self.sessions = SessionStore::load_or_empty(path);
        self
    }

    pub async fn conversation(&self, chat_id: ChatId) -> Conversation {
        self.sessions.get(chat_id).await
    }

    /// Handles one update and returns the replies for its chat.
    pub async fn handle(&self, event: &Inbound) -> Result<Vec<Reply>, BotError> {
        let sender = self.authorize(event.sender.as_ref())?;

        let mut conversation = self.sessions.lock(event.chat_id).await;
        let route = route(&conversation, &event.input);

        tracing::info!(
            "Message {}, chat {}: `{}` handler dispatched",
            event.message_id.0,
            event.chat_id.0,
            route.name()
        );
        let replies = match route {
            Route::Start => Ok(vec![start::start(sender)]),
            Route::Cancel => Ok(cancel(&mut conversation)),
            Route::AddBegin(arg) => add::begin(self, &mut conversation, arg),
            Route::AddAmount(text) => add::amount(self, &mut conversation, text),
            Route::AddDescription(text) => add::description(self, &mut conversation, text).await,
            Route::ShowNow(arg) => show::lookup(self, arg).await,
            Route::ShowAsk => Ok(show::ask(&mut conversation)),
            Route::ShowDate(text) => show::answer(self, &mut conversation, text).await,
            Route::ShowSelected(data) => show::selected(self, &mut conversation, data).await,
            Route::Unrecognized => Ok(vec![ui::unrecognized()]),
            Route::Ignored => Ok(Vec::new()),
        }?;
        if let Err(err) = self.sessions.save(event.chat_id, &conversation).await {
            tracing::warn!("Chat {}: could not save conversation: {err}", event.chat_id.0);
        }
        tracing::info!(
            "Message {}, chat {}: `{}` handler done",
            event.message_id.0,
            event.chat_id.0,
            route.name()
        );

        Ok(replies)
    }

    /// Like [`Dialogue::handle`], with a failure reported as a reply.
    pub async fn process(&self, event: &Inbound) -> Vec<Reply> {
        match self.handle(event).await {
            Ok(replies) => replies,
            Err(err) => {
                tracing::warn!(
                    "Message {}, chat {}: {}: {err}",
                    event.message_id.0,
                    event.chat_id.0,
                    err.kind()
                );
                vec![ui::failure(&err)]
            }
        }
    }

    fn authorize<'a>(&self, sender: Option<&'a Sender>) -> Result<&'a Sender, BotError> {
        match sender {
            Some(sender) if sender.id == self.owner => Ok(sender),
            Some(sender) => Err(BotError::AccessDenied(format!(
                "User {} is not allowed to use this bot",
                sender.id.0
            ))),
            None => Err(BotError::AccessDenied("Unknown sender".to_string())),
        }
    }

    fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }
}

pub(crate) fn default_income_labels() -> Vec<String> {
    vec!["Paycheck".to_string(), "Cashback".to_string()]
}

fn cancel(conversation: &mut Conversation) -> Vec<Reply> {
    let Some(operation) = conversation.operation() else {
        tracing::debug!("Nothing to cancel");
        return Vec::new();
    };
    *conversation = Conversation::Idle;
    vec![ui::cancelled(operation)]
}
