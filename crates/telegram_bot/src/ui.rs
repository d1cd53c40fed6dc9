//! Outgoing messages and keyboards.
use ledger::ExpenseItem;
use rand::seq::IndexedRandom;
use teloxide::{
    types::{
        InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup,
        KeyboardRemove, ReplyMarkup, UserId,
    },
    utils::html,
};

use crate::{
    error::BotError,
    parsing::{TODAY, YESTERDAY},
};

pub(crate) const ACKNOWLEDGMENTS: [&str; 5] = ["🎉", "🥳", "🙌", "✔️", "💾"];
pub(crate) const NOTHING_FOUND: [&str; 3] = ["🤷‍♂️", "😴", "😪"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyboard {
    /// One-time reply keyboard; a tap sends the label as a text message.
    Reply(Vec<String>),
    /// Inline buttons as `(label, callback data)`.
    Inline(Vec<(String, String)>),
    /// Hides a reply keyboard shown earlier.
    Remove,
}

/// A message to send back to the chat of the update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub html: bool,
    /// Forbids forwarding and saving.
    pub protected: bool,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: false,
            protected: false,
            keyboard: None,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            html: true,
            ..Self::text(text)
        }
    }

    #[must_use]
    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    #[must_use]
    pub fn keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

pub(crate) fn reply_markup(keyboard: Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Reply(labels) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(vec![
                labels.into_iter().map(KeyboardButton::new).collect::<Vec<_>>(),
            ])
            .one_time_keyboard()
            .resize_keyboard(),
        ),
        Keyboard::Inline(buttons) => ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(vec![
            buttons
                .into_iter()
                .map(|(label, data)| InlineKeyboardButton::callback(label, data))
                .collect::<Vec<_>>(),
        ])),
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

fn pick(options: &[&'static str]) -> &'static str {
    options.choose(&mut rand::rng()).copied().unwrap_or_default()
}

pub(crate) fn greeting(user_id: UserId, full_name: &str) -> Reply {
    Reply::html(format!(
        "Hi {}! 👋\nI'm your personal expense tracking bot!",
        html::user_mention(user_id, full_name)
    ))
}

pub(crate) fn ask_amount() -> Reply {
    Reply::text("Amount in $?")
}

pub(crate) fn ask_description(income_labels: &[String]) -> Reply {
    let reply = Reply::text("Description?");
    if income_labels.is_empty() {
        reply
    } else {
        reply.keyboard(Keyboard::Reply(income_labels.to_vec()))
    }
}

pub(crate) fn saved() -> Reply {
    Reply::text(pick(&ACKNOWLEDGMENTS)).keyboard(Keyboard::Remove)
}

pub(crate) fn ask_date() -> Reply {
    Reply::text("Which date?").keyboard(Keyboard::Inline(vec![
        (TODAY.to_string(), TODAY.to_string()),
        (YESTERDAY.to_string(), YESTERDAY.to_string()),
    ]))
}

/// Echo of a selected inline button, so the choice stays visible in the chat.
pub(crate) fn selected(data: &str) -> Reply {
    Reply::html(format!("👉 {}", html::italic(&html::escape(data))))
}

pub(crate) fn item(item: &ExpenseItem) -> Reply {
    Reply::html(format!(
        "{}: {}",
        html::bold(&html::escape(&item.description)),
        html::code_inline(&format!("${}", item.amount))
    ))
    .protected()
}

pub(crate) fn nothing_found() -> Reply {
    Reply::text(pick(&NOTHING_FOUND))
}

pub(crate) fn cancelled(operation: &str) -> Reply {
    Reply::text(format!("Operation /{operation} cancelled")).keyboard(Keyboard::Remove)
}

pub(crate) fn unrecognized() -> Reply {
    Reply::text("Command not recognized :(")
}

pub(crate) fn failure(err: &BotError) -> Reply {
    Reply::html(format!(
        "Something went wrong...\n\n{}",
        html::code_inline(&format!("{}: {err}", err.kind()))
    ))
}
