//! The /add operation: date, then amount, then description.

use ledger::{Category, ExpenseItem};

use super::Dialogue;
use crate::{
    error::BotError,
    parsing::{parse_amount, parse_date},
    state::{AddStep, Conversation},
    ui::{self, Reply},
};

/// `/add [date]`, the date defaults to today.
pub(super) fn begin(
    dialogue: &Dialogue,
    conversation: &mut Conversation,
    arg: &str,
) -> Result<Vec<Reply>, BotError> {
    let today = dialogue.today();
    let date = if arg.is_empty() {
        today
    } else {
        parse_date(arg, today)?
    };

    *conversation = Conversation::Add(AddStep::AwaitingAmount { date });
    Ok(vec![ui::ask_amount()])
}

pub(super) fn amount(
    dialogue: &Dialogue,
    conversation: &mut Conversation,
    text: &str,
) -> Result<Vec<Reply>, BotError> {
    let Conversation::Add(AddStep::AwaitingAmount { date }) = *conversation else {
        return Ok(Vec::new());
    };
    let amount = parse_amount(text)?;

    *conversation = Conversation::Add(AddStep::AwaitingDescription { date, amount });
    Ok(vec![ui::ask_description(&dialogue.income_labels)])
}

pub(super) async fn description(
    dialogue: &Dialogue,
    conversation: &mut Conversation,
    text: &str,
) -> Result<Vec<Reply>, BotError> {
    let Conversation::Add(AddStep::AwaitingDescription { date, amount }) = *conversation else {
        return Ok(Vec::new());
    };
    let description = text.trim();
    if description.is_empty() {
        return Err(BotError::Validation("Description cannot be empty".to_string()));
    }

    let category = if dialogue.income_labels.iter().any(|l| l == description) {
        Category::Earn
    } else {
        Category::Spend
    };
    let item = ExpenseItem::new(amount, description, category);
    tracing::debug!("Recording {item} on {date}");
    dialogue.repository.add(item, date).await?;

    *conversation = Conversation::Idle;
    Ok(vec![ui::saved()])
}
