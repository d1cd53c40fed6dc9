//! The /show operation.

use super::Dialogue;
use crate::{
    error::BotError,
    parsing::parse_date,
    state::{Conversation, ShowStep},
    ui::{self, Reply},
};

/// `/show` without a date asks for one.
pub(super) fn ask(conversation: &mut Conversation) -> Vec<Reply> {
    *conversation = Conversation::Show(ShowStep::AwaitingDate);
    vec![ui::ask_date()]
}

/// One reply per item recorded on the date, or a single "nothing here".
pub(super) async fn lookup(dialogue: &Dialogue, text: &str) -> Result<Vec<Reply>, BotError> {
    let date = parse_date(text, dialogue.today())?;
    let items = dialogue.repository.get_all(date).await?;
    tracing::debug!("Found {} items on {date}", items.len());

    if items.is_empty() {
        return Ok(vec![ui::nothing_found()]);
    }
    Ok(items.iter().map(ui::item).collect())
}

/// Date typed in answer to the prompt.
pub(super) async fn answer(
    dialogue: &Dialogue,
    conversation: &mut Conversation,
    text: &str,
) -> Result<Vec<Reply>, BotError> {
    let replies = lookup(dialogue, text).await?;
    *conversation = Conversation::Idle;
    Ok(replies)
}

/// Date picked with an inline button, echoed before the items.
pub(super) async fn selected(
    dialogue: &Dialogue,
    conversation: &mut Conversation,
    data: &str,
) -> Result<Vec<Reply>, BotError> {
    let mut replies = vec![ui::selected(data)];
    replies.extend(answer(dialogue, conversation, data).await?);
    Ok(replies)
}
