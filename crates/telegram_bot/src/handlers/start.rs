//! Handler for the /start command

use super::Sender;
use crate::ui::{self, Reply};

pub(super) fn start(sender: &Sender) -> Reply {
    ui::greeting(sender.id, &sender.full_name)
}
