//! Bot commands

use teloxide::utils::command::BotCommands;

/// Commands understood by the bot, in any conversation state.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Expense tracking commands:")]
pub enum Command {
    #[command(description = "Start conversation")]
    Start,
    #[command(description = "Record an expense item, optionally for a date")]
    Add(String),
    #[command(description = "Show expenses for a certain date")]
    Show(String),
    #[command(description = "Cancel current operation")]
    Cancel,
}

/// Parses `/name[@bot] [argument]`. Unknown commands give `None`.
pub fn parse_command(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    let rest = trimmed.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let name = name.split('@').next().unwrap_or(name);
    let arg = parts.next().unwrap_or("").trim().to_string();

    match name.to_lowercase().as_str() {
        "start" => Some(Command::Start),
        "add" => Some(Command::Add(arg)),
        "show" => Some(Command::Show(arg)),
        "cancel" => Some(Command::Cancel),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/add"), Some(Command::Add(String::new())));
        assert_eq!(
            parse_command("/add 2022-07-11"),
            Some(Command::Add("2022-07-11".to_string()))
        );
        assert_eq!(
            parse_command("  /show@expense_bot   yesterday "),
            Some(Command::Show("yesterday".to_string()))
        );
        assert_eq!(parse_command("/CANCEL"), Some(Command::Cancel));
    }

    #[test]
    fn ignores_other_text() {
        assert_eq!(parse_command("cancel"), None);
        assert_eq!(parse_command("/help"), None);
        assert_eq!(parse_command("12.50"), None);
        assert_eq!(parse_command("/"), None);
    }

    #[test]
    fn describes_every_command() {
        let names: Vec<String> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command.trim_start_matches('/').to_string())
            .collect();
        assert_eq!(names, ["start", "add", "show", "cancel"]);
    }
}
