//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the model.

/// A parsed chat command.
///
/// These commands control the chat session and are not sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history, keeping the hidden preamble.
    Clear,

    /// Re-render the visible transcript.
    History,

    /// Change the model.
    Model(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Display session statistics (message count, current model, etc.).
    Stats,

    /// Send text that starts with `/` as an ordinary message (input began with `//`).
    Message(String),

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a regular message.  Input whose first word contains
/// another `/` (a path, say) is a regular message, and `//` escapes a leading slash.
///
/// # Examples
///
/// ```
/// # use searchchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model gemini-2.5-flash").is_some());
/// assert!(parse_command("What is the latest news?").is_none());
/// assert!(parse_command("/etc/hosts, what is that?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;
    if rest.starts_with('/') {
        return Some(ChatCommand::Message(rest.to_string()));
    }

    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    if command.contains('/') {
        return None;
    }
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" | "reset" => ChatCommand::Clear,
        "history" => ChatCommand::History,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        "stats" | "status" => ChatCommand::Stats,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /history               Show the conversation so far
  /clear                 Clear conversation history
  /model <name>          Change the model (e.g., /model gemini-2.5-flash)
  /stats                 Show session statistics
  /help                  Show this help message
  /quit                  Exit the chat
  //text                 Send text that starts with "/""#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_clear() {
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/CLEAR"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/reset"), Some(ChatCommand::Clear));
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model gemini-2.5-pro"),
            Some(ChatCommand::Model("gemini-2.5-pro".to_string()))
        );
        assert_eq!(
            parse_command("/model   gemini-2.0-flash  "),
            Some(ChatCommand::Model("gemini-2.0-flash".to_string()))
        );
        assert_eq!(
            parse_command("/model"),
            Some(ChatCommand::Invalid(
                "/model requires a model name".to_string()
            ))
        );
    }

    #[test]
    fn parse_history_and_stats() {
        assert_eq!(parse_command("/history"), Some(ChatCommand::History));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/status"), Some(ChatCommand::Stats));
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse_command("/search on"),
            Some(ChatCommand::Invalid("Unknown command: /search".to_string()))
        );
    }

    #[test]
    fn paths_and_escapes_are_messages() {
        assert_eq!(parse_command("/etc/hosts, what is that?"), None);
        assert_eq!(parse_command("/usr/bin/env"), None);
        assert_eq!(
            parse_command("//help is a comment marker"),
            Some(ChatCommand::Message("/help is a comment marker".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("What is the capital of France?"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("and/or"), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/quit"));
        assert!(help.contains("/clear"));
        assert!(help.contains("/model"));
        assert!(help.contains("/history"));
    }
}
