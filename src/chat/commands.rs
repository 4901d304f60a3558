//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the chat session without sending messages
//! to the remote assistant.

/// A parsed chat command.
///
/// These commands control the chat session and are never transmitted.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Clear the conversation history.
    Clear,

    /// Switch to an existing session handle.
    Session(String),

    /// Provision a new chat identity, optionally with a behavioral prompt.
    Provision(Option<String>),

    /// Print the shareable link for the current session.
    Link,

    /// Display session statistics (message count, endpoint, etc.).
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// An unrecognized or malformed command, with an explanation.
    Invalid(String),
}

/// Parses a line of input as a slash command.
///
/// Returns `None` for regular messages (anything not starting with `/`).
///
/// # Example
///
/// ```
/// # use dmchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/session 66a1f00d").is_some());
/// assert!(parse_command("Hello!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "clear" => ChatCommand::Clear,
        "session" => match argument {
            Some(handle) => ChatCommand::Session(handle.to_string()),
            None => ChatCommand::Invalid("/session requires a session handle".to_string()),
        },
        "provision" => ChatCommand::Provision(argument.map(|s| s.to_string())),
        "link" => ChatCommand::Link,
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    "Commands:\n\
     /session <id>       Chat with an existing session handle\n\
     /provision [prompt] Provision a new identity (optional behavioral prompt)\n\
     /link               Print the shareable link for the current session\n\
     /clear              Clear conversation history\n\
     /stats              Show session statistics\n\
     /help               Show this help\n\
     /quit               Exit"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_messages_are_not_commands() {
        assert!(parse_command("Hello there").is_none());
        assert!(parse_command("").is_none());
        assert!(parse_command("what does /quit do?").is_none());
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/clear"), Some(ChatCommand::Clear));
        assert_eq!(parse_command("/link"), Some(ChatCommand::Link));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
    }

    #[test]
    fn parse_session_command() {
        assert_eq!(
            parse_command("/session 66a1f00d"),
            Some(ChatCommand::Session("66a1f00d".to_string()))
        );
        assert!(matches!(
            parse_command("/session"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_provision_command() {
        assert_eq!(parse_command("/provision"), Some(ChatCommand::Provision(None)));
        assert_eq!(
            parse_command("/provision Only discuss my public notes"),
            Some(ChatCommand::Provision(Some(
                "Only discuss my public notes".to_string()
            )))
        );
    }

    #[test]
    fn unknown_command_is_invalid() {
        assert!(matches!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parse_command("/QUIT"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/Help"), Some(ChatCommand::Help));
    }
}
