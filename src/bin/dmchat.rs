//! Interactive chat application for conversing with a DM-able assistant.
//!
//! This binary provides a streaming REPL interface for chatting with a
//! provisioned identity over the backend's streaming endpoint.
//!
//! # Usage
//!
//! ```bash
//! # Chat with an existing session handle
//! dmchat --session 66a1f00d
//!
//! # Point at a different backend
//! dmchat --endpoint https://chat.example.com/api --session 66a1f00d
//!
//! # Provision a new identity at startup (requires an access key)
//! DMCHAT_ACCESS_KEY=... dmchat
//!
//! # Disable colors (useful for piping output)
//! dmchat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/session <id>` - Switch to an existing session handle
//! - `/provision [prompt]` - Provision a new identity
//! - `/link` - Print the shareable link for the current session
//! - `/clear` - Clear conversation history
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use dmchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use dmchat::{ProvisionClient, SessionHandle, shareable_link};

/// Main entry point for the dmchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("dmchat [OPTIONS]");
    let config = ChatConfig::resolve(args)?;
    let use_color = config.use_color;

    let mut session = ChatSession::new(config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Flag for interrupt handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    match session.session_handle() {
        Some(handle) => println!("dmchat (session: {handle})"),
        None => println!("dmchat (no session configured; use /session or /provision)"),
    }
    println!("Type /help for commands, /quit to exit\n");

    loop {
        // Reset interrupt flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer.print_info("Conversation cleared.");
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Session(handle) => {
                            session.set_session_handle(SessionHandle::new(handle.clone()));
                            session.clear();
                            renderer.print_info(&format!("Now chatting with session: {handle}"));
                        }
                        ChatCommand::Provision(prompt) => {
                            match provision(&session, prompt).await {
                                Ok(handle) => {
                                    let link =
                                        shareable_link(&session.config().share_base, &handle);
                                    session.set_session_handle(handle);
                                    session.clear();
                                    renderer.print_info(&format!("Shareable link: {link}"));
                                }
                                Err(err) => renderer.print_error(&err.to_string()),
                            }
                        }
                        ChatCommand::Link => match session.session_handle() {
                            Some(handle) => {
                                let link = shareable_link(&session.config().share_base, handle);
                                renderer.print_info(&format!("Shareable link: {link}"));
                            }
                            None => renderer.print_error("No session configured."),
                        },
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - stream the reply
                println!("Assistant:");
                if let Err(e) = session
                    .submit(line, &mut renderer, interrupted.clone())
                    .await
                {
                    renderer.print_error(&e.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

async fn provision(
    session: &ChatSession,
    prompt: Option<String>,
) -> dmchat::Result<SessionHandle> {
    let config = session.config();
    let access_key = config.access_key.clone().ok_or_else(|| {
        dmchat::Error::authentication(format!(
            "no access key; pass --access-key or set {}",
            dmchat::chat::ACCESS_KEY_ENV
        ))
    })?;
    let client = ProvisionClient::new(config.endpoint.clone(), access_key)?;
    client.provision(prompt).await
}

fn print_stats(session: &ChatSession) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Endpoint: {}", stats.endpoint);
    match stats.session {
        Some(ref handle) => println!("      Session: {}", handle),
        None => println!("      Session: (none)"),
    }
    println!("      Messages: {}", stats.message_count);
    println!("      Idle window: {} ms", stats.idle_window_ms);
    println!(
        "      Exchanges: {} ({} failed)",
        stats.exchanges, stats.failures
    );
}
