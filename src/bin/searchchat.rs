//! Interactive chat assistant with live web search.
//!
//! This binary provides a streaming REPL for chatting with a Gemini model.
//! Time-sensitive questions are answered from fresh Serper search results.
//!
//! # Usage
//!
//! ```bash
//! # Credentials come from .searchchat/secrets.yaml or the environment
//! searchchat
//!
//! # Specify a model and a secrets file
//! searchchat --model gemini-2.5-flash --secrets ~/.config/searchchat.yaml
//!
//! # Disable colors (useful for piping output)
//! searchchat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/history` - Show the conversation so far
//! - `/clear` - Clear conversation history
//! - `/model <name>` - Change the model
//! - `/stats` - Show session statistics
//! - `/quit` - Exit the application
//!
//! Input starting with `//` is sent as a message with one slash removed.

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use searchchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use searchchat::{Gemini, Model, Secrets, SerperSearch};

/// Main entry point for the searchchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("searchchat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let secrets = match Secrets::load(&config.secrets_path) {
        Ok(secrets) => secrets,
        Err(err) => {
            eprintln!("searchchat: {err}");
            std::process::exit(1);
        }
    };
    let mut session = ChatSession::from_secrets(&secrets, config)?;
    let mut renderer = PlainTextRenderer::with_color(use_color).without_input_echo();
    let mut rl = DefaultEditor::new()?;

    println!("Search Chat (model: {})", session.model());
    println!("Type /help for commands, /quit to exit\n");

    loop {
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
                        ChatCommand::History => {
                            if session.conversation().is_empty() {
                                renderer.print_info("No messages yet.");
                            } else {
                                session.render_transcript(&mut renderer);
                            }
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Model(model_name) => {
                            session.set_model(Model::from(model_name.as_str()));
                            renderer.print_info(&format!("Model changed to: {}", model_name));
                        }
                        ChatCommand::Stats => {
                            print_stats(&session);
                        }
                        ChatCommand::Message(text) => {
                            let _ = session.submit(&text, &mut renderer).await;
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Failures are rendered by the session; the loop carries on either way.
                let _ = session.submit(line, &mut renderer).await;
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

fn print_stats(session: &ChatSession<Gemini, SerperSearch>) {
    let stats = session.stats();
    println!("    Session Statistics:");
    println!("      Model: {}", stats.model);
    println!("      Messages: {}", stats.message_count);
    println!("      Turns: {}", stats.turns);
    println!("      Search turns: {}", stats.searched_turns);
    println!("      Failed turns: {}", stats.failed_turns);
    println!(
        "      Temperature: {}",
        describe_float(stats.generation_config.temperature)
    );
    println!(
        "      Max output tokens: {}",
        stats
            .generation_config
            .max_output_tokens
            .map(|v| v.to_string())
            .unwrap_or_else(|| "default".to_string())
    );
}

fn describe_float(value: Option<f32>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "default".to_string())
}
