//! Interactive chat session

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::engine::ChatEngine;
use calstore::TaskStore;

/// Interactive chat REPL over the engine
pub struct ChatRepl {
    engine: Arc<ChatEngine>,
    store: Arc<dyn TaskStore>,
    user: String,
}

impl ChatRepl {
    pub fn new(engine: Arc<ChatEngine>, store: Arc<dyn TaskStore>, user: impl Into<String>) -> Self {
        Self {
            engine,
            store,
            user: user.into(),
        }
    }

    /// Run the REPL main loop
    pub async fn run(&self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    }

                    let reply = self.engine.handle(&self.user, input).await;
                    if reply.success {
                        println!("{}", reply.message);
                    } else {
                        println!("{} {}", "!".red(), reply.message);
                    }
                    if reply.requires_confirmation {
                        println!("{}", "(reply \"confirm\" to schedule, \"cancel\" to drop)".dimmed());
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "TaskChat".bright_cyan().bold());
        println!("Describe what you'd like to get done, e.g. \"gym tomorrow at 7am\".");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn handle_slash_command(&self, input: &str) -> SlashResult {
        let cmd = input.split_whitespace().next().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/tasks" | "/t" => {
                self.print_tasks().await;
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!("\n--- TaskChat Commands ---");
        println!("  /tasks    - Show tasks created this session");
        println!("  /help     - Show this help");
        println!("  /quit     - Exit");
        println!("-------------------------\n");
    }

    async fn print_tasks(&self) {
        match self.store.list_tasks().await {
            Ok(tasks) if tasks.is_empty() => println!("{}", "No tasks created yet.".dimmed()),
            Ok(tasks) => {
                for task in tasks {
                    println!(
                        "  {} {} ({} priority, {} to {})",
                        "*".bright_green(),
                        task.title,
                        task.priority,
                        task.start.format("%Y-%m-%d %H:%M"),
                        task.end.format("%H:%M")
                    );
                }
            }
            Err(e) => println!("{} Failed to list tasks: {}", "!".red(), e),
        }
    }
}

enum SlashResult {
    Continue,
    Quit,
}
