use std::io::{self, Write};

use anyhow::Result;
use bat::WrappingMode;
use cliclack::spinner;
use console::style;
use cortex_chat::connection::QueryResult;
use cortex_chat::models::message::{ChatMessage, Role};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::{format_table, parse_input, Input, InputType, Prompt};

const PROMPT: &str = "\x1b[1m\x1b[38;5;30m❄ > \x1b[0m";
const THEME: &str = "zenburn";

pub struct RustylinePrompt {
    editor: DefaultEditor,
    spinner: cliclack::ProgressBar,
}

impl RustylinePrompt {
    pub fn new() -> Result<Self> {
        Ok(RustylinePrompt {
            editor: DefaultEditor::new()?,
            spinner: spinner(),
        })
    }
}

fn print_markdown(content: &str) {
    let printed = bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .theme(THEME)
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print();

    if printed.is_err() {
        println!("{}", content);
    }
}

fn print_newline() {
    println!();
}

impl Prompt for RustylinePrompt {
    fn render(&mut self, message: &ChatMessage) {
        let label = match message.role {
            Role::User => style("you").green().bold(),
            Role::Assistant => style("assistant").cyan().bold(),
        };
        println!("{}", label);
        print_markdown(&message.display_markdown());
        print_newline();
        let _ = io::stdout().flush();
    }

    fn render_info(&mut self, message: &str) {
        let _ = cliclack::log::info(message);
    }

    fn render_error(&mut self, message: &str) {
        let _ = cliclack::log::error(message);
    }

    fn render_table(&mut self, result: &QueryResult) {
        println!("{}", format_table(result));
        print_newline();
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("Processing your request...");
    }

    fn hide_busy(&self) {
        self.spinner.stop("");
    }

    fn get_input(&mut self) -> Result<Input> {
        let line = match self.editor.readline(PROMPT) {
            Ok(line) => line,
            Err(e) => {
                match e {
                    ReadlineError::Interrupted | ReadlineError::Eof => (),
                    _ => eprintln!("Input error: {}", e),
                }
                return Ok(Input {
                    input_type: InputType::Exit,
                    content: None,
                });
            }
        };

        if !line.trim().is_empty() {
            let _ = self.editor.add_history_entry(line.trim());
        }
        Ok(parse_input(&line))
    }

    fn close(&self) {
        // No cleanup required
    }

    #[cfg(test)]
    fn as_any(&self) -> &dyn std::any::Any {
        panic!("Not implemented");
    }
}
