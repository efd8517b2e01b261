use anyhow::Result;
use console::{measure_text_width, pad_str, Alignment};
use cortex_chat::connection::QueryResult;
use cortex_chat::models::message::ChatMessage;

pub mod rustyline;

pub const TITLE: &str = "Intelligent Sales Assistant";
const NULL_CELL: &str = "NULL";
const MAX_CELL_WIDTH: usize = 40;

pub trait Prompt {
    fn render(&mut self, message: &ChatMessage);
    fn render_info(&mut self, message: &str);
    fn render_error(&mut self, message: &str);
    fn render_table(&mut self, result: &QueryResult);
    fn get_input(&mut self) -> Result<Input>;
    fn show_busy(&mut self);
    fn hide_busy(&self);
    fn close(&self);
    fn show_header(&mut self) {
        self.render_info(&format!("{} (type /help for commands)", TITLE));
    }
    // Used for testing. Allows us to downcast to any type.
    #[cfg(test)]
    fn as_any(&self) -> &dyn std::any::Any;
}

#[derive(Debug, PartialEq, Eq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // Question or SQL text, absent for control commands
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputType {
    AskAgain, // Ask the user for input again. Control flow command.
    Help,     // User asked for the command list
    Message,  // User asked a question
    Sql,      // User wants to run a SQL statement
    Reset,    // User wants to clear the conversation
    Exit,     // User wants to exit the session
}

impl Input {
    fn control(input_type: InputType) -> Self {
        Input {
            input_type,
            content: None,
        }
    }
}

pub const HELP: &str = "\
Commands:
/reset - Clear the conversation
/sql <statement> - Run a SQL statement on the current connection
/exit | /quit - Exit the session
/? | /help - Display this help message";

/// Interpret one line typed by the user.
pub fn parse_input(line: &str) -> Input {
    let text = line.trim();

    if text.is_empty() {
        return Input::control(InputType::AskAgain);
    }

    let (command, rest) = match text.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (text, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "/exit" | "/quit" => Input::control(InputType::Exit),
        "/reset" => Input::control(InputType::Reset),
        "/sql" if !rest.is_empty() => Input {
            input_type: InputType::Sql,
            content: Some(rest.to_string()),
        },
        "/sql" | "/?" | "/help" => Input::control(InputType::Help),
        _ => Input {
            input_type: InputType::Message,
            content: Some(text.to_string()),
        },
    }
}

/// Lay out query rows as a plain text grid.
pub fn format_table(result: &QueryResult) -> String {
    if result.columns.is_empty() {
        return "(no columns)".to_string();
    }

    let cells: Vec<Vec<&str>> = result
        .rows
        .iter()
        .map(|row| {
            (0..result.columns.len())
                .map(|i| row.get(i).and_then(|c| c.as_deref()).unwrap_or(NULL_CELL))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| measure_text_width(row[i]))
                .chain(std::iter::once(measure_text_width(name)))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL_WIDTH)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| pad_str(value, *width, Alignment::Left, Some("…")).into_owned())
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![
        line(result.columns.iter().map(String::as_str).collect()),
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    ];
    out.extend(cells.into_iter().map(line));
    out.push(format!(
        "({} row{})",
        result.rows.len(),
        if result.rows.len() == 1 { "" } else { "s" }
    ));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_input("/exit").input_type, InputType::Exit);
        assert_eq!(parse_input("  /QUIT ").input_type, InputType::Exit);
        assert_eq!(parse_input("/reset").input_type, InputType::Reset);
        assert_eq!(parse_input("").input_type, InputType::AskAgain);
        assert_eq!(parse_input("/help").input_type, InputType::Help);
        assert_eq!(parse_input("/?").input_type, InputType::Help);
        assert_eq!(parse_input("/sql").input_type, InputType::Help);
    }

    #[test]
    fn test_parse_sql_and_messages() {
        assert_eq!(
            parse_input("/sql SELECT 1;"),
            Input {
                input_type: InputType::Sql,
                content: Some("SELECT 1;".to_string()),
            }
        );
        assert_eq!(
            parse_input(" What were Q1 sales? "),
            Input {
                input_type: InputType::Message,
                content: Some("What were Q1 sales?".to_string()),
            }
        );
    }

    #[test]
    fn test_format_table() {
        let result = QueryResult {
            columns: vec!["REGION".to_string(), "TOTAL".to_string()],
            rows: vec![
                vec![Some("West".to_string()), Some("1200000".to_string())],
                vec![Some("Northeast".to_string()), None],
            ],
        };

        assert_eq!(
            format_table(&result),
            [
                "REGION    | TOTAL",
                "----------+--------",
                "West      | 1200000",
                "Northeast | NULL",
                "(2 rows)",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_format_table_without_columns() {
        assert_eq!(format_table(&QueryResult::default()), "(no columns)");
    }
}
