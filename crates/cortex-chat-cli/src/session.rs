use std::io::{self, Write};

use anyhow::Result;
use cortex_chat::conversation::Conversation;

use cortex_chat::models::message::ChatMessage;

use crate::prompt::{InputType, Prompt, HELP};

pub struct Session<'a> {
    conversation: Conversation,
    prompt: Box<dyn Prompt + 'a>,
}

impl<'a> Session<'a> {
    pub fn new(conversation: Conversation, prompt: Box<dyn Prompt + 'a>) -> Self {
        Session {
            conversation,
            prompt,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub async fn start(&mut self) -> Result<()> {
        self.prompt.show_header();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        self.process_message(content).await;
                    }
                }
                InputType::Sql => {
                    if let Some(content) = &input.content {
                        self.process_sql(content).await;
                    }
                }
                InputType::Reset => {
                    self.conversation.reset();
                    self.prompt.show_header();
                }
                InputType::Help => self.prompt.render_info(HELP),
                InputType::AskAgain => continue,
                InputType::Exit => break,
            }
        }

        self.prompt.close();
        Ok(())
    }

    /// Run a single question and print fragments to stdout as they arrive.
    pub async fn headless_ask(&mut self, query: &str) -> Result<()> {
        let mut stdout = io::stdout();
        self.conversation
            .submit(query, |fragment| {
                let _ = write!(stdout, "{}", fragment);
                let _ = stdout.flush();
            })
            .await?;
        println!();
        Ok(())
    }

    async fn process_message(&mut self, content: &str) {
        self.prompt.render(&ChatMessage::user(content));
        self.prompt.show_busy();
        let result = self.conversation.submit(content, |_| {}).await;
        self.prompt.hide_busy();

        match result {
            Ok(answer) => self.prompt.render(&answer),
            Err(e) => self.prompt.render_error(&format!("Error: {}", e)),
        }
    }

    async fn process_sql(&mut self, query: &str) {
        self.prompt.show_busy();
        let result = self.conversation.run_sql(query).await;
        self.prompt.hide_busy();

        match result {
            Ok(rows) => self.prompt.render_table(&rows),
            Err(e) => self.prompt.render_error(&format!("Error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Input;
    use async_trait::async_trait;
    use cortex_chat::connection::{Connection, QueryResult};
    use cortex_chat::errors::{AgentError, AgentResult};
    use cortex_chat::models::fragment::Fragment;
    use cortex_chat::models::message::Role;
    use cortex_chat::models::request::AgentRequest;
    use cortex_chat::providers::base::{AgentService, FragmentStream};
    use std::cell::Cell;
    use std::collections::VecDeque;

    /// Answers every question with the same fragments.
    struct EchoAgent {
        fragments: Vec<Fragment>,
    }

    #[async_trait]
    impl AgentService for EchoAgent {
        async fn stream_reply(
            &self,
            _connection: &Connection,
            _request: &AgentRequest,
        ) -> AgentResult<FragmentStream> {
            let items: Vec<AgentResult<Fragment>> =
                self.fragments.iter().cloned().map(Ok).collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    #[derive(Default)]
    struct MockPrompt {
        inputs: VecDeque<Input>,
        rendered: Vec<ChatMessage>,
        infos: Vec<String>,
        errors: Vec<String>,
        tables: Vec<QueryResult>,
        headers: usize,
        closed: Cell<bool>,
    }

    impl MockPrompt {
        fn new(lines: &[&str]) -> Self {
            MockPrompt {
                inputs: lines.iter().map(|l| crate::prompt::parse_input(l)).collect(),
                ..Default::default()
            }
        }
    }

    impl Prompt for MockPrompt {
        fn render(&mut self, message: &ChatMessage) {
            self.rendered.push(message.clone());
        }

        fn render_info(&mut self, message: &str) {
            self.infos.push(message.to_string());
        }

        fn render_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }

        fn render_table(&mut self, result: &QueryResult) {
            self.tables.push(result.clone());
        }

        fn get_input(&mut self) -> Result<Input> {
            Ok(self.inputs.pop_front().unwrap_or(Input {
                input_type: InputType::Exit,
                content: None,
            }))
        }

        fn show_busy(&mut self) {}

        fn hide_busy(&self) {}

        fn close(&self) {
            self.closed.set(true);
        }

        fn show_header(&mut self) {
            self.headers += 1;
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn mock_prompt<'a>(session: &'a Session) -> &'a MockPrompt {
        session
            .prompt
            .as_any()
            .downcast_ref::<MockPrompt>()
            .expect("Prompt is not a MockPrompt")
    }

    fn session(lines: &[&str], connected: bool) -> Session<'static> {
        let agent = EchoAgent {
            fragments: vec![
                Fragment::Text("Q1 sales were $1.2M".to_string()),
                Fragment::Sql("SELECT SUM(amount) FROM sales".to_string()),
            ],
        };
        let connection = connected.then(|| Connection::with_token("http://localhost:1", "tok").unwrap());
        Session::new(
            Conversation::new(Box::new(agent), connection, 1),
            Box::new(MockPrompt::new(lines)),
        )
    }

    #[tokio::test]
    async fn test_message_renders_answer() {
        let mut session = session(&["What were Q1 sales?", "/exit"], true);
        session.start().await.unwrap();

        let prompt = mock_prompt(&session);
        assert_eq!(prompt.rendered.len(), 2);
        assert_eq!(prompt.rendered[0].role, Role::User);
        assert_eq!(prompt.rendered[0].content, "What were Q1 sales?");
        assert_eq!(prompt.rendered[1].role, Role::Assistant);
        assert_eq!(
            prompt.rendered[1].content,
            "Q1 sales were $1.2M\n\n`SELECT SUM(amount) FROM sales`"
        );
        assert!(prompt.errors.is_empty());
        assert!(prompt.closed.get());
        assert_eq!(session.conversation().transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_clears_and_reprints_header() {
        let mut session = session(&["first", "second", "/reset"], true);
        session.start().await.unwrap();

        assert!(session.conversation().transcript().is_empty());
        let prompt = mock_prompt(&session);
        assert_eq!(prompt.rendered.len(), 4);
        assert_eq!(prompt.headers, 2);
    }

    #[tokio::test]
    async fn test_errors_are_rendered_and_loop_continues() {
        let mut session = session(&["q1", "", "/help", "/sql SELECT 1", "q2"], false);
        session.start().await.unwrap();

        let prompt = mock_prompt(&session);
        assert!(prompt.rendered.iter().all(|m| m.role == Role::User));
        assert_eq!(prompt.rendered.len(), 2);
        assert!(prompt.tables.is_empty());
        assert_eq!(prompt.infos, vec![HELP.to_string()]);
        assert_eq!(prompt.errors.len(), 3);
        let not_connected = format!("Error: {}", AgentError::NotConnected);
        assert!(prompt.errors.iter().all(|e| *e == not_connected));
        // Failed turns keep only the user messages
        assert_eq!(session.conversation().transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_headless_ask_records_turn() {
        let mut session = session(&[], true);
        session.headless_ask("What were Q1 sales?").await.unwrap();

        let messages = session.conversation().transcript().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Q1 sales were $1.2M\n\n`SELECT SUM(amount) FROM sales`");
    }
}
