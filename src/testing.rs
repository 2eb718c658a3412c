// Scripted doubles for the generation backend, the validator and the console
//
// Each one replays a queue of canned responses and records every call so
// tests can assert on call counts and on exactly what was sent.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::cli::Console;
use crate::document::{ValidationOutcome, Validator, Workbench};
use crate::generators::{validate_messages, Generation, Generator};
use crate::prompts::PromptLibrary;
use crate::providers::Message;
use crate::store::ContentStore;

/// Generator that replays canned responses.
///
/// Once the script runs out it answers `"generated <n>"` (or declines, for
/// `declining()`).
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Generation>>,
    decline_when_empty: bool,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_generations(
            responses
                .into_iter()
                .map(|r| Generation::Content(r.into())),
        )
    }

    pub fn from_generations(generations: impl IntoIterator<Item = Generation>) -> Self {
        Self {
            script: Mutex::new(generations.into_iter().collect()),
            decline_when_empty: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request is answered with an apology
    pub fn declining() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            decline_when_empty: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// The user message of every request, in call order
    pub fn user_messages(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|messages| messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, messages: Vec<Message>) -> Result<Generation> {
        validate_messages(&messages)?;
        let call = {
            let mut requests = self
                .requests
                .lock()
                .map_err(|_| anyhow::anyhow!("request log poisoned"))?;
            requests.push(messages);
            requests.len()
        };

        let next = self
            .script
            .lock()
            .map_err(|_| anyhow::anyhow!("script poisoned"))?
            .pop_front();
        Ok(match next {
            Some(generation) => generation,
            None if self.decline_when_empty => Generation::Apology,
            None => Generation::Content(format!("generated {}", call)),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Validator that replays canned outcomes, then repeats a fallback
pub struct ScriptedValidator {
    script: Mutex<VecDeque<ValidationOutcome>>,
    fallback: ValidationOutcome,
    paths: Mutex<Vec<PathBuf>>,
}

impl ScriptedValidator {
    pub fn new(script: impl IntoIterator<Item = ValidationOutcome>, fallback: ValidationOutcome) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            paths: Mutex::new(Vec::new()),
        }
    }

    pub fn always_pass() -> Self {
        Self::new(Vec::new(), ValidationOutcome::passed("ok"))
    }

    pub fn always_fail(diagnostic: &str) -> Self {
        Self::new(Vec::new(), ValidationOutcome::failed("", diagnostic))
    }

    /// Fails `failures` times with `diagnostic`, then passes
    pub fn pass_after(failures: usize, diagnostic: &str) -> Self {
        Self::new(
            (0..failures).map(|_| ValidationOutcome::failed("", diagnostic)),
            ValidationOutcome::passed("ok"),
        )
    }

    pub fn attempts(&self) -> usize {
        self.paths.lock().map(|p| p.len()).unwrap_or_default()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Validator for ScriptedValidator {
    async fn validate(&self, path: &Path) -> Result<ValidationOutcome> {
        self.paths
            .lock()
            .map_err(|_| anyhow::anyhow!("path log poisoned"))?
            .push(path.to_path_buf());
        let next = self
            .script
            .lock()
            .map_err(|_| anyhow::anyhow!("script poisoned"))?
            .pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }

    fn name(&self) -> &str {
        "scripted validator"
    }
}

/// What a `ScriptedConsole` was asked to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Title(String),
    Say(String),
    Info(String),
    Warning(String),
    Error(String),
    Success(String),
}

/// Console that answers from a script (empty answers once it runs out)
pub struct ScriptedConsole {
    answers: Mutex<VecDeque<String>>,
    questions: Mutex<Vec<String>>,
    events: Mutex<Vec<ConsoleEvent>>,
    opened: Mutex<Vec<PathBuf>>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            questions: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().map(|q| q.clone()).unwrap_or_default()
    }

    pub fn events(&self) -> Vec<ConsoleEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ConsoleEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn opened(&self) -> Vec<PathBuf> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }

    fn record(&self, event: ConsoleEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl Console for ScriptedConsole {
    fn ask(&self, prompt: &str) -> Result<String> {
        self.questions
            .lock()
            .map_err(|_| anyhow::anyhow!("question log poisoned"))?
            .push(prompt.to_string());
        Ok(self
            .answers
            .lock()
            .map_err(|_| anyhow::anyhow!("answers poisoned"))?
            .pop_front()
            .unwrap_or_default())
    }

    fn title(&self, text: &str, _level: usize) {
        self.record(ConsoleEvent::Title(text.to_string()));
    }

    fn say(&self, message: &str) {
        self.record(ConsoleEvent::Say(message.to_string()));
    }

    fn info(&self, message: &str) {
        self.record(ConsoleEvent::Info(message.to_string()));
    }

    fn warning(&self, message: &str) {
        self.record(ConsoleEvent::Warning(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.record(ConsoleEvent::Error(message.to_string()));
    }

    fn success(&self, message: &str) {
        self.record(ConsoleEvent::Success(message.to_string()));
    }

    fn open_for_editing(&self, path: &Path) -> Result<()> {
        self.opened
            .lock()
            .map_err(|_| anyhow::anyhow!("open log poisoned"))?
            .push(path.to_path_buf());
        Ok(())
    }
}

/// Workbench rooted at `data_dir` with the built-in system prompts and the
/// default attempt budget
pub fn workbench(
    data_dir: &Path,
    generator: Arc<dyn Generator>,
    validator: Arc<dyn Validator>,
    console: Arc<dyn Console>,
) -> Workbench {
    Workbench {
        generator,
        validator,
        console,
        store: ContentStore::new(data_dir),
        prompts: PromptLibrary::new(data_dir.join("system_prompts")),
        http: reqwest::Client::new(),
        max_attempts: crate::config::constants::DEFAULT_MAX_TEST_RUNS,
    }
}
