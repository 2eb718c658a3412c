// Console session - the interactive surface
//
// Info lines are transient: they are erased before the next prompt or
// message so status chatter doesn't pile up. Warnings, errors and document
// text stay on screen.

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use crossterm::{cursor, execute, terminal};
use rustyline::error::ReadlineError;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;

use crate::config::EditorConfig;

/// Everything the generation pipeline needs from a human
pub trait Console: Send + Sync {
    /// Ask a question and block until the user answers (may be empty)
    fn ask(&self, prompt: &str) -> Result<String>;

    /// Markdown-style heading
    fn title(&self, text: &str, level: usize);

    /// Plain text (document content, listings)
    fn say(&self, message: &str);

    /// Transient status line
    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str);

    fn success(&self, message: &str);

    /// Show a file in the user's editor
    fn open_for_editing(&self, path: &Path) -> Result<()>;
}

/// Console backed by the real terminal
pub struct TerminalConsole {
    editor: EditorConfig,
    interactive: bool,
    /// Number of transient lines currently on screen
    transient_lines: Mutex<usize>,
}

impl TerminalConsole {
    pub fn new(editor: EditorConfig) -> Self {
        Self {
            editor,
            interactive: io::stdout().is_terminal(),
            transient_lines: Mutex::new(0),
        }
    }

    fn add_transient(&self, lines: usize) {
        if let Ok(mut count) = self.transient_lines.lock() {
            *count += lines;
        }
    }

    /// Erase every transient line printed since the last clear
    fn clear_transient(&self) {
        let lines = match self.transient_lines.lock() {
            Ok(mut count) => std::mem::take(&mut *count),
            Err(_) => return,
        };
        if lines == 0 || !self.interactive {
            return;
        }

        let mut stdout = io::stdout();
        for _ in 0..lines {
            let _ = execute!(
                stdout,
                cursor::MoveUp(1),
                terminal::Clear(terminal::ClearType::CurrentLine)
            );
        }
        let _ = stdout.flush();
    }
}

impl Console for TerminalConsole {
    fn ask(&self, prompt: &str) -> Result<String> {
        self.clear_transient();

        let prompt = format!("{} > ", prompt);
        let mut editor = rustyline::DefaultEditor::new().context("Failed to open line editor")?;
        let answer = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Eof) => String::new(),
            Err(ReadlineError::Interrupted) => anyhow::bail!("Interrupted"),
            Err(e) => return Err(e).context("Failed to read user input"),
        };

        // The question and answer are erased once answered
        self.add_transient(prompt.matches('\n').count() + 1);
        self.clear_transient();
        Ok(answer)
    }

    fn title(&self, text: &str, level: usize) {
        self.clear_transient();
        println!("{} {}", "#".repeat(level.max(1)), text.bold());
        println!();
    }

    fn say(&self, message: &str) {
        self.clear_transient();
        println!("{}", message);
        println!();
    }

    fn info(&self, message: &str) {
        println!("{}", message.dark_grey());
        println!();
        self.add_transient(message.matches('\n').count() + 2);
    }

    fn warning(&self, message: &str) {
        self.clear_transient();
        println!("{}", format!("WARNING: {}", message).yellow());
        println!();
    }

    fn error(&self, message: &str) {
        self.clear_transient();
        eprintln!("{}", format!("ERROR: {}", message).red());
        eprintln!();
    }

    fn success(&self, message: &str) {
        self.clear_transient();
        println!("{}", message.green());
        println!();
    }

    fn open_for_editing(&self, path: &Path) -> Result<()> {
        if !self.editor.enabled {
            tracing::debug!("Editor disabled; not opening {}", path.display());
            return Ok(());
        }

        let status = Command::new(&self.editor.command)
            .arg(path)
            .status()
            .with_context(|| {
                format!(
                    "Failed to launch editor '{}' for {}",
                    self.editor.command,
                    path.display()
                )
            })?;

        if !status.success() {
            tracing::warn!(
                "Editor '{}' exited with {} for {}",
                self.editor.command,
                status,
                path.display()
            );
        }
        Ok(())
    }
}
