// Validation/repair cycle
//
// Runs the external validator against a section's persisted Markdown and,
// on failure, routes the diagnostic back through the edit loop in repair
// mode. Bounded by the attempt budget; the expired-credential signature
// stops the cycle at once.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::edit::edit_section;
use super::section::{
    ErrorEntry, Section, SectionState, VALIDATED_AT_KEY, VALIDATION_ATTEMPTS_KEY,
};
use super::Workbench;
use crate::config::constants::{EXPIRED_CREDENTIAL_SIGNATURE, REAUTH_HINT};
use crate::config::ValidationConfig;
use crate::prompts::repair_request;
use crate::store::Artifact;

/// Result of one validator run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ValidationOutcome {
    pub fn passed(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Standard output followed by standard error
    pub fn diagnostic(&self) -> String {
        match (self.stdout.trim().is_empty(), self.stderr.trim().is_empty()) {
            (false, false) => format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end()),
            (false, true) => self.stdout.trim_end().to_string(),
            (true, false) => self.stderr.trim_end().to_string(),
            (true, true) => String::new(),
        }
    }

    pub fn is_expired_credential(&self) -> bool {
        self.stdout.contains(EXPIRED_CREDENTIAL_SIGNATURE)
            || self.stderr.contains(EXPIRED_CREDENTIAL_SIGNATURE)
    }
}

/// Executes a document and reports pass/fail
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validate the Markdown file at `path`. `Err` means the validator could
    /// not be run at all; a failing document is `Ok` with `success == false`.
    async fn validate(&self, path: &Path) -> Result<ValidationOutcome>;

    fn name(&self) -> &str;
}

/// Runs `<command> <args..> <path>` as a subprocess
pub struct CommandValidator {
    command: String,
    args: Vec<String>,
}

impl CommandValidator {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

#[async_trait]
impl Validator for CommandValidator {
    async fn validate(&self, path: &Path) -> Result<ValidationOutcome> {
        tracing::debug!("Running {} {:?} {}", self.command, self.args, path.display());

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn validator '{}'", self.command))?;

        let stdout = child.stdout.take().context("Validator stdout was not captured")?;
        let stderr = child.stderr.take().context("Validator stderr was not captured")?;

        // Drain stderr concurrently so a chatty validator can't block on a full pipe
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                buf.push_str(&line);
                buf.push('\n');
            }
            buf
        });

        let mut stdout_buf = String::new();
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            stdout_buf.push_str(&line);
            stdout_buf.push('\n');
        }

        let stderr_buf = stderr_task.await.unwrap_or_default();
        let status = child
            .wait()
            .await
            .with_context(|| format!("Failed to wait for validator '{}'", self.command))?;

        tracing::debug!("Validator exited with {}", status);
        Ok(ValidationOutcome {
            success: status.success(),
            stdout: stdout_buf,
            stderr: stderr_buf,
        })
    }

    fn name(&self) -> &str {
        &self.command
    }
}

/// Bounded validate → repair loop for one section
pub struct RepairCycle<'a> {
    bench: &'a Workbench,
}

impl<'a> RepairCycle<'a> {
    pub fn new(bench: &'a Workbench) -> Self {
        Self { bench }
    }

    /// Run a fresh cycle. Clears the section's error log, records every
    /// failure, and returns (and stores) whether the section passed.
    pub async fn run(&self, section: &mut Section, title: &str, auto: bool) -> Result<bool> {
        let bench = self.bench;
        let max_attempts = bench.max_attempts;
        let path = bench
            .store
            .artifact_path(title, Artifact::Section(section.kind));

        section.error_log.clear();
        section.passed = false;

        let mut attempt = 0;
        while attempt < max_attempts && !section.passed {
            attempt += 1;
            section.set_state(SectionState::Validating);
            bench.console.info(&format!(
                "Testing the {} section with {} (attempt {} of {})",
                section.kind,
                bench.validator.name(),
                attempt,
                max_attempts
            ));

            let outcome = bench.validator.validate(&path).await?;
            if !outcome.stdout.trim().is_empty() {
                bench.console.info(&outcome.stdout);
            }

            if outcome.success {
                tracing::info!("{} passed on attempt {}", section.kind, attempt);
                section.passed = true;
                break;
            }

            if !outcome.stderr.trim().is_empty() {
                bench.console.error(&outcome.stderr);
            }
            let diagnostic = outcome.diagnostic();
            section.error_log.push(ErrorEntry::now(diagnostic.clone()));
            tracing::warn!("{} failed validation on attempt {}", section.kind, attempt);

            if outcome.is_expired_credential() {
                bench.console.error(REAUTH_HINT);
                break;
            }

            bench
                .console
                .error(&format!("Error executing the document: {}", diagnostic));
            section.set_state(SectionState::Repairing);
            edit_section(
                bench,
                title,
                section.kind,
                auto,
                Some(&repair_request(&diagnostic)),
            )
            .await?;
        }

        section
            .meta_data
            .insert(VALIDATION_ATTEMPTS_KEY.to_string(), attempt.to_string());
        section
            .meta_data
            .insert(VALIDATED_AT_KEY.to_string(), Utc::now().to_rfc3339());

        if section.passed {
            section.set_state(SectionState::Passed);
        } else {
            section.set_state(SectionState::Abandoned);
            bench.console.warning(&format!(
                "The {} section did not pass after {} attempt(s).",
                section.kind, attempt
            ));
        }
        Ok(section.passed)
    }
}
