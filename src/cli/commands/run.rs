use anyhow::Result;
use serde_json::json;
use std::io::Write;

use crate::cli::commands::Command;
use crate::cli::Action;
use crate::config::WizardConfig;
use crate::wizard::{NavigationFlags, NextOutcome, PreviousOutcome, ScriptedFlow, WizardController};

/// What a scripted run ended with
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub final_step: Option<String>,
    pub history: Vec<String>,
    pub finished: bool,
    pub failures: usize,
}

pub struct RunCommand {
    config: WizardConfig,
    actions: Vec<Action>,
    json: bool,
}

impl RunCommand {
    pub fn new(config: WizardConfig, actions: Vec<Action>) -> Self {
        Self {
            config,
            actions,
            json: false,
        }
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub async fn execute_to<W: Write>(&self, out: &mut W) -> Result<RunSummary> {
        let flow = ScriptedFlow::from_specs(&self.config.flow.steps);
        let wizard = WizardController::from_config(&self.config);
        wizard.start(&flow)?;

        if !self.json {
            writeln!(out, "🧭 {} ({} steps)", wizard.title(), flow.len())?;
            self.report(out, &wizard, "start", "initialized")?;
        }

        let mut summary = RunSummary::default();
        for action in &self.actions {
            match action {
                Action::Next => match wizard.next().await {
                    Ok(outcome) => {
                        if outcome == NextOutcome::Finished {
                            summary.finished = true;
                        }
                        self.report(out, &wizard, "next", next_label(outcome))?;
                    }
                    Err(e) if !e.is_contract_violation() => {
                        summary.failures += 1;
                        self.report(out, &wizard, "next", &format!("failed: {e}"))?;
                    }
                    Err(e) => return Err(e.into()),
                },
                Action::Previous => {
                    let outcome = wizard.previous()?;
                    self.report(out, &wizard, "previous", previous_label(outcome))?;
                }
            }
        }

        summary.final_step = wizard.active_step().map(|s| s.title().to_string());
        summary.history = wizard.history_titles();
        wizard.close();
        Ok(summary)
    }

    fn report<W: Write>(
        &self,
        out: &mut W,
        wizard: &WizardController,
        action: &str,
        outcome: &str,
    ) -> Result<()> {
        let step = wizard.active_step().map(|s| s.title().to_string());
        let flags = wizard.flags();

        if self.json {
            let line = json!({
                "action": action,
                "outcome": outcome,
                "step": step,
                "history": wizard.history_titles(),
                "flags": flags,
            });
            writeln!(out, "{line}")?;
        } else {
            writeln!(
                out,
                "   {:<9} {:<12} step={:<16} {}",
                action,
                outcome,
                step.as_deref().unwrap_or("-"),
                describe_flags(&flags)
            )?;
        }
        Ok(())
    }
}

impl Command for RunCommand {
    async fn execute(&self) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        let summary = self.execute_to(&mut stdout).await?;
        if !self.json {
            writeln!(stdout)?;
            match (&summary.final_step, summary.finished) {
                (Some(step), true) => writeln!(stdout, "✅ Wizard finished on '{step}'")?,
                (Some(step), false) => writeln!(stdout, "⏸️  Wizard stopped on '{step}'")?,
                (None, _) => writeln!(stdout, "⏸️  Wizard stopped")?,
            }
            if summary.failures > 0 {
                writeln!(stdout, "⚠️  {} step resolution failure(s)", summary.failures)?;
            }
        }
        Ok(())
    }
}

fn next_label(outcome: NextOutcome) -> &'static str {
    match outcome {
        NextOutcome::Advanced => "advanced",
        NextOutcome::Finished => "finished",
        NextOutcome::Invalid => "invalid",
        NextOutcome::Busy => "busy",
        NextOutcome::Superseded => "superseded",
    }
}

fn previous_label(outcome: PreviousOutcome) -> &'static str {
    match outcome {
        PreviousOutcome::Restored => "restored",
        PreviousOutcome::HistoryEmpty => "no-history",
    }
}

fn describe_flags(flags: &NavigationFlags) -> String {
    format!(
        "can_next={} can_previous={} busy={}",
        flags.can_next, flags.can_previous, flags.is_busy
    )
}
