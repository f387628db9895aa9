//! Drive a generation workflow from the terminal

use super::RunArgs;
use crate::context::AppContext;
use anyhow::{bail, Context, Result};
use chrono::Local;
use showrunner_core::{GenerationProgress, ToastKind, UiState};
use showrunner_workflow::{PhaseStatus, RunOutcome, WorkflowTracker};
use std::collections::HashSet;

pub async fn run(ctx: &AppContext, args: RunArgs) -> Result<()> {
    let tracker = ctx.tracker(&args.episode, args.workflow);
    tracker.load().await.context("Failed to load episode")?;
    print_phases(&tracker);

    let started = match args.phase {
        Some(phase) => tracker.run_phase(phase).await,
        None => tracker.run_full_workflow().await,
    };
    let handle = match started {
        Ok(handle) => handle,
        Err(e) => bail!(e.user_message()),
    };

    let mut ui = ctx.ui.subscribe();
    let mut printer = UiPrinter::default();
    let wait = handle.wait();
    tokio::pin!(wait);

    let finished = loop {
        tokio::select! {
            outcome = &mut wait => break Some(outcome),
            () = ctx.shutdown.cancelled() => break None,
            Ok(()) = ui.changed() => printer.render(&ui.borrow_and_update()),
        }
    };
    let outcome = match finished {
        Some(outcome) => outcome,
        None => {
            tracker.shutdown();
            wait.await
        }
    };
    printer.render(&ctx.ui.snapshot());
    tracker.shutdown();

    println!();
    print_phases(&tracker);
    match outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Cancelled => {
            println!("Interrupted.");
            Ok(())
        }
        RunOutcome::Failed(message) => bail!(message),
        RunOutcome::TimedOut => bail!("gave up waiting for the backend"),
    }
}

fn print_phases(tracker: &WorkflowTracker) {
    println!("{} for episode {}:", tracker.kind().label(), tracker.episode_id());
    for phase in tracker.phases() {
        let mark = match phase.status {
            PhaseStatus::Pending => "⏳",
            PhaseStatus::InProgress => "🔄",
            PhaseStatus::Completed => "✅",
            PhaseStatus::Error => "❌",
        };
        println!(
            "  {mark} {}. {:<24} [{}]",
            phase.id.ordinal(),
            phase.id.name(),
            phase.action_label()
        );
        for line in phase.detail.map(|d| d.lines()).unwrap_or_default() {
            println!("       {line}");
        }
    }
}

/// Prints each toast once and every progress change
#[derive(Default)]
struct UiPrinter {
    seen: HashSet<String>,
    last_progress: Option<GenerationProgress>,
}

impl UiPrinter {
    fn render(&mut self, state: &UiState) {
        for toast in &state.toasts {
            if !self.seen.insert(toast.id.clone()) {
                continue;
            }
            let icon = match toast.kind {
                ToastKind::Success => "✅",
                ToastKind::Error => "❌",
                ToastKind::Warning => "⚠️ ",
                ToastKind::Info => "ℹ️ ",
            };
            let at = toast.created_at.with_timezone(&Local).format("%H:%M:%S");
            match &toast.message {
                Some(message) => println!("[{at}] {icon} {}: {message}", toast.title),
                None => println!("[{at}] {icon} {}", toast.title),
            }
        }

        if state.is_generating && self.last_progress.as_ref() != Some(&state.progress) {
            let progress = &state.progress;
            let percent = progress
                .progress
                .display()
                .map_or_else(|| "…".to_string(), |p| format!("{p}%"));
            match &progress.message {
                Some(message) => println!("   {} {percent} {message}", progress.phase),
                None => println!("   {} {percent}", progress.phase),
            }
            self.last_progress = Some(progress.clone());
        }
    }
}
