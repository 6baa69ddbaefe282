//! `dashboard bootstrap`: run the controller with live progress, then bind
//! the repositories and report per-domain availability.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

use dashboard_core::{AuthState, DomainStatus, InitializationStatus, Mode, Phase, RunOutcome};

use super::Runtime;
use crate::cli::{BootstrapArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct BootstrapReport {
    mode: Mode,
    auth: Option<AuthState>,
    domains: Vec<DomainStatus>,
}

#[derive(Tabled)]
struct DomainRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

pub async fn handle(args: BootstrapArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (mut cfg, path) = super::load(global)?;
    if let Some(preset) = args.preset {
        cfg.retry.preset = preset.into();
    }
    let rt = Runtime::build(&cfg, &path)?;

    let bar = progress_bar(global.quiet);
    let outcome = drive(&rt, &bar).await;
    bar.finish_and_clear();

    let auth = match outcome {
        RunOutcome::Ready(auth) => {
            info!(?auth, "bootstrap complete");
            Some(auth)
        }
        RunOutcome::Failed(error) if args.local_on_failure => {
            warn!(%error, "bootstrap failed, continuing with local data");
            None
        }
        RunOutcome::Failed(error) => {
            rt.controller.shutdown();
            return Err(CliError::Bootstrap { error });
        }
        RunOutcome::Cancelled => {
            rt.controller.shutdown();
            return Err(CliError::Cancelled);
        }
    };

    let mode = rt.switchboard.initialize().await?;
    let report = BootstrapReport {
        mode,
        auth,
        domains: rt.switchboard.domain_status()?,
    };

    rt.switchboard.shutdown();
    rt.controller.shutdown();

    let color = output::should_color();
    let rendered = output::render_single(global.output, &report, |r| table_view(r, color))?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Run the controller, feeding every status into `bar`. Ctrl-C cancels.
async fn drive(rt: &Runtime, bar: &ProgressBar) -> RunOutcome {
    let mut statuses = rt.controller.statuses();
    let run = rt.controller.run();
    tokio::pin!(run);

    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            received = statuses.recv() => {
                if let Ok(status) = received {
                    show(bar, &status);
                }
            }
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    warn!("interrupted, cancelling bootstrap");
                    rt.controller.cancel();
                }
            }
        }
    };

    loop {
        match statuses.try_recv() {
            Ok(status) => show(bar, &status),
            Err(TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    outcome
}

fn progress_bar(quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let steps = u64::try_from(Phase::SEQUENCE.len()).unwrap_or(5);
    let bar = ProgressBar::new(steps);
    let style = ProgressStyle::with_template("{spinner} [{bar:25}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

fn show(bar: &ProgressBar, status: &InitializationStatus) {
    match status.phase {
        Phase::Success => {
            bar.set_position(bar.length().unwrap_or(0));
            bar.set_message("ready");
        }
        Phase::Retrying => {
            let wait = status.next_retry_in.unwrap_or_default();
            bar.set_message(format!(
                "retrying in {} (attempt {}/{})",
                humantime::format_duration(wait),
                status.current_attempt,
                status.max_attempts
            ));
        }
        Phase::Error => {
            if let Some(ref error) = status.error {
                bar.println(format!(
                    "attempt {}/{} failed: {error}",
                    status.current_attempt, status.max_attempts
                ));
            }
        }
        phase => {
            if let Some(step) = Phase::SEQUENCE.iter().position(|p| *p == phase) {
                bar.set_position(u64::try_from(step).unwrap_or(0));
            }
            bar.set_message(status.label());
        }
    }
}

fn auth_label(auth: Option<&AuthState>) -> String {
    match auth {
        Some(AuthState::Authenticated { uid, anonymous: true }) => {
            format!("signed in as {uid} (anonymous)")
        }
        Some(AuthState::Authenticated { uid, .. }) => format!("signed in as {uid}"),
        Some(AuthState::Degraded { reason }) => format!("degraded: {reason}"),
        None => "none".into(),
    }
}

fn table_view(report: &BootstrapReport, color: bool) -> String {
    let header = output::detail_lines(&[
        ("mode", output::paint(&report.mode.to_string(), report.mode == Mode::Live, color)),
        ("auth", auth_label(report.auth.as_ref())),
    ]);
    let rows: Vec<DomainRow> = report
        .domains
        .iter()
        .map(|d| DomainRow {
            domain: d.domain.to_string(),
            mode: d.mode.to_string(),
            available: output::paint(if d.available { "yes" } else { "no" }, d.available, color),
            reason: d.reason.clone().unwrap_or_default(),
        })
        .collect();
    let table = output::render_table(&rows);
    format!("{header}\n\n{table}")
}
