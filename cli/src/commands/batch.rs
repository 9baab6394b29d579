//! `rigup install-all` and `rigup update-all`.

use std::process::ExitCode;

use anyhow::Result;
use indicatif::ProgressBar;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::app::{AppContext, finish_engine};
use crate::application::services::batch::{BatchEvent, run_batch};
use crate::domain::batch::{BatchKind, BatchPhase};
use crate::output::progress;

/// Run a whole batch, rendering progress while it runs.
///
/// Exits with failure when any item failed; source and dependency errors
/// are returned as errors.
///
/// # Errors
///
/// Returns an error if the engine cannot start or the batch aborts.
pub async fn run(app: &AppContext, kind: BatchKind) -> Result<ExitCode> {
    let descriptors = app.descriptors()?;
    let engine = app.engine()?;
    let (tx, rx) = mpsc::unbounded_channel();

    let (outcome, ()) = tokio::join!(
        async {
            let outcome = run_batch(&engine, &descriptors, &app.config_store, kind, &tx).await;
            drop(tx);
            outcome
        },
        render_events(app, rx),
    );
    finish_engine(engine);

    let report = outcome?;
    app.renderer().render_batch_report(&report)?;
    Ok(if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn render_events(app: &AppContext, mut rx: UnboundedReceiver<BatchEvent>) {
    let human = app.human();
    let mut spinner: Option<ProgressBar> = None;
    while let Some(event) = rx.recv().await {
        let Some(renderer) = &human else {
            continue;
        };
        match event {
            BatchEvent::Phase(phase) => {
                if let Some(pb) = spinner.take() {
                    progress::finish_clear(&pb);
                }
                match phase {
                    BatchPhase::FetchingSources => {
                        spinner = progress::maybe_spinner(
                            &app.output,
                            "Fetching tool and environment lists...",
                        );
                    }
                    BatchPhase::ResolvingOrder => {
                        spinner =
                            progress::maybe_spinner(&app.output, "Resolving dependencies...");
                    }
                    BatchPhase::RunningTools => app.output.header("Tools:"),
                    BatchPhase::RunningEnvironments => app.output.header("Environments:"),
                    BatchPhase::Idle | BatchPhase::Complete | BatchPhase::Failed => {}
                }
            }
            BatchEvent::ItemCompleted {
                index,
                total,
                result,
            } => renderer.render_batch_item(index, total, &result),
            BatchEvent::Finished(_) | BatchEvent::Failed(_) => {}
        }
    }
    if let Some(pb) = spinner.take() {
        progress::finish_clear(&pb);
    }
}
