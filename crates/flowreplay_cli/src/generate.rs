//! Parallel replay generation

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use flowreplay_app::{
    trigger_generation, AppConfig, ReplayError, ReplayOrchestrator, TriggerBody, TriggerResponse,
};
use flowreplay_recorder::SessionId;

type Job = (SessionId, JoinHandle<Result<TriggerResponse>>);

/// Generate videos for `ids`, at most `jobs` at a time, returning one
/// response per distinct session in input order. Ctrl-C cancels every
/// running and queued replay.
pub async fn run(
    config: &AppConfig,
    ids: &[SessionId],
    jobs: usize,
) -> Vec<(SessionId, TriggerResponse)> {
    let cancel = CancellationToken::new();
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling replays");
                cancel.cancel();
            }
        })
    };

    let ids = distinct(ids);
    let mut handles: Vec<Job> = Vec::with_capacity(ids.len());
    for (slot, &id) in ids.iter().enumerate() {
        let orchestrator = ReplayOrchestrator::from_config(&job_config(config, slot));
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .context("job queue closed")?;
            if cancel.is_cancelled() {
                return Ok(TriggerResponse::from(&ReplayError::Cancelled));
            }
            tracing::info!(session = id, "Starting replay");
            tokio::task::spawn_blocking(move || trigger_generation(&orchestrator, id, &cancel))
                .await
                .context("replay worker panicked")
        });
        handles.push((id, handle));
    }

    let responses = collect(handles).await;
    interrupt.abort();
    responses
}

/// Drop repeated ids so no two jobs write the same session's files.
fn distinct(ids: &[SessionId]) -> Vec<SessionId> {
    let mut seen = HashSet::with_capacity(ids.len());
    let unique: Vec<SessionId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if unique.len() < ids.len() {
        tracing::warn!(
            skipped = ids.len() - unique.len(),
            "Ignoring repeated session ids"
        );
    }
    unique
}

/// Wait for every job; a job that failed outside replay generation becomes
/// an error response for its session.
async fn collect(handles: Vec<Job>) -> Vec<(SessionId, TriggerResponse)> {
    let mut responses = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        let response = match handle.await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => job_failure(id, &e),
            Err(e) => job_failure(id, &anyhow::Error::new(e).context("replay task failed")),
        };
        responses.push((id, response));
    }
    responses
}

fn job_failure(id: SessionId, error: &anyhow::Error) -> TriggerResponse {
    tracing::error!(session = id, error = %format!("{error:#}"), "Replay job failed");
    TriggerResponse {
        status_code: 500,
        body: TriggerBody::Error {
            message: format!("Failed to generate real browser video: {error:#}"),
        },
    }
}

/// Each job spawning its own driver gets its own port.
fn job_config(config: &AppConfig, slot: usize) -> AppConfig {
    let mut config = config.clone();
    if config.browser.driver_binary.is_some() {
        let offset = u16::try_from(slot).unwrap_or(u16::MAX);
        config.browser.driver_port = config.browser.driver_port.saturating_add(offset);
    }
    config
}
