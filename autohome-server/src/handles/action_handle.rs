use std::sync::Arc;

use autohome_core::AutoHome;
use axum::extract::{Path, State};

use crate::errors::ApiError;

#[derive(Clone)]
pub struct ActionState {
    pub home: Arc<AutoHome>,
}

/// Runs the named action and answers with its display text. Actions block on
/// relay holds and device reads, so they run on the blocking pool.
pub async fn execute_action(
    Path(action): Path<String>,
    State(state): State<ActionState>,
) -> Result<String, ApiError> {
    let home = state.home.clone();

    let outcome = tokio::task::spawn_blocking(move || home.dispatch(&action))
        .await
        .map_err(anyhow::Error::from)?;

    Ok(outcome?.unwrap_or_default())
}
