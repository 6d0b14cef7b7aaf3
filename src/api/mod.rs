pub mod blog;
pub mod health;
pub mod posts;

use crate::{
    app::AppState,
    error::{AppError, AppResult},
};

const MAX_HANDLE_LEN: usize = 64;

/// Use the requested handle, or the configured one when none was given.
fn resolve_handle(state: &AppState, requested: Option<String>) -> AppResult<String> {
    let handle = match requested {
        Some(handle) => {
            let trimmed = handle.trim();
            trimmed.strip_prefix('@').unwrap_or(trimmed).to_string()
        }
        None => return Ok(state.default_handle.clone()),
    };

    if handle.is_empty() || handle.len() > MAX_HANDLE_LEN {
        return Err(AppError::BadRequest(format!(
            "handle must be 1-{MAX_HANDLE_LEN} characters"
        )));
    }

    let valid = handle
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
    if !valid {
        return Err(AppError::BadRequest(format!(
            "handle {handle:?} contains unsupported characters"
        )));
    }

    Ok(handle)
}
