use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{PostsOut, PostsQuery},
    service,
};

use super::resolve_handle;

pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> AppResult<Json<PostsOut>> {
    let handle = resolve_handle(&state, query.handle)?;
    let posts = service::posts::load_posts(state.source.as_ref(), &handle).await;
    Ok(Json(PostsOut { handle, posts }))
}
