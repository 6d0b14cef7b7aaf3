use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::PostsQuery,
    view::{render::render_section, BlogSection},
};

use super::resolve_handle;

pub async fn blog_section(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> AppResult<Html<String>> {
    let handle = resolve_handle(&state, query.handle)?;

    let section = BlogSection::mount(Arc::clone(&state.source));
    section.activate(&handle);
    let settled = section.settled().await;
    section.teardown();

    Ok(Html(render_section(&settled, &handle, &state.feed_host)))
}
