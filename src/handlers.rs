use std::sync::Arc;

use actix_web::{http::header, web, HttpResponse};
use askama::Template;
use serde::{Deserialize, Serialize};

use crate::cache::RecentNotesCache;
use crate::config::Config;
use crate::errors::ServerError;
use crate::models::Note;
use crate::store::NoteStore;

/// Everything a request handler needs, built once in `main` and shared
/// across workers. No ambient globals.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn NoteStore>,
    pub cache: RecentNotesCache,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    notes: &'a [Note],
    server_name: &'a str,
    results_cached: bool,
}

/// Read path: serve the recent-notes list from the cache when it holds the
/// key, otherwise run the query and populate the cache for the next reader.
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse, ServerError> {
    let notes_to_display = state.config.notes_to_display;
    let key = RecentNotesCache::cache_key(notes_to_display);

    let (notes, results_cached) = match state.cache.get(&key) {
        Some(cached) => (cached, true),
        None => {
            let fresh = state.store.recent(notes_to_display)?;
            state.cache.put(&key, &fresh);
            (fresh, false)
        }
    };

    let body = IndexTemplate {
        notes: &notes,
        server_name: &state.config.hostname(),
        results_cached,
    }
    .render()?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct NewNoteForm {
    pub content: Option<String>,
}

/// Write path: store the note, then invalidate the cached list before
/// acknowledging, so the next read cannot serve a list older than this
/// write. Blank submissions are dropped silently and redirect like any
/// other; only storage failures surface to the caller.
pub async fn new(
    form: web::Form<NewNoteForm>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ServerError> {
    let content = form.content.as_deref().unwrap_or("");

    match state.store.insert(content, &state.config.hostname()) {
        Ok(note) => {
            let key = RecentNotesCache::cache_key(state.config.notes_to_display);
            state.cache.invalidate(&key);
            log::debug!("stored note {}", note.id);
        }
        Err(ServerError::EmptyContent) => {}
        Err(err) => return Err(err),
    }

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, "/"))
        .finish())
}
