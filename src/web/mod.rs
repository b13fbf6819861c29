//! Browser UI for the tracker.
//!
//! Every handler runs one cycle: lock the session, check the
//! auth gate, apply at most one inventory change, then redirect back to `/`
//! so the page is rebuilt from what is actually stored.

pub mod render;
pub mod session;

use std::sync::Arc;

use axum::extract::rejection::{FormRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::AuthGate;
use crate::config::AppConfig;
use crate::entity::{FilamentDraft, FilamentRecord};
use crate::error::{Result, SpooldexError};
use crate::filter::{filter, FilterOptions, Selection};
use crate::inventory::InventoryService;
use crate::storage::CsvStore;

pub use render::{InventoryView, PAGE_TITLE};
pub use session::{
    session_id, AdminAction, Flash, FlashKind, SessionGuard, SessionState, SessionStore,
};

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<InventoryService>,
    pub auth: Arc<AuthGate>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(inventory: InventoryService, auth: AuthGate, sessions: SessionStore) -> Self {
        Self {
            inventory: Arc::new(inventory),
            auth: Arc::new(auth),
            sessions: Arc::new(sessions),
        }
    }

    /// Wire up a CSV-backed tracker from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let auth = AuthGate::new(&config.password_hash)?;
        let inventory = InventoryService::new(CsvStore::new(&config.data_file));
        let sessions = SessionStore::new(config.session_idle());
        Ok(Self::new(inventory, auth, sessions))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/admin/toggle", post(toggle_admin))
        .route("/admin/action", post(select_action))
        .route("/admin/select", post(select_record))
        .route("/filaments", post(add_filament))
        .route("/filaments/{index}/update", post(update_filament))
        .route("/filaments/{index}/delete", post(delete_filament))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: AppConfig) -> Result<()> {
    let state = AppState::from_config(&config)?;

    // Fail fast on an unreadable inventory instead of on the first request.
    let count = state.inventory.records()?.len();

    let listener = TcpListener::bind(&config.bind).await?;
    let addr = listener.local_addr()?;
    info!(
        addr = %addr,
        data_file = %config.data_file.display(),
        records = count,
        "serving filament tracker"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

/// Persist the session and attach its cookie to `response`.
async fn finish(state: &AppState, session: SessionGuard, response: impl IntoResponse) -> Response {
    let id = session.id();
    let stored = state.sessions.save(session).await;

    let mut response = response.into_response();
    if stored {
        match HeaderValue::from_str(&session::session_cookie(id)) {
            Ok(cookie) => {
                response.headers_mut().insert(SET_COOKIE, cookie);
            }
            Err(e) => warn!(error = %e, "could not encode session cookie"),
        }
    }
    response
}

fn back_home() -> Redirect {
    Redirect::to("/")
}

/// Run an inventory call on the blocking pool; the store does file I/O.
async fn with_inventory<T, F>(state: &AppState, call: F) -> Result<T>
where
    F: FnOnce(&InventoryService) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let inventory = Arc::clone(&state.inventory);
    tokio::task::spawn_blocking(move || call(&inventory))
        .await
        .map_err(|e| SpooldexError::Io(std::io::Error::other(e)))?
}

fn form_input<T>(form: std::result::Result<Form<T>, FormRejection>) -> Result<T> {
    form.map(|Form(value)| value)
        .map_err(|rejection| SpooldexError::InvalidInput(rejection.body_text()))
}

fn path_index(path: std::result::Result<Path<usize>, PathRejection>) -> Result<usize> {
    path.map(|Path(index)| index)
        .map_err(|rejection| SpooldexError::InvalidInput(rejection.body_text()))
}

async fn healthz() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/plain; charset=utf-8")], "ok")
}

async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;
    let flash = session.flash.take();

    if state.auth.require(&session).is_err() {
        let page = Html(render::login_page(flash.as_ref()));
        return finish(&state, session, page).await;
    }

    let records = match with_inventory(&state, |inventory| inventory.records()).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "cannot load inventory");
            let page = (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render::error_page(&e.to_string(), true)),
            );
            return finish(&state, session, page).await;
        }
    };

    let selection = Selection::from_pairs(params);
    let visible = filter(&records, &selection);
    let options = FilterOptions::from_records(&records);

    let page = render::inventory_page(&InventoryView {
        session: &session,
        records: &records,
        visible: &visible,
        options: &options,
        selection: &selection,
        flash: flash.as_ref(),
    });

    // A rejected add draft is shown once, then dropped.
    session.pending_draft = None;
    finish(&state, session, Html(page)).await
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: std::result::Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;

    let result = form_input(form).and_then(|form| state.auth.login(&mut session, &form.password));
    if let Err(e) = result {
        session.flash = Some(Flash::error(e.to_string()));
    }

    finish(&state, session, back_home()).await
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;
    state.auth.logout(&mut session);
    finish(&state, session, back_home()).await
}

async fn toggle_admin(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;
    if state.auth.require(&session).is_ok() {
        session.admin_visible = !session.admin_visible;
    }
    finish(&state, session, back_home()).await
}

#[derive(Debug, Deserialize)]
struct ActionForm {
    action: String,
}

async fn select_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: std::result::Result<Form<ActionForm>, FormRejection>,
) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;
    if state.auth.require(&session).is_ok() {
        let action = form_input(form).and_then(|form| {
            form.action
                .parse::<AdminAction>()
                .map_err(SpooldexError::InvalidInput)
        });
        match action {
            Ok(action) => session.admin_action = action,
            Err(e) => session.flash = Some(Flash::error(e.to_string())),
        }
    }
    finish(&state, session, back_home()).await
}

#[derive(Debug, Deserialize)]
struct SelectForm {
    index: usize,
}

async fn select_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: std::result::Result<Form<SelectForm>, FormRejection>,
) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;
    if state.auth.require(&session).is_ok() {
        match form_input(form) {
            Ok(form) => {
                session.admin_action = AdminAction::Edit;
                session.edit_index = form.index;
            }
            Err(e) => {
                report(&e);
                session.flash = Some(Flash::error(e.to_string()));
            }
        }
    }
    finish(&state, session, back_home()).await
}

async fn add_filament(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: std::result::Result<Form<FilamentDraft>, FormRejection>,
) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;

    if state.auth.require(&session).is_ok() {
        let result = match form_input(form) {
            Ok(draft) => {
                let submitted = draft.clone();
                with_inventory(&state, move |inventory| inventory.add_record(&submitted))
                    .await
                    .map_err(|e| (e, Some(draft)))
            }
            Err(e) => Err((e, None)),
        };
        match result {
            Ok(_) => {
                session.pending_draft = None;
                session.flash = Some(Flash::success("Filament added successfully!"));
            }
            Err((e, draft)) => {
                report(&e);
                session.pending_draft = draft;
                session.flash = Some(Flash::error(e.to_string()));
            }
        }
    }

    finish(&state, session, back_home()).await
}

/// Edit form submission: the new field values plus a hidden copy of the
/// record the form was rendered from.
#[derive(Debug, Default, Deserialize)]
struct EditForm {
    #[serde(default)]
    color: String,
    #[serde(default)]
    company: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    remaining: i64,
    #[serde(default)]
    color_hex: String,
    #[serde(default)]
    expected_color: String,
    #[serde(default)]
    expected_company: String,
    #[serde(default)]
    expected_type: String,
    #[serde(default)]
    expected_remaining: i64,
    #[serde(default)]
    expected_color_hex: String,
}

impl EditForm {
    fn draft(&self) -> FilamentDraft {
        FilamentDraft::new(
            self.color.clone(),
            self.company.clone(),
            self.kind.clone(),
            self.remaining,
            self.color_hex.clone(),
        )
    }

    /// The record the operator was looking at, if the form carried one.
    ///
    /// Text is taken verbatim: it has to compare equal to the stored row,
    /// padding included.
    fn expected(&self) -> Option<FilamentRecord> {
        let text = [
            &self.expected_color,
            &self.expected_company,
            &self.expected_type,
        ];
        if text.iter().any(|value| value.is_empty()) {
            return None;
        }
        let color_hex = self.expected_color_hex.parse().ok()?;
        Some(FilamentRecord::new(
            self.expected_color.clone(),
            self.expected_company.clone(),
            self.expected_type.clone(),
            self.expected_remaining,
            color_hex,
        ))
    }
}

async fn update_filament(
    State(state): State<AppState>,
    headers: HeaderMap,
    index: std::result::Result<Path<usize>, PathRejection>,
    form: std::result::Result<Form<EditForm>, FormRejection>,
) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;

    if state.auth.require(&session).is_ok() {
        let result = match path_index(index).and_then(|index| Ok((index, form_input(form)?))) {
            Ok((index, form)) => {
                let draft = form.draft();
                let expected = form.expected();
                with_inventory(&state, move |inventory| match expected {
                    Some(expected) => inventory.update_record_checked(index, &expected, &draft),
                    None => inventory.update_record(index, &draft),
                })
                .await
            }
            Err(e) => Err(e),
        };
        session.flash = Some(match result {
            Ok(_) => Flash::success("Filament updated successfully!"),
            Err(e) => {
                report(&e);
                Flash::error(e.to_string())
            }
        });
    }

    finish(&state, session, back_home()).await
}

async fn delete_filament(
    State(state): State<AppState>,
    headers: HeaderMap,
    index: std::result::Result<Path<usize>, PathRejection>,
    form: std::result::Result<Form<EditForm>, FormRejection>,
) -> Response {
    let mut session = state.sessions.load(session_id(&headers)).await;

    if state.auth.require(&session).is_ok() {
        let result = match path_index(index).and_then(|index| Ok((index, form_input(form)?))) {
            Ok((index, form)) => {
                let expected = form.expected();
                with_inventory(&state, move |inventory| match expected {
                    Some(expected) => inventory.delete_record_checked(index, &expected),
                    None => inventory.delete_record(index),
                })
                .await
            }
            Err(e) => Err(e),
        };
        session.flash = Some(match result {
            Ok(records) => {
                if session.edit_index >= records.len() {
                    session.edit_index = 0;
                }
                Flash::success("Filament deleted successfully!")
            }
            Err(e) => {
                report(&e);
                Flash::error(e.to_string())
            }
        });
    }

    finish(&state, session, back_home()).await
}

fn report(err: &SpooldexError) {
    if err.is_user_error() {
        warn!(error = %err, "inventory change rejected");
    } else {
        error!(error = %err, "inventory change failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit_form(color: &str) -> EditForm {
        EditForm {
            expected_color: color.to_string(),
            expected_company: "Creality".to_string(),
            expected_type: "PLA".to_string(),
            expected_remaining: 50,
            expected_color_hex: "#e0115f".to_string(),
            ..EditForm::default()
        }
    }

    #[test]
    fn test_expected_record_keeps_padding() {
        let expected = edit_form("Ruby Red ").expected().unwrap();
        assert_eq!(expected.color, "Ruby Red ");
        assert_eq!(expected.color_hex.as_str(), "#E0115F");
    }

    #[test]
    fn test_expected_record_missing_or_malformed() {
        assert!(EditForm::default().expected().is_none());
        assert!(edit_form("").expected().is_none());

        let mut form = edit_form("Ruby Red");
        form.expected_color_hex = "nope".to_string();
        assert!(form.expected().is_none());
    }
}
