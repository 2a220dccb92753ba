use super::session::Session;
use super::views::APPLICATION_JS;
use super::{AppError, AppState};
use crate::models::{FlashKind, ListId, TodoId};
use crate::store::validate_todo_title;
use axum::extract::{Form, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

type HandlerResult = Result<Response, AppError>;

#[derive(Debug, Deserialize)]
pub struct ListTitleForm {
    pub list_title: String,
}

#[derive(Debug, Deserialize)]
pub struct TodoForm {
    pub todo: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub completed: String,
}

fn list_url(list_id: &ListId) -> String {
    format!("/lists/{}", list_id)
}

pub async fn index() -> Redirect {
    Redirect::to("/lists")
}

pub async fn get_lists(State(app): State<AppState>, jar: CookieJar) -> HandlerResult {
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    let flashes = store.take_flashes();
    let lists = store.sorted_lists();
    let html = app.views.lists_page(&flashes, lists.values())?;
    session.commit(&app, Html(html).into_response()).await
}

pub async fn new_list_form(State(app): State<AppState>, jar: CookieJar) -> HandlerResult {
    let mut session = Session::load(&app, &jar).await?;
    let flashes = session.store_mut().take_flashes();
    let html = app.views.new_list_page(&flashes, "")?;
    session.commit(&app, Html(html).into_response()).await
}

pub async fn create_list(
    State(app): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ListTitleForm>,
) -> HandlerResult {
    let title = form.list_title.trim().to_string();
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();

    if let Err(error) = store.validate_list_title(&title) {
        store.flash(FlashKind::Error, error.to_string());
        let flashes = store.take_flashes();
        let html = app.views.new_list_page(&flashes, &title)?;
        return session.commit(&app, Html(html).into_response()).await;
    }

    let list_id = store.create_list(title).id.clone();
    tracing::info!(list_id = %list_id, "list created");
    store.flash(FlashKind::Success, "The list has been created.");
    session.commit(&app, Redirect::to("/lists").into_response()).await
}

pub async fn get_list(
    State(app): State<AppState>,
    Path(list_id): Path<ListId>,
    jar: CookieJar,
) -> HandlerResult {
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    let list = store.find_list(&list_id)?.clone();
    let flashes = store.take_flashes();
    let html = app.views.list_page(&flashes, &list, "")?;
    session.commit(&app, Html(html).into_response()).await
}

pub async fn create_todo(
    State(app): State<AppState>,
    Path(list_id): Path<ListId>,
    jar: CookieJar,
    Form(form): Form<TodoForm>,
) -> HandlerResult {
    let title = form.todo.trim().to_string();
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    store.find_list(&list_id)?;

    if let Err(error) = validate_todo_title(&title) {
        store.flash(FlashKind::Error, error.to_string());
        let flashes = store.take_flashes();
        let list = store.find_list(&list_id)?;
        let html = app.views.list_page(&flashes, list, &title)?;
        return session.commit(&app, Html(html).into_response()).await;
    }

    store.create_todo(&list_id, title)?;
    session.commit(&app, Redirect::to(&list_url(&list_id)).into_response()).await
}

pub async fn update_todo_status(
    State(app): State<AppState>,
    Path((list_id, todo_id)): Path<(ListId, TodoId)>,
    jar: CookieJar,
    Form(form): Form<StatusForm>,
) -> HandlerResult {
    let completed = form.completed == "True";
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    store.set_todo_completed(&list_id, &todo_id, completed)?;
    store.flash(FlashKind::Success, "Todo status updated.");
    session.commit(&app, Redirect::to(&list_url(&list_id)).into_response()).await
}

pub async fn delete_todo(
    State(app): State<AppState>,
    Path((list_id, todo_id)): Path<(ListId, TodoId)>,
    jar: CookieJar,
) -> HandlerResult {
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    store.delete_todo(&list_id, &todo_id)?;
    store.flash(FlashKind::Success, "Todo successfully deleted.");
    session.commit(&app, Redirect::to(&list_url(&list_id)).into_response()).await
}

pub async fn complete_all_todos(
    State(app): State<AppState>,
    Path(list_id): Path<ListId>,
    jar: CookieJar,
) -> HandlerResult {
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    store.set_all_todos_completed(&list_id, true)?;
    store.flash(FlashKind::Success, "All todos marked as completed.");
    session.commit(&app, Redirect::to(&list_url(&list_id)).into_response()).await
}

pub async fn edit_list_form(
    State(app): State<AppState>,
    Path(list_id): Path<ListId>,
    jar: CookieJar,
) -> HandlerResult {
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    let list = store.find_list(&list_id)?.clone();
    let flashes = store.take_flashes();
    let html = app.views.edit_list_page(&flashes, &list, &list.title)?;
    session.commit(&app, Html(html).into_response()).await
}

/// Renames a list. The new title is checked against every list, this one
/// included, so resubmitting the current title is rejected as a duplicate.
pub async fn update_list(
    State(app): State<AppState>,
    Path(list_id): Path<ListId>,
    jar: CookieJar,
    Form(form): Form<ListTitleForm>,
) -> HandlerResult {
    let title = form.list_title.trim().to_string();
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    store.find_list(&list_id)?;

    if let Err(error) = store.validate_list_title(&title) {
        store.flash(FlashKind::Error, error.to_string());
        let flashes = store.take_flashes();
        let list = store.find_list(&list_id)?;
        let html = app.views.edit_list_page(&flashes, list, &title)?;
        return session.commit(&app, Html(html).into_response()).await;
    }

    store.rename_list(&list_id, title)?;
    store.flash(FlashKind::Success, "List successfully updated.");
    session.commit(&app, Redirect::to(&list_url(&list_id)).into_response()).await
}

pub async fn delete_list(
    State(app): State<AppState>,
    Path(list_id): Path<ListId>,
    jar: CookieJar,
) -> HandlerResult {
    let mut session = Session::load(&app, &jar).await?;
    let store = session.store_mut();
    let list = store.delete_list(&list_id)?;
    tracing::info!(list_id = %list.id, "list deleted");
    store.flash(FlashKind::Success, "List successfully deleted.");
    session.commit(&app, Redirect::to("/lists").into_response()).await
}

pub async fn application_js() -> impl IntoResponse {
    (
        [(CONTENT_TYPE, "text/javascript; charset=utf-8")],
        APPLICATION_JS,
    )
}
