//! HTTP handlers of the admin screens
//!
//! Every handler locks the caller's client state for its whole run. Pages
//! render server-side; every POST answers with a 303 redirect so a reload
//! never repeats an action.

use crate::auth::{LoginForm, LoginRequired, SessionAuth, require_login};
use crate::core::access::AccessContext;
use crate::core::error::AdminError;
use crate::core::model::Model;
use crate::core::query::ListParams;
use crate::crud::{
    CrudController, CrudState, ListAction, Navigation, column_names, field_views, row_cells,
};
use crate::server::client_state::ClientState;
use crate::server::host::{AdminHost, ClientSession};
use crate::server::model_registry::CrudRouteState;
use axum::Json;
use axum::extract::{Form, Path, State};
use axum::http::Uri;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

/// Body of a field edit
#[derive(Debug, Deserialize)]
pub struct ValueForm {
    #[serde(default)]
    pub value: String,
}

/// Body of a list control
#[derive(Debug, Deserialize)]
pub struct ListActionForm {
    pub action: String,
    #[serde(default)]
    pub value: Option<String>,
}

/// Body of the login form
#[derive(Debug, Deserialize)]
pub struct LoginSubmission {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Body of the logout button
#[derive(Debug, Default, Deserialize)]
pub struct LogoutForm {
    #[serde(default)]
    pub next: String,
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "admin",
    }))
}

/// Index of registered models
pub async fn index(
    State(host): State<Arc<AdminHost>>,
    jar: CookieJar,
    uri: Uri,
) -> Result<Response, AdminError> {
    let mut client = host.open_client(jar).await;
    let ctx = match require_login(&host, &mut client.state, &uri.to_string()).await? {
        LoginRequired::Granted(ctx) => ctx,
        LoginRequired::Login(page) => return Ok((client.jar, page).into_response()),
    };

    let models: Vec<Value> = host
        .models
        .links()
        .into_iter()
        .map(|(name, href)| json!({ "name": name, "href": href }))
        .collect();

    let html = host.templates.render(
        "index.html",
        &json!({
            "title": host.config.title,
            "logout_action": host.config.logout_path(),
            "username": username(&ctx),
            "models": models,
        }),
    )?;
    Ok((client.jar, Html(html)).into_response())
}

/// List screen of one model
pub async fn list_page<M: Model>(
    State(route): State<CrudRouteState<M>>,
    jar: CookieJar,
    uri: Uri,
) -> Result<Response, AdminError> {
    let CrudRouteState { host, controller: crud } = route;
    let mut client = host.open_client(jar).await;
    let ctx = match require_login(&host, &mut client.state, &uri.to_string()).await? {
        LoginRequired::Granted(ctx) => ctx,
        LoginRequired::Login(page) => return Ok((client.jar, page).into_response()),
    };

    let params = ListParams::from_query(uri.query(), crud.default_page_size());
    let state = crud_state(&mut client.state, &crud);
    state.loaded_for = None;

    let rows = crud.page(state, &ctx, &params, uri.path()).await;
    let flash = std::mem::take(&mut state.db_message);
    let has_next = CrudController::<M>::has_next(&rows, &params);
    let rows: Vec<Value> = rows
        .iter()
        .map(|row| {
            let id = row.id().map(|id| id.to_string()).unwrap_or_default();
            json!({ "href": crud.edit_path(&id), "cells": row_cells(row) })
        })
        .collect();

    let html = host.templates.render(
        "list.html",
        &json!({
            "title": host.config.title,
            "logout_action": host.config.logout_path(),
            "username": username(&ctx),
            "index_href": host.config.prefix,
            "model": M::NAME,
            "action": crud.list_path(),
            "columns": column_names::<M>(),
            "rows": rows,
            "filter": params.filter,
            "offset": params.offset,
            "page_size": params.page_size,
            "has_prev": params.offset > 0,
            "has_next": has_next,
            "flash": flash,
        }),
    )?;
    Ok((client.jar, Html(html)).into_response())
}

/// Pagination, page size, filter and "new" controls of the list screen
pub async fn list_action<M: Model>(
    State(route): State<CrudRouteState<M>>,
    jar: CookieJar,
    Form(form): Form<ListActionForm>,
) -> Response {
    let CrudRouteState { host, controller: crud } = route;
    let mut client = host.open_client(jar).await;
    let ctx = client_context(&host, &mut client).await;
    if !ctx.is_authenticated() {
        return redirect(client.jar, crud.list_path());
    }

    let params = crud_state(&mut client.state, &crud).page_params.clone();
    let navigation = match ListAction::parse(&form.action, form.value) {
        Some(action) => crud.list_action(&params, action),
        None => Navigation::Stay,
    };
    navigate(client.jar, navigation, &params.href(crud.list_path()))
}

/// Edit screen of one record (`new` for a blank one)
pub async fn edit_page<M: Model>(
    State(route): State<CrudRouteState<M>>,
    jar: CookieJar,
    uri: Uri,
    Path(id): Path<String>,
) -> Result<Response, AdminError> {
    let CrudRouteState { host, controller: crud } = route;
    let mut client = host.open_client(jar).await;
    let ctx = match require_login(&host, &mut client.state, &uri.to_string()).await? {
        LoginRequired::Granted(ctx) => ctx,
        LoginRequired::Login(page) => return Ok((client.jar, page).into_response()),
    };

    let state = crud_state(&mut client.state, &crud);
    let navigation = crud.open(state, &ctx, &id).await;
    if let Navigation::Redirect(url) = navigation {
        return Ok(redirect(client.jar, &url));
    }

    let edit_path = crud.edit_path(&id);
    let record = match state.current.id() {
        Some(id) => format!("#{}", id),
        None => "new".to_string(),
    };

    let html = host.templates.render(
        "edit.html",
        &json!({
            "title": host.config.title,
            "logout_action": host.config.logout_path(),
            "username": username(&ctx),
            "index_href": host.config.prefix,
            "model": M::NAME,
            "record": record,
            "list_href": state.page_params.href(crud.list_path()),
            "fields": field_views(&state.current, &edit_path),
            "db_message": state.db_message,
            "form_message": state.form_message,
            "is_new": state.current.id().is_none(),
            "save_action": format!("{}/save", edit_path),
            "delete_action": format!("{}/delete", edit_path),
            "discard_action": format!("{}/discard", edit_path),
        }),
    )?;
    Ok((client.jar, Html(html)).into_response())
}

pub async fn set_field<M: Model>(
    State(route): State<CrudRouteState<M>>,
    jar: CookieJar,
    Path((id, name)): Path<(String, String)>,
    Form(form): Form<ValueForm>,
) -> Response {
    let (mut client, ctx) = match open_edit(&route, jar, &id).await {
        Ok(opened) => opened,
        Err(response) => return response,
    };
    let crud = &route.controller;
    crud.set_field(crud_state(&mut client.state, crud), &ctx, &name, &form.value);
    redirect(client.jar, &crud.edit_path(&id))
}

pub async fn reset_field<M: Model>(
    State(route): State<CrudRouteState<M>>,
    jar: CookieJar,
    Path((id, name)): Path<(String, String)>,
) -> Response {
    let (mut client, ctx) = match open_edit(&route, jar, &id).await {
        Ok(opened) => opened,
        Err(response) => return response,
    };
    let crud = &route.controller;
    crud.reset_field(crud_state(&mut client.state, crud), &ctx, &name);
    redirect(client.jar, &crud.edit_path(&id))
}

pub async fn save<M: Model>(
    State(route): State<CrudRouteState<M>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let (mut client, ctx) = match open_edit(&route, jar, &id).await {
        Ok(opened) => opened,
        Err(response) => return response,
    };
    let crud = &route.controller;
    let navigation = crud.save(crud_state(&mut client.state, crud), &ctx).await;
    navigate(client.jar, navigation, &crud.edit_path(&id))
}

pub async fn delete<M: Model>(
    State(route): State<CrudRouteState<M>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let (mut client, ctx) = match open_edit(&route, jar, &id).await {
        Ok(opened) => opened,
        Err(response) => return response,
    };
    let crud = &route.controller;
    let navigation = crud.delete(crud_state(&mut client.state, crud), &ctx).await;
    navigate(client.jar, navigation, &crud.edit_path(&id))
}

/// Drop unsaved edits and return to the list
pub async fn discard<M: Model>(
    State(route): State<CrudRouteState<M>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let (mut client, _ctx) = match open_edit(&route, jar, &id).await {
        Ok(opened) => opened,
        Err(response) => return response,
    };
    let crud = &route.controller;
    let navigation = crud.redirect_back_to_table(crud_state(&mut client.state, crud));
    navigate(client.jar, navigation, crud.list_path())
}

pub async fn login(
    State(host): State<Arc<AdminHost>>,
    jar: CookieJar,
    Form(submission): Form<LoginSubmission>,
) -> Result<Response, AdminError> {
    let mut client = host.open_client(jar).await;
    let auth_state = SessionAuth::attach(&mut client.state, client.token.as_str()).clone();

    let form = client.state.get_or_insert_with(LoginForm::default);
    form.username = submission.username;
    form.password = submission.password;
    form.submit(&host.auth, &auth_state).await?;

    let next = safe_next(&submission.next, &host.config.prefix);
    Ok(redirect(client.jar, &next))
}

/// A bare GET on the login route goes to the index, which shows the form if needed
pub async fn login_page(State(host): State<Arc<AdminHost>>) -> Redirect {
    Redirect::to(&host.config.prefix)
}

pub async fn logout(
    State(host): State<Arc<AdminHost>>,
    jar: CookieJar,
    Form(form): Form<LogoutForm>,
) -> Result<Response, AdminError> {
    let mut client = host.open_client(jar).await;
    let auth_state = SessionAuth::attach(&mut client.state, client.token.as_str()).clone();
    host.auth.logout(&auth_state).await?;

    let next = safe_next(&form.next, &host.config.prefix);
    Ok(redirect(client.jar, &next))
}

/// Lock the client, require a session and bring the edit form to `id`
///
/// The early-exit response redirects to the edit page, which renders the
/// login UI or follows the controller's own redirect.
async fn open_edit<M: Model>(
    route: &CrudRouteState<M>,
    jar: CookieJar,
    id: &str,
) -> Result<(ClientSession, AccessContext), Response> {
    let crud = &route.controller;
    let mut client = route.host.open_client(jar).await;
    let ctx = client_context(&route.host, &mut client).await;
    if !ctx.is_authenticated() {
        return Err(redirect(client.jar, &crud.edit_path(id)));
    }

    let navigation = crud.open(crud_state(&mut client.state, crud), &ctx, id).await;
    if let Navigation::Redirect(url) = navigation {
        return Err(redirect(client.jar, &url));
    }
    Ok((client, ctx))
}

async fn client_context(host: &AdminHost, client: &mut ClientSession) -> AccessContext {
    let auth_state = SessionAuth::attach(&mut client.state, client.token.as_str()).clone();
    host.auth.access_context(&auth_state).await
}

fn crud_state<'a, M: Model>(
    client: &'a mut ClientState,
    crud: &CrudController<M>,
) -> &'a mut CrudState<M> {
    client.get_or_insert_with(|| crud.new_state())
}

fn username(ctx: &AccessContext) -> Option<&str> {
    ctx.user.as_ref().map(|user| user.username.as_str())
}

fn redirect(jar: CookieJar, url: &str) -> Response {
    (jar, Redirect::to(url)).into_response()
}

fn navigate(jar: CookieJar, navigation: Navigation, stay: &str) -> Response {
    match navigation {
        Navigation::Redirect(url) => redirect(jar, &url),
        Navigation::Stay => redirect(jar, stay),
    }
}

/// Local absolute path to return to after login, or `fallback`
fn safe_next(next: &str, fallback: &str) -> String {
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control);
    if local {
        next.to_string()
    } else {
        fallback.to_string()
    }
}
