//! Admin demo
//!
//! Serves a landing page, a login-protected page and the CRUD screens for
//! sessions, users, heroes and stuff. The first login creates the admin.
//!
//! ```sh
//! cargo run --example admin_demo [config.yaml]
//! ```

mod models;

use admin::prelude::*;
use models::{Hero, Stuff};
use std::sync::Arc;

async fn index() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html><body>
  <h1>Welcome to the admin demo!</h1>
  <p><a href="/protected">Protected Page</a></p>
  <p><a href="/crud">CRUD Models</a></p>
</body></html>"#,
    )
}

async fn protected(
    State(host): State<Arc<AdminHost>>,
    jar: CookieJar,
) -> std::result::Result<Response, AdminError> {
    let mut client = host.open_client(jar).await;
    let ctx = match require_login(&host, &mut client.state, "/protected").await? {
        LoginRequired::Granted(ctx) => ctx,
        LoginRequired::Login(page) => return Ok((client.jar, page).into_response()),
    };

    let user = ctx.user.unwrap_or_default();
    let rank = if user.admin { "ADMIN" } else { "just a peon" };
    let html = format!(
        r#"<!DOCTYPE html>
<html><body>
  <h1>You are logged in as {}</h1>
  <p>You are {}</p>
  <p><a href="/crud">CRUD Models</a></p>
</body></html>"#,
        tera::escape_html(&user.username),
        rank
    );
    Ok((client.jar, Html(html)).into_response())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AdminConfig::from_yaml_file(path)?,
        None => AdminConfig::default(),
    }
    .with_env_overrides()?;
    config.init_tracing()?;

    let pages = Router::new()
        .route("/", get(index))
        .route("/protected", get(protected));

    AdminBuilder::new(config)
        .with_event_bus(1024)
        .with_access(AccessPolicy::AdminOnly)
        .with_custom_routes(pages)
        .register_sessions()
        .register_users()
        .register::<Hero>(InMemoryStore::new())
        .register::<Stuff>(InMemoryStore::new())
        .serve()
        .await
}
