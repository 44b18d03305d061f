//! Login form, login UI and the login gate for protected pages

use super::models::User;
use super::session::{AuthState, SessionAuth};
use crate::core::access::AccessContext;
use crate::core::error::AdminError;
use crate::server::client_state::ClientState;
use crate::server::exposure::html::templates::Templates;
use crate::server::host::AdminHost;
use axum::response::Html;
use serde::Serialize;
use std::sync::Arc;

pub const DISABLED_MESSAGE: &str = "This account is disabled.";
pub const FAILED_MESSAGE: &str = "There was a problem logging in, please try again.";

/// Username/password sub-state bound to the login UI
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub error_message: String,
}

impl LoginForm {
    /// Check the submitted credentials and log the client in
    ///
    /// When no user exists at all, the submitted credentials become the
    /// first user, enabled and admin. Returns whether the client is now
    /// logged in; on failure the password is cleared and `error_message`
    /// explains why.
    pub async fn submit(&mut self, auth: &SessionAuth, state: &AuthState) -> Result<bool, AdminError> {
        self.error_message.clear();

        let username = self.username.clone();
        let mut user = auth
            .users()
            .find_one(Arc::new(move |u: &User| u.username == username))
            .await?;

        if user.is_none() && auth.users().count().await? == 0 {
            let mut first = User {
                username: self.username.clone(),
                password_hash: self.password.clone(),
                enabled: true,
                admin: true,
                ..Default::default()
            };
            first.hash_password()?;
            let first = auth.users().upsert(first).await?;
            tracing::warn!(username = %first.username, "Created first new admin user");
            user = Some(first);
        }

        match user {
            Some(user) if !user.enabled => {
                self.password.clear();
                self.error_message = DISABLED_MESSAGE.to_string();
                Ok(false)
            }
            Some(user) if user.verify(&self.password) => {
                auth.login(state, user.id.unwrap_or(-1)).await?;
                self.username.clear();
                self.password.clear();
                Ok(true)
            }
            _ => {
                tracing::debug!(username = %self.username, "login rejected");
                self.password.clear();
                self.error_message = FAILED_MESSAGE.to_string();
                Ok(false)
            }
        }
    }
}

/// Data handed to a login UI
#[derive(Debug, Clone, Serialize)]
pub struct LoginPage {
    pub title: String,
    /// URL the form posts to
    pub action: String,
    /// Page to return to after the attempt
    pub next: String,
    pub username: String,
    pub error_message: String,
}

/// Renders the login UI shown in place of protected pages
pub trait LoginComponent: Send + Sync {
    fn render(&self, templates: &Templates, page: &LoginPage) -> Result<String, AdminError>;
}

/// Username/password form from the built-in templates
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLoginComponent;

impl LoginComponent for DefaultLoginComponent {
    fn render(&self, templates: &Templates, page: &LoginPage) -> Result<String, AdminError> {
        templates.render("login.html", page)
    }
}

/// Outcome of [`require_login`]
#[derive(Debug)]
pub enum LoginRequired {
    /// The client holds a live session
    Granted(AccessContext),
    /// Login UI to serve at the requested URL instead of the page
    Login(Html<String>),
}

/// Gate a page behind a live session
///
/// Unauthenticated clients get the login UI at the same URL rather than a
/// redirect; the form posts back with `next` pointing at this page.
///
/// ```rust,ignore
/// async fn protected(State(host): State<Arc<AdminHost>>, jar: CookieJar, uri: Uri) -> Result<Response, AdminError> {
///     let mut client = host.open_client(jar).await;
///     let ctx = match require_login(&host, &mut client.state, &uri.to_string()).await? {
///         LoginRequired::Granted(ctx) => ctx,
///         LoginRequired::Login(page) => return Ok((client.jar, page).into_response()),
///     };
///     // render the protected page for ctx.user
/// }
/// ```
pub async fn require_login(
    host: &AdminHost,
    client: &mut ClientState,
    next: &str,
) -> Result<LoginRequired, AdminError> {
    let auth_state = match client.get::<AuthState>() {
        Some(state) => state.clone(),
        None => SessionAuth::attach(client, "").clone(),
    };

    let ctx = host.auth.access_context(&auth_state).await;
    if ctx.is_authenticated() {
        return Ok(LoginRequired::Granted(ctx));
    }

    let form = client.get_or_insert_with(LoginForm::default);
    let page = LoginPage {
        title: host.config.title.clone(),
        action: host.config.login_path(),
        next: next.to_string(),
        username: form.username.clone(),
        error_message: form.error_message.clone(),
    };
    let html = host.login_ui.render(&host.templates, &page)?;
    Ok(LoginRequired::Login(Html(html)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::AuthSession;
    use crate::auth::session::ANONYMOUS_USER_ID;
    use crate::core::store::RecordStore;
    use crate::storage::InMemoryStore;

    struct Fixture {
        auth: SessionAuth,
        users: InMemoryStore<User>,
        state: AuthState,
    }

    fn fixture() -> Fixture {
        let users = InMemoryStore::<User>::new();
        let sessions = InMemoryStore::<AuthSession>::new();
        let auth = SessionAuth::new(Arc::new(users.clone()), Arc::new(sessions));
        let mut client = ClientState::new();
        let state = SessionAuth::attach(&mut client, "tok-login").clone();
        Fixture { auth, users, state }
    }

    fn form(username: &str, password: &str) -> LoginForm {
        LoginForm {
            username: username.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_login_bootstraps_admin() {
        let fx = fixture();
        let mut login = form("root", "toor");

        let ok = login.submit(&fx.auth, &fx.state).await.expect("submit should succeed");
        assert!(ok);
        assert!(login.username.is_empty());
        assert!(login.password.is_empty());

        assert_eq!(fx.users.count().await.expect("count should succeed"), 1);
        let root = fx.users.get(1).await.expect("get should succeed").expect("user should exist");
        assert!(root.enabled);
        assert!(root.admin);
        assert_ne!(root.password_hash, "toor");
        assert!(root.verify("toor"));
        assert_eq!(fx.auth.authenticated_user_id(&fx.state).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_user_does_not_bootstrap_when_users_exist() {
        let fx = fixture();
        form("root", "toor").submit(&fx.auth, &fx.state).await.expect("submit should succeed");
        fx.auth.logout(&fx.state).await.expect("logout should succeed");

        let mut login = form("mallory", "x");
        let ok = login.submit(&fx.auth, &fx.state).await.expect("submit should succeed");

        assert!(!ok);
        assert_eq!(login.error_message, FAILED_MESSAGE);
        assert!(login.password.is_empty());
        assert_eq!(login.username, "mallory");
        assert_eq!(fx.users.count().await.expect("count should succeed"), 1);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let fx = fixture();
        form("root", "toor").submit(&fx.auth, &fx.state).await.expect("submit should succeed");
        fx.auth.logout(&fx.state).await.expect("logout should succeed");

        let mut login = form("root", "nope");
        assert!(!login.submit(&fx.auth, &fx.state).await.expect("submit should succeed"));
        assert_eq!(login.error_message, FAILED_MESSAGE);
        assert_eq!(fx.auth.authenticated_user_id(&fx.state).await, ANONYMOUS_USER_ID);
    }

    #[tokio::test]
    async fn test_disabled_account() {
        let fx = fixture();
        let mut user = User {
            username: "bob".to_string(),
            password_hash: "pw".to_string(),
            enabled: false,
            ..Default::default()
        };
        user.hash_password().expect("hashing should succeed");
        fx.users.upsert(user).await.expect("seed should succeed");

        let mut login = form("bob", "pw");
        assert!(!login.submit(&fx.auth, &fx.state).await.expect("submit should succeed"));
        assert_eq!(login.error_message, DISABLED_MESSAGE);
        assert!(login.password.is_empty());
    }

    #[tokio::test]
    async fn test_error_message_cleared_on_resubmit() {
        let fx = fixture();
        form("root", "toor").submit(&fx.auth, &fx.state).await.expect("submit should succeed");
        fx.auth.logout(&fx.state).await.expect("logout should succeed");

        let mut login = form("root", "bad");
        login.submit(&fx.auth, &fx.state).await.expect("submit should succeed");
        assert!(!login.error_message.is_empty());

        login.password = "toor".to_string();
        assert!(login.submit(&fx.auth, &fx.state).await.expect("submit should succeed"));
        assert!(login.error_message.is_empty());
    }
}
