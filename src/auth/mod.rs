//! Session authentication: users, sessions, login form and login gate

pub mod login;
pub mod models;
pub mod password;
pub mod session;

pub use login::{DefaultLoginComponent, LoginComponent, LoginForm, LoginPage, LoginRequired, require_login};
pub use models::{AuthSession, User};
pub use session::{ANONYMOUS_USER_ID, AuthState, SessionAuth};
