//! User and session records

use super::password;
use crate::admin_model;
use crate::core::model::ModelHooks;
use chrono::{DateTime, Utc};

admin_model!(User, "User", unique: [username], {
    username: String,
    password_hash: String,
    enabled: bool = false,
    admin: bool = false,
});

impl User {
    /// Check a plaintext password against the stored hash
    pub fn verify(&self, secret: &str) -> bool {
        password::verify_password(secret, &self.password_hash)
    }

    /// Replace a plaintext `password_hash` with its hash
    ///
    /// Values that already are hashes are left untouched, so saving a loaded
    /// user does not hash twice.
    pub fn hash_password(&mut self) -> anyhow::Result<()> {
        if !password::is_password_hash(&self.password_hash) {
            self.password_hash = password::hash_password(&self.password_hash)?;
        }
        Ok(())
    }
}

impl ModelHooks for User {
    fn before_save(&mut self) -> anyhow::Result<()> {
        self.hash_password()
    }
}

admin_model!(AuthSession, "AuthSession", unique: [session_id], {
    user_id: i64,
    session_id: String,
    expiration: DateTime<Utc>,
});

impl AuthSession {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expiration >= now
    }
}

impl ModelHooks for AuthSession {}
