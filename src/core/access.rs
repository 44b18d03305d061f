//! Access control for CRUD mutations and list pages
//!
//! The context is derived from the client's session on every request. A
//! policy that rejects a context turns guarded operations into silent no-ops.

use crate::auth::models::User;

/// Who is making the request, as resolved from the session token
#[derive(Debug, Clone)]
pub struct AccessContext {
    /// Authenticated user id, `-1` when the token has no live session
    pub user_id: i64,

    /// The user record behind `user_id`, when it still exists
    pub user: Option<User>,
}

impl AccessContext {
    /// Context of a visitor without a session
    pub fn anonymous() -> Self {
        Self {
            user_id: -1,
            user: None,
        }
    }

    pub fn for_user(user: User) -> Self {
        Self {
            user_id: user.id.unwrap_or(-1),
            user: Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id >= 0
    }

    /// Check if context represents an admin
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.admin)
    }
}

/// Access policy for the CRUD screens of a model
#[derive(Debug, Clone, Default)]
pub enum AccessPolicy {
    /// Everyone passes; list pages still require a session
    #[default]
    Public,

    /// Any authenticated user
    Authenticated,

    /// Users with the admin flag
    AdminOnly,

    /// Combination of policies (AND)
    And(Vec<AccessPolicy>),

    /// Combination of policies (OR)
    Or(Vec<AccessPolicy>),

    /// Custom policy function
    Custom(fn(&AccessContext) -> bool),
}

impl AccessPolicy {
    /// Check if the context satisfies this policy
    pub fn check(&self, context: &AccessContext) -> bool {
        match self {
            AccessPolicy::Public => true,

            AccessPolicy::Authenticated => context.is_authenticated(),

            AccessPolicy::AdminOnly => context.is_authenticated() && context.is_admin(),

            AccessPolicy::And(policies) => policies.iter().all(|p| p.check(context)),

            AccessPolicy::Or(policies) => policies.iter().any(|p| p.check(context)),

            AccessPolicy::Custom(f) => f(context),
        }
    }
}
