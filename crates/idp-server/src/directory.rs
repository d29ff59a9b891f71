//! User directory.
//!
//! The directory is the only place credentials are checked. Handlers see it
//! as a trait object so another store can be plugged in without touching
//! the SAML flow.

use async_trait::async_trait;
use idp_saml::{session, SamlResult, User};

/// Source of users for sign-in and session lookup.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Checks credentials.
    ///
    /// Fails with `SamlError::Authentication` without saying whether the
    /// username or the password was wrong.
    async fn authenticate(&self, username: &str, password: &str) -> SamlResult<User>;

    /// Resolves a session token to its user.
    async fn find_by_session(&self, token: &str) -> Option<User>;

    /// Users to list on the login page.
    fn listed_users(&self) -> Vec<User>;
}

/// Directory over a fixed, configured list of users.
#[derive(Debug, Clone, Default)]
pub struct StaticUserDirectory {
    users: Vec<User>,
}

impl StaticUserDirectory {
    /// Creates a directory over `users`.
    #[must_use]
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn authenticate(&self, username: &str, password: &str) -> SamlResult<User> {
        session::authenticate(username, password, &self.users).cloned()
    }

    async fn find_by_session(&self, token: &str) -> Option<User> {
        session::lookup_by_session(token, &self.users).cloned()
    }

    fn listed_users(&self) -> Vec<User> {
        self.users.clone()
    }
}
