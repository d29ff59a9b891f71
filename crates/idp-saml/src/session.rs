//! Users and the stateless session identity.
//!
//! A session token is the hex SHA-256 of the username bytes followed by the
//! password bytes. It needs no server-side storage and survives restarts, and
//! anyone who knows the credentials can compute it. That is acceptable for a
//! static demo directory only.

use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult};

/// A user the identity provider can authenticate.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name, also the assertion `NameID`.
    pub username: String,
    /// Plaintext demo credential.
    pub password: String,
    /// Attributes released into assertions, in configured order.
    #[serde(
        default,
        with = "ordered_attributes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attributes: Vec<(String, String)>,
}

impl User {
    /// Creates a user without attributes.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute, keeping insertion order.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Computes the session token for `user`.
#[must_use]
pub fn session_token(user: &User) -> String {
    idp_crypto::sha256_hex(&[user.username.as_bytes(), user.password.as_bytes()])
}

/// Finds the user whose session token equals `token`.
#[must_use]
pub fn lookup_by_session<'a>(token: &str, users: &'a [User]) -> Option<&'a User> {
    users.iter().find(|user| session_token(user) == token)
}

/// Checks credentials against `users`.
///
/// # Errors
///
/// Returns [`SamlError::Authentication`] for an unknown user or a wrong
/// password alike.
pub fn authenticate<'a>(username: &str, password: &str, users: &'a [User]) -> SamlResult<&'a User> {
    users
        .iter()
        .find(|user| user.username == username && user.password == password)
        .ok_or(SamlError::Authentication)
}

/// Creates a fresh session index: `_`, 32 random hex characters, `_`, token.
#[must_use]
pub fn new_session_index(user: &User) -> String {
    format!("_{}_{}", idp_crypto::random_hex(32), session_token(user))
}

/// (De)serializes attributes as a JSON object while keeping document order.
mod ordered_attributes {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        attributes: &[(String, String)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(attributes.len()))?;
        for (name, value) in attributes {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, String)>, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of attribute names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut attributes = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, String>()? {
                    attributes.push(entry);
                }
                Ok(attributes)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
