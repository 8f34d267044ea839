//! Credential state shared by every authenticator.
//!
//! Authenticators embed these structs by value instead of inheriting them:
//! [`AuthState`] holds the username/password pair and the last outcome, and
//! [`UserFields`] holds the field names and fetched record for lookups
//! against tabular stores.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::result::{AuthOutcome, AuthResult};

/// Default name of the username field in a user record.
pub const DEFAULT_USERNAME_FIELD: &str = "username";

/// Default name of the password field in a user record.
pub const DEFAULT_PASSWORD_FIELD: &str = "password";

/// A username and optional password.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Username (or DN for directory binds).
    pub username: String,
    /// Password, if one was supplied.
    pub password: Option<String>,
}

impl Credentials {
    /// Create credentials from a username and password.
    pub fn new(username: impl Into<String>, password: Option<&str>) -> Self {
        Self {
            username: username.into(),
            password: password.map(str::to_string),
        }
    }

    /// Password as a string slice.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Per-instance authentication state.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    credentials: Credentials,
    outcome: AuthOutcome,
}

impl AuthState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Current username.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Current password.
    pub fn password(&self) -> Option<&str> {
        self.credentials.password()
    }

    /// Replace the username without touching the result.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.credentials.username = username.into();
    }

    /// Replace the password without touching the result.
    pub fn set_password(&mut self, password: Option<&str>) {
        self.credentials.password = password.map(str::to_string);
    }

    /// Start a new attempt: store the credentials and reset the outcome.
    pub fn begin(&mut self, username: &str, password: Option<&str>) {
        self.credentials = Credentials::new(username, password);
        self.outcome = AuthOutcome::Unattempted;
    }

    /// Record the outcome of the attempt and return its binary result.
    pub fn finish(&mut self, outcome: AuthOutcome) -> AuthResult {
        self.outcome = outcome;
        self.outcome.result()
    }

    /// Outcome of the last attempt.
    pub fn outcome(&self) -> &AuthOutcome {
        &self.outcome
    }

    /// Binary result of the last attempt.
    pub fn result(&self) -> AuthResult {
        self.outcome.result()
    }
}

/// A single row returned by a user repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord {
    fields: Map<String, Value>,
}

impl UserRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder style).
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Raw field value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Field value as a string. Null and non-string values yield `None`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Check whether `name` holds exactly the string `value`.
    pub fn field_equals(&self, name: &str, value: &str) -> bool {
        self.get_str(name) == Some(value)
    }

    /// All fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for UserRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Field names and fetched record for authenticators backed by a user table.
#[derive(Debug, Clone)]
pub struct UserFields {
    /// Field compared against the username.
    pub username_field: String,
    /// Field holding the password hash.
    pub password_field: String,
    user: Option<UserRecord>,
}

impl UserFields {
    /// Create with explicit field names.
    pub fn new(username_field: impl Into<String>, password_field: impl Into<String>) -> Self {
        Self {
            username_field: username_field.into(),
            password_field: password_field.into(),
            user: None,
        }
    }

    /// Record fetched by the last attempt.
    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// Replace the fetched record.
    pub fn set_user(&mut self, user: Option<UserRecord>) {
        self.user = user;
    }

    /// Stored password hash of the fetched record, if present and non-null.
    pub fn stored_hash(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|user| user.get_str(&self.password_field))
    }
}

impl Default for UserFields {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME_FIELD, DEFAULT_PASSWORD_FIELD)
    }
}
