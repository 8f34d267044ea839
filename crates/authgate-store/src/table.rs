//! Table-backed authentication over a user repository.

use authgate_core::{
    AuthOutcome, AuthResult, AuthState, Authenticator, Result, UserFields, UserRecord, Verifier,
};

/// Single-row lookup by field equality.
pub trait UserRepository: Send {
    /// First record whose `field` equals `value`.
    fn find_by_field(&self, field: &str, value: &str) -> Result<Option<UserRecord>>;
}

impl<R: UserRepository + ?Sized> UserRepository for Box<R> {
    fn find_by_field(&self, field: &str, value: &str) -> Result<Option<UserRecord>> {
        (**self).find_by_field(field, value)
    }
}

/// In-memory user list.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    users: Vec<UserRecord>,
}

impl MemoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user (builder style).
    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.users.push(user);
        self
    }

    /// Add a user.
    pub fn insert(&mut self, user: UserRecord) {
        self.users.push(user);
    }

    /// Number of users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if there are no users.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserRepository for MemoryRepository {
    fn find_by_field(&self, field: &str, value: &str) -> Result<Option<UserRecord>> {
        Ok(self
            .users
            .iter()
            .find(|user| user.field_equals(field, value))
            .cloned())
    }
}

/// Authenticates against one row of a user table.
///
/// The fetched row stays available through [`user`](Self::user) after the
/// attempt, whatever its result.
pub struct TableAuthenticator<R: UserRepository> {
    state: AuthState,
    fields: UserFields,
    repository: R,
    verifier: Verifier,
}

impl<R: UserRepository> TableAuthenticator<R> {
    /// Create an authenticator with the default `username`/`password` fields.
    pub fn new(repository: R) -> Self {
        Self {
            state: AuthState::new(),
            fields: UserFields::default(),
            repository,
            verifier: Verifier::default(),
        }
    }

    /// Use different field names.
    pub fn with_fields(
        mut self,
        username_field: impl Into<String>,
        password_field: impl Into<String>,
    ) -> Self {
        self.fields = UserFields::new(username_field, password_field);
        self
    }

    /// Use a specific verifier instead of hash sniffing.
    pub fn with_verifier(mut self, verifier: impl Into<Verifier>) -> Self {
        self.verifier = verifier.into();
        self
    }

    /// Field names and fetched record.
    pub fn fields(&self) -> &UserFields {
        &self.fields
    }

    /// Record fetched by the last attempt.
    pub fn user(&self) -> Option<&UserRecord> {
        self.fields.user()
    }

    /// Underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }
}

impl<R: UserRepository> Authenticator for TableAuthenticator<R> {
    fn authenticate(&mut self, username: &str, password: Option<&str>) -> Result<AuthResult> {
        self.state.begin(username, password);

        let user = self
            .repository
            .find_by_field(&self.fields.username_field, username)?;
        tracing::debug!(
            username = %username,
            field = %self.fields.username_field,
            found = user.is_some(),
            "user lookup"
        );
        self.fields.set_user(user);

        let valid = match (password, self.fields.stored_hash()) {
            (Some(password), Some(hash)) => self.verifier.check(password, hash)?,
            _ => false,
        };

        tracing::info!(username = %username, valid, "table authentication resolved");
        Ok(self.state.finish(AuthOutcome::from_verdict(valid)))
    }

    fn state(&self) -> &AuthState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AuthState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::{EncryptionScheme, LegacyVerifier};
    use serde_json::Value;

    fn repository() -> MemoryRepository {
        MemoryRepository::new()
            .with_user(
                UserRecord::new()
                    .with_field("username", "admin")
                    .with_field("password", "12admin34")
                    .with_field("email", "admin@localhost"),
            )
            .with_user(
                UserRecord::new()
                    .with_field("username", "locked")
                    .with_field("password", Value::Null),
            )
    }

    #[test]
    fn test_valid_and_user_record_kept() {
        let mut auth = TableAuthenticator::new(repository());

        assert_eq!(auth.authenticate("admin", Some("12admin34")).unwrap(), AuthResult::Valid);
        assert_eq!(auth.user().unwrap().get_str("email"), Some("admin@localhost"));

        assert_eq!(auth.authenticate("admin", Some("bad")).unwrap(), AuthResult::NotValid);
        assert!(auth.user().is_some());
    }

    #[test]
    fn test_missing_user_and_null_password() {
        let mut auth = TableAuthenticator::new(repository());

        assert!(!auth.authenticate("ghost", Some("x")).unwrap().is_valid());
        assert!(auth.user().is_none());

        assert!(!auth.authenticate("locked", Some("")).unwrap().is_valid());
        assert!(auth.user().is_some());
    }

    #[test]
    fn test_custom_fields() {
        let repo = MemoryRepository::new().with_user(
            UserRecord::new()
                .with_field("login", "admin")
                .with_field("pass_hash", "12admin34"),
        );
        let mut auth = TableAuthenticator::new(repo).with_fields("login", "pass_hash");
        assert!(auth.authenticate("admin", Some("12admin34")).unwrap().is_valid());
    }

    #[test]
    fn test_legacy_md5_verifier() {
        let repo = MemoryRepository::new().with_user(
            UserRecord::new()
                .with_field("username", "admin")
                .with_field("password", "5f4dcc3b5aa765d61d8327deb882cf99"),
        );
        let mut auth = TableAuthenticator::new(repo)
            .with_verifier(LegacyVerifier::new(EncryptionScheme::Md5));

        assert!(auth.authenticate("admin", Some("password")).unwrap().is_valid());
        assert!(!auth.authenticate("admin", Some("Password")).unwrap().is_valid());
    }
}
