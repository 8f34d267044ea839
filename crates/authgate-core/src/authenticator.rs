//! The authenticator abstraction.

use crate::credentials::AuthState;
use crate::error::Result;
use crate::result::{AuthOutcome, AuthResult};

/// A credential source that can verify a username/password pair.
///
/// Each call to [`authenticate`](Authenticator::authenticate) recomputes the
/// result from scratch. Invalid credentials and unreachable backends return
/// `Ok(AuthResult::NotValid)`; `Err` is reserved for configuration problems.
///
/// Implementations own their connection handles and are not meant to be
/// shared between threads without external synchronisation.
pub trait Authenticator: Send {
    /// Verify `username`/`password` against the credential source.
    fn authenticate(&mut self, username: &str, password: Option<&str>) -> Result<AuthResult>;

    /// Shared credential state.
    fn state(&self) -> &AuthState;

    /// Mutable credential state.
    fn state_mut(&mut self) -> &mut AuthState;

    /// Username of the current or last attempt.
    fn username(&self) -> &str {
        self.state().username()
    }

    /// Password of the current or last attempt.
    fn password(&self) -> Option<&str> {
        self.state().password()
    }

    /// Replace the stored username. Does not change the result.
    fn set_username(&mut self, username: &str) {
        self.state_mut().set_username(username);
    }

    /// Replace the stored password. Does not change the result.
    fn set_password(&mut self, password: Option<&str>) {
        self.state_mut().set_password(password);
    }

    /// Result of the last attempt.
    fn result(&self) -> AuthResult {
        self.state().result()
    }

    /// Whether the last attempt succeeded.
    fn is_valid(&self) -> bool {
        self.result().is_valid()
    }

    /// Detailed outcome of the last attempt.
    fn outcome(&self) -> &AuthOutcome {
        self.state().outcome()
    }
}

impl<A: Authenticator + ?Sized> Authenticator for Box<A> {
    fn authenticate(&mut self, username: &str, password: Option<&str>) -> Result<AuthResult> {
        (**self).authenticate(username, password)
    }

    fn state(&self) -> &AuthState {
        (**self).state()
    }

    fn state_mut(&mut self) -> &mut AuthState {
        (**self).state_mut()
    }
}

/// Front object that drives an adapter with stored credentials.
///
/// # Example
///
/// ```ignore
/// use authgate_core::{Auth, AuthResult};
///
/// let mut auth = Auth::new(file_authenticator);
/// auth.set_username("admin").set_password(Some("12admin34"));
/// assert_eq!(auth.authenticate(None, None)?, AuthResult::Valid);
/// ```
pub struct Auth<A: Authenticator> {
    adapter: A,
}

impl<A: Authenticator> Auth<A> {
    /// Wrap an adapter.
    pub fn new(adapter: A) -> Self {
        Self { adapter }
    }

    /// The wrapped adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// The wrapped adapter, mutably.
    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Unwrap the adapter.
    pub fn into_adapter(self) -> A {
        self.adapter
    }

    /// Stored username.
    pub fn username(&self) -> &str {
        self.adapter.username()
    }

    /// Stored password.
    pub fn password(&self) -> Option<&str> {
        self.adapter.password()
    }

    /// Set the username for the next attempt.
    pub fn set_username(&mut self, username: &str) -> &mut Self {
        self.adapter.set_username(username);
        self
    }

    /// Set the password for the next attempt.
    pub fn set_password(&mut self, password: Option<&str>) -> &mut Self {
        self.adapter.set_password(password);
        self
    }

    /// Authenticate, overriding the stored credentials where given.
    pub fn authenticate(
        &mut self,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<AuthResult> {
        let username = username
            .map(str::to_string)
            .unwrap_or_else(|| self.adapter.username().to_string());
        let password = password
            .map(str::to_string)
            .or_else(|| self.adapter.password().map(str::to_string));

        self.adapter.authenticate(&username, password.as_deref())
    }

    /// Result of the last attempt.
    pub fn result(&self) -> AuthResult {
        self.adapter.result()
    }

    /// Whether the last attempt succeeded.
    pub fn is_valid(&self) -> bool {
        self.adapter.is_valid()
    }
}
