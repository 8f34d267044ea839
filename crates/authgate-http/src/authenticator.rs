//! The HTTP challenge/response engine.
//!
//! An attempt runs through these phases:
//!
//! ```text
//! Uninitialized -> Probing -> Challenged -> Authenticating -> Resolved
//!        \________________________________/
//!          (skipped when no probe is needed)
//! ```
//!
//! A probe is an unauthenticated request whose `WWW-Authenticate` header is
//! parsed into a [`Challenge`]. It runs when no auth type is known yet, or
//! when the type is Digest and the stored challenge lacks `realm`/`nonce`.
//! The final request carries credentials for the auth type; the attempt is
//! VALID iff its status is 200.

use authgate_core::{AuthOutcome, AuthResult, AuthState, Authenticator};

use crate::auth_header::{self, BodyEncoding};
use crate::challenge::{Challenge, HttpAuthType};
use crate::config::{validate_uri, HttpConfig};
use crate::error::{Error, Result};
use crate::headers::Headers;
use crate::request::{HttpRequest, Method};
use crate::response::HttpResponse;
use crate::transport::HttpTransport;

/// Engine phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HttpPhase {
    /// No auth type known.
    #[default]
    Uninitialized,
    /// Unauthenticated probe in flight.
    Probing,
    /// Challenge parameters parsed.
    Challenged,
    /// Final request in flight.
    Authenticating,
    /// Final status known (or transport failed).
    Resolved,
}

/// Authenticates against a remote HTTP endpoint.
pub struct HttpAuthenticator {
    state: AuthState,
    config: HttpConfig,
    transport: Box<dyn HttpTransport>,
    auth_type: Option<HttpAuthType>,
    scheme: Option<Challenge>,
    response: Option<HttpResponse>,
    phase: HttpPhase,
}

impl HttpAuthenticator {
    /// Create an authenticator for `uri` with default settings.
    pub fn new(uri: &str) -> authgate_core::Result<Self> {
        Self::from_config(HttpConfig::new(uri))
    }

    /// Create an authenticator using the configured built-in transport.
    pub fn from_config(config: HttpConfig) -> authgate_core::Result<Self> {
        config.validate()?;
        let transport = config.build_transport()?;
        Self::with_transport(config, transport)
    }

    /// Create an authenticator with a caller-supplied transport.
    pub fn with_transport(
        config: HttpConfig,
        transport: impl HttpTransport + 'static,
    ) -> authgate_core::Result<Self> {
        config.validate()?;

        let phase = if config.auth_type.is_some() {
            HttpPhase::Challenged
        } else {
            HttpPhase::Uninitialized
        };

        Ok(Self {
            state: AuthState::new(),
            auth_type: config.auth_type,
            config,
            transport: Box::new(transport),
            scheme: None,
            response: None,
            phase,
        })
    }

    /// Endpoint URI.
    pub fn uri(&self) -> &str {
        &self.config.uri
    }

    /// Change the endpoint. The stored challenge is discarded.
    pub fn set_uri(&mut self, uri: &str) -> authgate_core::Result<()> {
        validate_uri(uri)?;
        self.config.uri = uri.to_string();
        self.scheme = None;
        Ok(())
    }

    /// Request method.
    pub fn method(&self) -> Method {
        self.config.method
    }

    /// Set the request method.
    pub fn set_method(&mut self, method: Method) {
        self.config.method = method;
    }

    /// URI used in the Digest hash.
    pub fn relative_uri(&self) -> String {
        self.config.relative_uri()
    }

    /// Override the Digest URI.
    pub fn set_relative_uri(&mut self, relative_uri: Option<&str>) {
        self.config.relative_uri = relative_uri.map(str::to_string);
    }

    /// Current auth type, configured or discovered.
    pub fn auth_type(&self) -> Option<HttpAuthType> {
        self.auth_type
    }

    /// Fix the auth type. `None` re-enables discovery.
    pub fn set_auth_type(&mut self, auth_type: Option<HttpAuthType>) {
        self.config.auth_type = auth_type;
        self.auth_type = auth_type;
    }

    /// Set the bearer token.
    pub fn set_bearer_token(&mut self, token: Option<&str>) {
        self.config.bearer_token = token.map(str::to_string);
    }

    /// Set the refresh token and its body field name.
    pub fn set_refresh_token(&mut self, token: Option<&str>, name: Option<&str>) {
        self.config.refresh_token = token.map(str::to_string);
        if let Some(name) = name {
            self.config.refresh_token_name = name.to_string();
        }
    }

    /// Parsed challenge.
    pub fn scheme(&self) -> Option<&Challenge> {
        self.scheme.as_ref()
    }

    /// Last response received.
    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// Engine phase.
    pub fn phase(&self) -> HttpPhase {
        self.phase
    }

    /// Configuration in effect.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Parse a `WWW-Authenticate` value into the stored challenge.
    ///
    /// When no auth type is fixed, the challenge's scheme becomes the type.
    /// Unrecognised schemes leave the type unset.
    pub fn parse_scheme(&mut self, value: &str) {
        let challenge = Challenge::parse(value);

        if self.config.auth_type.is_none() {
            self.auth_type = challenge.http_auth_type();
            if self.auth_type.is_none() {
                tracing::warn!(
                    scheme = %challenge.auth_type,
                    "unrecognised authentication scheme"
                );
            }
        }

        tracing::debug!(
            scheme = %challenge.auth_type,
            realm = ?challenge.realm(),
            params = challenge.params.len(),
            "parsed authentication challenge"
        );

        self.scheme = Some(challenge);
        self.phase = HttpPhase::Challenged;
    }

    /// Send an unauthenticated request and parse its challenge, if any.
    pub fn probe(&mut self) -> Result<()> {
        self.phase = HttpPhase::Probing;
        tracing::debug!(uri = %self.config.uri, transport = self.transport.name(), "probing endpoint");

        let request = HttpRequest::new(self.config.method, &self.config.uri);
        let response = self.transport.send(&request)?;

        let challenge = response.www_authenticate().map(str::to_string);
        self.response = Some(response);

        match challenge {
            Some(value) => self.parse_scheme(&value),
            None => {
                tracing::debug!(uri = %self.config.uri, "probe returned no challenge");
                self.phase = HttpPhase::Uninitialized;
            }
        }

        Ok(())
    }

    /// Whether the next attempt has to probe first.
    pub fn needs_probe(&self) -> bool {
        match self.auth_type {
            None => true,
            Some(auth_type) if auth_type.needs_challenge() => !self
                .scheme
                .as_ref()
                .map(Challenge::has_digest_params)
                .unwrap_or(false),
            Some(_) => false,
        }
    }

    /// Build the final request for the current auth type.
    pub fn build_request(
        &self,
        username: &str,
        password: Option<&str>,
        extra_headers: &Headers,
    ) -> Result<HttpRequest> {
        let method = self.config.method;
        let mut request = HttpRequest::new(method, &self.config.uri);
        for (name, value) in extra_headers.iter() {
            request.headers.insert(name, value);
        }

        let password = password.unwrap_or("");

        match self.auth_type {
            None => {}
            Some(HttpAuthType::Basic) => {
                request
                    .headers
                    .insert("Authorization", auth_header::basic(username, password));
            }
            Some(HttpAuthType::Digest) => {
                let scheme = self.scheme.as_ref();
                let header = auth_header::digest(
                    username,
                    password,
                    scheme.and_then(Challenge::realm),
                    scheme.and_then(Challenge::nonce),
                    method,
                    &self.config.relative_uri(),
                )?;
                request.headers.insert("Authorization", header);
            }
            Some(HttpAuthType::Bearer) => {
                request
                    .headers
                    .insert("Authorization", auth_header::bearer(self.bearer_token()?));
            }
            Some(auth_type @ (HttpAuthType::UrlData | HttpAuthType::FormData)) => {
                if method == Method::Get {
                    return Err(Error::config(format!(
                        "{} credentials cannot be sent with GET",
                        auth_type
                    )));
                }
                let encoding = if auth_type == HttpAuthType::UrlData {
                    BodyEncoding::UrlEncoded
                } else {
                    BodyEncoding::multipart()
                };
                request
                    .headers
                    .insert("Content-Type", encoding.content_type());
                request.body =
                    Some(encoding.encode(&[("username", username), ("password", password)]));
            }
            Some(HttpAuthType::Refresh) => {
                request
                    .headers
                    .insert("Authorization", auth_header::bearer(self.bearer_token()?));

                let refresh_token = self
                    .config
                    .refresh_token
                    .as_deref()
                    .ok_or_else(|| Error::config("refresh token is not set"))?;
                let encoding = BodyEncoding::from_content_type(extra_headers.get("Content-Type"));
                request
                    .headers
                    .insert("Content-Type", encoding.content_type());
                request.body = Some(encoding.encode(&[(
                    self.config.refresh_token_name.as_str(),
                    refresh_token,
                )]));
            }
        }

        Ok(request)
    }

    fn bearer_token(&self) -> Result<&str> {
        self.config
            .bearer_token
            .as_deref()
            .ok_or_else(|| Error::config("bearer token is not set"))
    }

    /// Authenticate, merging `headers` into the final request.
    pub fn authenticate_with_headers(
        &mut self,
        username: &str,
        password: Option<&str>,
        headers: &Headers,
    ) -> authgate_core::Result<AuthResult> {
        self.state.begin(username, password);

        if self.needs_probe() {
            match self.probe() {
                Ok(()) => {}
                Err(e) if e.is_transport() => return Ok(self.unreachable(e)),
                Err(e) => return Err(e.into()),
            }
        }

        let request = self.build_request(username, password, headers)?;

        self.phase = HttpPhase::Authenticating;
        let response = match self.transport.send(&request) {
            Ok(response) => response,
            Err(e) if e.is_transport() => return Ok(self.unreachable(e)),
            Err(e) => return Err(e.into()),
        };

        let valid = response.is_ok();

        // A rejected attempt may carry a fresh nonce.
        if !valid {
            if let Some(value) = response.www_authenticate() {
                let challenge = Challenge::parse(value);
                if challenge.has_digest_params() {
                    self.scheme = Some(challenge);
                }
            }
        }

        tracing::info!(
            uri = %self.config.uri,
            username = %username,
            auth_type = ?self.auth_type,
            status = response.code,
            valid,
            "http authentication resolved"
        );

        self.response = Some(response);
        self.phase = HttpPhase::Resolved;
        Ok(self.state.finish(AuthOutcome::from_verdict(valid)))
    }

    fn unreachable(&mut self, err: Error) -> AuthResult {
        tracing::warn!(
            uri = %self.config.uri,
            error = %err,
            "http authentication endpoint unreachable"
        );
        self.response = None;
        self.phase = HttpPhase::Resolved;
        self.state.finish(AuthOutcome::Unreachable(err.to_string()))
    }
}

impl Authenticator for HttpAuthenticator {
    fn authenticate(
        &mut self,
        username: &str,
        password: Option<&str>,
    ) -> authgate_core::Result<AuthResult> {
        self.authenticate_with_headers(username, password, &Headers::new())
    }

    fn state(&self) -> &AuthState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AuthState {
        &mut self.state
    }
}
