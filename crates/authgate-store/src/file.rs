//! Delimited credential file backend.
//!
//! Each line is `username:hash` or, for realm-scoped files,
//! `username:realm:hash`. Blank lines and lines starting with `#` are
//! skipped. The file is re-read on every attempt.

use std::fs;
use std::path::{Path, PathBuf};

use authgate_core::{AuthOutcome, AuthResult, AuthState, Authenticator, Error, Result, Verifier};

/// Default field delimiter.
pub const DEFAULT_DELIMITER: &str = ":";

/// Authenticates against a delimited credential file.
#[derive(Debug, Clone)]
pub struct FileAuthenticator {
    state: AuthState,
    path: PathBuf,
    delimiter: String,
    realm: Option<String>,
    verifier: Verifier,
}

impl FileAuthenticator {
    /// Create an authenticator for an existing file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = checked_path(path.as_ref())?;
        Ok(Self {
            state: AuthState::new(),
            path,
            delimiter: DEFAULT_DELIMITER.to_string(),
            realm: None,
            verifier: Verifier::default(),
        })
    }

    /// Only accept `username:realm:hash` lines for `realm`.
    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Use a specific verifier instead of hash sniffing.
    pub fn with_verifier(mut self, verifier: impl Into<Verifier>) -> Self {
        self.verifier = verifier.into();
        self
    }

    /// Credential file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point at another file. The file must exist.
    pub fn set_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.path = checked_path(path.as_ref())?;
        Ok(())
    }

    /// Configured realm.
    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// Set or clear the realm.
    pub fn set_realm(&mut self, realm: Option<&str>) {
        self.realm = realm.map(str::to_string);
    }

    /// Field delimiter.
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Stored hash of the first matching line.
    pub fn find_hash(&self, username: &str) -> Result<Option<String>> {
        let contents = fs::read_to_string(&self.path)?;

        for line in contents.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split(self.delimiter.as_str()).collect();
            let hash = match (self.realm.as_deref(), fields.as_slice()) {
                (None, [user, hash]) if *user == username => hash,
                (Some(realm), [user, line_realm, hash])
                    if *user == username && *line_realm == realm =>
                {
                    hash
                }
                _ => continue,
            };

            return Ok(Some(hash.to_string()));
        }

        Ok(None)
    }
}

fn checked_path(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(Error::Config(format!(
            "credential file does not exist: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

impl Authenticator for FileAuthenticator {
    fn authenticate(&mut self, username: &str, password: Option<&str>) -> Result<AuthResult> {
        self.state.begin(username, password);

        let Some(password) = password else {
            tracing::debug!(username = %username, "no password supplied");
            return Ok(self.state.finish(AuthOutcome::Rejected));
        };

        let valid = match self.find_hash(username)? {
            Some(hash) => self.verifier.check(password, &hash)?,
            None => {
                tracing::debug!(
                    path = %self.path.display(),
                    username = %username,
                    realm = ?self.realm,
                    "no matching credential line"
                );
                false
            }
        };

        tracing::info!(username = %username, valid, "file authentication resolved");
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
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn credential_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = FileAuthenticator::new("/nonexistent/authgate/users").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_plaintext_lines() {
        let file = credential_file("# users\nadmin:12admin34\n\nguest:guest  \n");
        let mut auth = FileAuthenticator::new(file.path()).unwrap();

        assert_eq!(auth.authenticate("admin", Some("12admin34")).unwrap(), AuthResult::Valid);
        assert_eq!(auth.authenticate("guest", Some("guest")).unwrap(), AuthResult::Valid);
        assert_eq!(auth.authenticate("admin", Some("nope")).unwrap(), AuthResult::NotValid);
        assert_eq!(auth.authenticate("admin", None).unwrap(), AuthResult::NotValid);
    }

    #[test]
    fn test_first_match_wins() {
        let file = credential_file("admin:first\nadmin:second\n");
        let mut auth = FileAuthenticator::new(file.path()).unwrap();

        assert!(auth.authenticate("admin", Some("first")).unwrap().is_valid());
        assert!(!auth.authenticate("admin", Some("second")).unwrap().is_valid());
    }

    #[test]
    fn test_realm_lines() {
        let file = credential_file("admin:other:wrong\nadmin:office:12admin34\nadmin:plain\n");

        let mut auth = FileAuthenticator::new(file.path())
            .unwrap()
            .with_realm("office");
        assert!(auth.authenticate("admin", Some("12admin34")).unwrap().is_valid());
        assert!(!auth.authenticate("admin", Some("plain")).unwrap().is_valid());

        auth.set_realm(None);
        assert!(auth.authenticate("admin", Some("plain")).unwrap().is_valid());
    }

    #[test]
    fn test_custom_delimiter() {
        let file = credential_file("admin|12admin34\n");
        let mut auth = FileAuthenticator::new(file.path())
            .unwrap()
            .with_delimiter("|");
        assert!(auth.authenticate("admin", Some("12admin34")).unwrap().is_valid());
    }

    #[test]
    fn test_file_is_reread() {
        let mut file = credential_file("admin:old\n");
        let mut auth = FileAuthenticator::new(file.path()).unwrap();
        assert!(auth.authenticate("admin", Some("old")).unwrap().is_valid());

        file.as_file_mut().set_len(0).unwrap();
        std::fs::write(file.path(), "admin:new\n").unwrap();
        assert!(auth.authenticate("admin", Some("new")).unwrap().is_valid());
    }

    #[test]
    fn test_set_path_checks_existence() {
        let file = credential_file("admin:pw\n");
        let mut auth = FileAuthenticator::new(file.path()).unwrap();
        assert!(auth.set_path("/nonexistent/authgate/other").unwrap_err().is_config());
        assert_eq!(auth.path(), file.path());
    }
}
