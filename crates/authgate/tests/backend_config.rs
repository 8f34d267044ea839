//! Building authenticators from configuration files.

use std::io::Write;

use authgate::{AuthOutcome, AuthResult, Authenticator, BackendConfig};
use tempfile::{NamedTempFile, TempDir};

fn write_json(dir: &TempDir, name: &str, json: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn file_backend_from_config_file() {
    let mut users = NamedTempFile::new().unwrap();
    writeln!(users, "admin:office:{}", bcrypt::hash("12admin34", 4).unwrap()).unwrap();

    let dir = TempDir::new().unwrap();
    let config_path = write_json(
        &dir,
        "file.json",
        &format!(
            r#"{{"backend": "file", "path": {:?}, "realm": "office"}}"#,
            users.path().display().to_string()
        ),
    );

    let config = BackendConfig::from_file(&config_path).unwrap();
    let mut auth = config.build().unwrap();

    assert_eq!(auth.authenticate("admin", Some("12admin34")).unwrap(), AuthResult::Valid);
    assert_eq!(auth.authenticate("admin", Some("wrong")).unwrap(), AuthResult::NotValid);
    assert_eq!(auth.outcome(), &AuthOutcome::Rejected);
}

#[test]
fn missing_credential_file_fails_at_build() {
    let config =
        BackendConfig::from_json_str(r#"{"backend": "file", "path": "/nonexistent/users"}"#)
            .unwrap();
    assert!(config.build().err().unwrap().is_config());
}

#[test]
fn sqlite_backend_with_legacy_scheme() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("users.db");

    {
        let repo = authgate::SqliteRepository::open(&db_path, "members").unwrap();
        repo.connection()
            .execute_batch(
                "CREATE TABLE members (email TEXT, pass TEXT);
                 INSERT INTO members VALUES ('admin@localhost', '5f4dcc3b5aa765d61d8327deb882cf99');",
            )
            .unwrap();
    }

    let json = format!(
        r#"{{
            "backend": "sqlite",
            "path": {:?},
            "table": "members",
            "username_field": "email",
            "password_field": "pass",
            "legacy": {{"scheme": "md5"}}
        }}"#,
        db_path.display().to_string()
    );

    let mut auth = BackendConfig::from_json_str(&json).unwrap().build().unwrap();
    assert!(auth.authenticate("admin@localhost", Some("password")).unwrap().is_valid());
    assert!(!auth.authenticate("admin@localhost", Some("12admin34")).unwrap().is_valid());
}

#[test]
fn sled_backend_builds() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("users.sled");

    {
        let repo = authgate::SledRepository::open_tree(&db_path, "people").unwrap();
        repo.insert(
            "admin",
            &authgate::UserRecord::new()
                .with_field("username", "admin")
                .with_field("password", "12admin34"),
        )
        .unwrap();
        repo.flush().unwrap();
    }

    let json = format!(
        r#"{{"backend": "sled", "path": {:?}, "table": "people"}}"#,
        db_path.display().to_string()
    );
    let mut auth = BackendConfig::from_json_str(&json).unwrap().build().unwrap();
    assert!(auth.authenticate("admin", Some("12admin34")).unwrap().is_valid());
}

#[test]
fn ldap_backend_without_host_rejects() {
    let mut auth = BackendConfig::from_json_str(r#"{"backend": "ldap", "host": ""}"#)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(auth.authenticate("cn=admin", Some("secret")).unwrap(), AuthResult::NotValid);
}

#[test]
fn http_backend_unreachable_is_not_valid() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let json = format!(
        r#"{{"backend": "http", "uri": "http://127.0.0.1:{}/auth", "auth_type": "basic", "transport": "stream", "timeout_secs": 2}}"#,
        port
    );

    let mut auth = BackendConfig::from_json_str(&json).unwrap().build().unwrap();
    assert_eq!(auth.authenticate("admin", Some("pw")).unwrap(), AuthResult::NotValid);
    assert!(auth.outcome().is_unreachable());
}
