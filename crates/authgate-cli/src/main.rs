//! authgate command-line check
//!
//! Verifies one username/password pair against a configured backend and
//! reports the result through the exit code: 0 for VALID, 1 for NOT_VALID,
//! 2 when the backend could not be configured.

use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use authgate::{AuthResult, Authenticator, BackendConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// authgate credential check
#[derive(Parser, Debug)]
#[command(name = "authgate")]
#[command(version, about = "Check a username/password against an authgate backend")]
pub struct Args {
    /// Backend configuration file (JSON)
    #[arg(short, long, env = "AUTHGATE_CONFIG")]
    pub config: PathBuf,

    /// Username (or bind DN for LDAP)
    #[arg(short, long)]
    pub username: String,

    /// Password; read from the first line of stdin when omitted
    #[arg(short, long)]
    pub password: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

fn main() -> ExitCode {
    // Initialize tracing
    let filter = match "authgate=info".parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(AuthResult::Valid) => ExitCode::SUCCESS,
        Ok(AuthResult::NotValid) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<AuthResult, Box<dyn std::error::Error>> {
    let config = BackendConfig::from_file(&args.config)?;
    tracing::debug!(
        config = %args.config.display(),
        backend = config.name(),
        "loaded backend configuration"
    );
    let mut auth = config.build()?;

    let password = match &args.password {
        Some(password) => Some(password.clone()),
        None => read_password()?,
    };

    let result = auth.authenticate(&args.username, password.as_deref())?;

    if args.json {
        let report = serde_json::json!({
            "backend": config.name(),
            "username": args.username,
            "result": result,
            "code": result.code(),
            "outcome": auth.outcome().to_string(),
        });
        println!("{}", report);
    } else {
        println!("{} ({})", result, auth.outcome());
    }

    Ok(result)
}

/// First line of stdin without its line ending; `None` on empty input.
fn read_password() -> std::io::Result<Option<String>> {
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
