use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ldapinspect::args::{Credentials, Opts};
use ldapinspect::defaults::{default_filter, default_server_address, default_username};
use ldapinspect::{ConnectionConfig, DirectorySession, SearchOutcome, SearchRequest, SessionError};


#[derive(Debug, Error)]
enum AppError {
    #[error("failed to read credentials file {path:?}: {source}")]
    ReadCredentials { path: PathBuf, source: io::Error },

    #[error("failed to parse credentials file {path:?}: {source}")]
    ParseCredentials { path: PathBuf, source: toml::de::Error },

    #[error("failed to read password: {0}")]
    PasswordPrompt(io::Error),

    #[error("no entry with path {0:?} in the results")]
    NoSuchEntry(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}


fn connection_config(opts: &Opts) -> Result<ConnectionConfig, AppError> {
    let (username, password, file_server) = if let Some(credentials_file) = &opts.credentials_file {
        let credentials_string = std::fs::read_to_string(credentials_file)
            .map_err(|source| AppError::ReadCredentials { path: credentials_file.clone(), source })?;
        let credentials: Credentials = toml::from_str(&credentials_string)
            .map_err(|source| AppError::ParseCredentials { path: credentials_file.clone(), source })?;
        (credentials.username, credentials.password, credentials.server_address)
    } else {
        let username = opts.username.clone()
            .unwrap_or_else(default_username);
        let password = rpassword::prompt_password(format!("LDAP password for {}: ", username))
            .map_err(AppError::PasswordPrompt)?;
        (username, password, None)
    };

    let server_address = opts.server.clone()
        .or(file_server)
        .unwrap_or_else(default_server_address);
    Ok(ConnectionConfig::new(server_address, username, password))
}


async fn show_results(session: &mut DirectorySession, opts: &Opts) -> Result<(), AppError> {
    let filter = opts.filter.clone()
        .unwrap_or_else(default_filter);
    let summary = match session.search(&SearchRequest::new(filter.as_str())).await? {
        SearchOutcome::Found(summary) => summary,
        SearchOutcome::Empty => {
            eprintln!("no entries match ({})", filter);
            return Ok(());
        },
    };

    let Some(path) = &opts.entry else {
        for path in &summary.entries {
            println!("{}", path);
        }
        eprintln!("{} entries", summary.count);
        return Ok(());
    };

    let entry = session.select_entry(path)
        .ok_or_else(|| AppError::NoSuchEntry(path.clone()))?;
    if let Some(attribute) = &opts.attribute {
        if let Some(value) = entry.attribute_value(attribute) {
            println!("{}", value);
        }
    } else {
        for name in entry.list_attribute_names() {
            let value = entry.attribute_value(name)
                .unwrap_or_default();
            println!("{}: {}", name, value);
        }
    }
    Ok(())
}


async fn run() -> Result<(), AppError> {
    let opts = Opts::parse();

    let config = connection_config(&opts)?;
    let mut session = DirectorySession::open(config)?;

    let result = show_results(&mut session, &opts).await;
    if let Err(e) = session.close().await {
        warn!(error = %e, "failed to unbind from directory server");
    }
    result
}


#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        },
    }
}
