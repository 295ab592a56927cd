//! Register a directory user with a password so the first login is possible.
//!
//! The password is read from the first line of standard input to keep it out
//! of the process arguments:
//!
//! ```text
//! printf '%s\n' "$PASSWORD" | create-user --name "Ana Souza" --email ana@example.com
//! ```
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, BufRead};
use std::sync::Arc;

use clap::Parser;
use helpdesk::domain::ports::{CreateUserRequest, UserDirectoryCommand};
use helpdesk::domain::UserDirectoryService;
use helpdesk::outbound::persistence::{
    DbPool, DieselUserRepository, PoolConfig, run_pending_migrations,
};
use helpdesk::settings::HelpdeskSettings;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use zeroize::Zeroizing;

/// `create-user` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "create-user",
    about = "Create a helpdesk directory user; the password is read from stdin",
    version
)]
struct CliArgs {
    /// Display name.
    #[arg(long, value_name = "name")]
    name: String,
    /// Email address; its domain must be in HELPDESK_ALLOWED_DOMAINS.
    #[arg(long, value_name = "email")]
    email: String,
    /// Optional photo URL.
    #[arg(long = "photo-url", value_name = "url")]
    photo_url: Option<String>,
    /// Database connection URL. Falls back to `HELPDESK_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = HelpdeskSettings::load_from_iter([OsString::from("create-user")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    let database_url = resolve_database_url(args.database_url, settings.database_url())?;
    let password = read_password(io::stdin().lock())?;

    run_pending_migrations(&database_url)
        .await
        .map_err(|error| io::Error::other(format!("apply migrations: {error}")))?;
    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(1))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let directory = UserDirectoryService::new(
        Arc::new(DieselUserRepository::new(pool)),
        settings.domain_policy(),
        Arc::new(DefaultClock),
    );
    let user = directory
        .create(CreateUserRequest {
            name: args.name,
            email: args.email,
            password,
            photo_url: args.photo_url,
        })
        .await
        .map_err(|error| io::Error::other(format!("create user failed: {error}")))?;

    println!("id={}", user.id);
    println!("email={}", user.email);
    Ok(())
}

fn read_password(mut input: impl BufRead) -> io::Result<Zeroizing<String>> {
    let mut line = Zeroizing::new(String::new());
    input.read_line(&mut line)?;
    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "password must be supplied on stdin",
        ));
    }
    Ok(Zeroizing::new(trimmed.to_owned()))
}

fn resolve_database_url(explicit: Option<String>, configured: Option<&str>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }
    configured.map(str::to_owned).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url or HELPDESK_DATABASE_URL",
        )
    })
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI input helpers.

    use rstest::rstest;

    use super::{read_password, resolve_database_url};

    #[rstest]
    #[case("s3cret-pass\n", "s3cret-pass")]
    #[case("s3cret-pass\r\n", "s3cret-pass")]
    #[case(" padded \n", " padded ")]
    fn password_line_terminator_is_stripped(#[case] input: &str, #[case] expected: &str) {
        let password = read_password(input.as_bytes()).expect("password");
        assert_eq!(password.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("\n")]
    fn empty_password_is_rejected(#[case] input: &str) {
        let error = read_password(input.as_bytes()).expect_err("empty should fail");
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn explicit_database_url_wins() {
        let url = resolve_database_url(
            Some("postgres://cli/helpdesk".to_owned()),
            Some("postgres://env/helpdesk"),
        )
        .expect("url");
        assert_eq!(url, "postgres://cli/helpdesk");
    }

    #[rstest]
    #[case(Some("   ".to_owned()), Some("postgres://env/helpdesk"))]
    #[case(None, None)]
    fn unusable_database_url_is_rejected(
        #[case] explicit: Option<String>,
        #[case] configured: Option<&str>,
    ) {
        let error = resolve_database_url(explicit, configured).expect_err("should fail");
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
    }
}
