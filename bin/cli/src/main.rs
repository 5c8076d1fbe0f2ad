//! `emi-portal` command-line client.
//!
//! Restores the persisted session, runs one command through the same
//! session, access-control, and request-classification pipeline the portal
//! uses, and exits.

mod commands;
mod config;
mod error;
mod navigator;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use emi_portal_api::{
    ApiClient, AuthApi, ClassifiedError, HttpTransport, LoginRequest, RegisterRequest,
    RequestErrorClassifier,
};
use emi_portal_session::{
    AccessControl, FileStore, KeyValueStore, Navigator, RedirectConfig, SessionStore, UserProfile,
};
use rootcause::prelude::Report;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{Cli, Commands};
use crate::config::ClientConfig;
use crate::error::CliError;
use crate::navigator::ConsoleNavigator;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(report) => {
            eprintln!("error: {report}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, Report<CliError>> {
    let config = ClientConfig::from_env().map_err(|e| CliError::Config {
        details: e.to_string(),
    })?;
    tracing::debug!(api_base_url = %config.api_base_url, "loaded configuration");

    let portal = Portal::connect(&config)?;
    let json = cli.json;

    match cli.command {
        Commands::Login { email, password } => {
            let user = portal
                .auth
                .login(&LoginRequest { email, password })
                .await
                .map_err(|e| CliError::Command {
                    details: e.to_string(),
                })?;
            portal.land(&user, json)
        }
        Commands::Register {
            full_name,
            email,
            mobile,
            password,
        } => {
            let request = RegisterRequest {
                full_name,
                email,
                mobile,
                password,
            };
            let user = portal
                .auth
                .register(&request)
                .await
                .map_err(|e| CliError::Command {
                    details: e.to_string(),
                })?;
            portal.land(&user, json)
        }
        Commands::Logout => {
            if portal.auth.logout() {
                println!("Logged out.");
            } else {
                println!("No active session.");
            }
            portal.navigator.redirect_to(portal.redirects.login_path());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Whoami => match portal.session.current().user() {
            Some(user) => {
                print_user(user, json)?;
                Ok(ExitCode::SUCCESS)
            }
            None => {
                println!("Not logged in.");
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Check { path } => {
            if portal.access.admit(&path, portal.navigator.as_ref()) {
                println!("allowed: {path}");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("denied: {path}");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Request { method, path, body } => {
            match portal.client.request(method, &path, body).await {
                Ok(value) => {
                    println!("{}", to_pretty(&value)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    print_failure(&error, json)?;
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

/// The assembled client pipeline.
struct Portal {
    session: Arc<SessionStore>,
    access: AccessControl,
    client: ApiClient,
    auth: AuthApi,
    navigator: Arc<dyn Navigator>,
    redirects: RedirectConfig,
}

impl Portal {
    fn connect(config: &ClientConfig) -> Result<Self, Report<CliError>> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&config.storage_dir));
        let session = Arc::new(SessionStore::restored(storage));
        let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator);

        let transport = HttpTransport::new(&config.api_base_url, config.request_timeout())
            .map_err(|e| CliError::Startup {
                details: e.to_string(),
            })?;
        let classifier = Arc::new(RequestErrorClassifier::new(
            Arc::clone(&session),
            Arc::clone(&navigator),
            config.navigation.clone(),
            &config.api_base_url,
        ));
        let client = ApiClient::new(Arc::new(transport), Arc::clone(&session), classifier);

        Ok(Self {
            access: AccessControl::new(Arc::clone(&session), config.navigation.clone()),
            auth: AuthApi::new(client.clone()),
            client,
            session,
            navigator,
            redirects: config.navigation.clone(),
        })
    }

    fn land(&self, user: &UserProfile, json: bool) -> Result<ExitCode, Report<CliError>> {
        print_user(user, json)?;
        self.navigator
            .redirect_to(self.redirects.landing_for(user.role()));
        Ok(ExitCode::SUCCESS)
    }
}

fn print_user(user: &UserProfile, json: bool) -> Result<(), Report<CliError>> {
    if json {
        println!("{}", to_pretty(user)?);
    } else {
        println!(
            "{} <{}> ({}, id {})",
            user.full_name(),
            user.email(),
            user.role(),
            user.id()
        );
    }
    Ok(())
}

fn print_failure(error: &ClassifiedError, json: bool) -> Result<(), Report<CliError>> {
    let text = failure_text(error, json)?;
    if json {
        println!("{text}");
    } else {
        eprintln!("{text}");
    }
    Ok(())
}

/// The user message already carries the server-fault summary, so the
/// diagnostic is not printed again.
fn failure_text(error: &ClassifiedError, json: bool) -> Result<String, Report<CliError>> {
    if json {
        to_pretty(error)
    } else {
        Ok(error.user_message().to_string())
    }
}

fn to_pretty<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, Report<CliError>> {
    Ok(
        serde_json::to_string_pretty(value).map_err(|e| CliError::Command {
            details: e.to_string(),
        })?,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use emi_portal_api::{ErrorKind, FailedExchange, HttpMethod};
    use emi_portal_session::MemoryStore;

    fn server_fault() -> ClassifiedError {
        let session = Arc::new(SessionStore::new(Arc::new(MemoryStore::new())));
        let classifier = RequestErrorClassifier::new(
            session,
            Arc::new(ConsoleNavigator),
            RedirectConfig::default(),
            "http://backend",
        );
        let exchange = FailedExchange::new(
            HttpMethod::Get,
            "http://backend/loans/my",
            500,
            "Internal Server Error",
        )
        .with_payload(Some(serde_json::json!({"message": "DB timeout", "details": "retry"})));
        classifier.classify(&exchange)
    }

    #[test]
    fn server_fault_summary_is_printed_once() {
        let error = server_fault();
        assert_eq!(error.kind(), ErrorKind::ServerFault);

        let text = failure_text(&error, false).expect("text");

        assert_eq!(text.matches("Internal server error at").count(), 1);
        assert!(text.contains("DB timeout"));
    }

    #[test]
    fn json_failure_omits_diagnostic() {
        let text = failure_text(&server_fault(), true).expect("json");
        let value: serde_json::Value = serde_json::from_str(&text).expect("valid json");

        assert_eq!(value.get("kind"), Some(&serde_json::json!("ServerFault")));
        assert!(value.get("diagnostic").is_none());
    }
}
