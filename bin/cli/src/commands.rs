//! CLI command definitions

use clap::{Parser, Subcommand};
use emi_portal_api::HttpMethod;
use serde_json::Value as JsonValue;

#[derive(Parser)]
#[command(name = "emi-portal")]
#[command(about = "Session and API access for the EMI loan portal")]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Create an account and store the session
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        mobile: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Check whether the current session may enter a portal path
    ///
    /// Example usage:
    ///   emi-portal check /admin/dashboard
    Check {
        /// Portal path, e.g. /user/loans
        path: String,
    },

    /// Send an authenticated request to the backend
    ///
    /// Example usage:
    ///   emi-portal request GET /loans/my
    ///   emi-portal request POST /emi/pay --body '{"emiId": 4}'
    Request {
        /// HTTP method
        method: HttpMethod,
        /// Path relative to the API base URL
        path: String,
        /// JSON request body
        #[arg(long, value_parser = parse_json)]
        body: Option<JsonValue>,
    },
}

fn parse_json(raw: &str) -> Result<JsonValue, serde_json::Error> {
    serde_json::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_parses_method_and_body() {
        let cli = Cli::try_parse_from([
            "emi-portal",
            "request",
            "post",
            "/emi/pay",
            "--body",
            r#"{"emiId": 4}"#,
        ])
        .expect("parse");

        match cli.command {
            Commands::Request { method, path, body } => {
                assert_eq!(method, HttpMethod::Post);
                assert_eq!(path, "/emi/pay");
                assert_eq!(body, Some(serde_json::json!({"emiId": 4})));
            }
            _ => panic!("expected request"),
        }
    }

    #[test]
    fn unknown_method_is_rejected() {
        assert!(Cli::try_parse_from(["emi-portal", "request", "FETCH", "/x"]).is_err());
    }

    #[test]
    fn invalid_body_is_rejected() {
        assert!(
            Cli::try_parse_from(["emi-portal", "request", "POST", "/x", "--body", "{nope"])
                .is_err()
        );
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::try_parse_from(["emi-portal", "whoami", "--json"]).expect("parse");
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Whoami));
    }
}
