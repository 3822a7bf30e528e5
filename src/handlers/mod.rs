//! Command handlers behind the `ticketdesk` binary.
//!
//! Data commands print the same `{ success, data, message }` envelope the
//! backend speaks, so their output can be piped into other tools.

pub mod admin;
pub mod auth;
pub mod monitor;
pub mod storefront;
pub mod theme;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::ApiClient;
use crate::middlewares::{AuthGate, GateDecision};
use crate::models::AuthUser;
use crate::services::AuthService;
use serde::Serialize;
use serde_json::json;

/// Everything a command needs, built once at startup.
pub struct AppContext {
    pub config: Config,
    pub api: ApiClient,
    pub auth: AuthService,
    pub gate: AuthGate,
}

impl AppContext {
    /// Build the API client and pick up a saved session if one is still valid.
    pub async fn init(config: Config) -> AppResult<Self> {
        let api = ApiClient::new(&config.api)?;
        let auth = AuthService::new(api.clone(), config.auth.token_path.clone());
        if let Some(user) = auth.restore().await? {
            log::debug!("Restored session for {}", user.username);
        }

        Ok(Self {
            config,
            api,
            auth,
            gate: AuthGate::new(),
        })
    }

    /// Run the gate for `path` before touching the network.
    pub fn authorize(&self, path: &str) -> AppResult<Option<AuthUser>> {
        let user = self.auth.current_user();
        match self.gate.check(path, user.as_ref()) {
            GateDecision::Admit => Ok(user),
            GateDecision::RedirectToLogin => Err(AppError::AuthError(
                "Please log in first: ticketdesk login".to_string(),
            )),
            GateDecision::RedirectHome => Err(AppError::Forbidden),
        }
    }
}

pub fn respond<T: Serialize + ?Sized>(data: &T) -> AppResult<()> {
    print_json(&json!({
        "success": true,
        "data": data
    }))
}

pub fn respond_with_message<T: Serialize + ?Sized>(data: &T, message: &str) -> AppResult<()> {
    print_json(&json!({
        "success": true,
        "data": data,
        "message": message
    }))
}

/// Error envelope; the notice also logs the error at its level.
pub fn respond_error(err: &AppError) {
    let notice = err.notice();
    let body = json!({
        "success": false,
        "error": notice
    });
    match serde_json::to_string_pretty(&body) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{}", notice.message),
    }
}

fn print_json(value: &serde_json::Value) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
