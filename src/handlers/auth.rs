use crate::error::{AppError, AppResult};
use crate::handlers::{AppContext, respond, respond_with_message};
use clap::Args;

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,

    /// Falls back to TICKETDESK_PASSWORD
    #[arg(short, long, env = "TICKETDESK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn login(ctx: &AppContext, args: LoginArgs) -> AppResult<()> {
    let user = ctx.auth.login(&args.username, &args.password).await?;
    respond_with_message(&user, "Logged in")
}

pub async fn logout(ctx: &AppContext) -> AppResult<()> {
    ctx.auth.logout().await?;
    respond_with_message(&serde_json::Value::Null, "Logged out")
}

pub fn whoami(ctx: &AppContext) -> AppResult<()> {
    match ctx.auth.current_user() {
        Some(user) => respond(&user),
        None => Err(AppError::AuthError("Not logged in".to_string())),
    }
}
