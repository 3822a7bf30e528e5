use crate::error::{AppError, AppResult};
use crate::handlers::{AppContext, respond, respond_with_message};
use crate::models::ThemeColors;
use crate::services::{ThemeContext, ThemeService};
use clap::{Args, Subcommand};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum ThemeCommand {
    /// Current colors and the style variables derived from them
    Show,
    /// Apply changes locally and print the resulting variables
    Preview(ThemeEdit),
    /// Save changes for every visitor
    Save(ThemeEdit),
    /// Current theme as a CSS `:root` block
    Css,
}

#[derive(Debug, Args)]
pub struct ThemeEdit {
    /// Full theme as JSON (camelCase keys)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Single color override, e.g. --set primary=#2563eb
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,
}

impl ThemeEdit {
    async fn apply_to(&self, mut colors: ThemeColors) -> AppResult<ThemeColors> {
        if let Some(file) = &self.file {
            let raw = tokio::fs::read_to_string(file).await?;
            colors = serde_json::from_str(&raw)?;
        }
        for entry in &self.overrides {
            let (name, value) = entry.split_once('=').ok_or_else(|| {
                AppError::ValidationError(format!("Expected NAME=VALUE, got {entry}"))
            })?;
            colors.set(name.trim(), value)?;
        }
        Ok(colors)
    }
}

pub async fn handle(ctx: &AppContext, command: ThemeCommand) -> AppResult<()> {
    let service = ThemeService::new(ctx.api.clone(), ThemeContext::new());

    match command {
        ThemeCommand::Show => {
            let colors = service.fetch().await?;
            respond(&json!({
                "colors": colors,
                "variables": service.context().variables()
            }))
        }
        ThemeCommand::Css => {
            service.fetch().await?;
            println!("{}", service.context().to_css());
            Ok(())
        }
        ThemeCommand::Preview(edit) => {
            ctx.authorize("/admin/theme")?;
            let current = service.current().await?;
            let colors = edit.apply_to(current).await?;
            service.preview(&colors)?;
            respond_with_message(&service.context().variables(), "Preview only, nothing saved")
        }
        ThemeCommand::Save(edit) => {
            ctx.authorize("/admin/theme")?;
            let current = service.current().await?;
            let colors = edit.apply_to(current).await?;
            let saved = service.save(&colors).await?;
            respond_with_message(&saved, "Theme saved")
        }
    }
}
