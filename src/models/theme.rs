use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// The full set of named site colors. Always applied and saved as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColors {
    pub primary: String,
    pub primary_hover: String,
    pub secondary: String,
    pub accent: String,
    pub background: String,
    pub surface: String,
    pub text: String,
    pub text_muted: String,
    pub border: String,
    pub scrollbar_thumb: String,
    pub scrollbar_track: String,
}

impl ThemeColors {
    pub const COUNT: usize = 11;

    /// Field name (kebab-case) paired with its value, in declaration order.
    pub fn entries(&self) -> [(&'static str, &str); Self::COUNT] {
        [
            ("primary", &self.primary),
            ("primary-hover", &self.primary_hover),
            ("secondary", &self.secondary),
            ("accent", &self.accent),
            ("background", &self.background),
            ("surface", &self.surface),
            ("text", &self.text),
            ("text-muted", &self.text_muted),
            ("border", &self.border),
            ("scrollbar-thumb", &self.scrollbar_thumb),
            ("scrollbar-track", &self.scrollbar_track),
        ]
    }

    /// Replace one color by its kebab-case name.
    pub fn set(&mut self, name: &str, value: &str) -> AppResult<()> {
        let slot = match name {
            "primary" => &mut self.primary,
            "primary-hover" => &mut self.primary_hover,
            "secondary" => &mut self.secondary,
            "accent" => &mut self.accent,
            "background" => &mut self.background,
            "surface" => &mut self.surface,
            "text" => &mut self.text,
            "text-muted" => &mut self.text_muted,
            "border" => &mut self.border,
            "scrollbar-thumb" => &mut self.scrollbar_thumb,
            "scrollbar-track" => &mut self.scrollbar_track,
            _ => {
                return Err(AppError::ValidationError(format!(
                    "Unknown theme color: {name}"
                )));
            }
        };
        *slot = value.trim().to_string();
        Ok(())
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            primary: "#e11d48".to_string(),
            primary_hover: "#be123c".to_string(),
            secondary: "#1e293b".to_string(),
            accent: "#f59e0b".to_string(),
            background: "#0f172a".to_string(),
            surface: "#111827".to_string(),
            text: "#f8fafc".to_string(),
            text_muted: "#94a3b8".to_string(),
            border: "#334155".to_string(),
            scrollbar_thumb: "#475569".to_string(),
            scrollbar_track: "transparent".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_by_name() {
        let mut colors = ThemeColors::default();
        colors.set("text-muted", " #aaa ").unwrap();
        assert_eq!(colors.text_muted, "#aaa");
        assert!(colors.set("textMuted", "#aaa").is_err());
        assert!(colors.entries().iter().any(|(k, v)| *k == "text-muted" && *v == "#aaa"));
    }
}
