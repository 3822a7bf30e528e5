use crate::error::AppResult;
use crate::external::ApiClient;
use crate::models::ThemeColors;
use crate::utils::hex_to_rgb_triple;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Scrollbar colors go out as written; everything else becomes an `r g b` triple.
const LITERAL_VARIABLES: [&str; 2] = ["scrollbar-thumb", "scrollbar-track"];

/// Runtime style variables read by the rendering layer.
///
/// `apply` is the only writer and always replaces the whole set.
#[derive(Clone, Default)]
pub struct ThemeContext {
    variables: Arc<RwLock<BTreeMap<String, String>>>,
}

impl ThemeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert every color first; a single bad value leaves the current
    /// variables untouched.
    pub fn apply(&self, colors: &ThemeColors) -> AppResult<()> {
        let next = theme_variables(colors)?;
        let mut current = self
            .variables
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *current = next;
        Ok(())
    }

    pub fn variables(&self) -> BTreeMap<String, String> {
        self.variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.variables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in self.variables() {
            css.push_str(&format!("  {name}: {value};\n"));
        }
        css.push('}');
        css
    }
}

pub fn theme_variables(colors: &ThemeColors) -> AppResult<BTreeMap<String, String>> {
    colors
        .entries()
        .into_iter()
        .map(|(name, value)| -> AppResult<(String, String)> {
            let value = if LITERAL_VARIABLES.contains(&name) {
                value.trim().to_string()
            } else {
                hex_to_rgb_triple(value)?
            };
            Ok((format!("--color-{name}"), value))
        })
        .collect()
}

#[derive(Clone)]
pub struct ThemeService {
    api: ApiClient,
    context: ThemeContext,
}

impl ThemeService {
    pub fn new(api: ApiClient, context: ThemeContext) -> Self {
        Self { api, context }
    }

    pub fn context(&self) -> &ThemeContext {
        &self.context
    }

    /// Stored colors as the backend has them, not validated or applied.
    /// Edits start from here so a broken stored theme can still be repaired.
    pub async fn current(&self) -> AppResult<ThemeColors> {
        self.api.get("/theme").await
    }

    pub async fn fetch(&self) -> AppResult<ThemeColors> {
        let colors = self.current().await?;
        self.context.apply(&colors)?;
        Ok(colors)
    }

    /// Live preview: applied locally, nothing is saved.
    pub fn preview(&self, colors: &ThemeColors) -> AppResult<()> {
        self.context.apply(colors)
    }

    pub async fn save(&self, colors: &ThemeColors) -> AppResult<ThemeColors> {
        theme_variables(colors)?;
        let saved: ThemeColors = self.api.put("/theme", colors).await?;
        self.context.apply(&saved)?;
        log::info!("Theme saved");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_converts_and_keeps_literals() {
        let ctx = ThemeContext::new();
        let mut colors = ThemeColors::default();
        colors.primary = "#2563eb".to_string();
        colors.scrollbar_thumb = "rgba(0, 0, 0, 0.4)".to_string();
        ctx.apply(&colors).unwrap();

        let vars = ctx.variables();
        assert_eq!(vars.len(), ThemeColors::COUNT);
        assert_eq!(vars["--color-primary"], "37 99 235");
        assert_eq!(vars["--color-scrollbar-thumb"], "rgba(0, 0, 0, 0.4)");
        assert_eq!(vars["--color-scrollbar-track"], "transparent");
    }

    #[test]
    fn test_bad_color_leaves_previous_theme() {
        let ctx = ThemeContext::new();
        ctx.apply(&ThemeColors::default()).unwrap();
        let before = ctx.variables();

        let mut broken = ThemeColors::default();
        broken.primary = "#00f".to_string();
        broken.text = "white".to_string();
        assert!(ctx.apply(&broken).is_err());
        assert_eq!(ctx.variables(), before);
    }

    #[test]
    fn test_apply_overwrites_everything() {
        let ctx = ThemeContext::new();
        ctx.apply(&ThemeColors::default()).unwrap();

        let mut next = ThemeColors::default();
        next.accent = "#000".to_string();
        ctx.apply(&next).unwrap();
        assert_eq!(ctx.get("--color-accent").as_deref(), Some("0 0 0"));
        assert_eq!(ctx.variables().len(), ThemeColors::COUNT);
    }

    #[test]
    fn test_css_output() {
        let ctx = ThemeContext::new();
        ctx.apply(&ThemeColors::default()).unwrap();
        let css = ctx.to_css();
        assert!(css.starts_with(":root {"));
        assert!(css.contains("  --color-primary: 225 29 72;\n"));
    }
}
