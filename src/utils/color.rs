use crate::error::{AppError, AppResult};
use regex::Regex;

/// Parse `#rgb` or `#rrggbb` into its channels.
pub fn parse_hex_color(value: &str) -> AppResult<(u8, u8, u8)> {
    let hex_regex = Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$")
        .map_err(|e| AppError::InternalError(format!("color pattern: {e}")))?;
    let value = value.trim();
    if !hex_regex.is_match(value) {
        return Err(AppError::ValidationError(format!(
            "Invalid color value: {value}"
        )));
    }

    let hex = &value[1..];
    let channel = |s: &str| {
        u8::from_str_radix(s, 16)
            .map_err(|_| AppError::ValidationError(format!("Invalid color value: {value}")))
    };

    if hex.len() == 3 {
        let expand = |i: usize| channel(&hex[i..i + 1].repeat(2));
        Ok((expand(0)?, expand(1)?, expand(2)?))
    } else {
        Ok((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?))
    }
}

/// `#2563eb` -> `37 99 235`, the form opacity-aware styles compose with.
pub fn hex_to_rgb_triple(value: &str) -> AppResult<String> {
    let (r, g, b) = parse_hex_color(value)?;
    Ok(format!("{r} {g} {b}"))
}
