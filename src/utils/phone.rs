use crate::error::{AppError, AppResult};
use regex::Regex;

/// 校验联系电话并返回去掉分隔符后的号码
pub fn validate_phone(phone: &str) -> AppResult<String> {
    let normalized = normalize_phone(phone);
    if normalized.is_empty() {
        return Err(AppError::ValidationError("Phone number is required".to_string()));
    }

    let phone_regex = Regex::new(r"^\+?\d{8,15}$")
        .map_err(|e| AppError::InternalError(format!("phone pattern: {e}")))?;
    if !phone_regex.is_match(&normalized) {
        return Err(AppError::ValidationError(
            "Phone number must contain 8 to 15 digits".to_string(),
        ));
    }

    Ok(normalized)
}

/// Strip the separators people type into phone fields.
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}
