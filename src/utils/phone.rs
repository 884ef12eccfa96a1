use crate::error::{AppResult, Rejection};
use regex::Regex;
use std::sync::LazyLock;

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{6,15}$").expect("valid phone regex"));

/// 去掉空格、横线、点和括号，保留开头的 +
pub fn normalize_phone(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect()
}

/// 规范化并校验手机号（6-15 位数字，可带 +），返回规范化后的值作为唯一键
pub fn validate_phone(phone: &str) -> AppResult<String> {
    let normalized = normalize_phone(phone);
    if !PHONE_REGEX.is_match(&normalized) {
        return Err(Rejection::InvalidPhone.into());
    }
    Ok(normalized)
}
