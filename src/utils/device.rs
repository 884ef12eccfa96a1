use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use uuid::Uuid;

pub const DEVICE_COOKIE: &str = "device_id";

/// 设备标识：表单字段优先，其次是 cookie；均为空时返回 None
pub fn resolve_device_id(form_value: Option<&str>, cookie_value: Option<&str>) -> Option<String> {
    [form_value, cookie_value]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn new_device_id() -> String {
    Uuid::new_v4().to_string()
}

/// 长期有效的 HttpOnly cookie（约 2 年）
pub fn device_cookie(device_id: &str) -> Cookie<'static> {
    Cookie::build(DEVICE_COOKIE, device_id.to_string())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(CookieDuration::days(730))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_value_wins() {
        assert_eq!(
            resolve_device_id(Some("fp-1"), Some("cookie-1")).as_deref(),
            Some("fp-1")
        );
    }

    #[test]
    fn test_falls_back_to_cookie() {
        assert_eq!(
            resolve_device_id(Some("   "), Some("cookie-1")).as_deref(),
            Some("cookie-1")
        );
        assert_eq!(
            resolve_device_id(None, Some("cookie-1")).as_deref(),
            Some("cookie-1")
        );
    }

    #[test]
    fn test_missing_everywhere() {
        assert!(resolve_device_id(None, None).is_none());
        assert!(resolve_device_id(Some(""), Some(" ")).is_none());
    }

    #[test]
    fn test_device_cookie_shape() {
        let id = new_device_id();
        let cookie = device_cookie(&id);
        assert_eq!(cookie.name(), DEVICE_COOKIE);
        assert_eq!(cookie.value(), id);
        assert_eq!(cookie.http_only(), Some(true));
    }
}
