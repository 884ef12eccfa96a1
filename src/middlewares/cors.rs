use actix_cors::Cors;

/// 参赛页面与后台可能部署在不同域名；设备 cookie 需要携带凭据
pub fn create_cors() -> Cors {
    Cors::default()
        .allowed_origin_fn(|_, _req_head| true)
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        .expose_headers(vec!["Content-Disposition"])
        .supports_credentials()
        .max_age(3600)
}
