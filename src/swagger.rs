use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::draw::DrawPolicy;
use crate::handlers;
use crate::models::*;
use crate::utils::PaginationInfo;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::entry::submit_entry,
        handlers::entry::get_device,
        handlers::auth::admin_login,
        handlers::admin::list_entries,
        handlers::admin::count_entries,
        handlers::admin::export_entries,
        handlers::draw::start_draw,
        handlers::draw::current_draw,
        handlers::draw::next_winner,
    ),
    components(
        schemas(
            SubmitEntryForm,
            SubmitEntryResponse,
            DeviceResponse,
            EntryResponse,
            EntryCountResponse,
            PaginationInfo,
            AdminLoginRequest,
            AdminLoginResponse,
            StartDrawRequest,
            DrawPolicy,
            WinnerResponse,
            DrawStatusResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "entries", description = "Contest entry submission API"),
        (name = "admin", description = "Administrator API"),
        (name = "draws", description = "Winner draw API"),
    ),
    info(
        title = "Contest Backend API",
        version = "1.0.0",
        description = "Contest entry collection and winner draw REST API documentation"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
