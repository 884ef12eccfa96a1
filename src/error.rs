use crate::draw::DrawError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// 参赛提交被拒绝的原因，原样返回给提交方
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Please confirm you are not a robot")]
    MissingCaptcha,
    #[error("Captcha verification failed")]
    CaptchaFailed,
    #[error("Device identifier is missing")]
    MissingDeviceIdentity,
    #[error("Please upload a photo")]
    MissingImage,
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Field is too long: {0}")]
    FieldTooLong(String),
    #[error("Invalid phone number")]
    InvalidPhone,
    #[error("This phone number has already been used")]
    DuplicatePhone,
    #[error("This device has already participated")]
    DuplicateDevice,
    #[error("This image has already been used")]
    DuplicateImage,
}

impl Rejection {
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::MissingCaptcha => "MISSING_CAPTCHA",
            Rejection::CaptchaFailed => "CAPTCHA_FAILED",
            Rejection::MissingDeviceIdentity => "MISSING_DEVICE_IDENTITY",
            Rejection::MissingImage => "MISSING_IMAGE",
            Rejection::InvalidImage(_) => "INVALID_IMAGE",
            Rejection::MissingField(_) => "MISSING_FIELD",
            Rejection::FieldTooLong(_) => "FIELD_TOO_LONG",
            Rejection::InvalidPhone => "INVALID_PHONE",
            Rejection::DuplicatePhone => "DUPLICATE_PHONE",
            Rejection::DuplicateDevice => "DUPLICATE_DEVICE",
            Rejection::DuplicateImage => "DUPLICATE_IMAGE",
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Rejection::DuplicatePhone | Rejection::DuplicateDevice | Rejection::DuplicateImage
        )
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Submission rejected: {0}")]
    Rejected(#[from] Rejection),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("No entries")]
    NoEntries,

    #[error("Forbidden")]
    Forbidden,

    #[error("Draw error: {0}")]
    DrawState(#[from] DrawError),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Archive error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// (status, code, 对外消息)。上游错误只返回通用消息，细节仅写日志。
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Rejected(r) if r.is_duplicate() => {
                (StatusCode::CONFLICT, r.code(), r.to_string())
            }
            AppError::Rejected(r) => (StatusCode::BAD_REQUEST, r.code(), r.to_string()),
            AppError::AuthError(_) | AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                "AUTH_ERROR",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "You are not allowed to access the admin area".to_string(),
            ),
            AppError::NoEntries => (
                StatusCode::NOT_FOUND,
                "NO_ENTRIES",
                "There are no entries yet".to_string(),
            ),
            AppError::DrawState(e) => (StatusCode::CONFLICT, e.code(), e.to_string()),
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "An error occurred while saving, please try again later".to_string(),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "Database error".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = self.parts();

        if status_code.is_server_error() || status_code == StatusCode::BAD_GATEWAY {
            log::error!("{self}");
        } else {
            log::warn!("{self}");
        }

        HttpResponse::build(status_code).json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_map_to_conflict() {
        for r in [
            Rejection::DuplicatePhone,
            Rejection::DuplicateDevice,
            Rejection::DuplicateImage,
        ] {
            assert_eq!(AppError::from(r).status_code(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_validation_rejections_map_to_bad_request() {
        let err = AppError::from(Rejection::MissingDeviceIdentity);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.parts().1, "MISSING_DEVICE_IDENTITY");
    }

    #[test]
    fn test_overlong_field_is_bad_request() {
        let err = AppError::from(Rejection::FieldTooLong("code".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.parts().1, "FIELD_TOO_LONG");
    }

    #[test]
    fn test_upstream_errors_do_not_leak_details() {
        let err = AppError::ExternalApiError("cloudinary: invalid signature abc123".into());
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "UPSTREAM_ERROR");
        assert!(!message.contains("abc123"));
    }

    #[test]
    fn test_no_entries_is_not_found() {
        assert_eq!(AppError::NoEntries.status_code(), StatusCode::NOT_FOUND);
    }
}
