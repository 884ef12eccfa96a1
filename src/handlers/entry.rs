use actix_multipart::{Field, Multipart};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use futures_util::StreamExt;
use serde_json::json;

use crate::error::{AppError, AppResult, Rejection};
use crate::external::TurnstileService;
use crate::models::*;
use crate::services::EntryService;
use crate::utils::{DEVICE_COOKIE, device_cookie, new_device_id, resolve_device_id};

/// 文本字段上限
const MAX_TEXT_FIELD_BYTES: usize = 4 * 1024;

/// 解析后的 multipart 表单
#[derive(Debug, Default)]
struct EntryForm {
    submission: EntrySubmission,
    captcha_token: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/entries",
    tag = "entries",
    request_body(content = SubmitEntryForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "提交成功", body = SubmitEntryResponse),
        (status = 400, description = "缺少字段、图片无效或人机验证失败"),
        (status = 409, description = "手机号、设备或图片已被使用"),
        (status = 502, description = "图片上传失败")
    )
)]
pub async fn submit_entry(
    entry_service: web::Data<EntryService>,
    turnstile: web::Data<TurnstileService>,
    req: HttpRequest,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = match read_entry_form(payload, entry_service.max_image_bytes()).await {
        Ok(form) => form,
        Err(e) => return Ok(e.error_response()),
    };

    if turnstile.is_enabled() {
        let remote_ip = req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string);
        if let Err(e) = turnstile
            .verify_token(form.captcha_token.as_deref(), remote_ip.as_deref())
            .await
        {
            return Ok(e.error_response());
        }
    }

    let mut submission = form.submission;
    let cookie = req.cookie(DEVICE_COOKIE);
    submission.device_id = resolve_device_id(
        submission.device_id.as_deref(),
        cookie.as_ref().map(|c| c.value()),
    );

    match entry_service.admit(submission).await {
        Ok(id) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            SubmitEntryResponse { id },
            "Your entry has been received",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/device",
    tag = "entries",
    responses(
        (status = 200, description = "当前设备标识（不存在时生成并写入 cookie）", body = DeviceResponse)
    )
)]
pub async fn get_device(req: HttpRequest) -> Result<HttpResponse> {
    if let Some(existing) = req
        .cookie(DEVICE_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
    {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(DeviceResponse {
            device_id: existing,
        })));
    }

    let device_id = new_device_id();
    Ok(HttpResponse::Ok()
        .cookie(device_cookie(&device_id))
        .json(ApiResponse::success(DeviceResponse { device_id })))
}

pub async fn status() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Contest backend is running"
    })))
}

async fn read_entry_form(mut payload: Multipart, max_image_bytes: usize) -> AppResult<EntryForm> {
    let mut form = EntryForm::default();

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(multipart_error)?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" | "image" => {
                let content_type = field.content_type().map(|m| m.essence_str().to_string());
                let file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);
                // 超出上限的部分丢弃，只保留 max+1 字节让服务层判定为 InvalidImage
                let (bytes, _) = read_field(&mut field, max_image_bytes + 1).await?;
                form.submission.image = Some(ImageUpload {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            _ => {
                let (bytes, overflowed) = read_field(&mut field, MAX_TEXT_FIELD_BYTES).await?;
                if overflowed {
                    return Err(Rejection::FieldTooLong(name).into());
                }
                let value = String::from_utf8(bytes).map_err(|_| {
                    AppError::ValidationError(format!("Field {name} is not valid UTF-8"))
                })?;
                apply_text_field(&mut form, &name, value);
            }
        }
    }

    Ok(form)
}

/// 读取字段内容，最多保留 `limit` 字节；第二个返回值表示是否有被丢弃的内容
async fn read_field(field: &mut Field, limit: usize) -> AppResult<(Vec<u8>, bool)> {
    let mut buf = Vec::new();
    let mut overflowed = false;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(multipart_error)?;
        overflowed |= append_capped(&mut buf, &chunk, limit);
    }
    Ok((buf, overflowed))
}

fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    let take = chunk.len().min(room);
    buf.extend_from_slice(&chunk[..take]);
    take < chunk.len()
}

fn apply_text_field(form: &mut EntryForm, name: &str, value: String) {
    let s = &mut form.submission;
    match name {
        "firstName" => s.first_name = value,
        "lastName" => s.last_name = value,
        "phone" => s.phone = value,
        "city" => s.city = value,
        "code" => s.code = value,
        "deviceId" => s.device_id = Some(value),
        "captchaToken" | "cf-turnstile-response" => form.captcha_token = Some(value),
        "group" => s.group_tag = Some(value),
        "isRelative" => s.is_relative = parse_flag(&value),
        _ => log::debug!("Ignoring unknown form field {name}"),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn multipart_error(e: actix_multipart::MultipartError) -> AppError {
    AppError::ValidationError(format!("Malformed form data: {e}"))
}

pub fn entry_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/entries", web::post().to(submit_entry))
        .route("/device", web::get().to(get_device));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::error::PayloadError;
    use actix_web::http::header::{self, HeaderMap, HeaderValue};
    use actix_web::web::Bytes;
    use actix_web::{App, http::StatusCode, test as actix_test};

    const BOUNDARY: &str = "contest-boundary";

    fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Multipart {
        let mut body = Vec::new();
        for (name, file_name, content) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: image/jpeg\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(&format!("multipart/form-data; boundary={BOUNDARY}")).unwrap(),
        );
        let stream = futures_util::stream::iter([Ok::<_, PayloadError>(Bytes::from(body))]);
        Multipart::new(&headers, stream)
    }

    #[test]
    fn test_text_fields_are_mapped() {
        let mut form = EntryForm::default();
        apply_text_field(&mut form, "firstName", "Amina".into());
        apply_text_field(&mut form, "deviceId", "fp-1".into());
        apply_text_field(&mut form, "captchaToken", "tok".into());
        apply_text_field(&mut form, "isRelative", "false".into());
        apply_text_field(&mut form, "unknown", "x".into());

        assert_eq!(form.submission.first_name, "Amina");
        assert_eq!(form.submission.device_id.as_deref(), Some("fp-1"));
        assert_eq!(form.captcha_token.as_deref(), Some("tok"));
        assert_eq!(form.submission.is_relative, Some(false));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_append_capped_reports_dropped_bytes() {
        let mut buf = Vec::new();
        assert!(!append_capped(&mut buf, b"abc", 5));
        assert!(!append_capped(&mut buf, b"de", 5));
        assert!(append_capped(&mut buf, b"f", 5));
        assert_eq!(buf, b"abcde");
        assert!(!append_capped(&mut buf, b"", 5));
    }

    #[actix_web::test]
    async fn test_form_fields_are_read() {
        let form = read_entry_form(
            multipart(&[
                ("firstName", None, "Amina".as_bytes()),
                ("code", None, "SUMMER25".as_bytes()),
                ("file", Some("bottle.jpg"), &b"\xFF\xD8jpeg"[..]),
            ]),
            1024,
        )
        .await
        .unwrap();

        assert_eq!(form.submission.first_name, "Amina");
        assert_eq!(form.submission.code, "SUMMER25");
        let image = form.submission.image.unwrap();
        assert_eq!(image.bytes, b"\xFF\xD8jpeg");
        assert_eq!(image.content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(image.file_name.as_deref(), Some("bottle.jpg"));
    }

    #[actix_web::test]
    async fn test_overlong_text_field_is_rejected_not_cut() {
        let code = "X".repeat(MAX_TEXT_FIELD_BYTES + 1);
        let result = read_entry_form(multipart(&[("code", None, code.as_bytes())]), 1024).await;

        match result {
            Err(AppError::Rejected(r)) => assert_eq!(r, Rejection::FieldTooLong("code".into())),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_image_read_stops_one_byte_past_limit() {
        let image = vec![7u8; 4096];
        let form = read_entry_form(multipart(&[("file", Some("big.jpg"), image.as_slice())]), 1024)
            .await
            .unwrap();

        assert_eq!(form.submission.image.unwrap().bytes.len(), 1025);
    }

    #[actix_web::test]
    async fn test_device_is_created_once() {
        let app = actix_test::init_service(
            App::new().route("/api/v1/device", web::get().to(get_device)),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/v1/device").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == DEVICE_COOKIE)
            .unwrap();
        assert!(cookie.http_only().unwrap_or(false));
        let issued = cookie.value().to_string();

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/device")
            .cookie(device_cookie(&issued))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.response().cookies().next().is_none());
        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body["data"]["device_id"], issued);
    }
}
