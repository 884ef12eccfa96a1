/// 图片内容指纹：原始字节的 MD5（32 位小写 hex），字节完全相同的图片必然相同
pub fn image_content_hash(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// 从图片 URL 推断扩展名（取路径最后一段的后缀，忽略查询参数），推断失败时用 jpg
pub fn image_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    match last_segment.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "jpg".to_string(),
    }
}

/// 根据上传时的 content type / 文件名决定存储扩展名
pub fn upload_extension(content_type: Option<&str>, file_name: Option<&str>) -> String {
    match content_type {
        Some("image/png") => "png".to_string(),
        Some("image/webp") => "webp".to_string(),
        Some("image/gif") => "gif".to_string(),
        Some("image/heic") => "heic".to_string(),
        Some("image/jpeg") | Some("image/jpg") => "jpg".to_string(),
        _ => file_name.map(image_extension).unwrap_or_else(|| "jpg".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_md5() {
        assert_eq!(image_content_hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(image_content_hash(b"photo"), image_content_hash(b"photo"));
        assert_ne!(image_content_hash(b"photo-1"), image_content_hash(b"photo-2"));
        assert_eq!(image_content_hash(b"abc").len(), 32);
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(
            image_extension("https://res.cloudinary.com/demo/image/upload/v1/entries/abc.PNG"),
            "png"
        );
        assert_eq!(image_extension("https://cdn.example.com/a/b.jpeg?x=1.2"), "jpeg");
        assert_eq!(image_extension("https://cdn.example.com/a/noext"), "jpg");
        assert_eq!(image_extension("https://cdn.example.com.dz/a/"), "jpg");
    }

    #[test]
    fn test_upload_extension() {
        assert_eq!(upload_extension(Some("image/png"), Some("x.jpg")), "png");
        assert_eq!(upload_extension(None, Some("bottle.WEBP")), "webp");
        assert_eq!(upload_extension(Some("image/x-unknown"), None), "jpg");
    }
}
