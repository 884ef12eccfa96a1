use crate::draw::DrawPolicy;
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub cloudinary: CloudinaryConfig,
    #[serde(default)]
    pub turnstile: TurnstileConfig,
    #[serde(default)]
    pub contest: ContestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdminConfig {
    /// 允许登录后台的邮箱（大小写不敏感）
    #[serde(default)]
    pub allowed_emails: Vec<String>,
    /// Google OAuth client id，设置后校验 ID token 的 aud
    #[serde(default)]
    pub google_client_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TurnstileConfig {
    pub secret_key: String,
    #[serde(default)]
    pub expected_hostname: Option<String>,
    #[serde(default)]
    pub expected_action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContestConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// "unrestricted" | "group_fair"
    #[serde(default = "default_draw_policy")]
    pub default_draw_policy: String,
    #[serde(default)]
    pub stranger_quota: usize,
}

impl Default for ContestConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            default_draw_policy: default_draw_policy(),
            stranger_quota: 0,
        }
    }
}

impl ContestConfig {
    pub fn draw_policy(&self) -> AppResult<DrawPolicy> {
        match self.default_draw_policy.as_str() {
            "unrestricted" => Ok(DrawPolicy::Unrestricted),
            "group_fair" => Ok(DrawPolicy::GroupFair {
                stranger_quota: self.stranger_quota,
            }),
            other => Err(AppError::ConfigError(format!(
                "Unknown draw policy: {other}"
            ))),
        }
    }
}

fn default_folder() -> String {
    "contest-entries".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_image_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_draw_policy() -> String {
    "unrestricted".to_string()
}

fn split_emails(v: &str) -> Vec<String> {
    v.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| AppError::ConfigError(format!("Failed to parse {config_path}: {e}")))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    AppError::ConfigError(
                        "DATABASE_URL is not set and no config.toml was found".to_string(),
                    )
                })?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 43_200i64),
                    },
                    admin: AdminConfig {
                        allowed_emails: get_env("ADMIN_ALLOWED_EMAILS")
                            .map(|v| split_emails(&v))
                            .unwrap_or_default(),
                        google_client_id: get_env("GOOGLE_CLIENT_ID"),
                    },
                    cloudinary: CloudinaryConfig {
                        cloud_name: get_env("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
                        api_key: get_env("CLOUDINARY_API_KEY").unwrap_or_default(),
                        api_secret: get_env("CLOUDINARY_API_SECRET").unwrap_or_default(),
                        folder: get_env("CLOUDINARY_FOLDER").unwrap_or_else(default_folder),
                        timeout_secs: get_env_parse("CLOUDINARY_TIMEOUT_SECS", 30u64),
                    },
                    turnstile: TurnstileConfig {
                        secret_key: get_env("TURNSTILE_SECRET_KEY").unwrap_or_default(),
                        expected_hostname: get_env("TURNSTILE_EXPECTED_HOSTNAME"),
                        expected_action: get_env("TURNSTILE_EXPECTED_ACTION"),
                    },
                    contest: ContestConfig {
                        max_image_bytes: get_env_parse(
                            "CONTEST_MAX_IMAGE_BYTES",
                            default_max_image_bytes(),
                        ),
                        default_draw_policy: get_env("CONTEST_DRAW_POLICY")
                            .unwrap_or_else(default_draw_policy),
                        stranger_quota: get_env_parse("CONTEST_STRANGER_QUOTA", 0usize),
                    },
                }
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Failed to read {config_path}: {e}"
                )));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("ADMIN_ALLOWED_EMAILS") {
            config.admin.allowed_emails = split_emails(&v);
        }
        if let Ok(v) = env::var("GOOGLE_CLIENT_ID") {
            config.admin.google_client_id = Some(v);
        }
        if let Ok(v) = env::var("CLOUDINARY_CLOUD_NAME") {
            config.cloudinary.cloud_name = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_API_KEY") {
            config.cloudinary.api_key = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_API_SECRET") {
            config.cloudinary.api_secret = v;
        }
        if let Ok(v) = env::var("CLOUDINARY_FOLDER") {
            config.cloudinary.folder = v;
        }

        // Turnstile
        if let Ok(v) = env::var("TURNSTILE_SECRET_KEY") {
            config.turnstile.secret_key = v;
        }
        if let Ok(v) = env::var("TURNSTILE_EXPECTED_HOSTNAME") {
            config.turnstile.expected_hostname = Some(v);
        }
        if let Ok(v) = env::var("TURNSTILE_EXPECTED_ACTION") {
            config.turnstile.expected_action = Some(v);
        }

        if let Ok(v) = env::var("CONTEST_MAX_IMAGE_BYTES")
            && let Ok(n) = v.parse()
        {
            config.contest.max_image_bytes = n;
        }
        if let Ok(v) = env::var("CONTEST_DRAW_POLICY") {
            config.contest.default_draw_policy = v;
        }
        if let Ok(v) = env::var("CONTEST_STRANGER_QUOTA")
            && let Ok(n) = v.parse()
        {
            config.contest.stranger_quota = n;
        }

        // 提前发现错误的抽奖策略配置
        config.contest.draw_policy()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contest_defaults() {
        let contest = ContestConfig::default();
        assert_eq!(contest.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(contest.draw_policy().unwrap(), DrawPolicy::Unrestricted);
    }

    #[test]
    fn test_group_fair_policy_from_config() {
        let contest = ContestConfig {
            default_draw_policy: "group_fair".to_string(),
            stranger_quota: 3,
            ..Default::default()
        };
        assert_eq!(
            contest.draw_policy().unwrap(),
            DrawPolicy::GroupFair { stranger_quota: 3 }
        );
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let contest = ContestConfig {
            default_draw_policy: "weighted".to_string(),
            ..Default::default()
        };
        assert!(contest.draw_policy().is_err());
    }

    #[test]
    fn test_parse_toml_sections() {
        let raw = r#"
[server]
host = "127.0.0.1"
port = 5000

[database]
url = "postgres://localhost/contest"
max_connections = 5

[jwt]
secret = "s"
access_token_expires_in = 3600

[admin]
allowed_emails = ["owner@example.com"]

[cloudinary]
cloud_name = "demo"
api_key = "key"
api_secret = "secret"
"#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.admin.allowed_emails, vec!["owner@example.com"]);
        assert_eq!(config.cloudinary.folder, "contest-entries");
        assert!(config.turnstile.secret_key.is_empty());
        assert_eq!(config.contest.default_draw_policy, "unrestricted");
    }

    #[test]
    fn test_split_emails() {
        assert_eq!(
            split_emails(" a@x.com, ,b@y.com "),
            vec!["a@x.com".to_string(), "b@y.com".to_string()]
        );
    }
}
