//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问。所有变量以 `MDPRO_` 为前缀，
//! 翻译配置加载时只有显式设置的变量才会覆盖配置文件中的值。

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl EnvError {
    fn new(variable: &str, message: impl Into<String>) -> Self {
        Self {
            variable: variable.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    /// 读取变量，未设置时返回默认值
    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::DEFAULT.ok_or_else(|| {
                EnvError::new(Self::NAME, "Required environment variable not set")
            }),
        }
    }

    /// 只在变量显式设置时返回解析结果
    fn lookup() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "MDPRO_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError::new(
                    Self::NAME,
                    format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                )),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何非空值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "MDPRO_TARGET_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language for translation (e.g. en, vi, ja)";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME, false)
        }
    }

    /// 源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "MDPRO_SOURCE_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Source language for translation ('auto' for detection)";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("auto".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME, true)
        }
    }

    /// 图表块的固定翻译语言
    pub struct DiagramLang;
    impl EnvVar<String> for DiagramLang {
        const NAME: &'static str = "MDPRO_DIAGRAM_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Fixed target language for diagram blocks";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME, false)
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "MDPRO_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation API endpoint URL";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok(crate::translation::constants::DEFAULT_API_URL.to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            let value = value.trim();
            match url::Url::parse(value) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(value.to_string()),
                _ => Err(EnvError::new(
                    Self::NAME,
                    "API URL must start with http:// or https://",
                )),
            }
        }
    }

    /// 相邻请求之间的间隔
    pub struct RequestDelayMs;
    impl EnvVar<u64> for RequestDelayMs {
        const NAME: &'static str = "MDPRO_REQUEST_DELAY_MS";
        const DEFAULT: Option<u64> = Some(50);
        const DESCRIPTION: &'static str = "Delay between consecutive translation requests in milliseconds";

        fn parse(value: &str) -> EnvResult<u64> {
            let millis: u64 = value
                .trim()
                .parse()
                .map_err(|_| EnvError::new(Self::NAME, "Must be a valid number of milliseconds"))?;

            if millis > 10_000 {
                return Err(EnvError::new(Self::NAME, "Delay too long (max 10000 ms)"));
            }

            Ok(millis)
        }
    }

    /// 单次请求超时
    pub struct TimeoutSecs;
    impl EnvVar<u64> for TimeoutSecs {
        const NAME: &'static str = "MDPRO_TIMEOUT_SECS";
        const DEFAULT: Option<u64> = Some(10);
        const DESCRIPTION: &'static str = "Per-request timeout in seconds";

        fn parse(value: &str) -> EnvResult<u64> {
            parse_positive_usize(value, Self::NAME, 1, 300).map(|secs| secs as u64)
        }
    }

    /// 最大重试次数
    pub struct MaxRetryAttempts;
    impl EnvVar<usize> for MaxRetryAttempts {
        const NAME: &'static str = "MDPRO_MAX_RETRY_ATTEMPTS";
        const DEFAULT: Option<usize> = Some(2);
        const DESCRIPTION: &'static str = "Retries for retryable request failures";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 0, 10)
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存启用状态
    pub struct Enabled;
    impl EnvVar<bool> for Enabled {
        const NAME: &'static str = "MDPRO_CACHE_ENABLED";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Enable the in-memory translation cache";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 缓存容量
    pub struct Size;
    impl EnvVar<usize> for Size {
        const NAME: &'static str = "MDPRO_CACHE_SIZE";
        const DEFAULT: Option<usize> = Some(500);
        const DESCRIPTION: &'static str = "Translation cache size (number of entries)";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 100_000)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError::new(
            var_name,
            format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        )),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value
        .trim()
        .parse()
        .map_err(|_| EnvError::new(var_name, "Must be a valid positive number"))?;

    if num < min {
        return Err(EnvError::new(
            var_name,
            format!("Value {} is below minimum {}", num, min),
        ));
    }

    if num > max {
        return Err(EnvError::new(
            var_name,
            format!("Value {} exceeds maximum {}", num, max),
        ));
    }

    Ok(num)
}

/// 语言代码：`en`、`vi`、`zh-CN` 这类形式，源语言还允许 `auto`
fn parse_lang(value: &str, var_name: &str, allow_auto: bool) -> EnvResult<String> {
    let lang = value.trim();
    if lang.eq_ignore_ascii_case("auto") {
        return if allow_auto {
            Ok("auto".to_string())
        } else {
            Err(EnvError::new(var_name, "'auto' is only valid as a source language"))
        };
    }

    let mut parts = lang.splitn(2, '-');
    let primary = parts.next().unwrap_or_default();
    let region_ok = parts
        .next()
        .map_or(true, |region| !region.is_empty() && region.chars().all(|c| c.is_ascii_alphanumeric()));

    if (2..=3).contains(&primary.len()) && primary.chars().all(|c| c.is_ascii_alphabetic()) && region_ok {
        Ok(lang.to_string())
    } else {
        Err(EnvError::new(
            var_name,
            format!("Invalid language code '{}'. Use an ISO 639-1 code such as en, vi, ja", value),
        ))
    }
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    // 核心配置
    pub log_level: String,
    pub no_color: bool,

    // 翻译配置
    pub target_lang: String,
    pub source_lang: String,
    pub diagram_lang: String,
    pub api_url: String,
    pub request_delay: Duration,
    pub timeout: Duration,
    pub max_retry_attempts: usize,

    // 缓存配置
    pub cache_enabled: bool,
    pub cache_size: usize,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,
            no_color: core::NoColor::get()?,

            target_lang: translation::TargetLang::get()?,
            source_lang: translation::SourceLang::get()?,
            diagram_lang: translation::DiagramLang::get()?,
            api_url: translation::ApiUrl::get()?,
            request_delay: Duration::from_millis(translation::RequestDelayMs::get()?),
            timeout: Duration::from_secs(translation::TimeoutSecs::get()?),
            max_retry_attempts: translation::MaxRetryAttempts::get()?,

            cache_enabled: cache::Enabled::get()?,
            cache_size: cache::Size::get()?,
        })
    }

    /// 打印配置摘要
    pub fn print_summary(&self) {
        println!("Environment Configuration Summary:");
        println!("  Log Level: {}", self.log_level);
        println!("  Languages: {} -> {}", self.source_lang, self.target_lang);
        println!("  Diagram Language: {}", self.diagram_lang);
        println!("  API URL: {}", self.api_url);
        println!(
            "  Cache: {}",
            if self.cache_enabled { "enabled" } else { "disabled" }
        );
    }
}

fn doc_line<V: EnvVar<T>, T: fmt::Debug>(default_shown: &str) -> String {
    format!("- `{}`: {} (default: {})\n", V::NAME, V::DESCRIPTION, default_shown)
}

fn debug_default<V: EnvVar<T>, T: fmt::Debug>() -> String {
    match V::DEFAULT {
        Some(value) => doc_line::<V, T>(&format!("{:?}", value)),
        None => doc_line::<V, T>("none"),
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&doc_line::<core::LogLevel, String>("info"));
    docs.push_str(&debug_default::<core::NoColor, bool>());

    docs.push_str("\n## Translation Configuration\n\n");
    docs.push_str(&doc_line::<translation::TargetLang, String>("en"));
    docs.push_str(&doc_line::<translation::SourceLang, String>("auto"));
    docs.push_str(&doc_line::<translation::DiagramLang, String>("en"));
    docs.push_str(&doc_line::<translation::ApiUrl, String>(
        crate::translation::constants::DEFAULT_API_URL,
    ));
    docs.push_str(&debug_default::<translation::RequestDelayMs, u64>());
    docs.push_str(&debug_default::<translation::TimeoutSecs, u64>());
    docs.push_str(&debug_default::<translation::MaxRetryAttempts, usize>());

    docs.push_str("\n## Cache Configuration\n\n");
    docs.push_str(&debug_default::<cache::Enabled, bool>());
    docs.push_str(&debug_default::<cache::Size, usize>());

    docs
}
