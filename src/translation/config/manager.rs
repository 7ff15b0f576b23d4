//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::env::EnvVar;
use crate::translation::error::{helpers, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub source_lang: String,
    pub target_lang: String,
    pub api_url: String,
    pub client: String,

    // 图表块配置
    pub diagram_tag: String,
    pub diagram_lang: String,

    // 请求配置
    pub request_delay_ms: u64,
    pub timeout_secs: u64,
    pub max_retry_attempts: usize,
    pub retry_delay_ms: u64,

    // 缓存配置
    pub cache_enabled: bool,
    pub cache_size: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            client: constants::DEFAULT_CLIENT.to_string(),

            diagram_tag: constants::DEFAULT_DIAGRAM_TAG.to_string(),
            diagram_lang: constants::DEFAULT_DIAGRAM_LANG.to_string(),

            request_delay_ms: constants::DEFAULT_REQUEST_DELAY_MS,
            timeout_secs: constants::DEFAULT_TIMEOUT.as_secs(),
            max_retry_attempts: constants::DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY_MS,

            cache_enabled: true,
            cache_size: constants::DEFAULT_CACHE_SIZE,
        }
    }
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn default_with_lang(target_lang: &str, api_url: Option<&str>) -> Self {
        let mut config = Self::default();
        config.target_lang = target_lang.to_string();
        if let Some(url) = api_url {
            config.api_url = url.to_string();
        }
        config
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.target_lang.trim().is_empty() {
            return Err(helpers::config_error("目标语言不能为空"));
        }

        if self.diagram_lang.trim().is_empty() {
            return Err(helpers::config_error("图表翻译语言不能为空"));
        }

        if self.diagram_tag.trim().is_empty() {
            return Err(helpers::config_error("图表语言标记不能为空"));
        }

        match url::Url::parse(&self.api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(helpers::config_error(format!("API 地址无效: {}", self.api_url)))
            }
        }

        if self.timeout_secs == 0 {
            return Err(helpers::config_error("请求超时必须大于0"));
        }

        if self.cache_enabled && self.cache_size == 0 {
            return Err(helpers::config_error("启用缓存时缓存大小不能为0"));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只有显式设置的变量才会覆盖，取值无效时记录警告并保留原配置。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, translation};

        override_with::<translation::TargetLang, _>(&mut self.target_lang);
        override_with::<translation::SourceLang, _>(&mut self.source_lang);
        if override_with::<translation::ApiUrl, _>(&mut self.api_url) {
            tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
        }
        override_with::<translation::DiagramLang, _>(&mut self.diagram_lang);
        override_with::<translation::RequestDelayMs, _>(&mut self.request_delay_ms);
        override_with::<translation::TimeoutSecs, _>(&mut self.timeout_secs);
        override_with::<translation::MaxRetryAttempts, _>(&mut self.max_retry_attempts);
        override_with::<cache::Enabled, _>(&mut self.cache_enabled);
        override_with::<cache::Size, _>(&mut self.cache_size);
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

fn override_with<V, T>(slot: &mut T) -> bool
where
    V: EnvVar<T>,
{
    match V::lookup() {
        Some(Ok(value)) => {
            *slot = value;
            true
        }
        Some(Err(e)) => {
            tracing::warn!("忽略无效的环境变量: {}", e);
            false
        }
        None => false,
    }
}

/// 配置管理器
///
/// 加载顺序：`.env` 文件 → 第一个存在的配置文件 → 环境变量覆盖 → 验证。
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: TranslationConfig,
    source: Option<String>,
}

impl ConfigManager {
    /// 从默认搜索路径创建配置管理器
    pub fn new() -> TranslationResult<Self> {
        Self::load_dotenv();

        let (config, source) = match Self::find_config_file() {
            Some(path) => {
                tracing::info!("加载配置文件: {}", path);
                (Self::load_from_file(&path)?, Some(path))
            }
            None => {
                tracing::info!("未找到配置文件，使用默认配置");
                (TranslationConfig::default(), None)
            }
        };

        Self::finish(config, source)
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path).into_owned();
        let config = Self::load_from_file(&expanded)?;
        Self::finish(config, Some(expanded))
    }

    fn finish(mut config: TranslationConfig, source: Option<String>) -> TranslationResult<Self> {
        config.apply_env_overrides();
        config.validate()?;
        Ok(Self { config, source })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 配置文件路径，未使用配置文件时为 `None`
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// 以当前配置为基础，替换目标语言
    pub fn config_for(&self, target_lang: &str) -> TranslationConfig {
        let mut config = self.config.clone();
        config.target_lang = target_lang.to_string();
        config
    }

    fn find_config_file() -> Option<String> {
        constants::CONFIG_PATHS
            .iter()
            .map(|path| shellexpand::tilde(path).into_owned())
            .find(|path| Path::new(path).exists())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| helpers::config_error(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| helpers::config_error(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| helpers::config_error(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let content = toml::to_string_pretty(&TranslationConfig::default())
            .map_err(|e| helpers::config_error(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| helpers::config_error(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
