//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

use crate::translation::error::TranslationResult;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "https://translate.googleapis.com/translate_a/single";
    pub const DEFAULT_CLIENT: &str = "gtx";
    pub const DEFAULT_SOURCE_LANG: &str = "auto";
    pub const DEFAULT_TARGET_LANG: &str = "en";

    // 图表块
    pub const DEFAULT_DIAGRAM_TAG: &str = "mermaid";
    pub const DEFAULT_DIAGRAM_LANG: &str = "en";

    // 请求节奏与重试
    pub const DEFAULT_REQUEST_DELAY_MS: u64 = 50;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_MAX_RETRY_ATTEMPTS: usize = 2;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 200;
    pub const MAX_RETRY_DELAY_MS: u64 = 5_000;

    // 缓存设置
    pub const DEFAULT_CACHE_SIZE: usize = 500;

    // 单次请求允许的最大文本长度（URL 查询参数有长度限制）
    pub const MAX_PAYLOAD_CHARS: usize = 5_000;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "mdpro.toml",
        ".mdpro.toml",
        "mdpro.json",
        "~/.config/mdpro/config.toml",
        "/etc/mdpro/config.toml",
    ];

    // .env 文件搜索顺序，加载第一个存在的文件
    pub const ENV_FILES: &[&str] = &[".env.local", ".env.development", ".env.production", ".env"];
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}

/// 从默认搜索路径加载翻译配置，并把目标语言替换为 `target_lang`
///
/// 配置文件存在但无法解析或验证失败时返回错误，不会悄悄退回默认配置。
pub fn load_translation_config(target_lang: &str) -> TranslationResult<TranslationConfig> {
    load_translation_config_from(None, target_lang)
}

/// 从指定文件（`None` 时搜索默认路径）加载翻译配置
pub fn load_translation_config_from(
    path: Option<&str>,
    target_lang: &str,
) -> TranslationResult<TranslationConfig> {
    let manager = match path {
        Some(path) => ConfigManager::from_file(path),
        None => ConfigManager::new(),
    }
    .map_err(|e| {
        tracing::error!("配置加载失败: {}", e);
        e
    })?;

    if let Some(source) = manager.source() {
        tracing::debug!("使用配置文件: {}", source);
    }
    Ok(manager.config_for(target_lang))
}
