//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 翻译客户端和翻译服务
//! - **pipeline**: 受保护片段提取和逐行文本准备
//! - **storage**: 翻译结果缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use md_editor_pro::translation::TranslationService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = TranslationService::create_default("en", None)?;
//! let markdown = "# Tiêu đề\n\n```rust\nfn main() {}\n```";
//! let translated = service.translate(markdown, "auto", "en").await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块 - 处理翻译相关的所有配置
pub mod config;

/// 核心翻译模块 - 翻译客户端和翻译服务
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 文本处理管道模块 - 片段提取和逐行准备
pub mod pipeline;

/// 存储管理模块 - 翻译结果缓存
pub mod storage;

// ============================================================================
// 核心API导出
// ============================================================================

pub use self::core::{
    GoogleTranslateClient, ServiceStats, ServiceStatsSnapshot, TranslationRequest,
    TranslationService, Translator,
};

pub use config::{constants, ConfigManager, TranslationConfig};

pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};

pub use pipeline::{extract, Extraction, Segment, SegmentExtractor, SegmentKind};

pub use storage::{CacheStats, CachedTranslator, TranslationCache};

// ============================================================================
// 便利函数
// ============================================================================

/// 翻译 Markdown 文本
///
/// 使用默认搜索路径中的配置创建服务后执行一次翻译；
/// 配置文件无效时直接返回 [`TranslationError::ConfigError`]。
///
/// # 参数
///
/// * `text` - 原文
/// * `source_lang` - 源语言代码，`auto` 表示自动检测
/// * `target_lang` - 目标语言代码（如 "en", "vi", "ja"）
pub async fn translate_markdown(
    text: &str,
    source_lang: &str,
    target_lang: &str,
) -> TranslationResult<String> {
    let config = config::load_translation_config(target_lang)?;
    let service = TranslationService::new(config)?;
    service.translate(text, source_lang, target_lang).await
}
