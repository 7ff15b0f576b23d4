//! 翻译系统核心模块
//!
//! - **客户端层** (`client.rs`): [`Translator`] 能力和 HTTP 实现
//! - **服务层** (`service.rs`): 组合片段提取和逐行翻译的完整流程
//!
//! ## 模块依赖关系
//!
//! ```text
//! TranslationService (service.rs)
//!     ├── SegmentExtractor (pipeline/segments.rs)
//!     ├── PreparedLine (pipeline/inline.rs)
//!     └── Translator (client.rs)
//!             ├── CachedTranslator (storage/cache.rs)
//!             └── GoogleTranslateClient (client.rs)
//! ```

pub mod client;
pub mod service;

/// 翻译能力及其 HTTP 实现
pub use client::{parse_translation_response, GoogleTranslateClient, TranslationRequest, Translator};

/// 统一翻译服务 - 主要的对外接口
pub use service::TranslationService;

/// 服务运行统计信息
pub use service::{ServiceStats, ServiceStatsSnapshot};
