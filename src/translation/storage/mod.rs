//! 存储模块
//!
//! 提供翻译结果的内存缓存。

pub mod cache;

pub use cache::{generate_cache_key, CacheStats, CachedTranslator, TranslationCache};
