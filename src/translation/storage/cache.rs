//! 翻译缓存模块
//!
//! 以 `(源语言, 目标语言, 原文)` 为键缓存成功的翻译结果，
//! 容量满时淘汰最久未使用的条目。

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lru::LruCache;

use crate::translation::config::constants;
use crate::translation::core::client::{TranslationRequest, Translator};
use crate::translation::error::{TranslationError, TranslationResult};

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存统计信息
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
    pub evictions: u64,
}

#[derive(Debug)]
struct CacheInner {
    entries: LruCache<String, String>,
    stats: CacheStats,
}

/// 翻译缓存
#[derive(Debug)]
pub struct TranslationCache {
    inner: Mutex<CacheInner>,
}

/// 带缓存的翻译器
pub struct CachedTranslator<T> {
    inner: T,
    cache: Arc<TranslationCache>,
}

// ============================================================================
// 实现
// ============================================================================

impl Default for TranslationCache {
    fn default() -> Self {
        Self::with_capacity(constants::DEFAULT_CACHE_SIZE)
    }
}

impl TranslationCache {
    /// 创建指定容量的缓存，容量为0时按1处理
    pub fn with_capacity(max_size: usize) -> Self {
        let capacity = NonZeroUsize::new(max_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    fn lock(&self) -> TranslationResult<std::sync::MutexGuard<'_, CacheInner>> {
        self.inner
            .lock()
            .map_err(|_| TranslationError::CacheError("缓存锁已损坏".to_string()))
    }

    /// 查询缓存
    pub fn get(&self, request: &TranslationRequest) -> TranslationResult<Option<String>> {
        let key = generate_cache_key(&request.payload, &request.source_lang, &request.target_lang);
        let mut inner = self.lock()?;
        inner.stats.total_requests += 1;

        let hit = inner.entries.get(&key).cloned();
        if hit.is_some() {
            inner.stats.cache_hits += 1;
        } else {
            inner.stats.cache_misses += 1;
        }
        Ok(hit)
    }

    /// 写入缓存
    pub fn insert(&self, request: &TranslationRequest, translated: String) -> TranslationResult<()> {
        let key = generate_cache_key(&request.payload, &request.source_lang, &request.target_lang);
        let mut inner = self.lock()?;
        if let Some((evicted, _)) = inner.entries.push(key.clone(), translated) {
            if evicted != key {
                inner.stats.evictions += 1;
            }
        }
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.lock().map_or(0, |inner| inner.entries.len())
    }

    pub fn clear(&self) {
        if let Ok(mut inner) = self.lock() {
            inner.entries.clear();
        }
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> CacheStats {
        self.lock().map_or_else(
            |_| CacheStats::default(),
            |inner| CacheStats {
                total_entries: inner.entries.len(),
                ..inner.stats.clone()
            },
        )
    }

    pub fn reset_stats(&self) {
        if let Ok(mut inner) = self.lock() {
            inner.stats.reset();
        }
    }
}

impl<T: Translator> CachedTranslator<T> {
    pub fn new(inner: T, cache: Arc<TranslationCache>) -> Self {
        Self { inner, cache }
    }

    pub fn with_capacity(inner: T, max_size: usize) -> Self {
        Self::new(inner, Arc::new(TranslationCache::with_capacity(max_size)))
    }

    /// 共享的缓存实例
    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: Translator> Translator for CachedTranslator<T> {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        match self.cache.get(request) {
            Ok(Some(hit)) => {
                tracing::debug!("缓存命中: {} 个字符", request.payload.len());
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("缓存查询失败: {}", e),
        }

        let translated = self.inner.translate(request).await?;
        if let Err(e) = self.cache.insert(request, translated.clone()) {
            tracing::warn!("缓存写入失败: {}", e);
        }
        Ok(translated)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// 生成缓存键
pub fn generate_cache_key(text: &str, source_lang: &str, target_lang: &str) -> String {
    format!("{}:{}:{}", source_lang, target_lang, text)
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }

    /// 计算缓存未命中率
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    /// 重置统计信息
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for CountingTranslator {
        async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if request.payload == "fail" {
                return Err(TranslationError::NetworkError("down".to_string()));
            }
            Ok(format!("{}#{}", request.payload.to_uppercase(), n))
        }
    }

    fn request(text: &str, tl: &str) -> TranslationRequest {
        TranslationRequest::new("auto", tl, text)
    }

    #[test]
    fn test_cache_basic_operations() {
        let cache = TranslationCache::with_capacity(10);
        cache.insert(&request("hello", "vi"), "xin chào".to_string()).unwrap();
        assert_eq!(cache.get(&request("hello", "vi")).unwrap(), Some("xin chào".to_string()));
        assert_eq!(cache.get(&request("hello", "ja")).unwrap(), None);
        assert_eq!(cache.size(), 1);

        let stats = cache.get_stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.cache_hits, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);

        cache.clear();
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = TranslationCache::with_capacity(2);
        cache.insert(&request("a", "en"), "A".to_string()).unwrap();
        cache.insert(&request("b", "en"), "B".to_string()).unwrap();
        assert!(cache.get(&request("a", "en")).unwrap().is_some());
        cache.insert(&request("c", "en"), "C".to_string()).unwrap();

        assert!(cache.get(&request("b", "en")).unwrap().is_none());
        assert!(cache.get(&request("a", "en")).unwrap().is_some());
        assert_eq!(cache.get_stats().evictions, 1);
    }

    #[tokio::test]
    async fn test_cached_translator_reuses_results() {
        let translator = CachedTranslator::with_capacity(
            CountingTranslator {
                calls: AtomicUsize::new(0),
            },
            8,
        );

        let first = translator.translate(&request("hi", "en")).await.unwrap();
        let second = translator.translate(&request("hi", "en")).await.unwrap();
        assert_eq!(first, "HI#0");
        assert_eq!(second, first);
        assert_eq!(translator.inner().calls.load(Ordering::SeqCst), 1);

        assert!(translator.translate(&request("fail", "en")).await.is_err());
        assert!(translator.translate(&request("fail", "en")).await.is_err());
        assert_eq!(translator.inner().calls.load(Ordering::SeqCst), 3);
        assert_eq!(translator.cache().size(), 1);
    }
}
