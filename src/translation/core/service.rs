//! 翻译服务核心实现
//!
//! 本模块把受保护片段提取、逐行翻译和重新拼接组合成完整的 Markdown 翻译流程。
//!
//! ## 处理流程
//!
//! 1. 提取代码块和图表块，余文中以占位符代替
//! 2. 图表块正文统一翻译为 `diagram_lang`，失败时保留原文
//! 3. 余文逐行翻译：保留行首块标记和行尾空白，行内代码中只翻译字符串字面量
//! 4. 把占位符还原为原始或已翻译的片段
//!
//! 所有远程调用严格串行，相邻两次调用之间间隔 `request_delay_ms`。
//! 任一单元翻译失败只影响该单元，保留其原文。图表块失败不计入整体失败判定。
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use md_editor_pro::translation::TranslationService;
//!
//! # async fn demo() -> md_editor_pro::translation::TranslationResult<()> {
//! let service = TranslationService::create_default("en", None)?;
//! let translated = service.translate("# Xin chào", "auto", "en").await?;
//! println!("{}", translated);
//! println!("翻译统计: {:?}", service.get_stats().snapshot());
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

use super::client::{GoogleTranslateClient, TranslationRequest, Translator};
use crate::translation::{
    config::{constants, TranslationConfig},
    error::{helpers, ErrorStats, TranslationError, TranslationResult},
    pipeline::{
        inline::{should_translate, CodePiece, InlineSpan, PreparedLine},
        segments::{Extraction, FenceParts, PlaceholderAllocator, SegmentExtractor, SegmentKind},
    },
    storage::cache::{CacheStats, CachedTranslator, TranslationCache},
};

/// Markdown 翻译服务
///
/// 远程翻译能力以 [`Translator`] 注入，默认使用 [`GoogleTranslateClient`]，
/// 启用缓存时外层包一层 [`CachedTranslator`]。
pub struct TranslationService {
    translator: Arc<dyn Translator>,
    cache: Option<Arc<TranslationCache>>,
    config: TranslationConfig,
    extractor: SegmentExtractor,
    stats: ServiceStats,
}

/// 单次调用内的远程请求状态
///
/// `calls` 包含图表块请求，只用于请求节奏；
/// `attempted` / `succeeded` 只统计文本单元，用于整体失败判定。
#[derive(Debug, Default)]
struct CallState {
    calls: usize,
    attempted: usize,
    succeeded: usize,
    last_error: Option<TranslationError>,
}

impl TranslationService {
    /// 创建新的翻译服务实例
    ///
    /// # 参数
    ///
    /// * `config` - 翻译配置，包含API地址、图表语言、请求节奏和缓存设置
    ///
    /// # 错误
    ///
    /// - 配置验证失败
    /// - HTTP 客户端初始化失败
    pub fn new(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;
        let client = GoogleTranslateClient::new(&config)?;

        let cache = config
            .cache_enabled
            .then(|| Arc::new(TranslationCache::with_capacity(config.cache_size)));
        let translator: Arc<dyn Translator> = match &cache {
            Some(cache) => Arc::new(CachedTranslator::new(client, Arc::clone(cache))),
            None => Arc::new(client),
        };

        Ok(Self {
            translator,
            cache,
            extractor: SegmentExtractor::new(config.diagram_tag.clone()),
            config,
            stats: ServiceStats::default(),
        })
    }

    /// 使用注入的翻译器创建服务，不附加缓存
    pub fn with_translator(config: TranslationConfig, translator: Arc<dyn Translator>) -> Self {
        Self {
            translator,
            cache: None,
            extractor: SegmentExtractor::new(config.diagram_tag.clone()),
            config,
            stats: ServiceStats::default(),
        }
    }

    /// 使用默认配置创建服务
    ///
    /// * `target_lang` - 目标语言代码（如 "en", "vi", "ja"）
    /// * `api_url` - 可选的翻译API地址
    pub fn create_default(target_lang: &str, api_url: Option<&str>) -> TranslationResult<Self> {
        Self::new(TranslationConfig::default_with_lang(target_lang, api_url))
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 按配置中的语言翻译整篇文档
    pub async fn translate_document(&self, text: &str) -> TranslationResult<String> {
        self.translate(text, &self.config.source_lang, &self.config.target_lang)
            .await
    }

    /// 翻译 Markdown 文本
    ///
    /// # 参数
    ///
    /// * `text` - 原文
    /// * `source_lang` - 源语言代码，`auto` 表示自动检测
    /// * `target_lang` - 目标语言代码；图表块始终翻译为 `diagram_lang`
    ///
    /// # 错误
    ///
    /// - 至少发起了一次文本单元调用且全部失败时，返回最后一次的错误；
    ///   图表块失败只保留原文，不参与这一判定
    /// - 占位符还原失败时返回 [`TranslationError::InternalError`]
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslationResult<String> {
        let start_time = Instant::now();
        tracing::info!(
            "开始翻译: {} -> {}，{} 个字符",
            source_lang,
            target_lang,
            text.len()
        );

        let mut allocator = PlaceholderAllocator::for_input(text);
        let extraction = self.extractor.extract_with(text, &mut allocator);
        let mut state = CallState::default();

        let diagrams = self.translate_diagrams(&extraction, &mut state).await;

        let mut lines = Vec::new();
        for line in extraction.residue.split('\n') {
            let translated = self
                .translate_line(line, &extraction, &mut allocator, source_lang, target_lang, &mut state)
                .await;
            lines.push(translated);
        }
        let residue = lines.join("\n");

        let output = extraction
            .restore_with(&residue, |segment| {
                match segment.placeholder().and_then(|p| diagrams.get(p)) {
                    Some(translated) => Cow::Borrowed(translated.as_str()),
                    None => Cow::Borrowed(segment.raw()),
                }
            })
            .map_err(|e| {
                tracing::error!("占位符还原失败: {}", e);
                e
            })?;

        if let Some(leftover) = allocator.find_leftover(&output) {
            tracing::error!("译文中残留占位符: {}", leftover);
            return Err(helpers::internal_error(format!("残留占位符: {}", leftover)));
        }

        self.stats.add_chars_processed(text.chars().count());
        self.stats.add_processing_time(start_time.elapsed());

        if state.attempted > 0 && state.succeeded == 0 {
            if let Some(error) = state.last_error {
                tracing::warn!("全部 {} 个翻译单元失败", state.attempted);
                return Err(error);
            }
        }

        tracing::info!(
            "翻译完成: {} 次请求，文本单元 {}/{} 成功，耗时 {:?}",
            state.calls,
            state.succeeded,
            state.attempted,
            start_time.elapsed()
        );
        Ok(output)
    }

    /// 翻译所有图表块，返回 占位符 → 译后片段
    async fn translate_diagrams(
        &self,
        extraction: &Extraction,
        state: &mut CallState,
    ) -> HashMap<String, String> {
        let mut translated = HashMap::new();

        for segment in extraction.protected() {
            if segment.kind() != Some(SegmentKind::Diagram) {
                continue;
            }
            let (Some(placeholder), Some(parts)) =
                (segment.placeholder(), FenceParts::split(segment.raw()))
            else {
                continue;
            };

            let (lead, core, trail) = split_whitespace(parts.body);
            if !should_translate(core) {
                continue;
            }

            let request = TranslationRequest::new(
                constants::DEFAULT_SOURCE_LANG,
                self.config.diagram_lang.as_str(),
                core,
            );
            match self.call(&request, state).await {
                Ok(text) => {
                    self.stats.inc_diagrams_translated();
                    let body = format!("{}{}{}", lead, text.trim(), trail);
                    translated.insert(placeholder.to_string(), parts.with_body(&body));
                }
                Err(_) => self.stats.inc_diagrams_kept(),
            }
        }

        translated
    }

    async fn translate_line(
        &self,
        line: &str,
        extraction: &Extraction,
        allocator: &mut PlaceholderAllocator,
        source_lang: &str,
        target_lang: &str,
        state: &mut CallState,
    ) -> String {
        if line.trim().is_empty() || extraction.is_placeholder(line.trim()) {
            return line.to_string();
        }
        self.stats.inc_lines_processed();

        let prepared = PreparedLine::prepare(line, allocator);

        let mut span_texts = Vec::with_capacity(prepared.spans.len());
        for span in &prepared.spans {
            span_texts.push(self.translate_span(span, source_lang, target_lang, state).await);
        }

        let mut kept = false;
        let text = if prepared.has_translatable_text() {
            let request = TranslationRequest::new(source_lang, target_lang, prepared.text.as_str());
            self.call_unit(&request, state).await.unwrap_or_else(|| {
                kept = true;
                prepared.text.clone()
            })
        } else {
            prepared.text.clone()
        };

        match prepared.assemble(&text, &span_texts) {
            Some(assembled) => {
                if kept {
                    self.stats.inc_lines_kept();
                } else if assembled != line {
                    self.stats.inc_lines_translated();
                }
                assembled
            }
            None => {
                tracing::warn!("译文丢失或重复了行内占位符，保留原文: {}", line);
                self.stats.inc_lines_kept();
                line.to_string()
            }
        }
    }

    /// 翻译行内代码中的字符串字面量，其余代码原样保留
    async fn translate_span(
        &self,
        span: &InlineSpan,
        source_lang: &str,
        target_lang: &str,
        state: &mut CallState,
    ) -> String {
        if !span.has_literals() {
            return span.raw.clone();
        }

        let mut output = String::with_capacity(span.raw.len());
        for piece in span.pieces() {
            match piece {
                CodePiece::Verbatim(code) => output.push_str(code),
                CodePiece::Literal { quote, content } => {
                    output.push(quote);
                    if should_translate(content) {
                        let request = TranslationRequest::new(source_lang, target_lang, content);
                        match self.call_unit(&request, state).await {
                            Some(text) => output.push_str(&text),
                            None => output.push_str(content),
                        }
                    } else {
                        output.push_str(content);
                    }
                    output.push(quote);
                }
            }
        }
        output
    }

    /// 翻译一个文本单元（行或字符串字面量），失败时返回 `None`
    async fn call_unit(
        &self,
        request: &TranslationRequest,
        state: &mut CallState,
    ) -> Option<String> {
        state.attempted += 1;
        match self.call(request, state).await {
            Ok(text) => {
                state.succeeded += 1;
                Some(text)
            }
            Err(e) => {
                state.last_error = Some(e);
                None
            }
        }
    }

    /// 发起一次远程调用，失败时记入错误统计
    async fn call(
        &self,
        request: &TranslationRequest,
        state: &mut CallState,
    ) -> TranslationResult<String> {
        if state.calls > 0 {
            let delay = self.config.request_delay();
            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }
        }
        state.calls += 1;
        self.stats.inc_requests_sent();

        tracing::debug!(
            "{} 翻译单元: {} -> {}，{} 个字符",
            self.translator.name(),
            request.source_lang,
            request.target_lang,
            request.payload.len()
        );

        match self.translator.translate(request).await {
            Ok(text) => Ok(text),
            Err(e) => {
                self.stats.inc_requests_failed();
                self.stats.record_error(&e);
                helpers::log_error(e)
            }
        }
    }

    /// 获取服务统计信息的只读引用
    pub fn get_stats(&self) -> &ServiceStats {
        &self.stats
    }

    /// 重置所有统计信息
    pub fn reset_stats(&mut self) {
        self.stats.reset();
        if let Some(cache) = &self.cache {
            cache.reset_stats();
        }
    }

    /// 缓存统计，未启用缓存时为 `None`
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.get_stats())
    }
}

/// 拆出首尾空白
fn split_whitespace(text: &str) -> (&str, &str, &str) {
    let trimmed_start = text.trim_start();
    let lead = &text[..text.len() - trimmed_start.len()];
    let core = trimmed_start.trim_end();
    let trail = &trimmed_start[core.len()..];
    (lead, core, trail)
}

/// 翻译服务统计信息（线程安全版本）
///
/// 所有字段都使用原子类型，统计在调用过程中即时更新。
///
/// - `requests_sent` / `requests_failed`: 远程调用次数和失败次数
/// - `lines_processed`: 含有内容的行数
/// - `lines_translated` / `lines_kept`: 译文被采用的行数和保留原文的行数
/// - `diagrams_translated` / `diagrams_kept`: 图表块翻译结果
/// - `processing_time`: 总处理时间（微秒）
/// - `errors`: 失败请求按类别和严重程度的分布
#[derive(Debug, Default)]
pub struct ServiceStats {
    pub requests_sent: AtomicUsize,
    pub requests_failed: AtomicUsize,
    pub lines_processed: AtomicUsize,
    pub lines_translated: AtomicUsize,
    pub lines_kept: AtomicUsize,
    pub diagrams_translated: AtomicUsize,
    pub diagrams_kept: AtomicUsize,
    /// 总处理时间，以微秒为单位存储
    pub processing_time: AtomicU64,
    pub total_chars_processed: AtomicUsize,
    errors: Mutex<ErrorStats>,
}

impl ServiceStats {
    pub fn inc_requests_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_lines_processed(&self) {
        self.lines_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_lines_translated(&self) {
        self.lines_translated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_lines_kept(&self) {
        self.lines_kept.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_diagrams_translated(&self) {
        self.diagrams_translated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_diagrams_kept(&self) {
        self.diagrams_kept.fetch_add(1, Ordering::Relaxed);
    }

    /// 添加处理时间
    ///
    /// 时间以微秒精度存储。
    pub fn add_processing_time(&self, duration: Duration) {
        self.processing_time
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn add_chars_processed(&self, count: usize) {
        self.total_chars_processed
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_error(&self, error: &TranslationError) {
        if let Ok(mut errors) = self.errors.lock() {
            errors.record_error(error);
        }
    }

    /// 失败请求的错误分布
    pub fn error_stats(&self) -> ErrorStats {
        self.errors
            .lock()
            .map(|errors| errors.clone())
            .unwrap_or_default()
    }

    /// 获取统计数据快照
    ///
    /// ```rust,ignore
    /// let snapshot = service.get_stats().snapshot();
    /// println!("失败率: {:.2}%", 100.0 * snapshot.failure_rate());
    /// ```
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            lines_processed: self.lines_processed.load(Ordering::Relaxed),
            lines_translated: self.lines_translated.load(Ordering::Relaxed),
            lines_kept: self.lines_kept.load(Ordering::Relaxed),
            diagrams_translated: self.diagrams_translated.load(Ordering::Relaxed),
            diagrams_kept: self.diagrams_kept.load(Ordering::Relaxed),
            processing_time: Duration::from_micros(self.processing_time.load(Ordering::Relaxed)),
            total_chars_processed: self.total_chars_processed.load(Ordering::Relaxed),
        }
    }

    /// 重置所有统计计数器
    pub fn reset(&mut self) {
        *self = Default::default();
    }
}

/// 翻译服务统计数据的不可变快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatsSnapshot {
    pub requests_sent: usize,
    pub requests_failed: usize,
    pub lines_processed: usize,
    pub lines_translated: usize,
    pub lines_kept: usize,
    pub diagrams_translated: usize,
    pub diagrams_kept: usize,
    pub processing_time: Duration,
    pub total_chars_processed: usize,
}

impl ServiceStatsSnapshot {
    /// 远程调用失败率
    pub fn failure_rate(&self) -> f64 {
        if self.requests_sent == 0 {
            0.0
        } else {
            self.requests_failed as f64 / self.requests_sent as f64
        }
    }
}
