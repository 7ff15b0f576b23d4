//! 翻译接口客户端
//!
//! [`Translator`] 是流水线唯一依赖的远程能力，一次调用翻译一段文本。
//! [`GoogleTranslateClient`] 通过 HTTP GET 调用公开的翻译接口：
//!
//! ```text
//! GET {api_url}?client=gtx&sl={sl}&tl={tl}&dt=t&q={q}
//! ```
//!
//! 响应是 JSON 数组，第一个元素是 `[译文, 原文, ...]` 数组的列表，
//! 结果为各译文片段按顺序拼接。

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{helpers, TranslationResult};

/// `encodeURIComponent` 保留的字符之外全部编码
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// 单次翻译请求
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationRequest {
    /// 源语言代码，`auto` 表示自动检测
    pub source_lang: String,
    pub target_lang: String,
    pub payload: String,
}

impl TranslationRequest {
    pub fn new(
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            payload: payload.into(),
        }
    }
}

/// 翻译能力
#[async_trait]
pub trait Translator: Send + Sync {
    /// 翻译一段文本
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String>;

    /// 用于日志的名称
    fn name(&self) -> &str {
        "translator"
    }
}

#[async_trait]
impl<T: Translator + ?Sized> Translator for std::sync::Arc<T> {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        (**self).translate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// 公开翻译接口的 HTTP 客户端
#[derive(Debug, Clone)]
pub struct GoogleTranslateClient {
    http: reqwest::Client,
    api_url: String,
    client_id: String,
    max_retry_attempts: usize,
    retry_delay_ms: u64,
}

impl GoogleTranslateClient {
    /// 根据配置创建客户端
    ///
    /// # 错误
    ///
    /// HTTP 客户端构建失败时返回 [`TranslationError::ConfigError`](crate::translation::TranslationError::ConfigError)。
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("mdpro/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| helpers::config_error(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            client_id: config.client.clone(),
            max_retry_attempts: config.max_retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
        })
    }

    /// 构造请求地址
    pub fn request_url(&self, request: &TranslationRequest) -> String {
        let separator = if self.api_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}client={}&sl={}&tl={}&dt=t&q={}",
            self.api_url,
            separator,
            encode(&self.client_id),
            encode(&request.source_lang),
            encode(&request.target_lang),
            encode(&request.payload),
        )
    }

    async fn send_once(&self, url: &str) -> TranslationResult<String> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        parse_translation_response(&body)
    }

    fn backoff(&self, attempt: usize) -> std::time::Duration {
        let factor = 1u64.checked_shl(attempt as u32).unwrap_or(u64::MAX);
        let delay = self
            .retry_delay_ms
            .saturating_mul(factor)
            .min(constants::MAX_RETRY_DELAY_MS);
        std::time::Duration::from_millis(delay)
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        if request.payload.trim().is_empty() {
            return Ok(request.payload.clone());
        }
        let length = request.payload.chars().count();
        if length > constants::MAX_PAYLOAD_CHARS {
            return Err(helpers::validation_error(format!(
                "文本过长: {} 个字符，最多 {} 个",
                length,
                constants::MAX_PAYLOAD_CHARS
            )));
        }

        let url = self.request_url(request);
        let mut attempt = 0;
        loop {
            tracing::debug!(
                "发送翻译请求: {} -> {} ({} 个字符, 第 {} 次)",
                request.source_lang,
                request.target_lang,
                length,
                attempt + 1
            );

            match self.send_once(&url).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_retry_attempts => {
                    let delay = self.backoff(attempt);
                    tracing::warn!("翻译请求失败，{:?} 后重试: {}", delay, e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(e.with_context(format!(
                        "{} -> {}",
                        request.source_lang, request.target_lang
                    )))
                }
            }
        }
    }

    fn name(&self) -> &str {
        "google-translate"
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

/// 解析接口响应
///
/// 第一个元素必须是数组，其中每个元素的第一个成员为字符串或 `null`。
pub fn parse_translation_response(body: &str) -> TranslationResult<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| helpers::parse_error(format!("响应不是有效的JSON: {}", e)))?;

    let sentences = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| helpers::parse_error("响应缺少译文数组"))?;

    let mut translated = String::new();
    for sentence in sentences {
        match sentence.get(0) {
            Some(Value::String(text)) => translated.push_str(text),
            Some(Value::Null) => {}
            _ => {
                return Err(helpers::parse_error(format!("译文片段格式无效: {}", sentence)))
            }
        }
    }
    Ok(translated)
}
