// 集成测试公共模块
//
// 提供测试辅助工具和共享功能

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use md_editor_pro::translation::config::TranslationConfig;
use md_editor_pro::translation::{
    TranslationError, TranslationRequest, TranslationResult, TranslationService, Translator,
};

/// 测试配置构建器
pub struct TestConfigBuilder {
    translation_config: TranslationConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut translation_config = TranslationConfig::default();
        translation_config.request_delay_ms = 0;
        translation_config.retry_delay_ms = 1;
        translation_config.cache_enabled = false;
        Self { translation_config }
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.translation_config.api_url = url.to_string();
        self
    }

    pub fn with_request_delay(mut self, delay_ms: u64) -> Self {
        self.translation_config.request_delay_ms = delay_ms;
        self
    }

    pub fn with_retries(mut self, attempts: usize) -> Self {
        self.translation_config.max_retry_attempts = attempts;
        self
    }

    pub fn with_cache(mut self, size: usize) -> Self {
        self.translation_config.cache_enabled = true;
        self.translation_config.cache_size = size;
        self
    }

    pub fn with_diagram_lang(mut self, lang: &str) -> Self {
        self.translation_config.diagram_lang = lang.to_string();
        self
    }

    pub fn build(self) -> TranslationConfig {
        self.translation_config
    }
}

/// 记录所有请求并给译文加上 `[目标语言]` 前缀的翻译器
///
/// `fail_on` 中任一片段出现在请求文本中时返回网络错误。
pub struct RecordingTranslator {
    requests: Mutex<Vec<TranslationRequest>>,
    fail_on: Vec<String>,
}

impl RecordingTranslator {
    pub fn new() -> Arc<Self> {
        Self::failing_on(&[])
    }

    pub fn failing_on(needles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            fail_on: needles.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn requests(&self) -> Vec<TranslationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.payload).collect()
    }
}

#[async_trait]
impl Translator for RecordingTranslator {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_on.iter().any(|needle| request.payload.contains(needle.as_str())) {
            return Err(TranslationError::NetworkError("connection refused".to_string()));
        }
        Ok(format!("[{}]{}", request.target_lang, request.payload))
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// 按固定映射返回译文的翻译器，未知文本原样返回
pub struct DictionaryTranslator {
    entries: Vec<(String, String)>,
}

impl DictionaryTranslator {
    pub fn new(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            entries: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }
}

#[async_trait]
impl Translator for DictionaryTranslator {
    async fn translate(&self, request: &TranslationRequest) -> TranslationResult<String> {
        Ok(self
            .entries
            .iter()
            .find(|(k, _)| *k == request.payload)
            .map_or_else(|| request.payload.clone(), |(_, v)| v.clone()))
    }
}

/// 创建使用注入翻译器的服务
pub fn service_with(translator: Arc<dyn Translator>) -> TranslationService {
    TranslationService::with_translator(TestConfigBuilder::new().build(), translator)
}

/// 测试数据生成器
pub struct TestDataGenerator;

impl TestDataGenerator {
    /// 10 行文档，第 3 行的行内代码中含字符串字面量
    pub fn ten_line_document() -> String {
        [
            "# Hướng dẫn",
            "",
            "Gọi `greet(\"xin chào\")` để chào.",
            "- mục một",
            "- mục hai",
            "",
            "> ghi chú",
            "1. bước đầu",
            "2. bước cuối",
            "Kết thúc",
        ]
        .join("\n")
    }

    /// 含代码块和图表块的文档
    pub fn mixed_document() -> String {
        [
            "# Tài liệu",
            "",
            "```rust",
            "// chú thích",
            "fn main() {}",
            "```",
            "",
            "```mermaid",
            "graph TD",
            "  A[Bắt đầu] --> B[Kết thúc]",
            "```",
            "",
            "Dùng `cargo run` để chạy.",
        ]
        .join("\n")
    }
}

/// 进程内的最小 HTTP 响应器
///
/// 对每个连接返回队列中的下一个 `(状态码, 响应体)`，并记录请求行。
pub struct MockHttpServer {
    pub url: String,
    request_lines: Arc<Mutex<Vec<String>>>,
}

impl MockHttpServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let request_lines = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&request_lines);

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buffer = vec![0u8; 16 * 1024];
                let mut read = 0;
                while !buffer[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buffer[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => read += n,
                    }
                    if read == buffer.len() {
                        break;
                    }
                }
                let request = String::from_utf8_lossy(&buffer[..read]).to_string();
                if let Some(line) = request.lines().next() {
                    recorded.lock().unwrap().push(line.to_string());
                }

                let reason = match status {
                    200 => "OK",
                    429 => "Too Many Requests",
                    _ => "Error",
                };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            url: format!("http://{}/translate_a/single", addr),
            request_lines,
        }
    }

    pub fn request_lines(&self) -> Vec<String> {
        self.request_lines.lock().unwrap().clone()
    }
}

/// 性能测试辅助工具
pub struct PerformanceHelper;

impl PerformanceHelper {
    /// 测量异步执行时间
    pub async fn measure_async_time<F, Fut, R>(f: F) -> (R, Duration)
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = R>,
    {
        let start = std::time::Instant::now();
        let result = f().await;
        (result, start.elapsed())
    }
}
