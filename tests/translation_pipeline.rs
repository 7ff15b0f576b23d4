//! 翻译管道集成测试
//!
//! 测试片段提取、逐行翻译和重新拼接的端到端行为

use std::sync::Arc;
use std::time::Duration;

use md_editor_pro::translation::{
    CachedTranslator, TranslationError, TranslationService, Translator,
};

mod common {
    include!("common/mod.rs");
}

use common::{
    service_with, DictionaryTranslator, MockHttpServer, PerformanceHelper, RecordingTranslator,
    TestConfigBuilder, TestDataGenerator,
};

/// 图表块始终翻译为英文，其余内容翻译为调用方的目标语言
#[tokio::test]
async fn test_diagram_target_is_forced() {
    let translator = RecordingTranslator::new();
    let service = service_with(translator.clone());

    let output = service
        .translate(&TestDataGenerator::mixed_document(), "vi", "ja")
        .await
        .expect("翻译应当成功");

    let requests = translator.requests();
    let diagram = requests
        .iter()
        .find(|r| r.payload.starts_with("graph TD"))
        .expect("图表正文应当被发送");
    assert_eq!(diagram.source_lang, "auto");
    assert_eq!(diagram.target_lang, "en");
    assert_eq!(diagram.payload, "graph TD\n  A[Bắt đầu] --> B[Kết thúc]");

    assert!(requests
        .iter()
        .filter(|r| !r.payload.starts_with("graph TD"))
        .all(|r| r.target_lang == "ja" && r.source_lang == "vi"));

    assert!(output.contains("```rust\n// chú thích\nfn main() {}\n```"));
    assert!(output.contains("```mermaid\n[en]graph TD\n  A[Bắt đầu] --> B[Kết thúc]\n```"));
    assert!(output.contains("[ja]Dùng `cargo run` để chạy."));
    assert!(output.starts_with("# [ja]Tài liệu\n\n"));

    println!("✅ 图表目标语言测试通过");
}

/// 第 3 行行内代码中的字面量翻译失败，只影响该字面量
#[tokio::test]
async fn test_literal_failure_is_isolated() {
    let translator = RecordingTranslator::failing_on(&["xin chào"]);
    let service = service_with(translator.clone());

    let output = service
        .translate(&TestDataGenerator::ten_line_document(), "vi", "en")
        .await
        .expect("部分失败不应导致整体失败");

    let expected = [
        "# [en]Hướng dẫn",
        "",
        "[en]Gọi `greet(\"xin chào\")` để chào.",
        "- [en]mục một",
        "- [en]mục hai",
        "",
        "> [en]ghi chú",
        "1. [en]bước đầu",
        "2. [en]bước cuối",
        "[en]Kết thúc",
    ]
    .join("\n");
    assert_eq!(output, expected);

    let snapshot = service.get_stats().snapshot();
    assert_eq!(snapshot.requests_sent, 9);
    assert_eq!(snapshot.requests_failed, 1);

    println!("✅ 字面量失败隔离测试通过");
}

/// 整行翻译失败时保留该行原文
#[tokio::test]
async fn test_failed_line_keeps_original() {
    let translator = RecordingTranslator::failing_on(&["để chào"]);
    let service = service_with(translator);

    let output = service
        .translate(&TestDataGenerator::ten_line_document(), "vi", "en")
        .await
        .unwrap();
    let lines: Vec<&str> = output.split('\n').collect();
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[2], "Gọi `greet(\"[en]xin chào\")` để chào.");
    assert_eq!(lines[3], "- [en]mục một");
    assert_eq!(service.get_stats().snapshot().lines_kept, 1);
}

/// 译文丢失占位符时整行回退为原文
#[tokio::test]
async fn test_lost_placeholder_falls_back() {
    let translator = DictionaryTranslator::new(&[("Chạy __INLINE_CODE_0__ ngay", "Run it now")]);
    let service = service_with(translator);

    let output = service.translate("Chạy `make` ngay\nxong", "vi", "en").await.unwrap();
    assert_eq!(output, "Chạy `make` ngay\nxong");
}

/// 输入中已有占位符形式的文本时不会被误还原
#[tokio::test]
async fn test_placeholder_lookalikes_survive() {
    let translator = DictionaryTranslator::new(&[]);
    let service = service_with(translator);
    let input = "Literal __CODE_BLOCK_0__ and __INLINE_CODE_0__\n```\ncode\n```\nUse `x` here";

    let output = service.translate(input, "auto", "en").await.unwrap();
    assert_eq!(output, input);
}

#[tokio::test]
async fn test_unreachable_endpoint_fails_whole_call() {
    let translator = RecordingTranslator::failing_on(&[""]);
    let service = service_with(translator);

    let result = service.translate("một\nhai\nba", "vi", "en").await;
    assert!(matches!(result, Err(TranslationError::NetworkError(_))));
}

/// 图表块翻译失败只保留原文，即使文档中没有其他可翻译内容
#[tokio::test]
async fn test_failed_diagram_never_fails_whole_call() {
    let translator = RecordingTranslator::failing_on(&["graph"]);
    let service = service_with(translator.clone());

    let diagram_only = "```mermaid\ngraph TD\n  A --> B\n```";
    let output = service.translate(diagram_only, "vi", "en").await.unwrap();
    assert_eq!(output, diagram_only);

    let with_code_line = "`x = 1`\n```mermaid\ngraph TD\n```";
    let output = service.translate(with_code_line, "vi", "en").await.unwrap();
    assert_eq!(output, with_code_line);

    assert_eq!(translator.requests().len(), 2);
    let snapshot = service.get_stats().snapshot();
    assert_eq!(snapshot.diagrams_kept, 2);
    assert_eq!(snapshot.requests_failed, 2);

    let errors = service.get_stats().error_stats();
    assert_eq!(errors.total_errors, 2);
    assert_eq!(errors.retryable_errors, 2);

    println!("✅ 图表失败隔离测试通过");
}

/// 图表块请求同样参与请求间隔
#[tokio::test]
async fn test_diagram_requests_are_paced() {
    let translator = RecordingTranslator::new();
    let config = TestConfigBuilder::new().with_request_delay(30).build();
    let service = TranslationService::with_translator(config, translator.clone());

    let (result, elapsed) = PerformanceHelper::measure_async_time(|| {
        service.translate("```mermaid\ngraph TD\n```\nmột", "vi", "en")
    })
    .await;
    result.unwrap();

    assert_eq!(translator.requests().len(), 2);
    assert!(elapsed >= Duration::from_millis(30), "elapsed: {:?}", elapsed);
}

#[tokio::test]
async fn test_requests_are_paced() {
    let translator = RecordingTranslator::new();
    let config = TestConfigBuilder::new().with_request_delay(30).build();
    let service = TranslationService::with_translator(config, translator.clone());

    let (result, elapsed) =
        PerformanceHelper::measure_async_time(|| service.translate("một\nhai\nba", "vi", "en")).await;
    result.unwrap();

    assert_eq!(translator.requests().len(), 3);
    assert!(elapsed >= Duration::from_millis(60), "elapsed: {:?}", elapsed);
}

#[tokio::test]
async fn test_custom_diagram_lang() {
    let translator = RecordingTranslator::new();
    let config = TestConfigBuilder::new().with_diagram_lang("fr").build();
    let service = TranslationService::with_translator(config, translator.clone());

    service
        .translate("```mermaid\nA --> B\n```", "auto", "en")
        .await
        .unwrap();
    assert_eq!(translator.requests()[0].target_lang, "fr");
}

#[tokio::test]
async fn test_cached_translator_in_pipeline() {
    let translator = RecordingTranslator::new();
    let cached: Arc<dyn Translator> = Arc::new(CachedTranslator::with_capacity(translator.clone(), 16));
    let service = service_with(cached);

    let output = service.translate("lặp lại\nlặp lại\nlặp lại", "vi", "en").await.unwrap();
    assert_eq!(output, "[en]lặp lại\n[en]lặp lại\n[en]lặp lại");
    assert_eq!(translator.payloads(), ["lặp lại"]);
}

/// HTTP 客户端的请求格式和响应解析
#[tokio::test]
async fn test_http_wire_format() {
    let server = MockHttpServer::start(vec![(
        200,
        r#"[[["Hello ","Xin chào ",null,null,10],["world","thế giới",null,null,10]],null,"vi"]"#
            .to_string(),
    )])
    .await;
    let config = TestConfigBuilder::new().with_api_url(&server.url).build();
    let service = TranslationService::new(config).unwrap();

    let output = service.translate("Xin chào thế giới", "vi", "en").await.unwrap();
    assert_eq!(output, "Hello world");

    let lines = server.request_lines();
    assert_eq!(lines.len(), 1);
    assert!(
        lines[0].starts_with(
            "GET /translate_a/single?client=gtx&sl=vi&tl=en&dt=t&q=Xin%20ch%C3%A0o%20th%E1%BA%BF%20gi%E1%BB%9Bi "
        ),
        "request line: {}",
        lines[0]
    );

    println!("✅ HTTP 请求格式测试通过");
}

#[tokio::test]
async fn test_http_rate_limit_is_reported() {
    let server = MockHttpServer::start(vec![(429, String::new())]).await;
    let config = TestConfigBuilder::new()
        .with_api_url(&server.url)
        .with_retries(0)
        .build();
    let service = TranslationService::new(config).unwrap();

    let result = service.translate("Xin chào", "vi", "en").await;
    assert_eq!(result, Err(TranslationError::RateLimitExceeded));
}

#[tokio::test]
async fn test_http_server_error_is_retried() {
    let server = MockHttpServer::start(vec![
        (500, String::new()),
        (200, r#"[[["Retried","Thử lại"]]]"#.to_string()),
    ])
    .await;
    let config = TestConfigBuilder::new()
        .with_api_url(&server.url)
        .with_retries(1)
        .build();
    let service = TranslationService::new(config).unwrap();

    let output = service.translate("Thử lại", "vi", "en").await.unwrap();
    assert_eq!(output, "Retried");
    assert_eq!(server.request_lines().len(), 2);
}

#[tokio::test]
async fn test_http_malformed_body_keeps_original() {
    let server = MockHttpServer::start(vec![
        (200, r#"{"error":"bad"}"#.to_string()),
        (200, r#"[[["Fine","Ổn"]]]"#.to_string()),
    ])
    .await;
    let config = TestConfigBuilder::new().with_api_url(&server.url).build();
    let service = TranslationService::new(config).unwrap();

    let output = service.translate("Hỏng\nỔn", "vi", "en").await.unwrap();
    assert_eq!(output, "Hỏng\nFine");
}
