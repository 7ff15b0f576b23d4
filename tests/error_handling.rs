//! 错误处理集成测试
//!
//! 测试错误分类、命令层的前置条件检查和失败报告

use std::cell::RefCell;

use md_editor_pro::commands::{
    run_translate, CommandError, HostEditor, Language, Notifier, TextDocument, TranslateCommand,
};
use md_editor_pro::translation::error::{helpers, ErrorStats};
use md_editor_pro::translation::{
    extract, ConfigManager, ErrorCategory, ErrorSeverity, TranslationError,
};
use md_editor_pro::MdProError;

mod common {
    include!("common/mod.rs");
}

use common::{service_with, RecordingTranslator};

/// 记录通知内容的宿主
#[derive(Default)]
struct RecordingNotifier {
    infos: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
    choice: Option<Language>,
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.infos.borrow_mut().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }

    fn pick_language(&self, choices: &[Language]) -> Option<Language> {
        assert_eq!(choices.len(), 3);
        self.choice
    }
}

fn command(id: &str) -> &'static TranslateCommand {
    TranslateCommand::find(id).expect("命令应当存在")
}

#[test]
fn test_error_classification() {
    let cases = [
        (TranslationError::NetworkError("x".into()), true, ErrorCategory::Network),
        (TranslationError::TimeoutError("x".into()), true, ErrorCategory::Timeout),
        (TranslationError::RateLimitExceeded, false, ErrorCategory::RateLimit),
        (TranslationError::ParseError("x".into()), false, ErrorCategory::Parsing),
        (TranslationError::ConfigError("x".into()), false, ErrorCategory::Configuration),
        (TranslationError::InternalError("x".into()), false, ErrorCategory::Internal),
    ];

    for (error, retryable, category) in cases {
        assert_eq!(error.is_retryable(), retryable, "{error}");
        assert_eq!(error.category(), category, "{error}");
    }

    assert_eq!(
        TranslationError::ConfigError("x".into()).severity(),
        ErrorSeverity::Critical
    );

    println!("✅ 错误分类测试通过");
}

#[test]
fn test_error_context_and_stats() {
    let error = helpers::network_error("连接被拒绝").with_context("translate.googleapis.com");
    assert_eq!(
        error.to_string(),
        "网络错误: 连接被拒绝 (上下文: translate.googleapis.com)"
    );

    let mut stats = ErrorStats::default();
    stats.record_error(&error);
    stats.record_error(&helpers::internal_error("占位符丢失"));
    stats.record_error(&TranslationError::RateLimitExceeded);

    assert_eq!(stats.total_errors, 3);
    assert_eq!(stats.retryable_errors, 1);
    assert_eq!(stats.critical_errors, 1);
    assert_eq!(stats.by_category.get(&ErrorCategory::Network), Some(&1));
    assert!((stats.error_rate(6) - 0.5).abs() < f64::EPSILON);

    stats.reset();
    assert_eq!(stats.total_errors, 0);
}

#[test]
fn test_error_conversions() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    assert!(matches!(
        TranslationError::from(io),
        TranslationError::ProcessingError(_)
    ));

    let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        TranslationError::from(json),
        TranslationError::SerializationError(_)
    ));

    let top: MdProError = TranslationError::RateLimitExceeded.into();
    assert_eq!(top.to_string(), "请求速率过快，已达到限制");
}

#[test]
fn test_reassembly_rejects_broken_residue() {
    let extraction = extract("前言\n```\ncode\n```\n后记");
    assert!(matches!(
        extraction.reassemble("前言\n后记"),
        Err(TranslationError::InternalError(_))
    ));
}

#[test]
fn test_invalid_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "api_url = \"not a url\"\n").unwrap();

    let result = ConfigManager::from_file(path.to_str().unwrap());
    assert!(matches!(result, Err(TranslationError::ConfigError(_))));

    let missing = ConfigManager::from_file(dir.path().join("missing.toml").to_str().unwrap());
    assert!(matches!(missing, Err(TranslationError::ConfigError(_))));
}

#[tokio::test]
async fn test_command_without_editor() {
    let service = service_with(RecordingTranslator::new());
    let notifier = RecordingNotifier::default();

    let result = run_translate::<TextDocument, _>(
        &service,
        command("md-editor-pro.translateToEn"),
        None,
        &notifier,
    )
    .await;

    assert_eq!(result, Err(CommandError::NoActiveEditor));
    assert_eq!(*notifier.errors.borrow(), ["No active editor!"]);
}

#[tokio::test]
async fn test_command_rejects_non_markdown() {
    let service = service_with(RecordingTranslator::new());
    let notifier = RecordingNotifier::default();
    let mut doc = TextDocument::markdown("fn main() {}");
    doc.language_id = "rust".to_string();

    let result = run_translate(
        &service,
        command("md-editor-pro.translateToEn"),
        Some(&mut doc),
        &notifier,
    )
    .await;

    assert_eq!(result, Err(CommandError::NotMarkdown));
    assert_eq!(
        *notifier.errors.borrow(),
        ["This command only works with Markdown files (.md)"]
    );
    assert_eq!(doc.text, "fn main() {}");
}

#[tokio::test]
async fn test_command_requires_selection() {
    let translator = RecordingTranslator::new();
    let service = service_with(translator.clone());
    let notifier = RecordingNotifier::default();
    let mut doc = TextDocument::markdown("xin chào").with_selection(3..3);

    let result = run_translate(
        &service,
        command("md-editor-pro.translateViToEn"),
        Some(&mut doc),
        &notifier,
    )
    .await;

    assert_eq!(result, Err(CommandError::EmptySelection));
    assert_eq!(*notifier.errors.borrow(), ["No text selected!"]);
    assert!(translator.requests().is_empty());
}

#[tokio::test]
async fn test_command_replaces_selection_once() {
    let translator = RecordingTranslator::new();
    let service = service_with(translator.clone());
    let notifier = RecordingNotifier::default();
    let mut doc = TextDocument::markdown("Tiêu đề\n\nxin chào\n\ncuối").with_selection(13..22);
    assert_eq!(doc.text_in(doc.selection()), "xin chào");

    run_translate(
        &service,
        command("md-editor-pro.translateViToEn"),
        Some(&mut doc),
        &notifier,
    )
    .await
    .unwrap();

    assert_eq!(doc.text, "Tiêu đề\n\n[en]xin chào\n\ncuối");
    assert_eq!(translator.requests()[0].source_lang, "vi");
    assert_eq!(*notifier.infos.borrow(), ["Translated to English!"]);
    assert!(notifier.errors.borrow().is_empty());
}

#[tokio::test]
async fn test_command_with_language_picker() {
    let service = service_with(RecordingTranslator::new());
    let notifier = RecordingNotifier {
        choice: Some(Language::Japanese),
        ..Default::default()
    };
    let mut doc = TextDocument::markdown("hello");

    run_translate(&service, command("md-editor-pro.translate"), Some(&mut doc), &notifier)
        .await
        .unwrap();
    assert_eq!(doc.text, "[ja]hello");
    assert_eq!(*notifier.infos.borrow(), ["Translated to 日本語!"]);

    let cancelled = RecordingNotifier::default();
    let mut untouched = TextDocument::markdown("hello");
    run_translate(&service, command("md-editor-pro.translate"), Some(&mut untouched), &cancelled)
        .await
        .unwrap();
    assert_eq!(untouched.text, "hello");
    assert!(cancelled.infos.borrow().is_empty());
}

#[tokio::test]
async fn test_command_reports_translation_failure() {
    let service = service_with(RecordingTranslator::failing_on(&[""]));
    let notifier = RecordingNotifier::default();
    let mut doc = TextDocument::markdown("xin chào");

    let result = run_translate(
        &service,
        command("md-editor-pro.translateToEn"),
        Some(&mut doc),
        &notifier,
    )
    .await;

    assert!(matches!(
        result,
        Err(CommandError::Translation(TranslationError::NetworkError(_)))
    ));
    assert_eq!(doc.text, "xin chào");
    assert!(notifier.errors.borrow()[0].starts_with("Translation failed: "));
}
