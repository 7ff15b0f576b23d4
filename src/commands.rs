//! 翻译命令层
//!
//! 宿主编辑器的能力通过 [`HostEditor`] 和 [`Notifier`] 注入。
//! 命令读取当前选区，等待翻译流程完成后一次性替换选区内容。

use std::ops::Range;

use thiserror::Error;

use crate::translation::{TranslationError, TranslationService};

/// 宿主文档的语言标识
pub const MARKDOWN_LANGUAGE_ID: &str = "markdown";

/// 命令错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("No active editor!")]
    NoActiveEditor,

    #[error("This command only works with Markdown files (.md)")]
    NotMarkdown,

    /// 提示性错误，不代表失败
    #[error("No text selected!")]
    EmptySelection,

    #[error("Translation failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("Edit was rejected: {0}")]
    EditRejected(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// 支持的目标语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Vietnamese,
    Japanese,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Vietnamese, Language::Japanese];

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Vietnamese => "vi",
            Language::Japanese => "ja",
        }
    }

    /// 成功提示中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Vietnamese => "Vietnamese",
            Language::Japanese => "Japanese",
        }
    }

    /// 语言选择列表中显示的名称
    pub fn native_label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Vietnamese => "Tiếng Việt",
            Language::Japanese => "日本語",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(code))
    }
}

/// 翻译命令的目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Fixed(Language),
    /// 由用户在列表中选择
    Ask,
}

/// 已注册的翻译命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslateCommand {
    pub id: &'static str,
    /// `None` 表示自动检测源语言
    pub source: Option<Language>,
    pub target: Target,
}

use Language::{English, Japanese, Vietnamese};

pub const TRANSLATE_COMMANDS: &[TranslateCommand] = &[
    TranslateCommand { id: "md-editor-pro.translate", source: None, target: Target::Ask },
    TranslateCommand { id: "md-editor-pro.translateToEn", source: None, target: Target::Fixed(English) },
    TranslateCommand { id: "md-editor-pro.translateToVi", source: None, target: Target::Fixed(Vietnamese) },
    TranslateCommand { id: "md-editor-pro.translateToJa", source: None, target: Target::Fixed(Japanese) },
    TranslateCommand { id: "md-editor-pro.translateViToEn", source: Some(Vietnamese), target: Target::Fixed(English) },
    TranslateCommand { id: "md-editor-pro.translateEnToVi", source: Some(English), target: Target::Fixed(Vietnamese) },
    TranslateCommand { id: "md-editor-pro.translateViToJa", source: Some(Vietnamese), target: Target::Fixed(Japanese) },
    TranslateCommand { id: "md-editor-pro.translateJaToVi", source: Some(Japanese), target: Target::Fixed(Vietnamese) },
    TranslateCommand { id: "md-editor-pro.translateEnToJa", source: Some(English), target: Target::Fixed(Japanese) },
    TranslateCommand { id: "md-editor-pro.translateJaToEn", source: Some(Japanese), target: Target::Fixed(English) },
];

impl TranslateCommand {
    /// 按命令标识查找
    pub fn find(id: &str) -> Option<&'static TranslateCommand> {
        TRANSLATE_COMMANDS.iter().find(|command| command.id == id)
    }

    pub fn resolve(id: &str) -> Result<&'static TranslateCommand, CommandError> {
        Self::find(id).ok_or_else(|| CommandError::UnknownCommand(id.to_string()))
    }

    pub fn source_code(&self) -> &'static str {
        self.source.map_or("auto", Language::code)
    }
}

/// 宿主文档
pub trait HostEditor {
    fn language_id(&self) -> &str;

    /// 当前选区，UTF-8 字节偏移
    fn selection(&self) -> Range<usize>;

    fn text_in(&self, range: Range<usize>) -> String;

    /// 原子替换一段文本
    fn replace(&mut self, range: Range<usize>, text: &str) -> Result<(), CommandError>;
}

/// 宿主通知能力
pub trait Notifier {
    fn info(&self, message: &str);

    fn error(&self, message: &str);

    /// 让用户选择目标语言，取消时返回 `None`
    fn pick_language(&self, choices: &[Language]) -> Option<Language>;
}

/// 内存中的文档，供命令行和测试使用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    pub language_id: String,
    pub text: String,
    pub selection: Range<usize>,
}

impl TextDocument {
    pub fn markdown(text: impl Into<String>) -> Self {
        let text = text.into();
        let selection = 0..text.len();
        Self {
            language_id: MARKDOWN_LANGUAGE_ID.to_string(),
            text,
            selection,
        }
    }

    pub fn with_selection(mut self, selection: Range<usize>) -> Self {
        self.selection = selection;
        self
    }
}

impl HostEditor for TextDocument {
    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    fn text_in(&self, range: Range<usize>) -> String {
        self.text.get(range).unwrap_or_default().to_string()
    }

    fn replace(&mut self, range: Range<usize>, text: &str) -> Result<(), CommandError> {
        if range.start > range.end
            || range.end > self.text.len()
            || !self.text.is_char_boundary(range.start)
            || !self.text.is_char_boundary(range.end)
        {
            return Err(CommandError::EditRejected(format!(
                "范围 {}..{} 无效",
                range.start, range.end
            )));
        }
        self.text.replace_range(range.clone(), text);
        self.selection = range.start..range.start + text.len();
        Ok(())
    }
}

/// 执行翻译命令
///
/// 校验编辑器、文档语言和选区后调用翻译流程，成功时替换选区并提示。
/// 所有错误都会先通过 `notifier` 报告再返回；用户取消语言选择时直接返回。
pub async fn run_translate<E, N>(
    service: &TranslationService,
    command: &TranslateCommand,
    editor: Option<&mut E>,
    notifier: &N,
) -> Result<(), CommandError>
where
    E: HostEditor + ?Sized,
    N: Notifier + ?Sized,
{
    let result = translate_selection(service, command, editor, notifier).await;
    if let Err(e) = &result {
        tracing::warn!("命令 {} 失败: {}", command.id, e);
        notifier.error(&e.to_string());
    }
    result
}

async fn translate_selection<E, N>(
    service: &TranslationService,
    command: &TranslateCommand,
    editor: Option<&mut E>,
    notifier: &N,
) -> Result<(), CommandError>
where
    E: HostEditor + ?Sized,
    N: Notifier + ?Sized,
{
    let editor = editor.ok_or(CommandError::NoActiveEditor)?;
    if editor.language_id() != MARKDOWN_LANGUAGE_ID {
        return Err(CommandError::NotMarkdown);
    }

    let range = editor.selection();
    let text = editor.text_in(range.clone());
    if text.is_empty() {
        return Err(CommandError::EmptySelection);
    }

    let target = match command.target {
        Target::Fixed(language) => language,
        Target::Ask => match notifier.pick_language(&Language::ALL) {
            Some(language) => language,
            None => {
                tracing::debug!("用户取消了语言选择");
                return Ok(());
            }
        },
    };

    let translated = service
        .translate(&text, command.source_code(), target.code())
        .await?;
    editor.replace(range, &translated)?;

    let label = match command.target {
        Target::Ask => target.native_label(),
        Target::Fixed(_) => target.name(),
    };
    notifier.info(&format!("Translated to {}!", label));
    Ok(())
}
