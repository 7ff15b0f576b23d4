//! 工具栏格式化操作
//!
//! 每个工具栏按钮对应一个 [`ToolbarAction`]。编辑类操作先根据当前选区
//! 生成 [`EditPlan`]，再交给编辑引擎执行：
//!
//! - 选区非空：包裹或加前缀后调用 `replace_selection`
//! - 选区为空：调用 `insert_template` 并选中占位文本，或在光标处插入前缀
//!
//! 格式化不识别已有标记，对 `**world**` 中的 `world` 再次加粗会得到
//! `****world****`。

use std::str::FromStr;

use tracing::{debug, warn};

use super::context::{EditorContext, HostChannel};
use super::engine::{Selection, TextEditEngine};
use super::error::{EditError, EditResult};
use super::surface::EditSurface;

/// 导出 PDF 的宿主命令
pub const EXPORT_PDF_COMMAND: &str = "md-editor-pro.exportPdfFile";

/// 翻译选中文本的宿主命令
pub const TRANSLATE_COMMAND: &str = "md-editor-pro.translate";

/// 表格模板（3 列 2 行）
pub const TABLE_TEMPLATE: &str = "| Header 1 | Header 2 | Header 3 |
| -------- | -------- | -------- |
| Cell 1   | Cell 2   | Cell 3   |
| Cell 4   | Cell 5   | Cell 6   |
";

/// 工具栏操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarAction {
    /// 标题，级别 1-6
    Heading(u8),
    Bold,
    Italic,
    Strikethrough,
    Highlight,
    InlineCode,
    CodeBlock,
    Link,
    Image,
    Quote,
    UnorderedList,
    OrderedList,
    TaskList,
    Table,
    InsertEmoji(String),
    HeadingToggle,
    EmojiToggle,
    ExportPdf,
    Translate,
}

/// 操作类别，决定执行后是否重新聚焦编辑器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// 修改缓冲区
    Edit,
    /// 展开或收起菜单
    Toggle,
    /// 交给宿主执行
    Host,
}

impl ToolbarAction {
    /// 从按钮的 `data-action` 属性解析操作
    ///
    /// `insert-emoji` 需要同时提供按钮上的 `data-emoji` 属性。
    pub fn from_data_action(action: &str, emoji: Option<&str>) -> EditResult<Self> {
        let parsed = match action {
            "heading1" => Self::Heading(1),
            "heading2" => Self::Heading(2),
            "heading3" => Self::Heading(3),
            "heading4" => Self::Heading(4),
            "heading5" => Self::Heading(5),
            "heading6" => Self::Heading(6),
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "strikethrough" => Self::Strikethrough,
            "highlight" => Self::Highlight,
            "inline-code" => Self::InlineCode,
            "code" => Self::CodeBlock,
            "link" => Self::Link,
            "image" => Self::Image,
            "quote" => Self::Quote,
            "unordered-list" => Self::UnorderedList,
            "ordered-list" => Self::OrderedList,
            "task-list" => Self::TaskList,
            "table" => Self::Table,
            "insert-emoji" => Self::InsertEmoji(emoji.unwrap_or_default().to_string()),
            "heading-toggle" => Self::HeadingToggle,
            "emoji-toggle" => Self::EmojiToggle,
            "export-pdf" => Self::ExportPdf,
            "translate" => Self::Translate,
            other => return Err(EditError::UnknownAction(other.to_string())),
        };
        Ok(parsed)
    }

    /// 操作对应的 `data-action` 名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Heading(1) => "heading1",
            Self::Heading(2) => "heading2",
            Self::Heading(3) => "heading3",
            Self::Heading(4) => "heading4",
            Self::Heading(5) => "heading5",
            Self::Heading(_) => "heading6",
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Strikethrough => "strikethrough",
            Self::Highlight => "highlight",
            Self::InlineCode => "inline-code",
            Self::CodeBlock => "code",
            Self::Link => "link",
            Self::Image => "image",
            Self::Quote => "quote",
            Self::UnorderedList => "unordered-list",
            Self::OrderedList => "ordered-list",
            Self::TaskList => "task-list",
            Self::Table => "table",
            Self::InsertEmoji(_) => "insert-emoji",
            Self::HeadingToggle => "heading-toggle",
            Self::EmojiToggle => "emoji-toggle",
            Self::ExportPdf => "export-pdf",
            Self::Translate => "translate",
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::HeadingToggle | Self::EmojiToggle => ActionKind::Toggle,
            Self::ExportPdf | Self::Translate => ActionKind::Host,
            _ => ActionKind::Edit,
        }
    }

    /// 宿主操作对应的命令标识
    pub fn host_command(&self) -> Option<&'static str> {
        match self {
            Self::ExportPdf => Some(EXPORT_PDF_COMMAND),
            Self::Translate => Some(TRANSLATE_COMMAND),
            _ => None,
        }
    }

    /// 根据选中文本生成编辑计划
    ///
    /// 非编辑类操作以及没有表情内容的 `insert-emoji` 返回 `None`。
    pub fn plan(&self, selected: &str) -> Option<EditPlan> {
        let has_selection = !selected.is_empty();
        let plan = match self {
            Self::Heading(level) => {
                let marker = format!("{} ", "#".repeat((*level).clamp(1, 6) as usize));
                if has_selection {
                    EditPlan::Replace(prefix_lines(selected, |_| marker.clone()))
                } else {
                    EditPlan::InsertAtCursor(marker)
                }
            }
            Self::Bold => wrap(selected, "**", "bold text"),
            Self::Italic => wrap(selected, "*", "italic text"),
            Self::Strikethrough => wrap(selected, "~~", "strikethrough text"),
            Self::Highlight => wrap(selected, "==", "highlight text"),
            Self::InlineCode => wrap(selected, "`", "code"),
            Self::CodeBlock => {
                if has_selection {
                    EditPlan::Replace(format!("```\n{selected}\n```"))
                } else {
                    EditPlan::template("```\n", "\n```", "code")
                }
            }
            Self::Link => {
                if has_selection {
                    EditPlan::template(format!("[{selected}]("), ")", "url")
                } else {
                    EditPlan::template("[", "](url)", "link text")
                }
            }
            Self::Image => {
                if has_selection {
                    EditPlan::template(format!("![{selected}]("), ")", "image-url")
                } else {
                    EditPlan::template("![", "](image-url)", "alt text")
                }
            }
            Self::Quote => block(selected, |_| "> ".to_string()),
            Self::UnorderedList => block(selected, |_| "- ".to_string()),
            Self::OrderedList => block(selected, |n| format!("{n}. ")),
            Self::TaskList => block(selected, |_| "- [ ] ".to_string()),
            Self::Table => EditPlan::InsertAtCursor(TABLE_TEMPLATE.to_string()),
            Self::InsertEmoji(emoji) if !emoji.is_empty() => {
                EditPlan::InsertAtCursor(emoji.clone())
            }
            _ => return None,
        };
        Some(plan)
    }
}

impl FromStr for ToolbarAction {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_data_action(s, None)
    }
}

/// 编辑计划，对应编辑引擎的一个原语
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPlan {
    Replace(String),
    Template {
        prefix: String,
        suffix: String,
        default_content: String,
    },
    InsertAtCursor(String),
}

impl EditPlan {
    fn template(
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        default_content: impl Into<String>,
    ) -> Self {
        Self::Template {
            prefix: prefix.into(),
            suffix: suffix.into(),
            default_content: default_content.into(),
        }
    }

    /// 在编辑引擎上执行
    pub fn apply<S: EditSurface>(&self, engine: &mut TextEditEngine<S>) -> EditResult<Selection> {
        match self {
            Self::Replace(text) => engine.replace_selection(text),
            Self::Template {
                prefix,
                suffix,
                default_content,
            } => engine.insert_template(prefix, suffix, default_content),
            Self::InsertAtCursor(text) => engine.insert_at_cursor(text),
        }
    }
}

fn wrap(selected: &str, marker: &str, placeholder: &str) -> EditPlan {
    if selected.is_empty() {
        EditPlan::template(marker, marker, placeholder)
    } else {
        EditPlan::Replace(format!("{marker}{selected}{marker}"))
    }
}

fn block<F>(selected: &str, prefix: F) -> EditPlan
where
    F: FnMut(usize) -> String,
{
    if selected.is_empty() {
        let mut prefix = prefix;
        EditPlan::InsertAtCursor(prefix(1))
    } else {
        EditPlan::Replace(prefix_lines(selected, prefix))
    }
}

/// 给每个非空白行加前缀
///
/// 按 `\n` 切分，只含空白的行原样保留，`prefix` 收到的序号从 1 开始，
/// 只对加了前缀的行计数。
pub fn prefix_lines<F>(text: &str, mut prefix: F) -> String
where
    F: FnMut(usize) -> String,
{
    let mut counter = 0;
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                counter += 1;
                format!("{}{}", prefix(counter), line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 工具栏下拉菜单
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Heading,
    Emoji,
}

/// 工具栏操作的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// 缓冲区已修改
    Edited(Selection),
    /// 菜单状态变化
    MenuToggled { menu: Menu, open: bool },
    /// 已向宿主发送命令
    Posted(&'static str),
    /// 没有可执行的内容
    Skipped,
}

/// 键盘组合键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: char,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyChord {
    pub fn ctrl(key: char) -> Self {
        Self {
            key,
            ctrl: true,
            meta: false,
        }
    }

    pub fn meta(key: char) -> Self {
        Self {
            key,
            ctrl: false,
            meta: true,
        }
    }

    /// Ctrl/Cmd + B/I/K 分别对应加粗、斜体、链接
    pub fn action(&self) -> Option<ToolbarAction> {
        if !(self.ctrl || self.meta) {
            return None;
        }
        match self.key {
            'b' => Some(ToolbarAction::Bold),
            'i' => Some(ToolbarAction::Italic),
            'k' => Some(ToolbarAction::Link),
            _ => None,
        }
    }
}

/// 工具栏
///
/// 只保存菜单展开状态，编辑器上下文由调用方显式传入。
#[derive(Debug, Default)]
pub struct Toolbar {
    heading_menu_open: bool,
    emoji_menu_open: bool,
}

impl Toolbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, menu: Menu) -> bool {
        match menu {
            Menu::Heading => self.heading_menu_open,
            Menu::Emoji => self.emoji_menu_open,
        }
    }

    /// 执行工具栏操作
    pub fn execute<S, C>(
        &mut self,
        context: &mut EditorContext<S, C>,
        action: &ToolbarAction,
    ) -> EditResult<ActionOutcome>
    where
        S: EditSurface,
        C: HostChannel,
    {
        debug!("执行工具栏操作: {}", action.name());

        match action.kind() {
            ActionKind::Toggle => {
                let menu = if *action == ToolbarAction::HeadingToggle {
                    Menu::Heading
                } else {
                    Menu::Emoji
                };
                let open = self.toggle(menu);
                Ok(ActionOutcome::MenuToggled { menu, open })
            }
            ActionKind::Host => match action.host_command() {
                Some(command) => {
                    context.post_command(command);
                    Ok(ActionOutcome::Posted(command))
                }
                None => Ok(ActionOutcome::Skipped),
            },
            ActionKind::Edit => {
                match action {
                    ToolbarAction::Heading(_) => self.heading_menu_open = false,
                    ToolbarAction::InsertEmoji(_) => self.emoji_menu_open = false,
                    _ => {}
                }

                let selected = context.engine().get_selection()?.text;
                let Some(plan) = action.plan(&selected) else {
                    warn!("工具栏操作没有可插入的内容: {}", action.name());
                    return Ok(ActionOutcome::Skipped);
                };

                let selection = context.edit(|engine| plan.apply(engine))?;
                context.engine_mut().focus()?;
                Ok(ActionOutcome::Edited(selection))
            }
        }
    }

    /// 处理快捷键，未绑定的组合键返回 `None`
    pub fn handle_shortcut<S, C>(
        &mut self,
        context: &mut EditorContext<S, C>,
        chord: KeyChord,
    ) -> EditResult<Option<ActionOutcome>>
    where
        S: EditSurface,
        C: HostChannel,
    {
        match chord.action() {
            Some(action) => self.execute(context, &action).map(Some),
            None => Ok(None),
        }
    }

    /// 点击工具栏以外的区域时收起所有菜单
    pub fn close_menus(&mut self) {
        self.heading_menu_open = false;
        self.emoji_menu_open = false;
    }

    fn toggle(&mut self, menu: Menu) -> bool {
        let flag = match menu {
            Menu::Heading => &mut self.heading_menu_open,
            Menu::Emoji => &mut self.emoji_menu_open,
        };
        *flag = !*flag;
        *flag
    }
}
