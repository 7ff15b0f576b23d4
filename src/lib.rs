//! # MD Editor Pro
//!
//! Markdown 分栏编辑器的核心库：在编辑操作中保持光标、选区和滚动位置的
//! 文本编辑原语，以及保留代码块、行内代码和图表块的 Markdown 翻译流程。
//!
//! ## 模块组织
//!
//! - `core` - 统一错误类型和终端输出
//! - `env` - 类型安全的环境变量
//! - `editor` - 文本编辑引擎、工具栏和面板消息协议
//! - `translation` - 片段提取、翻译客户端和翻译服务
//! - `commands` - 面向宿主编辑器的翻译命令

pub mod commands;
pub mod core;
pub mod editor;
pub mod env;
pub mod translation;

// Re-export commonly used items for convenience
pub use self::core::{print_error_message, print_info_message, MdProError};
pub use editor::{EditorContext, TextEditEngine, Toolbar, ToolbarAction};
pub use translation::{TranslationConfig, TranslationError, TranslationService};
