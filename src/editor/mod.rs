//! 编辑器模块
//!
//! 提供保持光标、选区与滚动位置不变量的文本编辑原语，
//! 以及在其之上的工具栏格式化和面板消息协议。

pub mod context;
pub mod engine;
pub mod error;
pub mod messages;
pub mod surface;
pub mod toolbar;

pub use context::{EditorContext, HostChannel};
pub use engine::{splice, Selection, TextEditEngine};
pub use error::{EditError, EditResult};
pub use messages::{HostMessage, Theme, WebviewMessage};
pub use surface::{EditSurface, TextArea};
pub use toolbar::{ActionOutcome, EditPlan, KeyChord, Menu, Toolbar, ToolbarAction};
