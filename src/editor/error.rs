//! 文本编辑引擎错误类型

use thiserror::Error;

/// 编辑操作错误
///
/// 所有错误都在修改缓冲区之前产生，不会留下半完成的编辑。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// 尚未挂载编辑表面（对应宿主中编辑器还没有初始化）
    #[error("编辑器尚未就绪")]
    SurfaceUnavailable,

    /// 选区超出文本范围或没有落在字符边界上
    #[error("选区无效: {start}..{end}（文本长度 {len}）")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// 工具栏收到无法识别的操作名
    #[error("未知的工具栏操作: {0}")]
    UnknownAction(String),
}

/// 编辑操作结果类型别名
pub type EditResult<T> = Result<T, EditError>;
