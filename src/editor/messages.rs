//! 编辑面板与宿主之间的消息协议
//!
//! 消息以 JSON 传输，`type` 字段区分消息种类：
//!
//! - 面板 → 宿主：`ready`、`edit`、`command`、`openLink`
//! - 宿主 → 面板：`update`、`theme-changed`

use serde::{Deserialize, Serialize};

/// 面板发往宿主的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WebviewMessage {
    /// 面板初始化完成，宿主应回送当前文档内容
    Ready,
    /// 缓冲区内容变化
    Edit { content: String },
    /// 请求宿主执行命令
    Command { command: String },
    /// 请求宿主打开链接
    OpenLink { url: String },
}

/// 宿主发往面板的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    /// 用文档内容整体替换缓冲区
    #[serde(rename = "update")]
    Update { content: String },
    /// 宿主配色主题变化
    #[serde(rename = "theme-changed")]
    ThemeChanged { kind: u8 },
}

/// 面板配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// 宿主主题编号：1 = 深色，2 = 浅色，3 = 高对比度
    ///
    /// 高对比度按深色处理，未知编号按浅色处理。
    pub fn from_kind(kind: u8) -> Self {
        match kind {
            1 | 3 => Theme::Dark,
            _ => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    /// 面板根元素使用的样式类名
    pub fn css_class(self) -> &'static str {
        match self {
            Theme::Light => "theme-light",
            Theme::Dark => "theme-dark",
        }
    }
}
