//! 核心类型和终端输出
//!
//! [`MdProError`] 是命令行入口统一使用的错误类型，各子系统的错误
//! 通过 `From` 转换为它。终端输出只在 stderr/stdout 是终端且没有设置
//! `NO_COLOR` 时使用颜色。

use std::error::Error;
use std::fmt;

use crate::env::{core::NoColor, EnvVar};

/// md-editor-pro 处理过程中的错误
///
/// 只携带一条面向用户的消息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MdProError {
    details: String,
}

impl MdProError {
    /// 用给定消息创建错误
    pub fn new(msg: &str) -> MdProError {
        MdProError {
            details: msg.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.details
    }
}

impl fmt::Display for MdProError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for MdProError {}

impl From<std::io::Error> for MdProError {
    fn from(error: std::io::Error) -> Self {
        MdProError::new(&format!("IO错误: {}", error))
    }
}

impl From<crate::editor::EditError> for MdProError {
    fn from(error: crate::editor::EditError) -> Self {
        MdProError::new(&error.to_string())
    }
}

impl From<crate::commands::CommandError> for MdProError {
    fn from(error: crate::commands::CommandError) -> Self {
        MdProError::new(&error.to_string())
    }
}

const ANSI_COLOR_RED: &str = "\x1b[31m";
const ANSI_COLOR_GREEN: &str = "\x1b[32m";
const ANSI_COLOR_RESET: &str = "\x1b[0m";

fn use_color(stream: atty::Stream) -> bool {
    !NoColor::get_or_default(false) && atty::is(stream)
}

fn paint(msg: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{color}{msg}{ANSI_COLOR_RESET}")
    } else {
        msg.to_string()
    }
}

/// 向 stderr 输出错误消息，终端下显示为红色
pub fn print_error_message(msg: &str) {
    eprintln!("{}", paint(msg, ANSI_COLOR_RED, use_color(atty::Stream::Stderr)));
}

/// 向 stdout 输出提示消息，终端下显示为绿色
pub fn print_info_message(msg: &str) {
    println!("{}", paint(msg, ANSI_COLOR_GREEN, use_color(atty::Stream::Stdout)));
}
