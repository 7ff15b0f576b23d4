//! 编辑器上下文
//!
//! 编辑引擎和宿主通道由同一个上下文对象持有，并显式传给工具栏。
//! 构造上下文即完成就绪握手：编辑表面已挂载，随即向宿主发送一次 `ready`。

use tracing::debug;

use super::engine::TextEditEngine;
use super::error::{EditError, EditResult};
use super::messages::{HostMessage, Theme, WebviewMessage};
use super::surface::EditSurface;

/// 向宿主发送消息的通道
pub trait HostChannel {
    fn post(&mut self, message: WebviewMessage);
}

/// 把消息记录在内存中，便于测试和离线使用
impl HostChannel for Vec<WebviewMessage> {
    fn post(&mut self, message: WebviewMessage) {
        self.push(message);
    }
}

impl HostChannel for std::sync::mpsc::Sender<WebviewMessage> {
    fn post(&mut self, message: WebviewMessage) {
        // 接收端关闭意味着宿主已经退出
        let _ = self.send(message);
    }
}

/// 编辑器上下文
pub struct EditorContext<S: EditSurface, C: HostChannel> {
    engine: TextEditEngine<S>,
    channel: C,
    theme: Theme,
}

impl<S: EditSurface, C: HostChannel> EditorContext<S, C> {
    /// 挂载编辑表面并通知宿主面板已就绪
    pub fn new(surface: S, mut channel: C) -> Self {
        channel.post(WebviewMessage::Ready);
        debug!("编辑器已就绪");
        Self {
            engine: TextEditEngine::with_surface(surface),
            channel,
            theme: Theme::default(),
        }
    }

    pub fn engine(&self) -> &TextEditEngine<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TextEditEngine<S> {
        &mut self.engine
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// 执行一次编辑，并把新内容作为 `edit` 消息转发给宿主
    pub fn edit<T, F>(&mut self, operation: F) -> EditResult<T>
    where
        F: FnOnce(&mut TextEditEngine<S>) -> EditResult<T>,
    {
        let result = operation(&mut self.engine)?;
        let content = self.engine.get_value()?.to_string();
        self.channel.post(WebviewMessage::Edit { content });
        Ok(result)
    }

    /// 请求宿主执行命令
    pub fn post_command(&mut self, command: &str) {
        self.channel.post(WebviewMessage::Command {
            command: command.to_string(),
        });
    }

    /// 请求宿主打开预览中的链接
    pub fn open_link(&mut self, url: &str) {
        self.channel.post(WebviewMessage::OpenLink {
            url: url.to_string(),
        });
    }

    /// 处理宿主发来的消息
    ///
    /// `update` 直接替换缓冲区，不派发内容变化通知，避免把宿主的内容回送给宿主。
    pub fn handle_host_message(&mut self, message: HostMessage) -> EditResult<()> {
        match message {
            HostMessage::Update { content } => {
                let surface = self
                    .engine
                    .surface_mut()
                    .ok_or(EditError::SurfaceUnavailable)?;
                surface.set_value(content);
            }
            HostMessage::ThemeChanged { kind } => {
                self.theme = Theme::from_kind(kind);
                debug!("主题切换为 {:?}", self.theme);
            }
        }
        Ok(())
    }

    /// 拆分上下文，取回编辑表面和通道
    pub fn into_parts(self) -> (Option<S>, C) {
        let mut engine = self.engine;
        (engine.detach(), self.channel)
    }
}
