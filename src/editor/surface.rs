//! 编辑表面抽象
//!
//! 编辑引擎不直接依赖宿主的文本控件，而是通过 [`EditSurface`] 访问：
//! 文本内容、选区、滚动位置、焦点以及"内容已变化"通知。
//!
//! [`TextArea`] 是一个内存实现，行为与浏览器 `<textarea>` 一致：
//! 设置内容会把光标移到末尾，设置选区会自动滚动到光标所在行。
//! 这正是编辑引擎需要显式保存并恢复滚动位置的原因。

use super::error::{EditError, EditResult};

/// 宿主文本控件需要提供的能力
pub trait EditSurface {
    /// 当前完整文本
    fn value(&self) -> &str;

    /// 整体替换文本
    fn set_value(&mut self, value: String);

    /// 当前选区（字节偏移，`start <= end`）
    fn selection_range(&self) -> (usize, usize);

    /// 设置选区，宿主控件通常会自动滚动到光标
    fn set_selection_range(&mut self, start: usize, end: usize);

    /// 视口垂直滚动位置（像素）
    fn scroll_top(&self) -> u32;

    fn set_scroll_top(&mut self, scroll_top: u32);

    fn focus(&mut self);

    /// 派发一次内容变化通知
    fn dispatch_input(&mut self);
}

/// 内容变化监听器
pub type InputListener = Box<dyn FnMut(&str) + Send>;

/// 默认行高（像素）
pub const DEFAULT_LINE_HEIGHT: u32 = 20;

/// 默认视口高度（像素）
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 400;

/// 内存中的多行文本控件
pub struct TextArea {
    value: String,
    selection_start: usize,
    selection_end: usize,
    scroll_top: u32,
    line_height: u32,
    viewport_height: u32,
    focused: bool,
    input_events: usize,
    listeners: Vec<InputListener>,
}

impl TextArea {
    /// 创建文本控件，光标位于文本开头
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            selection_start: 0,
            selection_end: 0,
            scroll_top: 0,
            line_height: DEFAULT_LINE_HEIGHT,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            focused: false,
            input_events: 0,
            listeners: Vec::new(),
        }
    }

    /// 创建带初始选区的文本控件
    ///
    /// 选区必须位于文本范围内且落在字符边界上。
    pub fn with_selection(value: impl Into<String>, start: usize, end: usize) -> EditResult<Self> {
        let mut area = Self::new(value);
        check_range(&area.value, start, end)?;
        area.selection_start = start;
        area.selection_end = end;
        Ok(area)
    }

    /// 设置视口几何尺寸
    pub fn with_viewport(mut self, line_height: u32, viewport_height: u32) -> Self {
        self.line_height = line_height.max(1);
        self.viewport_height = viewport_height.max(self.line_height);
        self
    }

    /// 注册内容变化监听器
    pub fn on_input(&mut self, listener: InputListener) {
        self.listeners.push(listener);
    }

    /// 已派发的内容变化通知次数
    pub fn input_events(&self) -> usize {
        self.input_events
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// 最大可滚动位置
    pub fn max_scroll_top(&self) -> u32 {
        let lines = self.value.split('\n').count() as u32;
        (lines * self.line_height).saturating_sub(self.viewport_height)
    }

    fn line_of(&self, offset: usize) -> u32 {
        self.value[..offset].matches('\n').count() as u32
    }

    fn scroll_caret_into_view(&mut self) {
        let caret_top = self.line_of(self.selection_end) * self.line_height;
        let caret_bottom = caret_top + self.line_height;
        if caret_top < self.scroll_top {
            self.scroll_top = caret_top;
        } else if caret_bottom > self.scroll_top + self.viewport_height {
            self.scroll_top = caret_bottom - self.viewport_height;
        }
    }
}

impl EditSurface for TextArea {
    fn value(&self) -> &str {
        &self.value
    }

    fn set_value(&mut self, value: String) {
        self.value = value;
        let end = self.value.len();
        self.selection_start = end;
        self.selection_end = end;
        self.scroll_top = self.scroll_top.min(self.max_scroll_top());
        self.scroll_caret_into_view();
    }

    fn selection_range(&self) -> (usize, usize) {
        (self.selection_start, self.selection_end)
    }

    fn set_selection_range(&mut self, start: usize, end: usize) {
        let start = floor_char_boundary(&self.value, start);
        let end = floor_char_boundary(&self.value, end);
        self.selection_start = start.min(end);
        self.selection_end = start.max(end);
        self.scroll_caret_into_view();
    }

    fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    fn set_scroll_top(&mut self, scroll_top: u32) {
        self.scroll_top = scroll_top.min(self.max_scroll_top());
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn dispatch_input(&mut self) {
        self.input_events += 1;
        for listener in self.listeners.iter_mut() {
            listener(&self.value);
        }
    }
}

impl std::fmt::Debug for TextArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextArea")
            .field("value", &self.value)
            .field("selection", &(self.selection_start..self.selection_end))
            .field("scroll_top", &self.scroll_top)
            .field("input_events", &self.input_events)
            .finish()
    }
}

/// 把偏移量收紧到文本长度内，并向前对齐到字符边界
/// 检查 `start..end` 能否用于切片 `text`
pub fn check_range(text: &str, start: usize, end: usize) -> EditResult<()> {
    let len = text.len();
    if start > end || end > len || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
        return Err(EditError::InvalidRange { start, end, len });
    }
    Ok(())
}

pub fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
