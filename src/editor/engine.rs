//! 文本编辑引擎
//!
//! 在可变文本缓冲区和选区之上提供四个编辑原语：
//!
//! - `insert_at_cursor`：替换选区，光标落在插入文本之后
//! - `insert_text`：替换选区，按偏移量放置结果选区
//! - `replace_selection`：替换选区，光标折叠到新文本末尾
//! - `insert_template`：插入 `前缀 + 默认内容 + 后缀`，并选中默认内容
//!
//! 每个原语都遵守同样的约束：
//!
//! 1. 编辑前记录视口滚动位置，设置选区之后再显式恢复，
//!    因为宿主控件会自动滚动到光标，内容长度变化会导致视口跳动
//! 2. 每次调用恰好派发一次内容变化通知
//! 3. 未挂载编辑表面时不做任何修改，返回 [`EditError::SurfaceUnavailable`]
//! 4. 表面报告的选区越界或不在字符边界上时不做任何修改，返回 [`EditError::InvalidRange`]
//!
//! 偏移量均为 UTF-8 字节偏移。

use super::error::{EditError, EditResult};
use super::surface::{check_range, floor_char_boundary, EditSurface};

/// 选区快照
///
/// 每次查询时重新计算，不缓存；`text` 恒等于 `buffer[start..end]`。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Selection {
    /// 从缓冲区截取选区
    pub fn from_buffer(buffer: &str, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            text: buffer[start..end].to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// 用 `text` 替换 `buffer[start..end]`
///
/// 纯函数版本的替换，编辑引擎的所有原语都基于它。
pub fn splice(buffer: &str, start: usize, end: usize, text: &str) -> String {
    let mut result = String::with_capacity(buffer.len() - (end - start) + text.len());
    result.push_str(&buffer[..start]);
    result.push_str(text);
    result.push_str(&buffer[end..]);
    result
}

/// 文本编辑引擎
///
/// 编辑表面通过构造函数或 [`TextEditEngine::attach`] 注入，
/// 而不是在运行时从全局对象中查找。
pub struct TextEditEngine<S: EditSurface> {
    surface: Option<S>,
}

impl<S: EditSurface> Default for TextEditEngine<S> {
    fn default() -> Self {
        Self { surface: None }
    }
}

impl<S: EditSurface> TextEditEngine<S> {
    /// 创建未挂载编辑表面的引擎
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建已挂载编辑表面的引擎
    pub fn with_surface(surface: S) -> Self {
        Self {
            surface: Some(surface),
        }
    }

    /// 挂载编辑表面，返回之前挂载的表面
    pub fn attach(&mut self, surface: S) -> Option<S> {
        self.surface.replace(surface)
    }

    /// 卸载编辑表面
    pub fn detach(&mut self) -> Option<S> {
        self.surface.take()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    /// 获取当前选区
    pub fn get_selection(&self) -> EditResult<Selection> {
        let surface = self.require()?;
        let (start, end) = checked_selection(surface)?;
        Ok(Selection::from_buffer(surface.value(), start, end))
    }

    /// 获取完整文本
    pub fn get_value(&self) -> EditResult<&str> {
        Ok(self.require()?.value())
    }

    pub fn focus(&mut self) -> EditResult<()> {
        self.require_mut()?.focus();
        Ok(())
    }

    /// 替换选区并按偏移量放置结果选区
    ///
    /// 结果选区为 `(s + len + offset_start, s + len + offset_end)`，
    /// 负偏移可以把光标放在插入文本内部。结果会被收紧到缓冲区范围内。
    pub fn insert_text(
        &mut self,
        text: &str,
        offset_start: isize,
        offset_end: isize,
    ) -> EditResult<Selection> {
        self.apply(text, |start, buffer| {
            let anchor = start + text.len();
            (
                offset_in(buffer, anchor, offset_start),
                offset_in(buffer, anchor, offset_end),
            )
        })
    }

    /// 在光标处插入文本，光标移到插入文本之后
    pub fn insert_at_cursor(&mut self, text: &str) -> EditResult<Selection> {
        self.apply(text, |start, _| {
            let caret = start + text.len();
            (caret, caret)
        })
    }

    /// 用新文本替换选区，光标折叠到新文本末尾
    pub fn replace_selection(&mut self, text: &str) -> EditResult<Selection> {
        self.apply(text, |start, _| {
            let caret = start + text.len();
            (caret, caret)
        })
    }

    /// 插入模板并选中默认内容，方便直接覆盖输入
    pub fn insert_template(
        &mut self,
        prefix: &str,
        suffix: &str,
        default_content: &str,
    ) -> EditResult<Selection> {
        let full_text = format!("{prefix}{default_content}{suffix}");
        self.apply(&full_text, |start, _| {
            let content_start = start + prefix.len();
            (content_start, content_start + default_content.len())
        })
    }

    /// 所有编辑原语的公共流程
    fn apply<F>(&mut self, text: &str, place: F) -> EditResult<Selection>
    where
        F: FnOnce(usize, &str) -> (usize, usize),
    {
        let surface = self.require_mut()?;

        let (start, end) = checked_selection(surface)?;
        let scroll_top = surface.scroll_top();
        let updated = splice(surface.value(), start, end, text);

        surface.set_value(updated);
        surface.focus();

        let (new_start, new_end) = place(start, surface.value());
        surface.set_selection_range(new_start, new_end);

        // 必须在设置选区之后恢复
        surface.set_scroll_top(scroll_top);
        surface.dispatch_input();

        let (start, end) = checked_selection(surface)?;
        Ok(Selection::from_buffer(surface.value(), start, end))
    }

    fn require(&self) -> EditResult<&S> {
        self.surface.as_ref().ok_or(EditError::SurfaceUnavailable)
    }

    fn require_mut(&mut self) -> EditResult<&mut S> {
        self.surface.as_mut().ok_or(EditError::SurfaceUnavailable)
    }
}

/// 宿主提供的选区可能已经过期，切片前先检查
fn checked_selection<S: EditSurface>(surface: &S) -> EditResult<(usize, usize)> {
    let (start, end) = surface.selection_range();
    check_range(surface.value(), start, end)?;
    Ok((start, end))
}

fn offset_in(buffer: &str, anchor: usize, offset: isize) -> usize {
    let target = if offset.is_negative() {
        anchor.saturating_sub(offset.unsigned_abs())
    } else {
        anchor.saturating_add(offset as usize)
    };
    floor_char_boundary(buffer, target)
}
