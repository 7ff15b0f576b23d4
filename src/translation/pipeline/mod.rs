//! 翻译管道模块
//!
//! 提供受保护片段提取和逐行文本准备

pub mod inline;
pub mod segments;

// 重新导出主要类型
pub use inline::{should_translate, CodePiece, InlineSpan, PreparedLine};
pub use segments::{
    extract, Extraction, FenceParts, PlaceholderAllocator, Segment, SegmentExtractor, SegmentKind,
};
