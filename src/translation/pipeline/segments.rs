//! Markdown 受保护片段提取
//!
//! 一次扫描把原文切分为可翻译片段和受保护片段（代码块、图表块），
//! 受保护片段在余文中以占位符代替：
//!
//! ```text
//! 原文:  "Intro\n```rust\nfn main() {}\n```\nOutro"
//! 余文:  "Intro\n__CODE_BLOCK_0__\nOutro"
//! ```
//!
//! 行内代码不在这里提取，而是由逐行流水线在每一行内处理（见 `inline`）。
//! 占位符由每次调用独立创建的 [`PlaceholderAllocator`] 分配，
//! 分配前会确认占位符族没有在输入中出现过。

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::constants;
use crate::translation::error::{helpers, TranslationResult};

/// 受保护片段的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// 普通围栏代码块
    CodeFence,
    /// 行内代码
    InlineCode,
    /// 图表块（如 mermaid），正文会被翻译为固定语言
    Diagram,
}

impl SegmentKind {
    const ALL: [SegmentKind; 3] = [
        SegmentKind::CodeFence,
        SegmentKind::InlineCode,
        SegmentKind::Diagram,
    ];

    /// 占位符族名称
    pub fn family(self) -> &'static str {
        match self {
            SegmentKind::CodeFence => "CODE_BLOCK",
            SegmentKind::InlineCode => "INLINE_CODE",
            SegmentKind::Diagram => "DIAGRAM_BLOCK",
        }
    }

    fn index(self) -> usize {
        match self {
            SegmentKind::CodeFence => 0,
            SegmentKind::InlineCode => 1,
            SegmentKind::Diagram => 2,
        }
    }
}

/// 文本片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Protected {
        kind: SegmentKind,
        raw: String,
        placeholder: String,
    },
    Translatable {
        raw: String,
    },
}

impl Segment {
    /// 片段原文
    pub fn raw(&self) -> &str {
        match self {
            Segment::Protected { raw, .. } | Segment::Translatable { raw } => raw,
        }
    }

    pub fn placeholder(&self) -> Option<&str> {
        match self {
            Segment::Protected { placeholder, .. } => Some(placeholder),
            Segment::Translatable { .. } => None,
        }
    }

    pub fn kind(&self) -> Option<SegmentKind> {
        match self {
            Segment::Protected { kind, .. } => Some(*kind),
            Segment::Translatable { .. } => None,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Segment::Protected { .. })
    }
}

/// 单次翻译调用内的占位符分配器
///
/// 占位符形如 `__CODE_BLOCK_0__`，每个种类独立递增编号。
/// 如果输入中已经出现某个占位符族的前缀，则给所有族加上盐值，
/// 直到没有任何族前缀出现在输入中。
#[derive(Debug, Clone)]
pub struct PlaceholderAllocator {
    salt: String,
    counters: [usize; 3],
}

impl PlaceholderAllocator {
    /// 针对给定输入创建分配器
    pub fn for_input(input: &str) -> Self {
        let mut salt = String::new();
        let mut round = 0usize;
        while SegmentKind::ALL
            .iter()
            .any(|kind| input.contains(&Self::family_prefix(*kind, &salt)))
        {
            round += 1;
            salt = format!("X{round}");
        }
        Self {
            salt,
            counters: [0; 3],
        }
    }

    /// 分配下一个占位符
    pub fn allocate(&mut self, kind: SegmentKind) -> String {
        let index = self.counters[kind.index()];
        self.counters[kind.index()] += 1;
        format!("{}{}__", Self::family_prefix(kind, &self.salt), index)
    }

    /// 当前使用的盐值，未加盐时为空
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// 文本中是否还残留本分配器的占位符
    pub fn find_leftover<'a>(&self, text: &'a str) -> Option<&'a str> {
        SegmentKind::ALL.iter().find_map(|kind| {
            let prefix = Self::family_prefix(*kind, &self.salt);
            text.find(&prefix).map(|start| {
                let rest = &text[start..];
                let end = rest[prefix.len()..]
                    .find("__")
                    .map_or(rest.len(), |i| prefix.len() + i + 2);
                &rest[..end]
            })
        })
    }

    fn family_prefix(kind: SegmentKind, salt: &str) -> String {
        format!("__{}{}_", kind.family(), salt)
    }
}

/// 提取结果：余文和有序片段列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub residue: String,
    pub segments: Vec<Segment>,
}

impl Extraction {
    /// 受保护片段
    pub fn protected(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|segment| segment.is_protected())
    }

    pub fn has_protected(&self) -> bool {
        self.segments.iter().any(Segment::is_protected)
    }

    /// 按顺序拼接所有片段原文，等于提取前的原文
    pub fn original(&self) -> String {
        self.segments.iter().map(Segment::raw).collect()
    }

    /// `text` 是否恰好是某个受保护片段的占位符
    pub fn is_placeholder(&self, text: &str) -> bool {
        self.protected().any(|segment| segment.placeholder() == Some(text))
    }

    /// 用片段原文替换余文中的占位符
    pub fn reassemble(&self, residue: &str) -> TranslationResult<String> {
        self.restore_with(residue, |segment| Cow::Borrowed(segment.raw()))
    }

    /// 用 `replacement` 给出的内容替换余文中的占位符
    ///
    /// 每个占位符必须恰好出现一次，否则返回
    /// [`TranslationError::InternalError`](crate::translation::TranslationError::InternalError)。
    /// 替换一次完成，替换内容中的文本不会被再次扫描。
    pub fn restore_with<'s, F>(&'s self, residue: &str, mut replacement: F) -> TranslationResult<String>
    where
        F: FnMut(&'s Segment) -> Cow<'s, str>,
    {
        let mut spans = Vec::new();
        for segment in self.protected() {
            let Some(placeholder) = segment.placeholder() else {
                continue;
            };
            let mut found = residue.match_indices(placeholder);
            let Some((start, _)) = found.next() else {
                return Err(helpers::internal_error(format!("占位符丢失: {}", placeholder)));
            };
            if found.next().is_some() {
                return Err(helpers::internal_error(format!("占位符重复: {}", placeholder)));
            }
            spans.push((start, placeholder.len(), replacement(segment)));
        }
        spans.sort_by_key(|(start, _, _)| *start);

        let mut output = String::with_capacity(residue.len());
        let mut cursor = 0;
        for (start, len, text) in &spans {
            output.push_str(&residue[cursor..*start]);
            output.push_str(text);
            cursor = start + len;
        }
        output.push_str(&residue[cursor..]);
        Ok(output)
    }
}

/// 围栏代码块的三个部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceParts<'a> {
    /// 开始行，包含换行符
    pub open: &'a str,
    /// 正文，包含最后一行的换行符
    pub body: &'a str,
    /// 结束行
    pub close: &'a str,
}

impl<'a> FenceParts<'a> {
    /// 拆分围栏代码块原文
    pub fn split(raw: &'a str) -> Option<Self> {
        let open_end = raw.find('\n')? + 1;
        let close_start = raw[open_end..].rfind('\n').map_or(open_end, |i| open_end + i + 1);
        Some(Self {
            open: &raw[..open_end],
            body: &raw[open_end..close_start],
            close: &raw[close_start..],
        })
    }

    /// 替换正文后重新拼接
    pub fn with_body(&self, body: &str) -> String {
        format!("{}{}{}", self.open, body, self.close)
    }
}

/// 正则表达式缓存
struct RegexCache {
    fence: OnceLock<Regex>,
}

impl RegexCache {
    const fn new() -> Self {
        Self {
            fence: OnceLock::new(),
        }
    }

    fn fence(&self) -> &Regex {
        self.fence.get_or_init(|| {
            // 开始行：三个反引号加可选语言标记；结束行：只有三个反引号
            Regex::new(
                r"(?m)^[ \t]{0,3}```[ \t]*([^\s`]*)[^\r\n]*\r?\n(?s:.*?)^[ \t]{0,3}```[ \t]*\r?$",
            )
            .expect("围栏代码块正则表达式无效")
        })
    }
}

static REGEX_CACHE: RegexCache = RegexCache::new();

/// 受保护片段提取器
#[derive(Debug, Clone)]
pub struct SegmentExtractor {
    diagram_tag: String,
}

impl Default for SegmentExtractor {
    fn default() -> Self {
        Self::new(constants::DEFAULT_DIAGRAM_TAG)
    }
}

impl SegmentExtractor {
    /// `diagram_tag` 为图表块的语言标记，比较时忽略大小写
    pub fn new(diagram_tag: impl Into<String>) -> Self {
        Self {
            diagram_tag: diagram_tag.into(),
        }
    }

    /// 提取受保护片段，使用新的占位符分配器
    pub fn extract(&self, text: &str) -> Extraction {
        let mut allocator = PlaceholderAllocator::for_input(text);
        self.extract_with(text, &mut allocator)
    }

    /// 提取受保护片段，占位符由调用方的分配器分配
    pub fn extract_with(&self, text: &str, allocator: &mut PlaceholderAllocator) -> Extraction {
        let mut residue = String::with_capacity(text.len());
        let mut segments = Vec::new();
        let mut cursor = 0;

        for captures in REGEX_CACHE.fence().captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };

            if whole.start() > cursor {
                let plain = &text[cursor..whole.start()];
                residue.push_str(plain);
                segments.push(Segment::Translatable {
                    raw: plain.to_string(),
                });
            }

            let tag = captures.get(1).map_or("", |m| m.as_str());
            let kind = if tag.eq_ignore_ascii_case(&self.diagram_tag) {
                SegmentKind::Diagram
            } else {
                SegmentKind::CodeFence
            };
            let placeholder = allocator.allocate(kind);
            residue.push_str(&placeholder);
            segments.push(Segment::Protected {
                kind,
                raw: whole.as_str().to_string(),
                placeholder,
            });
            cursor = whole.end();
        }

        if cursor < text.len() {
            let plain = &text[cursor..];
            residue.push_str(plain);
            segments.push(Segment::Translatable {
                raw: plain.to_string(),
            });
        }

        Extraction { residue, segments }
    }
}

/// 使用默认图表标记提取受保护片段
pub fn extract(text: &str) -> Extraction {
    SegmentExtractor::default().extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::error::TranslationError;

    const DOC: &str = "# Title\n\nSome text.\n\n```rust\nfn main() {}\n```\n\nMiddle\n\n```Mermaid\ngraph TD\n  A[Start] --> B[Kết thúc]\n```\nEnd";

    #[test]
    fn test_plain_text_is_unchanged() {
        let text = "Hello\nworld, no code here.";
        let extraction = extract(text);
        assert_eq!(extraction.residue, text);
        assert!(!extraction.has_protected());
        assert_eq!(extraction.protected().count(), 0);
    }

    #[test]
    fn test_fences_are_classified() {
        let extraction = extract(DOC);
        let kinds: Vec<_> = extraction.protected().filter_map(Segment::kind).collect();
        assert_eq!(kinds, [SegmentKind::CodeFence, SegmentKind::Diagram]);
        assert_eq!(
            extraction.residue,
            "# Title\n\nSome text.\n\n__CODE_BLOCK_0__\n\nMiddle\n\n__DIAGRAM_BLOCK_0__\nEnd"
        );
        assert!(extraction.is_placeholder("__DIAGRAM_BLOCK_0__"));
    }

    #[test]
    fn test_segments_reconstruct_original() {
        for text in [DOC, "", "```\n```", "a\n```js\nx\n```", "```\nonly\n```\n"] {
            let extraction = extract(text);
            assert_eq!(extraction.original(), text);
            assert_eq!(extraction.reassemble(&extraction.residue).unwrap(), text);
        }
    }

    #[test]
    fn test_crlf_fences() {
        let text = "Intro\r\n```python\r\nprint('hi')\r\n```\r\nOutro";
        let extraction = extract(text);
        assert_eq!(extraction.protected().count(), 1);
        assert_eq!(extraction.residue, "Intro\r\n__CODE_BLOCK_0__\nOutro");
        assert_eq!(extraction.reassemble(&extraction.residue).unwrap(), text);
    }

    #[test]
    fn test_unterminated_fence_is_plain_text() {
        let text = "Before\n```rust\nlet x = 1;\nno closing";
        let extraction = extract(text);
        assert!(!extraction.has_protected());
        assert_eq!(extraction.residue, text);
    }

    #[test]
    fn test_first_closing_delimiter_terminates() {
        let text = "```md\n```rust\ninner\n```\nafter\n```";
        let extraction = extract(text);
        let first = extraction.protected().next().unwrap();
        assert_eq!(first.raw(), "```md\n```rust\ninner\n```");
        assert_eq!(extraction.residue, "__CODE_BLOCK_0__\nafter\n```");
    }

    #[test]
    fn test_indices_increase_per_kind() {
        let text = "```\na\n```\n```mermaid\nb\n```\n```\nc\n```";
        let extraction = extract(text);
        assert_eq!(
            extraction.residue,
            "__CODE_BLOCK_0__\n__DIAGRAM_BLOCK_0__\n__CODE_BLOCK_1__"
        );
    }

    #[test]
    fn test_allocator_salts_colliding_families() {
        let text = "Literal __CODE_BLOCK_0__ in prose\n```\ncode\n```";
        let extraction = extract(text);
        let placeholder = extraction.protected().next().unwrap().placeholder().unwrap();
        assert!(!text.contains(placeholder));
        assert_eq!(placeholder, "__CODE_BLOCKX1_0__");
        assert_eq!(extraction.reassemble(&extraction.residue).unwrap(), text);
    }

    #[test]
    fn test_allocators_are_independent_per_call() {
        let first = extract("```\na\n```");
        let second = extract("```\nb\n```");
        assert_eq!(first.residue, second.residue);
    }

    #[test]
    fn test_reassemble_detects_missing_and_duplicate_placeholders() {
        let extraction = extract("x\n```\ncode\n```");
        assert!(matches!(
            extraction.reassemble("x\n"),
            Err(TranslationError::InternalError(_))
        ));
        assert!(matches!(
            extraction.reassemble("__CODE_BLOCK_0__ __CODE_BLOCK_0__"),
            Err(TranslationError::InternalError(_))
        ));
    }

    #[test]
    fn test_restore_with_replacement() {
        let extraction = extract("A\n```mermaid\nnút\n```\nB");
        let restored = extraction
            .restore_with("Ä\n__DIAGRAM_BLOCK_0__\nB", |segment| match segment.kind() {
                Some(SegmentKind::Diagram) => Cow::Borrowed("```mermaid\nnode\n```"),
                _ => Cow::Borrowed(segment.raw()),
            })
            .unwrap();
        assert_eq!(restored, "Ä\n```mermaid\nnode\n```\nB");
    }

    #[test]
    fn test_custom_diagram_tag() {
        let extraction = SegmentExtractor::new("plantuml").extract("```PlantUML\nA -> B\n```");
        assert_eq!(extraction.residue, "__DIAGRAM_BLOCK_0__");
    }

    #[test]
    fn test_fence_parts() {
        let parts = FenceParts::split("```mermaid\ngraph TD\n  A --> B\n```").unwrap();
        assert_eq!(parts.open, "```mermaid\n");
        assert_eq!(parts.body, "graph TD\n  A --> B\n");
        assert_eq!(parts.close, "```");
        assert_eq!(parts.with_body("x\n"), "```mermaid\nx\n```");

        let empty = FenceParts::split("```mermaid\n```").unwrap();
        assert_eq!(empty.body, "");
    }

    #[test]
    fn test_find_leftover() {
        let allocator = PlaceholderAllocator::for_input("plain");
        assert_eq!(allocator.find_leftover("ok"), None);
        assert_eq!(
            allocator.find_leftover("a __INLINE_CODE_3__ b"),
            Some("__INLINE_CODE_3__")
        );
        assert_eq!(allocator.salt(), "");
    }
}
