//! 逐行文本准备
//!
//! 把余文中的一行拆成三部分：行首的 Markdown 块标记、需要翻译的正文、
//! 行尾空白。正文中的行内代码替换为占位符，代码中的字符串字面量
//! 单独翻译，其余代码原样保留。

use std::sync::OnceLock;

use regex::Regex;

use super::segments::{PlaceholderAllocator, SegmentKind};

/// 正则表达式缓存
struct RegexCache {
    block_marker: OnceLock<Regex>,
    inline_code: OnceLock<Regex>,
    string_literal: OnceLock<Regex>,
}

impl RegexCache {
    const fn new() -> Self {
        Self {
            block_marker: OnceLock::new(),
            inline_code: OnceLock::new(),
            string_literal: OnceLock::new(),
        }
    }

    /// 缩进、引用、标题、列表符号、任务框、有序编号
    fn block_marker(&self) -> &Regex {
        self.block_marker.get_or_init(|| {
            Regex::new(
                r"^[ \t]*(?:>[ \t]?)*[ \t]*(?:#{1,6}[ \t]+|(?:[-*+]|\d{1,9}[.)])[ \t]+(?:\[[ xX]\][ \t]+)?)?",
            )
            .expect("块标记正则表达式无效")
        })
    }

    fn inline_code(&self) -> &Regex {
        self.inline_code
            .get_or_init(|| Regex::new(r"`[^`\r\n]+`").expect("行内代码正则表达式无效"))
    }

    fn string_literal(&self) -> &Regex {
        self.string_literal.get_or_init(|| {
            Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("字符串字面量正则表达式无效")
        })
    }
}

static REGEX_CACHE: RegexCache = RegexCache::new();

/// 文本是否值得发送翻译：至少包含一个字母字符
pub fn should_translate(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// 行内代码片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub placeholder: String,
    /// 含反引号的原文
    pub raw: String,
}

/// 行内代码中的一段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePiece<'a> {
    /// 原样保留的代码
    Verbatim(&'a str),
    /// 字符串字面量，`content` 不含引号
    Literal { quote: char, content: &'a str },
}

impl InlineSpan {
    /// 按字符串字面量拆分代码
    pub fn pieces(&self) -> Vec<CodePiece<'_>> {
        let mut pieces = Vec::new();
        let mut cursor = 0;

        for captures in REGEX_CACHE.string_literal().captures_iter(&self.raw) {
            let (Some(whole), Some(content)) = (captures.get(0), captures.get(1).or(captures.get(2)))
            else {
                continue;
            };
            if whole.start() > cursor {
                pieces.push(CodePiece::Verbatim(&self.raw[cursor..whole.start()]));
            }
            let quote = if captures.get(1).is_some() { '"' } else { '\'' };
            pieces.push(CodePiece::Literal {
                quote,
                content: content.as_str(),
            });
            cursor = whole.end();
        }

        if cursor < self.raw.len() {
            pieces.push(CodePiece::Verbatim(&self.raw[cursor..]));
        }
        pieces
    }

    /// 是否包含可翻译的字符串字面量
    pub fn has_literals(&self) -> bool {
        self.pieces().iter().any(|piece| match piece {
            CodePiece::Literal { content, .. } => should_translate(content),
            CodePiece::Verbatim(_) => false,
        })
    }
}

/// 准备好的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLine {
    pub prefix: String,
    /// 行内代码已替换为占位符的正文
    pub text: String,
    pub suffix: String,
    pub spans: Vec<InlineSpan>,
}

impl PreparedLine {
    /// 拆分一行，行内代码占位符由 `allocator` 分配
    pub fn prepare(line: &str, allocator: &mut PlaceholderAllocator) -> Self {
        let prefix_len = REGEX_CACHE
            .block_marker()
            .find(line)
            .map_or(0, |m| m.end());
        let (prefix, rest) = line.split_at(prefix_len);
        let body = rest.trim_end_matches([' ', '\t', '\r']);
        let suffix = &rest[body.len()..];

        let mut text = String::with_capacity(body.len());
        let mut spans = Vec::new();
        let mut cursor = 0;
        for m in REGEX_CACHE.inline_code().find_iter(body) {
            text.push_str(&body[cursor..m.start()]);
            let placeholder = allocator.allocate(SegmentKind::InlineCode);
            text.push_str(&placeholder);
            spans.push(InlineSpan {
                placeholder,
                raw: m.as_str().to_string(),
            });
            cursor = m.end();
        }
        text.push_str(&body[cursor..]);

        Self {
            prefix: prefix.to_string(),
            text,
            suffix: suffix.to_string(),
            spans,
        }
    }

    /// 去掉占位符后的正文是否需要翻译
    pub fn has_translatable_text(&self) -> bool {
        let mut stripped = self.text.clone();
        for span in &self.spans {
            stripped = stripped.replace(&span.placeholder, " ");
        }
        should_translate(&stripped)
    }

    /// 重新拼接一行
    ///
    /// `translated` 为译文正文，`span_texts` 与 `spans` 一一对应。
    /// 任一占位符丢失或重复时返回 `None`。
    pub fn assemble(&self, translated: &str, span_texts: &[String]) -> Option<String> {
        let mut positions = Vec::with_capacity(self.spans.len());
        for (span, replacement) in self.spans.iter().zip(span_texts) {
            let mut found = translated.match_indices(&span.placeholder);
            let (start, _) = found.next()?;
            if found.next().is_some() {
                return None;
            }
            positions.push((start, span.placeholder.len(), replacement.as_str()));
        }
        if positions.len() != self.spans.len() {
            return None;
        }
        positions.sort_by_key(|(start, _, _)| *start);

        let mut line = String::with_capacity(self.prefix.len() + translated.len() + self.suffix.len());
        line.push_str(&self.prefix);
        let mut cursor = 0;
        for (start, len, replacement) in positions {
            if start < cursor {
                return None;
            }
            line.push_str(&translated[cursor..start]);
            line.push_str(replacement);
            cursor = start + len;
        }
        line.push_str(&translated[cursor..]);
        line.push_str(&self.suffix);
        Some(line)
    }

    /// 原始行内代码
    pub fn original_span_texts(&self) -> Vec<String> {
        self.spans.iter().map(|span| span.raw.clone()).collect()
    }
}
