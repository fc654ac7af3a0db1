// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Directive scanner.
//!
//! Extracts the ordered list of directive [`Tag`]s from raw template text.
//! The scanner knows nothing about nesting or string literals: it walks the
//! text left to right and takes the first grammar form that matches at each
//! position, so a directive written inside a quoted Lua string is still a
//! directive.
//!
//! # Grammar
//!
//! ```text
//! {@ ... @}  {? ... ?}  {! ... !}      raw block (same line, any closer)
//! @word  @word( ... )                  directive call, fixed vocabulary
//! {{ ... }}                            interpolation (same line)
//! {@  {?  {!                           lone raw opener
//! @}  ?}  !}                           lone raw closer
//! ```

use std::ops::Range;

/// Recognized directive kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `{{ expr }}`
    Interpolation,
    /// `@include(name[, params])`
    Include,
    /// `@url(name[, params])`
    Url,
    /// `@foreach(...)`
    Foreach,
    /// `@endforeach`
    EndForeach,
    /// `@if(...)`
    If,
    /// `@elseif(...)`
    ElseIf,
    /// `@else`
    Else,
    /// `@endif`
    EndIf,
    /// `@extend(parent, params)`
    Extend,
    /// `@content`
    Content,
    /// `@endcontent`
    EndContent,
    /// A raw block opened and closed on the same line.
    RawBlock,
    /// A raw opener with no closer on its line.
    RawOpen,
    /// A raw closer that did not belong to a same-line block.
    RawClose,
}

impl TagKind {
    /// Maps a directive word to its kind.
    pub fn from_directive(word: &str) -> Option<Self> {
        let kind = match word {
            "include" => TagKind::Include,
            "url" => TagKind::Url,
            "foreach" => TagKind::Foreach,
            "endforeach" => TagKind::EndForeach,
            "if" => TagKind::If,
            "elseif" => TagKind::ElseIf,
            "else" => TagKind::Else,
            "endif" => TagKind::EndIf,
            "extend" => TagKind::Extend,
            "content" => TagKind::Content,
            "endcontent" => TagKind::EndContent,
            _ => return None,
        };
        Some(kind)
    }

    /// True for directives that are meaningless without `( )` arguments.
    pub fn requires_args(self) -> bool {
        matches!(
            self,
            TagKind::Include
                | TagKind::Url
                | TagKind::Foreach
                | TagKind::If
                | TagKind::ElseIf
                | TagKind::Extend
        )
    }

    /// The directive as it is written in templates, for error messages.
    pub fn label(self) -> &'static str {
        match self {
            TagKind::Interpolation => "{{ }}",
            TagKind::Include => "@include",
            TagKind::Url => "@url",
            TagKind::Foreach => "@foreach",
            TagKind::EndForeach => "@endforeach",
            TagKind::If => "@if",
            TagKind::ElseIf => "@elseif",
            TagKind::Else => "@else",
            TagKind::EndIf => "@endif",
            TagKind::Extend => "@extend",
            TagKind::Content => "@content",
            TagKind::EndContent => "@endcontent",
            TagKind::RawBlock => "raw block",
            TagKind::RawOpen => "raw block opener",
            TagKind::RawClose => "raw block closer",
        }
    }
}

/// A directive occurrence in the template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// What kind of directive this is.
    pub kind: TagKind,
    /// The exact matched text.
    pub raw: String,
    /// Unparsed text between `(` and `)` for directive calls, or the
    /// inner text for interpolations and raw blocks.
    pub args: Option<String>,
    /// Byte range of `raw` in the source.
    pub span: Range<usize>,
    /// 1-indexed line the tag starts on.
    pub line: usize,
}

fn is_raw_marker(b: u8) -> bool {
    matches!(b, b'@' | b'?' | b'!')
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scans `source` and returns every directive tag in document order.
///
/// # Examples
///
/// ```rust
/// use poison::scanner::{scan, TagKind};
///
/// let tags = scan("@if(ok) {{ name }} @endif");
/// let kinds: Vec<_> = tags.iter().map(|t| t.kind).collect();
/// assert_eq!(kinds, vec![TagKind::If, TagKind::Interpolation, TagKind::EndIf]);
/// ```
pub fn scan(source: &str) -> Vec<Tag> {
    let bytes = source.as_bytes();
    let mut tags = Vec::new();
    let mut line = 1;
    let mut line_from = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let found = match bytes[pos] {
            b'{' => match_brace(source, pos),
            b'@' => match_directive(source, pos).or_else(|| match_closer(source, pos)),
            b'?' | b'!' => match_closer(source, pos),
            _ => None,
        };

        match found {
            Some((kind, end, args)) => {
                line += bytes[line_from..pos].iter().filter(|&&b| b == b'\n').count();
                line_from = pos;
                tags.push(Tag {
                    kind,
                    raw: source[pos..end].to_string(),
                    args,
                    span: pos..end,
                    line,
                });
                pos = end;
            }
            None => pos += 1,
        }
    }

    tracing::trace!("scanned {} tags", tags.len());
    tags
}

type Match = (TagKind, usize, Option<String>);

fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |offset| from + offset)
}

/// Tries the raw block, interpolation and lone opener forms at a `{`.
fn match_brace(source: &str, pos: usize) -> Option<Match> {
    let bytes = source.as_bytes();
    let next = *bytes.get(pos + 1)?;

    if is_raw_marker(next) {
        let eol = line_end(bytes, pos);
        let body = pos + 2;
        if let Some(close) = (body..eol.saturating_sub(1))
            .find(|&i| is_raw_marker(bytes[i]) && bytes[i + 1] == b'}')
        {
            let inner = source[body..close].to_string();
            return Some((TagKind::RawBlock, close + 2, Some(inner)));
        }

        return Some((TagKind::RawOpen, pos + 2, None));
    }

    if next == b'{' {
        let eol = line_end(bytes, pos);
        let body = pos + 2;
        let close = source[body..eol].find("}}")?;
        let inner = source[body..body + close].to_string();
        return Some((TagKind::Interpolation, body + close + 2, Some(inner)));
    }

    None
}

/// Tries a `@word` or `@word(...)` directive call.
fn match_directive(source: &str, pos: usize) -> Option<Match> {
    let bytes = source.as_bytes();
    let word_start = pos + 1;
    let mut word_end = word_start;
    while word_end < bytes.len() && is_word_byte(bytes[word_end]) {
        word_end += 1;
    }

    let kind = TagKind::from_directive(&source[word_start..word_end])?;

    if bytes.get(word_end) != Some(&b'(') {
        return Some((kind, word_end, None));
    }

    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(word_end) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let args = source[word_end + 1..i].to_string();
                    return Some((kind, i + 1, Some(args)));
                }
            }
            _ => {}
        }
    }

    let args = source[word_end + 1..].to_string();
    Some((kind, bytes.len(), Some(args)))
}

/// Tries a lone closer: one or more of `@?!` followed by `}`.
fn match_closer(source: &str, pos: usize) -> Option<Match> {
    let bytes = source.as_bytes();
    let mut end = pos;
    while end < bytes.len() && is_raw_marker(bytes[end]) {
        end += 1;
    }
    (end > pos && bytes.get(end) == Some(&b'}')).then(|| (TagKind::RawClose, end + 1, None))
}
