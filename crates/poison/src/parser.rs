// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Builds the [`Node`] tree from scanned tags.
//!
//! Every tag is replaced by position, so two identical tags in one template
//! are two independent nodes. Literal text between tags is kept byte for
//! byte.

use crate::ast::{Branch, LoopBinding, Node};
use crate::error::{PoisonError, Result};
use crate::scanner::{Tag, TagKind};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IN_HEADER: Regex = Regex::new(
        r"(?s)^\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:,\s*([A-Za-z_][A-Za-z0-9_]*)\s*)?\bin\s+(.+?)\s*$"
    )
    .unwrap();
    static ref AS_HEADER: Regex = Regex::new(
        r"(?s)^\s*(.+?)\s+as\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:=>\s*([A-Za-z_][A-Za-z0-9_]*)\s*)?$"
    )
    .unwrap();
}

/// Parses `source` into nodes using the tags produced by [`scan`](crate::scanner::scan).
///
/// `view` is only used in error messages.
///
/// # Errors
///
/// Returns [`PoisonError::MalformedDirective`] for unbalanced blocks,
/// stray closers, unterminated raw blocks, missing argument lists and
/// unreadable `@foreach` headers.
pub fn parse(view: &str, source: &str, tags: &[Tag]) -> Result<Vec<Node>> {
    let mut parser = Parser {
        view,
        source,
        tags,
        index: 0,
        cursor: 0,
    };

    let (nodes, stop) = parser.parse_nodes(&[])?;
    debug_assert!(stop.is_none());
    Ok(nodes)
}

struct Parser<'a> {
    view: &'a str,
    source: &'a str,
    tags: &'a [Tag],
    index: usize,
    cursor: usize,
}

impl Parser<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> PoisonError {
        PoisonError::malformed(self.view, self.source, line, message)
    }

    fn push_text(&mut self, nodes: &mut Vec<Node>, until: usize) {
        if until > self.cursor {
            nodes.push(Node::Text(self.source[self.cursor..until].to_string()));
        }
        self.cursor = until;
    }

    fn required_args(&self, tag: &Tag) -> Result<String> {
        match tag.args.as_deref().map(str::trim) {
            Some(args) if !args.is_empty() => Ok(args.to_string()),
            _ => Err(self.error(
                tag.line,
                format!("{} requires an argument list", tag.kind.label()),
            )),
        }
    }

    /// Parses nodes until one of `closers` or the end of the tag stream.
    ///
    /// Returns the closing tag that stopped the block, or `None` at end.
    fn parse_nodes(&mut self, closers: &[TagKind]) -> Result<(Vec<Node>, Option<Tag>)> {
        let mut nodes = Vec::new();

        while let Some(tag) = self.tags.get(self.index).cloned() {
            self.push_text(&mut nodes, tag.span.start);
            self.index += 1;
            self.cursor = tag.span.end;

            if closers.contains(&tag.kind) {
                return Ok((nodes, Some(tag)));
            }

            let node = match tag.kind {
                TagKind::Interpolation => Node::Interpolation {
                    expression: self.required_args(&tag)?,
                    line: tag.line,
                },
                TagKind::RawBlock => Node::Raw {
                    code: tag.args.clone().unwrap_or_default(),
                    line: tag.line,
                },
                TagKind::RawOpen => self.parse_raw(&tag)?,
                TagKind::If => self.parse_if(&tag)?,
                TagKind::Foreach => self.parse_foreach(&tag)?,
                TagKind::Content => self.parse_content(&tag)?,
                TagKind::Include => Node::Include {
                    args: self.required_args(&tag)?,
                    line: tag.line,
                },
                TagKind::Url => Node::Url {
                    args: self.required_args(&tag)?,
                    line: tag.line,
                },
                TagKind::Extend => Node::Extend {
                    args: self.required_args(&tag)?,
                    line: tag.line,
                },
                TagKind::RawClose => {
                    return Err(self.error(tag.line, "raw block closer without an opener"))
                }
                TagKind::ElseIf
                | TagKind::Else
                | TagKind::EndIf
                | TagKind::EndForeach
                | TagKind::EndContent => {
                    return Err(self.error(
                        tag.line,
                        format!("unexpected {}", tag.kind.label()),
                    ))
                }
            };
            nodes.push(node);
        }

        self.push_text(&mut nodes, self.source.len());
        Ok((nodes, None))
    }

    fn parse_raw(&mut self, open: &Tag) -> Result<Node> {
        let close_offset = self.tags[self.index..]
            .iter()
            .position(|t| t.kind == TagKind::RawClose)
            .ok_or_else(|| self.error(open.line, "unterminated raw block"))?;
        let close = &self.tags[self.index + close_offset];

        let code = self.source[open.span.end..close.span.start].to_string();
        self.index += close_offset + 1;
        self.cursor = close.span.end;

        Ok(Node::Raw {
            code,
            line: open.line,
        })
    }

    fn parse_if(&mut self, open: &Tag) -> Result<Node> {
        let mut branches = vec![Branch {
            condition: self.required_args(open)?,
            body: Vec::new(),
            line: open.line,
        }];

        loop {
            let (body, stop) =
                self.parse_nodes(&[TagKind::ElseIf, TagKind::Else, TagKind::EndIf])?;
            if let Some(branch) = branches.last_mut() {
                branch.body = body;
            }

            let stop = stop.ok_or_else(|| {
                self.error(open.line, "@if is never closed with @endif")
            })?;

            match stop.kind {
                TagKind::ElseIf => branches.push(Branch {
                    condition: self.required_args(&stop)?,
                    body: Vec::new(),
                    line: stop.line,
                }),
                TagKind::Else => {
                    let (otherwise, end) = self.parse_nodes(&[TagKind::EndIf])?;
                    if end.is_none() {
                        return Err(self.error(stop.line, "@else is never closed with @endif"));
                    }
                    return Ok(Node::If {
                        branches,
                        otherwise: Some(otherwise),
                    });
                }
                _ => {
                    return Ok(Node::If {
                        branches,
                        otherwise: None,
                    })
                }
            }
        }
    }

    fn parse_foreach(&mut self, open: &Tag) -> Result<Node> {
        let header = self.required_args(open)?;
        let binding = loop_binding(&header).ok_or_else(|| {
            self.error(
                open.line,
                format!("cannot read @foreach header `{}`", header),
            )
        })?;

        let (body, stop) = self.parse_nodes(&[TagKind::EndForeach])?;
        if stop.is_none() {
            return Err(self.error(open.line, "@foreach is never closed with @endforeach"));
        }

        Ok(Node::Foreach {
            binding,
            body,
            line: open.line,
        })
    }

    fn parse_content(&mut self, open: &Tag) -> Result<Node> {
        let (body, stop) = self.parse_nodes(&[TagKind::EndContent])?;
        let stop = stop.ok_or_else(|| {
            self.error(open.line, "@content is never closed with @endcontent")
        })?;

        Ok(Node::Content {
            body,
            line: stop.line,
        })
    }
}

/// Reads a `@foreach` header in either `in` or `as` form.
pub fn loop_binding(header: &str) -> Option<LoopBinding> {
    if let Some(caps) = IN_HEADER.captures(header) {
        let first = caps[1].to_string();
        let expr = caps[3].to_string();
        return Some(match caps.get(2) {
            Some(value) => LoopBinding::Pairs {
                key: first,
                value: value.as_str().to_string(),
                table: expr,
            },
            None => LoopBinding::Sequence {
                item: first,
                list: expr,
            },
        });
    }

    let caps = AS_HEADER.captures(header)?;
    let expr = caps[1].to_string();
    let first = caps[2].to_string();
    Some(match caps.get(3) {
        Some(value) => LoopBinding::Pairs {
            key: first,
            value: value.as_str().to_string(),
            table: expr,
        },
        None => LoopBinding::Sequence {
            item: first,
            list: expr,
        },
    })
}
