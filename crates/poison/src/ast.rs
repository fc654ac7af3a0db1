// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Node tree for Poison templates.
//!
//! The parser turns the flat tag stream from the [scanner](crate::scanner)
//! into a list of [`Node`]s. Block directives (`@if`, `@foreach`,
//! `@content`) own their children, so the code generator never has to
//! balance markers itself.
//!
//! Expressions are kept as raw Lua text; the engine does not interpret
//! them before execution.

/// A node in a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, emitted unchanged.
    Text(String),
    /// `{{ expr }}`: evaluate and print.
    Interpolation {
        /// The Lua expression.
        expression: String,
        /// Template line of the tag.
        line: usize,
    },
    /// `{? ... ?}` and friends: Lua statements run in place.
    Raw {
        /// The code between the delimiters.
        code: String,
        /// Template line of the opener.
        line: usize,
    },
    /// `@if` ... `@elseif` ... `@else` ... `@endif`.
    If {
        /// `@if` and each `@elseif`, in order.
        branches: Vec<Branch>,
        /// The `@else` body, if any.
        otherwise: Option<Vec<Node>>,
    },
    /// `@foreach(...)` ... `@endforeach`.
    Foreach {
        /// How the loop header binds variables.
        binding: LoopBinding,
        /// The loop body.
        body: Vec<Node>,
        /// Template line of the `@foreach`.
        line: usize,
    },
    /// `@include(name[, params])`.
    Include {
        /// The Lua argument list.
        args: String,
        /// Template line of the tag.
        line: usize,
    },
    /// `@url(name[, params])`.
    Url {
        /// The Lua argument list.
        args: String,
        /// Template line of the tag.
        line: usize,
    },
    /// `@extend(parent, params)`: records a pending extension.
    Extend {
        /// The Lua argument list.
        args: String,
        /// Template line of the tag.
        line: usize,
    },
    /// `@content` ... `@endcontent`: captured body handed to the parent.
    Content {
        /// Nodes whose output is captured.
        body: Vec<Node>,
        /// Template line of the `@endcontent`.
        line: usize,
    },
}

/// One conditional arm of an [`Node::If`].
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// The Lua condition.
    pub condition: String,
    /// Nodes rendered when the condition holds.
    pub body: Vec<Node>,
    /// Template line of the `@if`/`@elseif`.
    pub line: usize,
}

/// Variable binding of a `@foreach` header.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopBinding {
    /// `item in list` / `list as item`: walk a sequence with `ipairs`.
    Sequence {
        /// Loop variable for each element.
        item: String,
        /// Lua expression producing the sequence.
        list: String,
    },
    /// `key, value in map` / `map as key => value`: walk with `pairs`.
    Pairs {
        /// Loop variable for each key.
        key: String,
        /// Loop variable for each value.
        value: String,
        /// Lua expression producing the table.
        table: String,
    },
}

impl Node {
    /// Line of the first raw code block in this subtree.
    pub fn first_raw_line(&self) -> Option<usize> {
        fn first(nodes: &[Node]) -> Option<usize> {
            nodes.iter().find_map(Node::first_raw_line)
        }

        match self {
            Node::Raw { line, .. } => Some(*line),
            Node::If { branches, otherwise } => branches
                .iter()
                .find_map(|b| first(&b.body))
                .or_else(|| otherwise.as_deref().and_then(first)),
            Node::Foreach { body, .. } | Node::Content { body, .. } => first(body),
            _ => None,
        }
    }
}
