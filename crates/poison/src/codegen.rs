// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Lua code generation from the node tree.
//!
//! Each [`Node`] becomes a self-contained Lua fragment placed where the tag
//! was. The result is a compiled artifact: a Lua chunk that takes the
//! engine's runtime table as its only argument and returns the rendered
//! text.
//!
//! # Generated Code Structure
//!
//! ```lua
//! -- Poison compiled view: pages.home
//! local __rt = ...
//! local __write, __capture, __release, __finish = __rt.output()
//! local echo = __write
//! local __pending = nil
//! local function __extend(name, params) ... end
//!
//! __write("<h1>")
//! __write((title))
//! __write("</h1>\n")
//!
//! return __finish()
//! ```
//!
//! Template bindings are not locals: the chunk runs with the render
//! context as its environment, so `title` above is looked up there.

use crate::ast::{LoopBinding, Node};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref LINE_REF: Regex = Regex::new(r":(\d+):").unwrap();
}

/// Source map that maps artifact line numbers to template lines.
#[derive(Debug, Clone, Default)]
pub struct LuaSourceMap {
    /// Maps artifact line number -> template line number.
    /// Only lines generated from a directive are recorded.
    mappings: BTreeMap<usize, usize>,
}

impl LuaSourceMap {
    /// Creates a new empty source map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a mapping from an artifact line to a template line.
    pub fn record(&mut self, lua_line: usize, source_line: usize) {
        self.mappings.insert(lua_line, source_line);
    }

    /// Finds the most likely template line for an artifact line.
    ///
    /// If no exact match, returns the closest preceding mapping.
    pub fn lookup(&self, lua_line: usize) -> Option<usize> {
        if let Some(&source_line) = self.mappings.get(&lua_line) {
            return Some(source_line);
        }

        self.mappings
            .range(..=lua_line)
            .next_back()
            .map(|(_, &source_line)| source_line)
    }

    /// Template line of the first `:LINE:` reference in a Lua error message.
    pub fn template_line(&self, error_msg: &str) -> Option<usize> {
        LINE_REF
            .captures(error_msg)
            .and_then(|caps| caps[1].parse::<usize>().ok())
            .and_then(|lua_line| self.lookup(lua_line))
    }

    /// Rewrites `:LINE:` references in a Lua error message to template lines.
    pub fn translate_error(&self, error_msg: &str) -> String {
        LINE_REF
            .replace_all(error_msg, |caps: &regex::Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|lua_line| self.lookup(lua_line))
                    .map_or_else(|| caps[0].to_string(), |line| format!(":{}:", line))
            })
            .into_owned()
    }
}

/// A translated template, ready to be persisted and executed.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// The view this artifact was generated from.
    pub view: String,
    /// The generated Lua chunk.
    pub code: String,
    /// Artifact line -> template line.
    pub source_map: LuaSourceMap,
}

/// Translates a node tree into a Lua artifact.
///
/// # Examples
///
/// ```rust
/// use poison::{codegen::generate_artifact, parser::parse, scanner::scan};
///
/// let source = "Hi {{ name }}";
/// let nodes = parse("greeting", source, &scan(source)).unwrap();
/// let artifact = generate_artifact("greeting", &nodes);
/// assert!(artifact.code.contains("__write((name))"));
/// ```
pub fn generate_artifact(view: &str, nodes: &[Node]) -> Artifact {
    let mut generator = LuaCodeGenerator::new();

    generator.write_line(&format!("-- Poison compiled view: {}", view));
    generator.write_line("local __rt = ...");
    generator.write_line("local __write, __capture, __release, __finish = __rt.output()");
    generator.write_line("local echo = __write");
    generator.write_line("local __pending = nil");
    generator.write_line("local function __extend(name, params)");
    generator.indent();
    generator.write_line("return { name = name, params = params or {} }");
    generator.dedent();
    generator.write_line("end");
    generator.write_line("");

    generator.generate_nodes(nodes);

    generator.write_line("");
    generator.write_line("return __finish()");

    Artifact {
        view: view.to_string(),
        code: generator.output,
        source_map: generator.source_map,
    }
}

struct LuaCodeGenerator {
    output: String,
    indent_level: usize,
    /// Current output line number (1-indexed).
    current_line: usize,
    source_map: LuaSourceMap,
}

impl LuaCodeGenerator {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent_level: 0,
            current_line: 1,
            source_map: LuaSourceMap::new(),
        }
    }

    fn write_line(&mut self, line: &str) {
        if !line.is_empty() {
            self.output.push_str(&"  ".repeat(self.indent_level));
        }
        self.output.push_str(line);
        self.output.push('\n');
        self.current_line += line.matches('\n').count() + 1;
    }

    /// Writes a line and records the template line it came from.
    fn write_line_with_source(&mut self, line: &str, source_line: usize) {
        if source_line > 0 {
            let lines = line.matches('\n').count();
            for offset in 0..=lines {
                self.source_map.record(self.current_line + offset, source_line);
            }
        }
        self.write_line(line);
    }

    /// Writes raw user code unindented so long strings keep their content.
    fn write_verbatim(&mut self, code: &str, source_line: usize) {
        let lines = code.matches('\n').count();
        for offset in 0..=lines {
            self.source_map
                .record(self.current_line + offset, source_line + offset);
        }
        self.output.push_str(code);
        self.output.push('\n');
        self.current_line += lines + 1;
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn generate_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.generate_node(node);
        }
    }

    fn generate_node(&mut self, node: &Node) {
        match node {
            Node::Text(content) => {
                self.write_line(&format!("__write(\"{}\")", escape_lua_string(content)));
            }
            Node::Interpolation { expression, line } => {
                self.write_line_with_source(&format!("__write(({}))", expression), *line);
            }
            Node::Raw { code, line } => self.write_verbatim(code, *line),
            Node::If {
                branches,
                otherwise,
            } => {
                for (i, branch) in branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "elseif" };
                    if i > 0 {
                        self.dedent();
                    }
                    self.write_line_with_source(
                        &format!("{} ({}) then", keyword, branch.condition),
                        branch.line,
                    );
                    self.indent();
                    self.generate_nodes(&branch.body);
                }
                if let Some(body) = otherwise {
                    self.dedent();
                    self.write_line("else");
                    self.indent();
                    self.generate_nodes(body);
                }
                self.dedent();
                self.write_line("end");
            }
            Node::Foreach {
                binding,
                body,
                line,
            } => {
                let header = match binding {
                    LoopBinding::Sequence { item, list } => {
                        format!("for _, {} in __rt.ipairs({}) do", item, list)
                    }
                    LoopBinding::Pairs { key, value, table } => {
                        format!("for {}, {} in __rt.pairs({}) do", key, value, table)
                    }
                };
                self.write_line_with_source(&header, *line);
                self.indent();
                self.generate_nodes(body);
                self.dedent();
                self.write_line("end");
            }
            Node::Include { args, line } => {
                self.write_line_with_source(&format!("__write(__rt.include({}))", args), *line);
            }
            Node::Url { args, line } => {
                self.write_line_with_source(&format!("__write(__rt.url({}))", args), *line);
            }
            Node::Extend { args, line } => {
                self.write_line_with_source(&format!("__pending = __extend({})", args), *line);
            }
            Node::Content { body, line } => {
                self.write_line("__capture()");
                self.generate_nodes(body);
                self.write_line("do");
                self.indent();
                self.write_line_with_source("local __content = __release()", *line);
                self.write_line_with_source("if __pending == nil then", *line);
                self.indent();
                self.write_line_with_source(
                    "__rt.fail(\"@endcontent reached without a pending @extend\")",
                    *line,
                );
                self.dedent();
                self.write_line("end");
                self.write_line_with_source("__pending.params.content = __content", *line);
                self.write_line_with_source(
                    "__write(__rt.render(__pending.name, __pending.params))",
                    *line,
                );
                self.dedent();
                self.write_line("end");
            }
        }
    }
}

/// Escapes text for a double-quoted Lua string literal.
pub fn escape_lua_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .replace('\0', "\\x00")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::scanner::scan;

    fn compile(source: &str) -> Artifact {
        let nodes = parse("test", source, &scan(source)).unwrap();
        generate_artifact("test", &nodes)
    }

    #[test]
    fn test_escape_lua_string() {
        assert_eq!(escape_lua_string("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }

    #[test]
    fn test_text_is_written_literally() {
        let artifact = compile("line \"one\"\n{{ x }}");
        assert!(artifact.code.contains("__write(\"line \\\"one\\\"\\n\")"));
        assert!(artifact.code.contains("__write((x))"));
        assert!(artifact.code.ends_with("return __finish()\n"));
    }

    #[test]
    fn test_blocks_translate_to_lua_control_flow() {
        let code = compile("@if(a)1@elseif(b)2@else 3@endif").code;
        assert!(code.contains("if (a) then"));
        assert!(code.contains("elseif (b) then"));
        assert!(code.contains("\nelse\n"));

        let code = compile("@foreach(k, v in t){{ k }}@endforeach").code;
        assert!(code.contains("for k, v in __rt.pairs(t) do"));

        let code = compile("@foreach(t as item){{ item }}@endforeach").code;
        assert!(code.contains("for _, item in __rt.ipairs(t) do"));
    }

    #[test]
    fn test_directive_calls() {
        let code = compile("@include('nav', { active = 'home' }) @url('post', { id = 3 })").code;
        assert!(code.contains("__write(__rt.include('nav', { active = 'home' }))"));
        assert!(code.contains("__write(__rt.url('post', { id = 3 }))"));
    }

    #[test]
    fn test_extend_and_content() {
        let code = compile("@extend('layout', { title = 'X' })@content BODY @endcontent").code;
        assert!(code.contains("__pending = __extend('layout', { title = 'X' })"));
        assert!(code.contains("__capture()"));
        assert!(code.contains("__pending.params.content = __content"));
        assert!(code.contains("__write(__rt.render(__pending.name, __pending.params))"));
    }

    #[test]
    fn test_raw_code_is_verbatim() {
        let code = compile("{?\nlocal s = [[\n  keep\n]]\n?}").code;
        assert!(code.contains("\nlocal s = [[\n  keep\n]]\n"));
    }

    #[test]
    fn test_source_map_points_at_template_lines() {
        let artifact = compile("a\nb\n{{ broken + 1 }}");
        let lua_line = artifact
            .code
            .lines()
            .position(|l| l.contains("broken"))
            .unwrap()
            + 1;
        assert_eq!(artifact.source_map.lookup(lua_line), Some(3));

        let message = format!("home:{}: attempt to perform arithmetic", lua_line);
        assert_eq!(
            artifact.source_map.translate_error(&message),
            "home:3: attempt to perform arithmetic"
        );
        assert_eq!(artifact.source_map.template_line(&message), Some(3));
    }
}
