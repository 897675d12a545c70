//! Line-oriented block stack machine.
//!
//! Each input line is classified once, in a fixed priority order, and either
//! opens a construct (pushing a [`Frame`]), switches a conditional branch,
//! closes the top frame, or is rewritten as a plain statement. Literal and
//! table parsing may consume several lines; the cursor only moves forward.
//!
//! `end` closes whatever frame is on top. Source indentation is only compared
//! against the opener's column to report [`DiagnosticKind::MisalignedCloser`];
//! output indentation comes from the frame depth alone.

use crate::diagnostics::{self, Diagnostic, DiagnosticKind, Diagnostics};
use crate::emit::PythonWriter;
use crate::literal::{self, LiteralKind};
use crate::rewrite::{GotoTarget, RewriteContext, RewriteEngine, RuleError};
use crate::scan::{
    brace_balance, find_assignment, find_keyword, is_identifier, split_comment, split_top_level,
    strip_trailing_end,
};
use crate::scope::{self, Scope};
use crate::source::{SourceInput, SourceLine};
use crate::imports::{self, ImportScanner};
use crate::{goto, table};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Kind of an open construct.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameKind {
    Conditional,
    Loop,
    Function,
    Repeat,
    /// `do ... end`; adds no indentation.
    Block,
}

impl FrameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Conditional => "if",
            FrameKind::Loop => "loop",
            FrameKind::Function => "function",
            FrameKind::Repeat => "repeat",
            FrameKind::Block => "do block",
        }
    }
}

/// Knobs for one conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Spaces per output indentation level.
    pub indent_width: usize,
    /// Mask string literals so rewrite rules never fire inside them.
    pub protect_strings: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            indent_width: 4,
            protect_strings: true,
        }
    }
}

/// Everything one conversion produced.
#[derive(Clone, Debug, Serialize)]
pub struct Conversion {
    /// Warnings block, imports, shims and body.
    pub text: String,
    /// Translated statements only.
    pub body: String,
    pub diagnostics: Vec<Diagnostic>,
    pub imports: Vec<String>,
    /// Label name to output line index of its marker.
    pub labels: BTreeMap<String, usize>,
    pub gotos: Vec<GotoTarget>,
    pub metatables: BTreeMap<String, String>,
    pub required_modules: BTreeSet<String>,
    pub frames_opened: usize,
    /// Frames closed by `end` or `until`; frames left open at end of input
    /// are not counted.
    pub frames_closed: usize,
}

/// Statement-level patterns, compiled once per process.
struct Syntax {
    table: Regex,
    function: Regex,
    function_value: Regex,
    if_then: Regex,
    elseif: Regex,
    else_: Regex,
    while_do: Regex,
    numeric_for: Regex,
    generic_for: Regex,
    repeat: Regex,
    until: Regex,
    do_block: Regex,
    local: Regex,
    return_: Regex,
}

impl Syntax {
    fn new() -> Result<Self, RuleError> {
        let compile = |name: &'static str, pattern: &str| {
            Regex::new(pattern).map_err(|source| RuleError::Pattern { name, source })
        };
        Ok(Self {
            table: compile(
                "table-assignment",
                r"^(local\s+)?([A-Za-z_][\w.]*(?:\[[^\]]+\])?)\s*=\s*\{(.*)$",
            )?,
            function: compile(
                "function",
                r"^(local\s+)?function\s+([A-Za-z_][\w.:]*)\s*\(([^)]*)\)\s*(.*)$",
            )?,
            function_value: compile(
                "function-value",
                r"^(local\s+)?([A-Za-z_][\w.]*)\s*=\s*function\s*\(([^)]*)\)\s*(.*)$",
            )?,
            if_then: compile("if", r"^if\s+(.+?)\s+then\b\s*(.*)$")?,
            elseif: compile("elseif", r"^elseif\s+(.+?)\s+then\b\s*(.*)$")?,
            else_: compile("else", r"^else\b\s*(.*)$")?,
            while_do: compile("while", r"^while\s+(.+?)\s+do\b\s*(.*)$")?,
            numeric_for: compile(
                "numeric-for",
                r"^for\s+([A-Za-z_]\w*)\s*=\s*(.+?)\s+do\b\s*(.*)$",
            )?,
            generic_for: compile(
                "generic-for",
                r"^for\s+([A-Za-z_][\w\s,]*?)\s+in\s+(.+?)\s+do\b\s*(.*)$",
            )?,
            repeat: compile("repeat", r"^repeat\b\s*(.*)$")?,
            until: compile("until", r"^until\s+(.+)$")?,
            do_block: compile("do", r"^do\b\s*(.*)$")?,
            local: compile("local", r"^local\s+(.*)$")?,
            return_: compile("return", r"^return\s+(.+)$")?,
        })
    }

    fn shared() -> Result<&'static Syntax, RuleError> {
        static SHARED: OnceLock<Result<Syntax, RuleError>> = OnceLock::new();
        match SHARED.get_or_init(Syntax::new) {
            Ok(syntax) => Ok(syntax),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Translates a whole [`SourceInput`] into Python.
pub struct Converter<'e> {
    engine: &'e RewriteEngine,
    syntax: &'static Syntax,
    imports: &'static ImportScanner,
    options: ConvertOptions,
}

impl<'e> Converter<'e> {
    pub fn new(engine: &'e RewriteEngine, options: ConvertOptions) -> Result<Self, RuleError> {
        Ok(Self {
            engine,
            syntax: Syntax::shared()?,
            imports: ImportScanner::shared()?,
            options,
        })
    }

    /// Convert `input`. Every call starts from a fresh context.
    pub fn convert(&self, input: &SourceInput) -> Conversion {
        let mut ctx = ConversionContext::new(self, &input.lines);
        if input.oversized {
            ctx.diagnostics.push(Diagnostic::new(
                DiagnosticKind::OversizedInput,
                format!(
                    "input has {} lines, more than the configured maximum",
                    input.len()
                ),
            ));
        }
        let mut i = 0;
        while i < input.lines.len() {
            i = ctx.step(i);
        }
        ctx.finish()
    }
}

/// One open construct.
#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    /// Indentation of the opening line in the source.
    column: usize,
    /// 0-indexed opening line.
    line: usize,
    /// Output depth of the header.
    depth: usize,
    /// Output index of the header line.
    header: usize,
    /// Output index where the current branch body starts.
    body_start: usize,
    /// Owned by function frames only; dropped with the frame.
    scope: Option<Scope>,
    /// Emitted at header depth once the frame closes.
    after: Vec<String>,
}

/// Per-run state: construct stack, scopes, output and diagnostics.
struct ConversionContext<'c, 'e> {
    converter: &'c Converter<'e>,
    lines: &'c [SourceLine],
    out: PythonWriter,
    frames: Vec<Frame>,
    module: Scope,
    rewrite: RewriteContext,
    diagnostics: Diagnostics,
    frames_opened: usize,
    frames_closed: usize,
}

fn comment_line(text: &str) -> String {
    match text.trim() {
        "" => "#".to_string(),
        text => format!("# {text}"),
    }
}

fn with_comment(text: String, comment: Option<&str>) -> String {
    match comment {
        Some(comment) if !comment.is_empty() => format!("{text}  # {comment}"),
        _ => text,
    }
}

/// Names in a `local` declaration list, with `<const>`-style attributes removed.
fn declared_names(list: &str) -> Vec<&str> {
    list.split(',')
        .map(|name| name.split_once('<').map_or(name, |(name, _)| name).trim())
        .filter(|name| !name.is_empty())
        .collect()
}

/// `stop` moved by `by`, folded when it is an integer literal.
fn shifted(stop: &str, by: i64) -> String {
    match stop.parse::<i64>().ok().and_then(|n| n.checked_add(by)) {
        Some(n) => n.to_string(),
        None if by < 0 => format!("{stop} - {}", by.unsigned_abs()),
        None => format!("{stop} + {by}"),
    }
}

/// `range(...)` covering Lua's inclusive numeric loop.
fn range_call(start: &str, stop: &str, step: Option<&str>) -> String {
    let Some(step) = step else {
        return format!("range({start}, {})", shifted(stop, 1));
    };
    match step.parse::<i64>() {
        Ok(1) => format!("range({start}, {})", shifted(stop, 1)),
        Ok(n) if n > 0 => format!("range({start}, {}, {step})", shifted(stop, 1)),
        Ok(n) if n < 0 => format!("range({start}, {}, {step})", shifted(stop, -1)),
        _ => format!("range({start}, {stop} + (1 if {step} > 0 else -1), {step})"),
    }
}

impl<'c, 'e> ConversionContext<'c, 'e> {
    fn new(converter: &'c Converter<'e>, lines: &'c [SourceLine]) -> Self {
        Self {
            converter,
            lines,
            out: PythonWriter::new(converter.options.indent_width),
            frames: Vec::new(),
            module: Scope::new(1),
            rewrite: RewriteContext::new(converter.options.protect_strings),
            diagnostics: Diagnostics::default(),
            frames_opened: 0,
            frames_closed: 0,
        }
    }

    fn syntax(&self) -> &'static Syntax {
        self.converter.syntax
    }

    fn depth(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| frame.kind != FrameKind::Block)
            .count()
    }

    fn emit(&mut self, text: &str) {
        let depth = self.depth();
        self.out.line(depth, text);
    }

    fn statement(&mut self, text: &str) -> String {
        self.rewrite.position = self.out.next_index();
        self.converter.engine.rewrite(text, &mut self.rewrite)
    }

    fn condition(&mut self, text: &str) -> String {
        self.rewrite.position = self.out.next_index();
        self.converter.engine.rewrite_condition(text, &mut self.rewrite)
    }

    /// Innermost function scope, or the module scope.
    fn current_scope(&mut self) -> &mut Scope {
        match self.frames.iter_mut().rev().find_map(|f| f.scope.as_mut()) {
            Some(scope) => scope,
            None => &mut self.module,
        }
    }

    fn declare(&mut self, name: &str) {
        self.current_scope().declare(name);
    }

    /// Track a plain assignment for `global`/`nonlocal` declarations.
    fn note_assignment(&mut self, name: &str) {
        let mut scopes: Vec<&mut Scope> = self
            .frames
            .iter_mut()
            .rev()
            .filter_map(|f| f.scope.as_mut())
            .collect();
        let Some((current, enclosing)) = scopes.split_first_mut() else {
            self.module.declare(name);
            return;
        };
        scope::note_assignment(current, enclosing.iter().map(|scope| &**scope), name);
    }

    fn push_frame(
        &mut self,
        kind: FrameKind,
        header: Option<String>,
        scope: Option<Scope>,
        after: Vec<String>,
        i: usize,
    ) {
        let depth = self.depth();
        let index = self.out.next_index();
        if let Some(header) = header {
            self.out.line(depth, &header);
        }
        tracing::debug!(kind = kind.as_str(), line = i + 1, depth, "open");
        self.frames_opened += 1;
        self.frames.push(Frame {
            kind,
            column: self.lines[i].indent,
            line: i,
            depth,
            header: index,
            body_start: self.out.next_index(),
            scope,
            after,
        });
    }

    /// Close the top frame in response to a closer on line `i`.
    fn close_top(&mut self, i: usize) {
        let Some(frame) = self.frames.pop() else {
            self.diagnostics.push(
                Diagnostic::new(DiagnosticKind::UnmatchedCloser, "`end` without an open block")
                    .at(i + 1),
            );
            return;
        };
        self.frames_closed += 1;
        let column = self.lines[i].indent;
        if column > frame.column {
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MisalignedCloser,
                    format!(
                        "closer at column {column} ends the {} opened on line {} at column {}",
                        frame.kind.as_str(),
                        frame.line + 1,
                        frame.column
                    ),
                )
                .at(i + 1),
            );
        }
        self.finish_frame(frame);
    }

    fn finish_frame(&mut self, frame: Frame) {
        tracing::debug!(kind = frame.kind.as_str(), line = frame.line + 1, "close");
        if frame.kind != FrameKind::Block && !self.out.has_code_since(frame.body_start) {
            self.out.line(frame.depth + 1, "pass");
        }
        if let Some(scope) = &frame.scope {
            let declarations = scope.declarations();
            let at = frame.header + 1;
            for (offset, declaration) in declarations.iter().enumerate() {
                self.out.insert(at + offset, frame.depth + 1, declaration);
            }
            goto::shift_labels(&mut self.rewrite.labels, at, declarations.len());
        }
        for line in &frame.after {
            self.out.line(frame.depth, line);
        }
    }

    /// Start the next branch of the conditional on top of the stack.
    fn switch_branch(&mut self, header: &str) {
        let Some(frame) = self.frames.last() else {
            return;
        };
        let (depth, body_start) = (frame.depth, frame.body_start);
        if !self.out.has_code_since(body_start) {
            self.out.line(depth + 1, "pass");
        }
        self.out.line(depth, header);
        let body_start = self.out.next_index();
        if let Some(frame) = self.frames.last_mut() {
            frame.body_start = body_start;
        }
    }

    fn top_is(&self, kind: FrameKind) -> bool {
        self.frames.last().is_some_and(|frame| frame.kind == kind)
    }

    /// Handle the text after a block header: nothing, a first statement, or a
    /// complete one-line body ending in `end`.
    fn block_rest(&mut self, rest: &str, i: usize) {
        let rest = rest.trim();
        if rest.is_empty() {
            return;
        }
        let Some(body) = strip_trailing_end(rest) else {
            self.code(rest, None, i);
            return;
        };
        if self.top_is(FrameKind::Conditional) {
            self.inline_branches(body, i);
        } else {
            self.code(body, None, i);
        }
        self.close_top(i);
    }

    /// Split a one-line conditional body at its `elseif ... then` and `else`
    /// keywords, switching branches in place.
    fn inline_branches(&mut self, body: &str, i: usize) {
        let syntax = self.syntax();
        let mut rest = body;
        loop {
            let next = match (find_keyword(rest, "elseif"), find_keyword(rest, "else")) {
                (Some(a), Some(b)) if b < a => Some((b, false)),
                (Some(a), _) => Some((a, true)),
                (None, Some(b)) => Some((b, false)),
                (None, None) => None,
            };
            let Some((pos, is_elseif)) = next else {
                self.code(rest.trim(), None, i);
                return;
            };
            self.code(rest[..pos].trim(), None, i);
            let tail = &rest[pos..];
            if !is_elseif {
                self.switch_branch("else:");
                rest = &tail["else".len()..];
                continue;
            }
            let Some(caps) = syntax.elseif.captures(tail) else {
                self.code(tail.trim(), None, i);
                return;
            };
            let header = format!("elif {}:", self.condition(&caps[1]));
            self.switch_branch(&header);
            rest = caps.get(2).map_or("", |m| m.as_str());
        }
    }

    /// Process line `i`; returns the index of the next unprocessed line.
    fn step(&mut self, i: usize) -> usize {
        let lines = self.lines;
        let line = &lines[i];
        self.rewrite.line = i + 1;
        if line.is_blank() {
            self.out.blank();
            return i + 1;
        }
        let stripped = line.stripped.as_str();
        if stripped.starts_with(LiteralKind::Comment.opener()) {
            return self.long_comment(i, None);
        }
        if stripped.starts_with(LiteralKind::String.opener()) {
            return self.long_string(i);
        }
        if let Some(comment) = stripped.strip_prefix("--") {
            self.emit(&comment_line(comment));
            return i + 1;
        }
        let (code, comment) = split_comment(stripped);
        let code = code.trim().trim_end_matches(';').trim_end();
        if let Some(comment) = comment
            && comment.starts_with("[[")
            && !comment.contains("]]")
        {
            self.code(code, None, i);
            return self.long_comment(i, line.raw.rfind(LiteralKind::Comment.opener()));
        }
        self.code(code, comment, i)
    }

    fn long_comment(&mut self, i: usize, column: Option<usize>) -> usize {
        let line = &self.lines[i];
        let column =
            column.unwrap_or_else(|| line.raw.find(LiteralKind::Comment.opener()).unwrap_or(0));
        let extracted = literal::extract(
            self.lines,
            i,
            column,
            LiteralKind::Comment,
            &mut self.diagnostics,
        );
        for body_line in extracted.body.split('\n') {
            self.emit(&comment_line(body_line));
        }
        if !extracted.trailing.is_empty() {
            self.code(&extracted.trailing, None, extracted.next - 1);
        }
        extracted.next
    }

    fn long_string(&mut self, i: usize) -> usize {
        let column = self.lines[i].raw.find(LiteralKind::String.opener()).unwrap_or(0);
        let extracted =
            literal::extract(self.lines, i, column, LiteralKind::String, &mut self.diagnostics);
        let mut text = triple_quoted(&extracted.body);
        if !extracted.trailing.is_empty() {
            text.push_str(&self.statement(&extracted.trailing));
        }
        self.emit(&text);
        extracted.next
    }

    /// Dispatch one code fragment (comment already split off).
    fn code(&mut self, code: &str, comment: Option<&str>, i: usize) -> usize {
        let syntax = self.syntax();
        if code.is_empty() {
            if let Some(comment) = comment {
                self.emit(&comment_line(comment));
            }
            return i + 1;
        }
        if let Some(next) = self.assigned_long_string(code, i) {
            return next;
        }
        if let Some(next) = self.table_assignment(code, comment, i) {
            return next;
        }
        if self.function_definition(code, comment, i) {
            return i + 1;
        }
        if let Some(caps) = syntax.if_then.captures(code) {
            let header = with_comment(format!("if {}:", self.condition(&caps[1])), comment);
            self.push_frame(FrameKind::Conditional, Some(header), None, Vec::new(), i);
            self.block_rest(&caps[2], i);
            return i + 1;
        }
        if self.top_is(FrameKind::Conditional) {
            if let Some(caps) = syntax.elseif.captures(code) {
                let header = with_comment(format!("elif {}:", self.condition(&caps[1])), comment);
                self.switch_branch(&header);
                self.block_rest(&caps[2], i);
                return i + 1;
            }
            if let Some(caps) = syntax.else_.captures(code) {
                self.switch_branch(&with_comment("else:".to_string(), comment));
                self.block_rest(&caps[1], i);
                return i + 1;
            }
        }
        if code == "end" {
            self.close_top(i);
            return i + 1;
        }
        if let Some(caps) = syntax.while_do.captures(code) {
            let header = with_comment(format!("while {}:", self.condition(&caps[1])), comment);
            self.push_frame(FrameKind::Loop, Some(header), None, Vec::new(), i);
            self.block_rest(&caps[2], i);
            return i + 1;
        }
        if let Some(caps) = syntax.numeric_for.captures(code) {
            let bounds = split_top_level(&caps[2], &[',']);
            if let [start, stop, step @ ..] = bounds.as_slice()
                && step.len() <= 1
            {
                let start = self.condition(start.trim());
                let stop = self.condition(stop.trim());
                let step = step.first().map(|s| self.condition(s.trim()));
                let var = &caps[1];
                self.declare(var);
                let header = with_comment(
                    format!("for {var} in {}:", range_call(&start, &stop, step.as_deref())),
                    comment,
                );
                self.push_frame(FrameKind::Loop, Some(header), None, Vec::new(), i);
                self.block_rest(&caps[3], i);
                return i + 1;
            }
        }
        if let Some(caps) = syntax.generic_for.captures(code) {
            let vars = declared_names(&caps[1]);
            for var in &vars {
                self.declare(var);
            }
            let iter = self.condition(&caps[2]);
            let header = with_comment(format!("for {} in {iter}:", vars.join(", ")), comment);
            self.push_frame(FrameKind::Loop, Some(header), None, Vec::new(), i);
            self.block_rest(&caps[3], i);
            return i + 1;
        }
        if let Some(caps) = syntax.repeat.captures(code) {
            let header = with_comment("while True:".to_string(), comment);
            self.push_frame(FrameKind::Repeat, Some(header), None, Vec::new(), i);
            let rest = caps[1].trim();
            if !rest.is_empty() {
                self.code(rest, None, i);
            }
            return i + 1;
        }
        if self.top_is(FrameKind::Repeat)
            && let Some(caps) = syntax.until.captures(code)
        {
            let cond = self.condition(&caps[1]);
            let depth = self.depth();
            self.out.line(depth, &with_comment(format!("if {cond}:"), comment));
            self.out.line(depth + 1, "break");
            self.close_top(i);
            return i + 1;
        }
        if let Some(caps) = syntax.do_block.captures(code) {
            self.push_frame(FrameKind::Block, None, None, Vec::new(), i);
            if let Some(comment) = comment {
                self.emit(&comment_line(comment));
            }
            self.block_rest(&caps[1], i);
            return i + 1;
        }
        self.plain_statement(code, comment, i);
        i + 1
    }

    /// `x = [[` with the closer on a later line.
    fn assigned_long_string(&mut self, code: &str, i: usize) -> Option<usize> {
        let pos = code.find(LiteralKind::String.opener())?;
        if code[pos..].contains("]]") {
            return None;
        }
        let target = code[..pos].trim_end().strip_suffix('=')?.trim_end();
        if target.is_empty() || target.ends_with(['=', '~', '<', '>']) {
            return None;
        }
        let line = &self.lines[i];
        let column = line.raw.len() - line.raw.trim_start().len() + pos;
        let extracted =
            literal::extract(self.lines, i, column, LiteralKind::String, &mut self.diagnostics);
        let target = self.assignment_target(target);
        let body = extracted.body.strip_prefix('\n').unwrap_or(&extracted.body);
        let mut text = format!("{target} = {}", triple_quoted(body));
        let trailing = extracted.trailing.trim_end_matches(';').trim();
        if !trailing.is_empty() {
            text.push_str(&self.statement(trailing));
        }
        self.emit(&text);
        Some(extracted.next)
    }

    /// Register and rewrite an assignment target, dropping any `local`.
    fn assignment_target(&mut self, target: &str) -> String {
        let syntax = self.syntax();
        if let Some(caps) = syntax.local.captures(target) {
            let names = declared_names(&caps[1]);
            for name in &names {
                self.declare(name);
            }
            return names.join(", ");
        }
        for name in split_top_level(target, &[',']) {
            let name = name.trim();
            if is_identifier(name) {
                self.note_assignment(name);
            }
        }
        self.statement(target)
    }

    fn table_assignment(&mut self, code: &str, comment: Option<&str>, i: usize) -> Option<usize> {
        let caps = self.syntax().table.captures(code)?;
        if brace_balance(code) <= 0 {
            return None;
        }
        let target = match caps.get(1) {
            Some(local) => format!("{}{}", local.as_str(), &caps[2]),
            None => caps[2].to_string(),
        };
        let target = self.assignment_target(&target);
        let after = caps.get(3).map_or("", |m| m.as_str());
        let parsed = table::parse(self.lines, i, after, &mut self.diagnostics);

        let depth = self.depth();
        let width = self.converter.options.indent_width;
        let engine = self.converter.engine;
        self.rewrite.position = self.out.next_index();
        let rewrite = &mut self.rewrite;
        let mut rendered =
            parsed
                .literal
                .render_block(&format!("{target} = "), depth, width, &mut |value| {
                    engine.rewrite(value, rewrite)
                });
        if let Some(comment) = comment
            && let Some(first) = rendered.first_mut()
        {
            *first = with_comment(std::mem::take(first), Some(comment));
        }
        let trailing = parsed.trailing.trim_end_matches(';').trim();
        if !trailing.is_empty()
            && let Some(last) = rendered.last_mut()
        {
            last.push_str(&engine.rewrite(trailing, &mut self.rewrite));
        }
        for line in rendered {
            self.out.raw(line);
        }
        Some(parsed.next)
    }

    fn function_definition(&mut self, code: &str, comment: Option<&str>, i: usize) -> bool {
        let syntax = self.syntax();
        let Some(caps) = syntax
            .function
            .captures(code)
            .or_else(|| syntax.function_value.captures(code))
        else {
            return false;
        };
        let local = caps.get(1).is_some();
        let name = &caps[2];
        let (def_name, owner, method) = match name.rsplit_once(':') {
            Some((owner, method)) => (method, Some(owner), true),
            None => match name.rsplit_once('.') {
                Some((owner, field)) => (field, Some(owner), false),
                None => (name, None, false),
            },
        };

        let mut scope = Scope::new(i + 1);
        let mut params: Vec<String> = Vec::new();
        if method {
            params.push("self".to_string());
            scope.declare("self");
        }
        for param in caps[3].split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if param == "..." {
                params.push("*args".to_string());
                scope.declare("args");
            } else {
                params.push(param.to_string());
                scope.declare(param);
            }
        }

        if local {
            self.declare(def_name);
        } else if owner.is_none() {
            self.current_scope().define_function(def_name, i + 1);
        }
        let after = owner
            .map(|owner| vec![format!("{owner}.{def_name} = {def_name}")])
            .unwrap_or_default();
        let header = with_comment(format!("def {def_name}({}):", params.join(", ")), comment);
        self.push_frame(FrameKind::Function, Some(header), Some(scope), after, i);
        self.block_rest(&caps[4], i);
        true
    }

    fn plain_statement(&mut self, code: &str, comment: Option<&str>, i: usize) {
        let syntax = self.syntax();
        if let Some(caps) = syntax.local.captures(code) {
            let rest = &caps[1];
            match find_assignment(rest) {
                Some(eq) => {
                    let names = declared_names(&rest[..eq]);
                    for name in &names {
                        self.declare(name);
                    }
                    let text = format!("{} = {}", names.join(", "), rest[eq + 1..].trim_start());
                    let out = self.statement(&text);
                    self.emit(&with_comment(out, comment));
                }
                None => {
                    let names = declared_names(rest);
                    for name in &names {
                        self.declare(name);
                    }
                    let values = vec!["None"; names.len()].join(", ");
                    self.emit(&with_comment(format!("{} = {values}", names.join(", ")), comment));
                }
            }
            return;
        }

        if let Some(caps) = syntax.return_.captures(code) {
            let values = &caps[1];
            if split_top_level(values, &[',']).len() > 1 {
                let out = format!("return ({})", self.statement(values));
                self.emit(&with_comment(out, comment));
                return;
            }
        }

        if let Some(eq) = find_assignment(code) {
            for target in split_top_level(&code[..eq], &[',']) {
                let target = target.trim();
                if is_identifier(target) {
                    self.note_assignment(target);
                }
            }
        }
        tracing::trace!(line = i + 1, "statement");
        let out = self.statement(code);
        self.emit(&with_comment(out, comment));
    }

    fn finish(mut self) -> Conversion {
        while let Some(frame) = self.frames.pop() {
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::UnterminatedConstruct,
                    format!(
                        "{} opened on line {} is never closed",
                        frame.kind.as_str(),
                        frame.line + 1
                    ),
                )
                .at(frame.line + 1),
            );
            self.finish_frame(frame);
        }
        goto::report(&self.rewrite.labels, &self.rewrite.gotos, &mut self.diagnostics);

        let body = self.out.finish();
        let imports = self.converter.imports.required_imports(
            &body,
            !self.rewrite.object_api.is_empty(),
            !self.rewrite.memory_api.is_empty(),
        );
        let shims = imports::shims(&body);
        let diagnostics = self.diagnostics.into_vec();
        let text = imports::assemble(
            &diagnostics::render_block(&diagnostics),
            &imports,
            &shims,
            &body,
        );
        Conversion {
            text,
            body,
            diagnostics,
            imports,
            labels: self.rewrite.labels,
            gotos: self.rewrite.gotos,
            metatables: self.rewrite.metatables,
            required_modules: self.rewrite.required_modules,
            frames_opened: self.frames_opened,
            frames_closed: self.frames_closed,
        }
    }
}

fn triple_quoted(body: &str) -> String {
    format!("\"\"\"{}\"\"\"", body.replace("\"\"\"", "\\\"\\\"\\\""))
}
