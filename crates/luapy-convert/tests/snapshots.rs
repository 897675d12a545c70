//! End-to-end conversion tests.
//!
//! Inline snapshots hold the exact Python produced for small Lua programs.
//! Run `cargo insta review` to update them after intentional changes.

use luapy_convert::{
    Conversion, ConvertOptions, Converter, DiagnosticKind, RewriteEngine, SourceInput, convert,
};

fn run(source: &str) -> Conversion {
    convert(source, ConvertOptions::default()).expect("rule tables compile")
}

// ============================================================================
// Block structure
// ============================================================================

#[test]
fn simple_program_has_no_warnings_or_imports() {
    let out = run("local x = 1\nif x == 1 then\n  print(x)\nend");
    insta::assert_snapshot!(out.text, @r"
x = 1
if x == 1:
    print(x)
");
    assert!(out.diagnostics.is_empty());
    assert!(out.imports.is_empty());
}

#[test]
fn numeric_loop_includes_both_bounds() {
    let out = run("for i = 1, 5 do\n  print(i)\nend");
    insta::assert_snapshot!(out.body, @r"
for i in range(1, 6):
    print(i)
");
}

#[test]
fn unmatched_statement_only_loses_local() {
    let out = run("local y = foo(bar)");
    assert_eq!(out.body, "y = foo(bar)\n");
}

#[test]
fn construct_count_balances() {
    let cases = [
        "if a then\nend",
        "while x do\n  if y then\n",
        "function f()\n  for i = 1, 2 do\n  end\n",
        "repeat\nuntil done\nend",
        "if a then b() end\nfor k in pairs(t) do",
    ];
    for source in cases {
        let out = run(source);
        let unterminated = out
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::UnterminatedConstruct)
            .count();
        assert_eq!(
            out.frames_opened,
            unterminated + out.frames_closed,
            "source: {source:?}"
        );
        assert_eq!(
            out.frames_opened == out.frames_closed,
            unterminated == 0,
            "source: {source:?}"
        );
    }
}

#[test]
fn unterminated_block_is_reported_in_output() {
    let out = run("if ready then\n  go()");
    insta::assert_snapshot!(out.text, @r"
# Warnings:
# line 1: if opened on line 1 is never closed

if ready:
    go()
");
    insta::assert_json_snapshot!(out.diagnostics, @r#"
[
  {
    "kind": "unterminated-construct",
    "line": 1,
    "message": "if opened on line 1 is never closed"
  }
]
"#);
}

#[test]
fn oversized_input_is_still_converted_with_a_warning() {
    let engine = RewriteEngine::shared().expect("rule tables compile");
    let converter = Converter::new(engine, ConvertOptions::default()).expect("syntax compiles");
    let out = converter.convert(&SourceInput::from_text("local a = 1\nlocal b = nil", 1));
    insta::assert_snapshot!(out.text, @r"
# Warnings:
# input has 2 lines, more than the configured maximum

a = 1
b = None
");
    insta::assert_json_snapshot!(out.diagnostics, @r#"
[
  {
    "kind": "oversized-input",
    "line": null,
    "message": "input has 2 lines, more than the configured maximum"
  }
]
"#);
}

#[test]
fn nested_functions_and_loops() {
    let source = r#"
local Counter = {}

function Counter.new(start)
  local self = setmetatable({}, {__index = Counter})
  self.value = start or 0
  return self
end

function Counter:step(n)
  for i = 1, n do
    self.value = self.value + 1
  end
  return self.value, n
end
"#;
    let out = run(source.trim_start());
    insta::assert_snapshot!(out.body, @r"
Counter = []

def new(start):
    self = __setmetatable([], {'__index': Counter})
    self.value = start if start is not None else 0
    return self
Counter.new = new

def step(self, n):
    for i in range(1, n + 1):
        self.value = self.value + 1
    return (self.value, n)
Counter.step = step
");
}

#[test]
fn metatable_records_last_literal() {
    let out = run("setmetatable(obj, {__index = Base})\nsetmetatable(obj, {__index = Other})");
    assert_eq!(out.metatables["obj"], "{'__index': Other}");
    assert!(out.text.starts_with("__metatables = {}\n"));
}

// ============================================================================
// Tables
// ============================================================================

#[test]
fn positional_table_is_a_list() {
    let out = run("local colors = {\n  \"red\",\n  \"green\",\n}");
    insta::assert_snapshot!(out.body, @r#"
colors = [
    "red",
    "green",
]
"#);
}

#[test]
fn any_keyed_entry_makes_a_dict() {
    let out = run("local t = {\n  \"first\",\n  name = \"x\",\n  [10] = false,\n}");
    insta::assert_snapshot!(out.body, @r#"
t = {
    1: "first",
    'name': "x",
    10: False,
}
"#);
}

#[test]
fn inline_tables() {
    let out = run("local point = {x = 1, y = 2}\nlocal list = {1, 2, 3}");
    assert_eq!(out.body, "point = {'x': 1, 'y': 2}\nlist = [1, 2, 3]\n");
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn long_literals_consume_their_lines() {
    let out = run("--[[ one\ntwo ]]\nlocal s = [[\nalpha\nbeta\n]]\nprint(s)");
    insta::assert_snapshot!(out.body, @r#"
# one
# two
s = """alpha
beta
"""
print(s)
"#);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn unterminated_long_string_swallows_rest() {
    let out = run("s = [[\nnever closed\nprint(1)");
    assert_eq!(out.diagnostics.len(), 1);
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnterminatedLiteral);
    assert_eq!(out.body, "s = \"\"\"never closed\nprint(1)\"\"\"\n");
}

// ============================================================================
// Rewrites, imports and control transfer
// ============================================================================

#[test]
fn memory_api_imports_once() {
    let out = run("gg.toast(\"a\")\ngg.clearResults()\nif x then\n  gg.toast(\"b\")\nend");
    assert_eq!(out.imports, vec!["import gg".to_string()]);
    assert_eq!(out.text.matches("import gg").count(), 1);
}

#[test]
fn object_api_imports_enum() {
    let out = run("local part = Instance.new(\"Part\")\npart.Parent = workspace");
    assert_eq!(out.body, "part = Instance.new(\"Part\")\npart.parent = workspace\n");
    assert_eq!(out.imports, vec!["from enum import Enum".to_string()]);
}

#[test]
fn labels_and_gotos_keep_their_positions() {
    let out = run("::done::\nx = 1\ngoto done");
    insta::assert_snapshot!(out.body, @r"
def goto_done(): pass
x = 1
goto_done()
");
    assert_eq!(out.labels["done"], 0);
    assert_eq!(out.gotos[0].line, 3);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn goto_without_label_is_diagnosed() {
    let out = run("goto nowhere");
    assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnresolvedGoto);
    assert_eq!(out.diagnostics[0].line, Some(1));
}

#[test]
fn protected_calls_pull_in_shims() {
    let out = run("local ok, err = pcall(risky)\nmath.floor(1.5)");
    assert!(out.text.starts_with("import math\n\ndef __pcall_wrapper(fn, *args):\n"));
    assert!(out.body.starts_with("ok, err = __pcall_wrapper(risky)\n"));
}

#[test]
fn strings_can_be_rewritten_when_unprotected() {
    let source = "print(\"nil\")";
    let protected = run(source);
    let raw = convert(
        source,
        ConvertOptions {
            protect_strings: false,
            ..ConvertOptions::default()
        },
    )
    .expect("rule tables compile");
    assert_eq!(protected.body, "print(\"nil\")\n");
    assert_eq!(raw.body, "print(\"None\")\n");
}

#[test]
fn indent_width_is_configurable() {
    let out = convert(
        "while true do\n  step()\nend",
        ConvertOptions {
            indent_width: 2,
            ..ConvertOptions::default()
        },
    )
    .expect("rule tables compile");
    assert_eq!(out.body, "while True:\n  step()\n");
}

#[test]
fn conversion_serializes() {
    let out = run("goto nowhere");
    let json = serde_json::to_value(&out).expect("serializable");
    assert_eq!(json["diagnostics"][0]["kind"], "unresolved-goto");
    assert_eq!(json["gotos"][0]["label"], "nowhere");
}
