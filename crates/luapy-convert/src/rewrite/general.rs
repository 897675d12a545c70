//! General Lua idioms: literals, operators, standard library calls.
//!
//! Patterns for bare global functions start with `(^|[^.\w])` so a method of
//! the same name (`log.error(...)`) is left alone; the prefix is group 1 and
//! every template re-emits it.

use super::{GotoTarget, RewriteContext, RuleSpec, group};
use crate::scan::{is_identifier, split_top_level};
use regex::Captures;

pub(super) const RULES: &[RuleSpec] = &[
    RuleSpec::template("nil", r"\bnil\b", "None"),
    RuleSpec::template("true", r"\btrue\b", "True"),
    RuleSpec::template("false", r"\bfalse\b", "False"),
    RuleSpec::template("color3-rgb", r"\bColor3\.fromRGB\s*\(", "Color3.from_rgb("),
    RuleSpec::func(
        "instance-new",
        r#"\bInstance\.new\s*\(\s*("[^"]+"|'[^']+')\s*(?:,\s*([^()]+?))?\s*\)"#,
        instance_new,
    ),
    RuleSpec::template(
        "get-service",
        r#"[.:]GetService\s*\(\s*("[^"]+"|'[^']+')\s*\)"#,
        ".get_service(${1})",
    ),
    RuleSpec::template("game-colon", r"\bgame\s*:\s*", "game."),
    RuleSpec::template(
        "connect-function",
        r"[.:]Connect\s*\(\s*function\s*\(\s*\)\s*(.*?)\s*end\s*\)",
        ".connect(lambda: ${1})",
    ),
    RuleSpec::template("colon-call", r":([A-Za-z_]\w*)\s*\(", ".${1}("),
    RuleSpec::template("local-player", r"\bPlayers\.LocalPlayer\b", "players.local_player"),
    RuleSpec::template("fire", r"\.Fire\s*\(", ".fire("),
    RuleSpec::template(
        "random-range",
        r"\bmath\.random\s*\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)",
        "random.randint(${1}, ${2})",
    ),
    RuleSpec::template(
        "random-upper",
        r"\bmath\.random\s*\(\s*([^,()\s][^,()]*?)\s*\)",
        "random.randint(1, ${1})",
    ),
    RuleSpec::template("random-unit", r"\bmath\.random\s*\(\s*\)", "random.random()"),
    RuleSpec::func(
        "select-count",
        r#"(^|[^.\w])select\s*\(\s*"([^"]*)"\s*,\s*\.\.\.\s*\)"#,
        select_count,
    ),
    RuleSpec::template("vararg-spread", r"([(\[,]\s*)\.\.\.", "${1}*args"),
    RuleSpec::template("vararg", r"\.\.\.", "args"),
    RuleSpec::template("concat", r"\s*\.\.\s*", " + "),
    RuleSpec::template(
        "pcall-function",
        r"(^|[^.\w])pcall\s*\(\s*function\s*\(\s*\)\s*(.*?)\s*end\s*\)",
        "${1}__pcall_wrapper(lambda: ${2})",
    ),
    RuleSpec::template("pcall", r"(^|[^.\w])pcall\s*\(", "${1}__pcall_wrapper("),
    RuleSpec::template("xpcall", r"(^|[^.\w])xpcall\s*\(", "${1}__xpcall_wrapper("),
    RuleSpec::template(
        "error-level",
        r"(^|[^.\w])error\s*\(\s*(.*?)\s*,\s*\d+\s*\)",
        "${1}raise RuntimeError(${2})",
    ),
    RuleSpec::template("error", r"(^|[^.\w])error\s*\(", "${1}raise RuntimeError("),
    RuleSpec::template("assert", r"(^|[^.\w])assert\s*\(", "${1}__assert_wrapper("),
    RuleSpec::template(
        "or-default",
        r"\b(\w+)\s+or\s+(.[^\s),;}|]*)",
        "${1} if ${1} is not None else ${2}",
    )
    .statement_only(),
    RuleSpec::template("length", r"#([A-Za-z_][\w.]*)", "len(${1})"),
    RuleSpec::template("not-equal", r"~=", "!="),
    RuleSpec::template("power", r"\s*\^\s*", " ** "),
    RuleSpec::func(
        "table-insert-at",
        r"\btable\.insert\s*\(\s*([\w.]+)\s*,\s*([^,()\[\]{}]+?)\s*,\s*(.+?)\s*\)",
        table_insert_at,
    ),
    RuleSpec::template(
        "table-insert",
        r"\btable\.insert\s*\(\s*([\w.]+)\s*,\s*(.+?)\s*\)",
        "${1}.append(${2})",
    ),
    RuleSpec::func(
        "table-remove-at",
        r"\btable\.remove\s*\(\s*([\w.]+)\s*,\s*([^,()\[\]{}]+?)\s*\)",
        table_remove_at,
    ),
    RuleSpec::template(
        "table-remove",
        r"\btable\.remove\s*\(\s*([\w.]+)\s*\)",
        "${1}.pop()",
    ),
    RuleSpec::func(
        "table-concat",
        r#"\btable\.concat\s*\(\s*([\w.]+)\s*(?:,\s*("[^"]*"|'[^']*')\s*(?:,\s*([^,()]+?)\s*,\s*([^,()]+?)\s*)?)?\)"#,
        table_concat,
    ),
    RuleSpec::func(
        "table-sort",
        r"\btable\.sort\s*\(\s*([\w.]+)\s*(?:,\s*(?:function\s*\(([^)]*)\)\s*(?:return\s+)?(.*?)\s*end|([\w.]+)))?\s*\)",
        table_sort,
    ),
    RuleSpec::template(
        "unpack",
        r"(^|[^.\w])(?:table\.)?unpack\s*\(\s*([\w.]+)\s*\)",
        "${1}*${2}",
    ),
    RuleSpec::func(
        "setmetatable",
        r"(^|[^.\w])setmetatable\s*\(\s*([\w.]+)\s*,\s*(\{[^}]*\}|\[\]|[\w.]+)\s*\)",
        set_metatable,
    ),
    RuleSpec::template(
        "setmetatable-any",
        r"(^|[^.\w])setmetatable\s*\(",
        "${1}__setmetatable(",
    ),
    RuleSpec::template(
        "getmetatable",
        r"(^|[^.\w])getmetatable\s*\(",
        "${1}__getmetatable(",
    ),
    RuleSpec::template(
        "coroutine-create",
        r"\bcoroutine\.create\s*\(\s*(.+?)\s*\)",
        "threading.Thread(target=${1}, daemon=True)",
    ),
    RuleSpec::template(
        "coroutine-resume",
        r"\bcoroutine\.resume\s*\(\s*([\w.]+)\s*\)",
        "${1}.start()",
    ),
    RuleSpec::template("coroutine-yield", r"\bcoroutine\.yield\s*\(", "__yield("),
    RuleSpec::template(
        "coroutine-wrap",
        r"\bcoroutine\.wrap\s*\(\s*(.+?)\s*\)",
        "lambda *a, **k: __coroutine_wrap(${1})(*a, **k)",
    ),
    RuleSpec::func(
        "string-format",
        r#"\bstring\.format\s*\(\s*("[^"]*"|'[^']*')((?:\s*,\s*(?:[^(),]|\([^()]*\))+)*)\s*\)"#,
        string_format,
    ),
    RuleSpec::func(
        "string-byte",
        r"\bstring\.byte\s*\(\s*([\w.]+)\s*(?:,\s*([^,()]+?)\s*(?:,\s*([^,()]+?)\s*)?)?\)",
        string_byte,
    ),
    RuleSpec::template(
        "string-char",
        r"\bstring\.char\s*\(\s*(.+?)\s*\)",
        "''.join(chr(int(x)) for x in (${1},))",
    ),
    RuleSpec::func(
        "string-gsub",
        r#"\bstring\.gsub\s*\(\s*([\w.]+)\s*,\s*("[^"]*"|'[^']*')\s*,\s*("[^"]*"|'[^']*')\s*(?:,\s*(\d+)\s*)?\)"#,
        string_gsub,
    ),
    RuleSpec::func(
        "string-find",
        r#"\bstring\.find\s*\(\s*([\w.]+)\s*,\s*("[^"]*"|'[^']*')\s*(?:,\s*([^,()]+?)\s*)?\)"#,
        string_find,
    ),
    RuleSpec::template(
        "string-match",
        r#"\bstring\.match\s*\(\s*([\w.]+)\s*,\s*"([^"]*)"\s*\)"#,
        r#"re.search(r"${2}", ${1}).group() if re.search(r"${2}", ${1}) else None"#,
    ),
    RuleSpec::template(
        "string-upper",
        r"\bstring\.upper\s*\(\s*([\w.]+)\s*\)",
        "${1}.upper()",
    ),
    RuleSpec::template(
        "string-lower",
        r"\bstring\.lower\s*\(\s*([\w.]+)\s*\)",
        "${1}.lower()",
    ),
    RuleSpec::template("string-len", r"\bstring\.len\s*\(", "len("),
    RuleSpec::template(
        "string-rep",
        r"\bstring\.rep\s*\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)",
        "${1} * ${2}",
    ),
    RuleSpec::func(
        "string-sub",
        r"\bstring\.sub\s*\(\s*([\w.]+)\s*,\s*([^,()]+?)\s*(?:,\s*([^,()]+?)\s*)?\)",
        string_sub,
    ),
    RuleSpec::template("math-abs", r"\bmath\.abs\s*\(", "abs("),
    RuleSpec::template("math-rad", r"\bmath\.rad\s*\(", "math.radians("),
    RuleSpec::template("math-deg", r"\bmath\.deg\s*\(", "math.degrees("),
    RuleSpec::template("math-max", r"\bmath\.max\s*\(", "max("),
    RuleSpec::template("math-min", r"\bmath\.min\s*\(", "min("),
    RuleSpec::template("math-huge", r"\bmath\.huge\b", r#"float("inf")"#),
    RuleSpec::template(
        "os-time-table",
        r"\bos\.time\s*\(\s*(\{[^}]*\}|[\w.]+)\s*\)",
        r#"time.mktime(tuple(${1}.get(k, d) for k, d in (("year", 1970), ("month", 1), ("day", 1), ("hour", 12), ("min", 0), ("sec", 0))) + (0, 0, -1))"#,
    ),
    RuleSpec::template("os-time", r"\bos\.time\s*\(\s*\)", "time.time()"),
    RuleSpec::template("os-date-now", r"\bos\.date\s*\(\s*\)", "time.ctime()"),
    RuleSpec::func(
        "os-date",
        r#"\bos\.date\s*\(\s*("[^"]*"|'[^']*')\s*(?:,\s*([^()]+?)\s*)?\)"#,
        os_date,
    ),
    RuleSpec::template("os-clock", r"\bos\.clock\s*\(\s*\)", "time.perf_counter()"),
    RuleSpec::template(
        "io-open",
        r#"\bio\.open\s*\(\s*("[^"]*"|'[^']*'|[\w.]+)\s*,\s*("[^"]*"|'[^']*')\s*\)"#,
        "open(${1}, ${2})",
    ),
    RuleSpec::template("io-read", r"\bio\.read\s*\(\s*\)", "input()"),
    RuleSpec::func(
        "require-assign",
        r#"^([A-Za-z_]\w*)\s*=\s*require\s*\(?\s*["']([^"']+)["']\s*\)?\s*$"#,
        require_assign,
    ),
    RuleSpec::func(
        "require",
        r#"(^|[^.\w])require\s*\(?\s*["']([^"']+)["']\s*\)?"#,
        require,
    ),
    RuleSpec::template("env", r"\b_ENV\b", "globals()"),
    RuleSpec::func(
        "collectgarbage",
        r#"(^|[^.\w])collectgarbage\s*\(\s*(?:"([^"]*)"|'([^']*)')?\s*\)"#,
        collect_garbage,
    ),
    RuleSpec::template(
        "bit32-band",
        r"\bbit32\.band\s*\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)",
        "(${1} & ${2})",
    ),
    RuleSpec::template(
        "bit32-bor",
        r"\bbit32\.bor\s*\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)",
        "(${1} | ${2})",
    ),
    RuleSpec::template(
        "bit32-bxor",
        r"\bbit32\.bxor\s*\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)",
        "(${1} ^ ${2})",
    ),
    RuleSpec::template(
        "bit32-lshift",
        r"\bbit32\.lshift\s*\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)",
        "(${1} << ${2})",
    ),
    RuleSpec::template(
        "bit32-rshift",
        r"\bbit32\.rshift\s*\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)",
        "(${1} >> ${2})",
    ),
    RuleSpec::template(
        "bit32-bnot",
        r"\bbit32\.bnot\s*\(\s*([^,()]+?)\s*\)",
        "(~${1})",
    ),
    RuleSpec::func("goto", r"\bgoto\s+([A-Za-z_]\w*)", goto),
    RuleSpec::func("label", r"::([A-Za-z_]\w*)::", label),
    RuleSpec::template(
        "loadstring",
        r"(^|[^.\w])loadstring\s*\(\s*(.+?)\s*\)",
        r#"${1}compile(${2}, "<lua>", "exec")"#,
    ),
    RuleSpec::template(
        "dofile",
        r#"(^|[^.\w])dofile\s*\(\s*("[^"]*"|'[^']*')\s*\)"#,
        r#"${1}exec(open(${2}, encoding="utf-8").read())"#,
    ),
    RuleSpec::template(
        "load",
        r"(^|[^.\w])load\s*\(\s*([^()]+?)\s*\)",
        r#"${1}compile(${2}, "<lua>", "exec")"#,
    ),
    RuleSpec::template(
        "wait",
        r"(^|[^.\w])wait\s*\(\s*([\d.]+)\s*\)",
        "${1}time.sleep(${2})",
    ),
    RuleSpec::template(
        "pairs",
        r"(^|[^.\w])pairs\s*\(\s*([\w.]+)\s*\)",
        "${1}${2}.items()",
    ),
    RuleSpec::template(
        "ipairs",
        r"(^|[^.\w])ipairs\s*\(\s*([\w.]+)\s*\)",
        "${1}enumerate(${2})",
    ),
    RuleSpec::template(
        "rawset",
        r"(^|[^.\w])rawset\s*\(\s*([\w.]+)\s*,\s*([^,()]+?)\s*,\s*(.+?)\s*\)",
        "${1}${2}[${3}] = ${4}",
    ),
    RuleSpec::template(
        "rawget",
        r"(^|[^.\w])rawget\s*\(\s*([\w.]+)\s*,\s*([^,()]+?)\s*\)",
        "${1}${2}.get(${3})",
    ),
    RuleSpec::template("rawlen", r"(^|[^.\w])rawlen\s*\(", "${1}len("),
    RuleSpec::template(
        "rawequal",
        r"(^|[^.\w])rawequal\s*\(\s*([^,()]+?)\s*,\s*([^,()]+?)\s*\)",
        "${1}(${2} is ${3})",
    ),
    RuleSpec::func(
        "next",
        r"(^|[^.\w])next\s*\(\s*([\w.]+)\s*(?:,\s*([^,()]+?)\s*)?\)",
        next_key,
    ),
    RuleSpec::template("tostring", r"(^|[^.\w])tostring\s*\(", "${1}str("),
    RuleSpec::template(
        "tonumber",
        r"(^|[^.\w])tonumber\s*\(\s*([^,()]+?)\s*\)",
        "${1}(float(${2}) if ${2} else 0)",
    ),
    RuleSpec::template("getfenv", r"(^|[^.\w])getfenv\s*\(", "${1}__getfenv("),
    RuleSpec::template("setfenv", r"(^|[^.\w])setfenv\s*\(", "${1}__setfenv("),
    RuleSpec::template("debug-getinfo", r"\bdebug\.getinfo\s*\(", "__debug_getinfo("),
    RuleSpec::template(
        "debug-traceback",
        r"\bdebug\.traceback\s*\(\s*\)",
        "traceback.format_exc()",
    ),
    RuleSpec::template("debug-getupvalue", r"\bdebug\.getupvalue\s*\(", "__getupvalue("),
    RuleSpec::template("debug-setupvalue", r"\bdebug\.setupvalue\s*\(", "__setupvalue("),
];

/// The raw `(^|[^.\w])` guard group.
fn prefix<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1).map_or("", |m| m.as_str())
}

fn instance_new(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    match group(caps, 2) {
        "" => format!("Instance.new({})", group(caps, 1)),
        parent => format!("Instance.new({}, {})", group(caps, 1), parent),
    }
}

fn select_count(caps: &Captures<'_>, ctx: &mut RewriteContext) -> String {
    let prefix = prefix(caps);
    if ctx.reveal(group(caps, 2)) == "#" {
        format!("{prefix}len(args)")
    } else {
        format!("{prefix}{}", &caps[0][caps[1].len()..])
    }
}

/// `n - 1` for an integer literal, `expr - 1` otherwise.
fn zero_based(index: &str) -> String {
    match index.parse::<i64>().ok().and_then(|n| n.checked_sub(1)) {
        Some(n) => n.to_string(),
        None => format!("{index} - 1"),
    }
}

fn table_insert_at(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    format!(
        "{}.insert({}, {})",
        group(caps, 1),
        zero_based(group(caps, 2)),
        group(caps, 3)
    )
}

fn table_remove_at(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    format!("{}.pop({})", group(caps, 1), zero_based(group(caps, 2)))
}

fn table_concat(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let table = group(caps, 1);
    let sep = match group(caps, 2) {
        "" => "\"\"",
        sep => sep,
    };
    match (group(caps, 3), group(caps, 4)) {
        ("", _) | (_, "") => format!("{sep}.join(map(str, {table}))"),
        (from, to) => format!(
            "{sep}.join(str({table}[i]) for i in range({}, min({to}, len({table}))))",
            zero_based(from)
        ),
    }
}

fn table_sort(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let table = group(caps, 1);
    if let Some(body) = caps.get(3) {
        let params = match group(caps, 2) {
            "" => "a, b",
            params => params,
        };
        return format!(
            "{table}.sort(key=functools.cmp_to_key(lambda {params}: -1 if ({}) else 1))",
            body.as_str().trim()
        );
    }
    match group(caps, 4) {
        "" => format!("{table}.sort()"),
        field => format!("{table}.sort(key=lambda x: x.{field})"),
    }
}

fn set_metatable(caps: &Captures<'_>, ctx: &mut RewriteContext) -> String {
    let table = group(caps, 2);
    let meta = group(caps, 3);
    ctx.metatables.insert(table.to_string(), ctx.reveal(meta));
    format!("{}__setmetatable({table}, {meta})", prefix(caps))
}

fn string_format(caps: &Captures<'_>, ctx: &mut RewriteContext) -> String {
    let literal = group(caps, 1);
    let quote = &literal[..1];
    let fmt = ctx.reveal(&literal[1..literal.len() - 1]);
    let args: Vec<&str> = split_top_level(group(caps, 2), &[','])
        .into_iter()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .collect();
    if args.is_empty() {
        return format!("{quote}{}{quote}", ctx.stash(&fmt));
    }

    let mut out = String::new();
    let mut rest = fmt.as_str();
    let mut implicit = 0;
    let mut numbered = false;
    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open + 1..].find('}') else {
            break;
        };
        let inner = &rest[open + 1..open + 1 + len];
        if !inner.chars().all(|c| c.is_ascii_digit()) {
            out.push_str(&rest[..open + 1 + len + 1]);
            rest = &rest[open + 1 + len + 1..];
            continue;
        }
        numbered = true;
        let index = inner.parse::<usize>().unwrap_or_else(|_| {
            implicit += 1;
            implicit - 1
        });
        out.push_str(&rest[..open]);
        out.push('{');
        out.push_str(args.get(index).copied().unwrap_or(""));
        out.push('}');
        rest = &rest[open + 1 + len + 1..];
    }
    out.push_str(rest);

    if numbered {
        format!("f{quote}{}{quote}", ctx.stash(&out))
    } else {
        format!(
            "{quote}{}{quote} % ({})",
            ctx.stash(&fmt),
            args.join(", ")
        )
    }
}

fn string_byte(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let s = group(caps, 1);
    match (group(caps, 2), group(caps, 3)) {
        ("", _) => format!("ord({s}[0])"),
        (start, "") => format!(
            "ord({s}[{}]) if len({s}) >= {start} else None",
            zero_based(start)
        ),
        (start, end) => format!(
            "[ord({s}[i]) for i in range({}, min({end}, len({s})))]",
            zero_based(start)
        ),
    }
}

fn string_gsub(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let (s, pattern, replacement) = (group(caps, 1), group(caps, 2), group(caps, 3));
    match group(caps, 4) {
        "" => format!("{s}.replace({pattern}, {replacement})"),
        count => format!("{s}.replace({pattern}, {replacement}, {count})"),
    }
}

fn string_find(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let (s, pattern) = (group(caps, 1), group(caps, 2));
    match group(caps, 3) {
        "" => format!("{s}.find({pattern}) + 1"),
        init => format!("{s}.find({pattern}, {}) + 1", zero_based(init)),
    }
}

fn string_sub(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let s = group(caps, 1);
    let start = match group(caps, 2).parse::<i64>() {
        Ok(n) if n < 0 => n.to_string(),
        Ok(n) => (n.max(1) - 1).to_string(),
        Err(_) => format!("{} - 1", group(caps, 2)),
    };
    let end = match group(caps, 3) {
        "" => String::new(),
        raw => match raw.parse::<i64>() {
            Ok(-1) => String::new(),
            Ok(n) if n < 0 => (n + 1).to_string(),
            _ => raw.to_string(),
        },
    };
    format!("{s}[{start}:{end}]")
}

fn os_date(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    match group(caps, 2) {
        "" => format!("time.strftime({})", group(caps, 1)),
        t => format!("time.strftime({}, time.localtime({t}))", group(caps, 1)),
    }
}

fn require_assign(caps: &Captures<'_>, ctx: &mut RewriteContext) -> String {
    let name = group(caps, 1);
    let module = ctx.reveal(group(caps, 2));
    ctx.required_modules.insert(module.clone());
    if module == name {
        format!("import {module}")
    } else {
        format!("import {module} as {name}")
    }
}

fn require(caps: &Captures<'_>, ctx: &mut RewriteContext) -> String {
    let module = ctx.reveal(group(caps, 2));
    if !module.split('.').all(is_identifier) {
        return caps[0].to_string();
    }
    ctx.required_modules.insert(module.clone());
    format!("{}from {module} import *", prefix(caps))
}

fn collect_garbage(caps: &Captures<'_>, ctx: &mut RewriteContext) -> String {
    let option = ctx.reveal(caps.get(2).or(caps.get(3)).map_or("", |m| m.as_str()));
    match option.as_str() {
        "" | "collect" => format!("{}gc.collect()", prefix(caps)),
        _ => caps[0].to_string(),
    }
}

fn goto(caps: &Captures<'_>, ctx: &mut RewriteContext) -> String {
    let label = group(caps, 1);
    ctx.gotos.push(GotoTarget {
        line: ctx.line,
        label: label.to_string(),
    });
    format!("goto_{label}()")
}

fn label(caps: &Captures<'_>, ctx: &mut RewriteContext) -> String {
    let label = group(caps, 1);
    ctx.labels.insert(label.to_string(), ctx.position);
    format!("def goto_{label}(): pass")
}

fn next_key(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let (prefix, table) = (prefix(caps), group(caps, 2));
    match group(caps, 3) {
        "" => format!("{prefix}next(iter({table}), None)"),
        key => format!("{prefix}next(iter({table}), {key})"),
    }
}

#[cfg(test)]
mod tests {
    use crate::rewrite::{RewriteContext, RewriteEngine};

    fn rewrite(line: &str) -> String {
        let engine = RewriteEngine::new().unwrap();
        let mut ctx = RewriteContext::new(true);
        engine.rewrite(line, &mut ctx)
    }

    #[test]
    fn literals_and_operators() {
        assert_eq!(rewrite("x = nil"), "x = None");
        assert_eq!(rewrite("ok = a ~= b"), "ok = a != b");
        assert_eq!(rewrite("n = #items"), "n = len(items)");
        assert_eq!(rewrite("s = a .. b"), "s = a + b");
        assert_eq!(rewrite("p = 2 ^ 8"), "p = 2 ** 8");
    }

    #[test]
    fn colon_calls_become_dot_calls() {
        assert_eq!(rewrite("obj:move(1, 2)"), "obj.move(1, 2)");
    }

    #[test]
    fn inserting_a_table_literal_appends_it() {
        assert_eq!(rewrite("table.insert(t, {1, 2})"), "t.append([1, 2])");
        assert_eq!(
            rewrite("table.insert(t, {x = 1, y = 2})"),
            "t.append({'x': 1, 'y': 2})"
        );
        assert_eq!(rewrite("table.insert(t, 2, {3})"), "t.insert(1, [3])");
    }

    #[test]
    fn table_helpers() {
        assert_eq!(rewrite("table.insert(t, v)"), "t.append(v)");
        assert_eq!(rewrite("table.insert(t, 1, v)"), "t.insert(0, v)");
        assert_eq!(rewrite("table.remove(t, 3)"), "t.pop(2)");
        assert_eq!(rewrite("table.remove(t)"), "t.pop()");
        assert_eq!(
            rewrite("table.remove(t, -9223372036854775808)"),
            "t.pop(-9223372036854775808 - 1)"
        );
        assert_eq!(
            rewrite(r#"s = table.concat(parts, ", ")"#),
            r#"s = ", ".join(map(str, parts))"#
        );
    }

    #[test]
    fn sort_with_comparator() {
        assert_eq!(
            rewrite("table.sort(t, function(a, b) return a > b end)"),
            "t.sort(key=functools.cmp_to_key(lambda a, b: -1 if (a > b) else 1))"
        );
        assert_eq!(
            rewrite("table.sort(t, score)"),
            "t.sort(key=lambda x: x.score)"
        );
    }

    #[test]
    fn format_positional_and_numbered() {
        assert_eq!(
            rewrite(r#"s = string.format("%d items", n)"#),
            r#"s = "%d items" % (n)"#
        );
        assert_eq!(
            rewrite(r#"s = string.format("{} of {}", a, b)"#),
            r#"s = f"{a} of {b}""#
        );
        assert_eq!(
            rewrite(r#"s = string.format("{1} then {0}", a, b)"#),
            r#"s = f"{b} then {a}""#
        );
    }

    #[test]
    fn method_named_like_builtin_is_untouched() {
        assert_eq!(rewrite(r#"log.error("x")"#), r#"log.error("x")"#);
        assert_eq!(rewrite(r#"error("boom")"#), r#"raise RuntimeError("boom")"#);
    }

    #[test]
    fn require_forms() {
        let engine = RewriteEngine::new().unwrap();
        let mut ctx = RewriteContext::new(true);
        assert_eq!(
            engine.rewrite(r#"json = require("json")"#, &mut ctx),
            "import json"
        );
        assert_eq!(
            engine.rewrite(r#"require("utils")"#, &mut ctx),
            "from utils import *"
        );
        assert!(ctx.required_modules.contains("utils"));
    }

    #[test]
    fn iteration_helpers() {
        assert_eq!(rewrite("pairs(t)"), "t.items()");
        assert_eq!(rewrite("ipairs(t)"), "enumerate(t)");
        assert_eq!(rewrite("k = next(t)"), "k = next(iter(t), None)");
    }

    #[test]
    fn varargs() {
        assert_eq!(rewrite("print(...)"), "print(*args)");
        assert_eq!(rewrite(r##"n = select("#", ...)"##), "n = len(args)");
    }

    #[test]
    fn metatable_is_last_write() {
        let engine = RewriteEngine::new().unwrap();
        let mut ctx = RewriteContext::new(true);
        engine.rewrite("setmetatable(obj, {__index = A})", &mut ctx);
        engine.rewrite("setmetatable(obj, {__index = B})", &mut ctx);
        assert_eq!(ctx.metatables["obj"], "{'__index': B}");
    }

    #[test]
    fn goto_and_label_record_positions() {
        let engine = RewriteEngine::new().unwrap();
        let mut ctx = RewriteContext::new(true);
        ctx.position = 4;
        assert_eq!(engine.rewrite("::top::", &mut ctx), "def goto_top(): pass");
        ctx.line = 9;
        assert_eq!(engine.rewrite("goto top", &mut ctx), "goto_top()");
        assert_eq!(ctx.labels["top"], 4);
        assert_eq!(ctx.gotos[0].line, 9);
    }

    #[test]
    fn string_slicing() {
        assert_eq!(rewrite("s = string.sub(name, 2, 4)"), "s = name[1:4]");
        assert_eq!(rewrite("s = string.sub(name, -3)"), "s = name[-3:]");
    }
}
