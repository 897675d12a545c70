//! Memory-automation API (`gg.*`): ranges, searches, results, prompts,
//! process control and persistence, rewritten to snake-case calls.

use super::{RewriteContext, RuleSpec, group};
use regex::Captures;

pub(super) const RULES: &[RuleSpec] = &[
    RuleSpec::template("getRanges", r"\bgg\.getRanges\s*\(\s*\)", "gg.get_ranges()"),
    RuleSpec::template("setRanges", r"\bgg\.setRanges\s*\(", "gg.set_ranges("),
    RuleSpec::template("getRangesList", r"\bgg\.getRangesList\s*\(", "gg.get_ranges_list("),
    RuleSpec::func(
        "searchNumber",
        r#"\bgg\.searchNumber\s*\(\s*("[^"]+"|'[^']+'|[\w.]+)\s*,\s*gg\.TYPE_(\w+)\s*(?:,\s*([^()]+?))?\s*\)"#,
        search_number,
    ),
    RuleSpec::template(
        "searchFuzzy",
        r#"\bgg\.searchFuzzy\s*\(\s*("[^"]+"|'[^']+'|[\w.]+)\s*,\s*gg\.TYPE_(\w+)\s*(?:,\s*[^()]+?)?\s*\)"#,
        "gg.search_fuzzy(${1}, gg.TYPE_${2})",
    ),
    RuleSpec::func(
        "getResults",
        r"\bgg\.getResults\s*\(\s*([^,()]*?)\s*(?:,\s*([^,()]+?)\s*)?\)",
        get_results,
    ),
    RuleSpec::template(
        "editAll",
        r#"\bgg\.editAll\s*\(\s*("[^"]+"|'[^']+'|[\w.]+)\s*,\s*gg\.TYPE_(\w+)\s*\)"#,
        "gg.edit_all(${1}, gg.TYPE_${2})",
    ),
    RuleSpec::template("addListItems", r"\bgg\.addListItems\s*\(", "gg.add_list_items("),
    RuleSpec::template(
        "removeListItems",
        r"\bgg\.removeListItems\s*\(",
        "gg.remove_list_items(",
    ),
    RuleSpec::template("clearResults", r"\bgg\.clearResults\s*\(\s*\)", "gg.clear_results()"),
    RuleSpec::template(
        "setVisible",
        r"\bgg\.setVisible\s*\(\s*(True|False)\s*\)",
        "gg.set_visible(${1})",
    ),
    RuleSpec::template("isVisible", r"\bgg\.isVisible\s*\(\s*\)", "gg.is_visible()"),
    RuleSpec::template("toast", r"\bgg\.toast\s*\(", "gg.toast("),
    RuleSpec::template("alert", r"\bgg\.alert\s*\(", "gg.alert("),
    RuleSpec::func(
        "prompt",
        r"\bgg\.prompt\s*\(\s*(\[.*?\])\s*(?:,\s*(\[.*?\]|\{.*?\}|None)\s*)?(?:,\s*(\[.*?\]|\{.*?\})\s*)?\)",
        prompt,
    ),
    RuleSpec::func(
        "choice",
        r#"\bgg\.choice\s*\(\s*(\[.*?\]|[\w.]+)\s*(?:,\s*([\w.]+)\s*)?(?:,\s*("[^"]*"|'[^']*')\s*)?\)"#,
        choice,
    ),
    RuleSpec::func(
        "multiChoice",
        r"\bgg\.multiChoice\s*\(\s*(\[.*?\]|[\w.]+)\s*(?:,\s*(\[.*?\]|\{.*?\}|[\w.]+)\s*)?\)",
        multi_choice,
    ),
    RuleSpec::template(
        "sleep",
        r"\bgg\.sleep\s*\(\s*([^,()]+?)\s*\)",
        "time.sleep(int(${1}) / 1000)",
    ),
    RuleSpec::template("saveVariable", r"\bgg\.saveVariable\s*\(", "gg.save_variable("),
    RuleSpec::template("loadVariable", r"\bgg\.loadVariable\s*\(", "gg.load_variable("),
    RuleSpec::template("processOpen", r"\bgg\.processOpen\s*\(\s*\)", "gg.process_open()"),
    RuleSpec::template("processClose", r"\bgg\.processClose\s*\(\s*\)", "gg.process_close()"),
    RuleSpec::template("processKill", r"\bgg\.processKill\s*\(\s*\)", "gg.process_kill()"),
    RuleSpec::template("processPause", r"\bgg\.processPause\s*\(\s*\)", "gg.process_pause()"),
    RuleSpec::template(
        "processResume",
        r"\bgg\.processResume\s*\(\s*\)",
        "gg.process_resume()",
    ),
    RuleSpec::template(
        "getTargetInfo",
        r"\bgg\.getTargetInfo\s*\(\s*\)",
        "gg.get_target_info()",
    ),
    RuleSpec::template(
        "getTargetPackage",
        r"\bgg\.getTargetPackage\s*\(\s*\)",
        "gg.get_target_package()",
    ),
    RuleSpec::template(
        "setSpeed",
        r"\bgg\.setSpeed\s*\(\s*([^,()]+?)\s*\)",
        "gg.set_speed(float(${1}))",
    ),
    RuleSpec::template(
        "isPackageInstalled",
        r"\bgg\.isPackageInstalled\s*\(",
        "gg.is_package_installed(",
    ),
    RuleSpec::template("getFile", r"\bgg\.getFile\s*\(\s*\)", "gg.get_file()"),
    RuleSpec::template("copyText", r"\bgg\.copyText\s*\(", "gg.copy_text("),
    RuleSpec::template("makeRequest", r"\bgg\.makeRequest\s*\(", "gg.make_request("),
    RuleSpec::template("setValues", r"\bgg\.setValues\s*\(", "gg.set_values("),
    RuleSpec::template("loadList", r"\bgg\.loadList\s*\(", "gg.load_list("),
    RuleSpec::template("saveList", r"\bgg\.saveList\s*\(", "gg.save_list("),
    RuleSpec::template("getLine", r"\bgg\.getLine\s*\(\s*\)", "gg.get_line()"),
    RuleSpec::template("getLocale", r"\bgg\.getLocale\s*\(\s*\)", "gg.get_locale()"),
    RuleSpec::template("setLocale", r"\bgg\.setLocale\s*\(", "gg.set_locale("),
    RuleSpec::template("getVersion", r"\bgg\.getVersion\s*\(\s*\)", "gg.get_version()"),
    RuleSpec::template(
        "getVersionCode",
        r"\bgg\.getVersionCode\s*\(\s*\)",
        "gg.get_version_code()",
    ),
    RuleSpec::template("require", r"\bgg\.require\s*\(", "gg.require("),
    RuleSpec::template(
        "constants",
        r"\bgg\.(?:TYPE|REGION|SIGN|NUMBER_FLAG)_\w+",
        "${0}",
    ),
    RuleSpec::template(
        "startFuzzy",
        r"\bgg\.startFuzzy\s*\(",
        "gg.start_fuzzy(",
    ),
    RuleSpec::func(
        "refineNumber",
        r#"\bgg\.refineNumber\s*\(\s*("[^"]+"|'[^']+'|[\w.]+)\s*,\s*gg\.TYPE_(\w+)\s*(?:,\s*([^()]+?))?\s*\)"#,
        refine_number,
    ),
    RuleSpec::func("camel-case", r"\bgg\.([a-z][a-z0-9]*(?:[A-Z][a-z0-9]*)+)\b", camel_case),
];

const FLAG_GROUPS: &[&str] = &["REGION_", "SIGN_", "NUMBER_FLAG_"];

/// `gg.REGION_*`, `gg.SIGN_*` and `gg.NUMBER_FLAG_*` names in `text`, in order.
fn flags(text: &str) -> impl Iterator<Item = &str> {
    text.match_indices("gg.").filter_map(move |(at, prefix)| {
        let rest = &text[at + prefix.len()..];
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..end];
        FLAG_GROUPS
            .iter()
            .any(|group| name.len() > group.len() && name.starts_with(group))
            .then_some(name)
    })
}

/// Every recognized flag in `extra` becomes a keyword argument; anything
/// else in the trailing arguments is dropped.
fn search_number(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let mut out = format!("gg.search_number({}, gg.TYPE_{}", group(caps, 1), group(caps, 2));
    for flag in flags(group(caps, 3)) {
        out.push_str(&format!(", {}=gg.{flag}", flag.to_ascii_lowercase()));
    }
    out.push(')');
    out
}

fn get_results(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    match (group(caps, 1), group(caps, 2)) {
        ("", _) => "gg.get_results()".to_string(),
        (count, "") => format!("gg.get_results({count})"),
        (count, skip) => format!("gg.get_results({count}, {skip})"),
    }
}

fn join_present(call: &str, args: &[&str]) -> String {
    let args: Vec<&str> = args.iter().copied().filter(|a| !a.is_empty()).collect();
    format!("{call}({})", args.join(", "))
}

fn prompt(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    join_present(
        "gg.prompt",
        &[group(caps, 1), group(caps, 2), group(caps, 3)],
    )
}

fn choice(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    join_present(
        "gg.choice",
        &[group(caps, 1), group(caps, 2), group(caps, 3)],
    )
}

fn multi_choice(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    join_present("gg.multi_choice", &[group(caps, 1), group(caps, 2)])
}

fn refine_number(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let head = format!("gg.refine_number({}, gg.TYPE_{}", group(caps, 1), group(caps, 2));
    match group(caps, 3) {
        "" => format!("{head})"),
        extra => format!("{head}, {extra})"),
    }
}

fn camel_case(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let mut out = String::from("gg.");
    for c in group(caps, 1).chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
