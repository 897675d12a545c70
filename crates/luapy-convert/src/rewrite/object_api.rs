//! Object-scripting API: instance properties, hierarchy, tweening, scheduling.
//!
//! Compiled case-insensitively. Method rules accept both `obj:Method(` and
//! `obj.Method(` since the general table has already turned colon calls into
//! dot calls by the time these run.

use super::{RewriteContext, RuleSpec, group};
use regex::Captures;

pub(super) const RULES: &[RuleSpec] = &[
    RuleSpec::template("parent", r"\.Parent\s*=", ".parent ="),
    RuleSpec::template("name", r"\.Name\s*=", ".name ="),
    RuleSpec::template("size", r"\.Size\s*=", ".size ="),
    RuleSpec::template("position", r"\.Position\s*=", ".position ="),
    RuleSpec::template(
        "background-color3",
        r"\.BackgroundColor3\s*=",
        ".background_color3 =",
    ),
    RuleSpec::template("text", r"\.Text\s*=", ".text ="),
    RuleSpec::template("text-color3", r"\.TextColor3\s*=", ".text_color3 ="),
    RuleSpec::template("visible", r"\.Visible\s*=", ".visible ="),
    RuleSpec::template("transparency", r"\.Transparency\s*=", ".transparency ="),
    RuleSpec::template("wait", r"[.:]Wait\s*\(\s*\)", ".wait()"),
    RuleSpec::template("destroy", r"[.:]Destroy\s*\(\s*\)", ".destroy()"),
    RuleSpec::template("clone", r"[.:]Clone\s*\(\s*\)", ".clone()"),
    RuleSpec::func(
        "find-first-child",
        r#"[.:]FindFirstChild\s*\(\s*("[^"]+"|'[^']+')\s*(?:,\s*(true|false)\s*)?\)"#,
        find_first_child,
    ),
    RuleSpec::func(
        "wait-for-child",
        r#"[.:]WaitForChild\s*\(\s*("[^"]+"|'[^']+')\s*(?:,\s*([\d.]+)\s*)?\)"#,
        wait_for_child,
    ),
    RuleSpec::template("get-children", r"[.:]GetChildren\s*\(\s*\)", ".get_children()"),
    RuleSpec::template(
        "get-descendants",
        r"[.:]GetDescendants\s*\(\s*\)",
        ".get_descendants()",
    ),
    RuleSpec::template("is-a", r#"[.:]IsA\s*\(\s*("[^"]+"|'[^']+')\s*\)"#, ".is_a(${1})"),
    RuleSpec::template("tween-size", r"[.:]TweenSize\s*\(", ".tween_size("),
    RuleSpec::template("tween-position", r"[.:]TweenPosition\s*\(", ".tween_position("),
    RuleSpec::template(
        "property-changed-signal",
        r#"[.:]GetPropertyChangedSignal\s*\(\s*("[^"]+"|'[^']+')\s*\)"#,
        ".get_property_changed_signal(${1})",
    ),
    RuleSpec::template(
        "bind-to-render-step",
        r#"[.:]BindToRenderStep\s*\(\s*("[^"]+"|'[^']+')\s*,\s*([^,()]+?)\s*,\s*(.+?)\s*\)"#,
        ".bind_to_render_step(${1}, int(${2}), ${3})",
    ),
    RuleSpec::template(
        "unbind-from-render-step",
        r#"[.:]UnbindFromRenderStep\s*\(\s*("[^"]+"|'[^']+')\s*\)"#,
        ".unbind_from_render_step(${1})",
    ),
    RuleSpec::template("workspace", r"\bworkspace\b", "workspace"),
    RuleSpec::template("enum", r"\bEnum\.([A-Za-z]+)\.([A-Za-z]+)\b", "Enum.${1}.${2}"),
    RuleSpec::template(
        "vector3",
        r"\bVector3\.new\s*\(\s*([\d.+\-e]+)\s*,\s*([\d.+\-e]+)\s*,\s*([\d.+\-e]+)\s*\)",
        "Vector3(float(${1}), float(${2}), float(${3}))",
    ),
    RuleSpec::template(
        "cframe",
        r"\bCFrame\.new\s*\(\s*([\d.+\-e]+)\s*,\s*([\d.+\-e]+)\s*,\s*([\d.+\-e]+)\s*\)",
        "CFrame(float(${1}), float(${2}), float(${3}))",
    ),
    RuleSpec::template(
        "brick-color",
        r#"\bBrickColor\.new\s*\(\s*("[^"]+"|'[^']+')\s*\)"#,
        "BrickColor(${1})",
    ),
    RuleSpec::template("tick", r"(^|[^.\w])tick\s*\(\s*\)", "${1}time.time()"),
    RuleSpec::template(
        "spawn",
        r"(^|[^.\w])spawn\s*\(\s*(.+?)\s*\)",
        "${1}threading.Thread(target=lambda: (${2}), daemon=True).start()",
    ),
    RuleSpec::template(
        "delay",
        r"(^|[^.\w])delay\s*\(\s*([\d.]+)\s*,\s*(.+?)\s*\)",
        "${1}threading.Timer(float(${2}), lambda: (${3})).start()",
    ),
    RuleSpec::template(
        "clear-all-children",
        r"[.:]ClearAllChildren\s*\(\s*\)",
        ".clear_all_children()",
    ),
    RuleSpec::template("is-loaded", r"[.:]IsLoaded\s*\(\s*\)", ".is_loaded()"),
];

fn find_first_child(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let name = group(caps, 1);
    match group(caps, 2).to_ascii_lowercase().as_str() {
        "true" => format!(".find_first_child({name}, True)"),
        _ => format!(".find_first_child({name})"),
    }
}

fn wait_for_child(caps: &Captures<'_>, _: &mut RewriteContext) -> String {
    let name = group(caps, 1);
    match group(caps, 2) {
        "" => format!(".wait_for_child({name})"),
        timeout => format!(".wait_for_child({name}, float({timeout}))"),
    }
}

#[cfg(test)]
mod tests {
    use crate::rewrite::{RewriteContext, RewriteEngine};

    fn rewrite(line: &str) -> (String, RewriteContext) {
        let engine = RewriteEngine::new().unwrap();
        let mut ctx = RewriteContext::new(true);
        let out = engine.rewrite(line, &mut ctx);
        (out, ctx)
    }

    #[test]
    fn property_assignment_is_case_insensitive() {
        let (out, ctx) = rewrite("frame.PARENT = gui");
        assert_eq!(out, "frame.parent = gui");
        assert!(ctx.object_api.contains("parent"));
    }

    #[test]
    fn colon_methods_after_general_table() {
        let (out, _) = rewrite(r#"local hum = char:WaitForChild("Humanoid", 5)"#);
        assert_eq!(out, r#"local hum = char.wait_for_child("Humanoid", float(5))"#);
        let (out, _) = rewrite("part:Destroy()");
        assert_eq!(out, "part.destroy()");
    }

    #[test]
    fn find_first_child_recursive_flag() {
        let (out, _) = rewrite(r#"x = gui:FindFirstChild("Button", true)"#);
        assert_eq!(out, r#"x = gui.find_first_child("Button", True)"#);
    }

    #[test]
    fn constructors_and_scheduling() {
        let (out, _) = rewrite("p.position = Vector3.new(1, 2.5, -3)");
        assert_eq!(out, "p.position = Vector3(float(1), float(2.5), float(-3))");
        let (out, _) = rewrite("delay(2, cleanup)");
        assert_eq!(out, "threading.Timer(float(2), lambda: (cleanup)).start()");
    }

    #[test]
    fn unrelated_line_records_nothing() {
        let (_, ctx) = rewrite("x = y + 1");
        assert!(ctx.object_api.is_empty());
    }
}
