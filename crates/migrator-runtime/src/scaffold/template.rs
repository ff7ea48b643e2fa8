//! Template rendering for scaffolded migrations.
//!
//! Provides simple `{{var}}` replacement. Substitution is a single pass, so
//! a value containing `{{...}}` is inserted verbatim and never re-expanded.

use std::collections::HashMap;

/// Render a template by replacing `{{key}}` placeholders with values.
/// Placeholders without a value are left untouched.
pub fn render(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find("}}").and_then(|end| vars.get(&after[..end]).map(|v| (end, v))) {
            Some((end, value)) => {
                result.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Helper macro to create a HashMap of template variables.
#[macro_export]
macro_rules! template_vars {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = std::collections::HashMap::new();
        $(map.insert($key, $value);)*
        map
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_simple() {
        let vars = template_vars!("version" => "20240101000000");
        assert_eq!(render("-- Migration {{version}}", &vars), "-- Migration 20240101000000");
    }

    #[test]
    fn test_render_multiple_and_repeated() {
        let vars = template_vars!("namespace" => "app::migrations", "version" => "1");
        assert_eq!(
            render("{{namespace}} {{version}} {{version}}", &vars),
            "app::migrations 1 1"
        );
    }

    #[test]
    fn test_render_missing_var() {
        let vars = HashMap::new();
        assert_eq!(render("Hello, {{name}}!", &vars), "Hello, {{name}}!");
    }

    #[test]
    fn test_render_unclosed_placeholder() {
        let vars = template_vars!("up" => "SELECT 1;");
        assert_eq!(render("{{up}} {{down", &vars), "SELECT 1; {{down");
    }

    #[test]
    fn test_render_nested_braces() {
        let vars = template_vars!("up" => "SELECT 1;");
        assert_eq!(render("{{a {{up}}", &vars), "{{a SELECT 1;");
    }

    #[test]
    fn test_values_are_not_reexpanded() {
        let vars = template_vars!("up" => "{{version}}", "version" => "7");
        assert_eq!(render("{{up}}", &vars), "{{version}}");
    }
}
