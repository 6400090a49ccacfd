// Shared prompt fragments.
// Each feature module keeps its own prompts.rs; only cross-cutting pieces live here.

/// Appended to every prompt whose reply is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Return ONLY valid JSON. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Formats a skills list for inclusion in a prompt sentence.
pub fn skills_clause(skills: &[String]) -> String {
    let skills: Vec<&str> = skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if skills.is_empty() {
        String::new()
    } else {
        format!(" with expertise in {}", skills.join(", "))
    }
}

/// Fills `{name}` placeholders from `values` in a single left-to-right pass.
/// Substituted text is never rescanned, so a value that itself contains
/// `{name}` is inserted verbatim. Unknown `{...}` runs, such as literal JSON
/// in a template, are left alone.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_known_names() {
        let filled = fill_template("{a} and {b}, {a} again", &[("a", "x"), ("b", "y")]);
        assert_eq!(filled, "x and y, x again");
    }

    #[test]
    fn test_fill_template_does_not_rescan_values() {
        let filled = fill_template("Q: {q}\nA: {a}", &[("q", "what is {a}?"), ("a", "42")]);
        assert_eq!(filled, "Q: what is {a}?\nA: 42");
    }

    #[test]
    fn test_fill_template_keeps_literal_braces() {
        let filled = fill_template(r#"{"role": "{name}"} {unknown"#, &[("name", "Dev")]);
        assert_eq!(filled, r#"{"role": "Dev"} {unknown"#);
    }

    #[test]
    fn test_skills_clause_empty() {
        assert_eq!(skills_clause(&[]), "");
        assert_eq!(skills_clause(&["  ".to_string()]), "");
    }

    #[test]
    fn test_skills_clause_joins() {
        let skills = vec!["Rust".to_string(), "SQL".to_string()];
        assert_eq!(skills_clause(&skills), " with expertise in Rust, SQL");
    }
}
