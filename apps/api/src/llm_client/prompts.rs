// Shared prompt constants and prompt-building utilities.
// Each module that needs oracle calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Appended to every prompt that expects a JSON document back.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON document. \
    Do NOT include explanations or apologies.";

/// Fills `{name}` placeholders in a single pass. Inserted values are never
/// re-scanned, so review text containing braces is left alone. Unknown
/// placeholders (and JSON braces in the template) pass through untouched.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let hit = after.find('}').and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });

        match hit {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
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
