use std::collections::HashSet;

/// Operation name used when the document declares no `operationId`:
/// `GET /pet/{id}` becomes `get_pet_id`.
pub fn fallback_name(method: &str, path: &str) -> String {
    let mut out = method.to_lowercase();
    let mut pending_sep = true;
    for c in path.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep {
                out.push('_');
                pending_sep = false;
            }
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

pub(crate) fn unique_name(taken: &HashSet<String>, base: &str) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Names of the `{token}` placeholders in a path template, in order.
pub fn template_tokens(template: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push(after[..end].to_string());
        rest = &after[end + 1..];
    }
    out
}
