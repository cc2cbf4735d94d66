//! `{placeholder}` rendering for step messages and response templates.

use super::slots::{display_value, SlotMap};

/// Replaces `{name}` placeholders using `lookup`. Unknown placeholders and
/// unbalanced braces are left as written.
pub fn render_template<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match lookup(key.trim()) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

/// Renders a step message against an instance's slots.
pub fn render_with_slots(template: &str, slots: &SlotMap) -> String {
    render_template(template, |key| {
        slots
            .iter()
            .find(|(name, _)| name.as_str() == key)
            .map(|(_, value)| display_value(value))
    })
}
