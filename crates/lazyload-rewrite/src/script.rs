//! Script placeholder emission.
//!
//! Inline scripts cannot be deferred by attribute rewriting — browsers
//! execute them eagerly — so script-kind input is replaced wholesale by a
//! marker element that the client-side observer expands via dynamic script
//! insertion once it nears the viewport.

use lazyload_config::Policy;

/// Parameters for a script placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptParams {
    /// Location of the script to load when the placeholder is reached.
    pub url: String,
}

/// Build the placeholder element for a deferred script.
///
/// Any original markup is discarded; the output is a single element
/// carrying the placeholder marker class and the script location in
/// `data-src`.
#[must_use]
pub fn script_placeholder(params: &ScriptParams, policy: &Policy) -> String {
    format!(
        r#"<div class="{}" data-src="{}"></div>"#,
        escape_attribute(&policy.markers.placeholder_class),
        escape_attribute(&params.url)
    )
}

/// Escape HTML special characters for attribute context.
fn escape_attribute(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
