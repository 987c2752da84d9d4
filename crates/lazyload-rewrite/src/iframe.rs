//! Tree-based iframe transform.
//!
//! Renames `src` to `data-src` on `iframe` start tags so the frame content
//! is not fetched eagerly. Unlike the image transform there is no fallback
//! wrapping and no `srcset` concern; iframes have neither.

use kuchiki::NodeRef;

use crate::RewriteError;
use crate::fragment::{self, Rewritten};

/// Rename `src` to `data-src` on every `iframe` element that carries one.
///
/// All other attributes and the element content are untouched. Elements
/// without `src` — including previously transformed ones — are skipped, so
/// repeated application is a no-op. Matching is against the element's own
/// attribute map; `src=`-looking substrings inside other attribute values
/// cannot match.
///
/// # Errors
///
/// Returns [`RewriteError`] when the rewritten tree cannot be serialized.
/// The input is not consumed on failure; callers typically echo it.
pub fn rewrite_iframes(html: &str) -> Result<Rewritten, RewriteError> {
    let (document, status) = fragment::parse(html);

    let iframes: Vec<NodeRef> = match document.select("iframe") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(()) => Vec::new(),
    };

    for node in &iframes {
        let Some(element) = node.as_element() else {
            continue;
        };
        let mut attrs = element.attributes.borrow_mut();
        if let Some(src) = attrs.get("src").map(ToOwned::to_owned) {
            attrs.insert("data-src", src);
            attrs.remove("src");
        }
    }

    let serialized = fragment::serialize(&document)?;
    Ok(Rewritten {
        html: fragment::strip_document_wrapper(&serialized),
        status,
    })
}
