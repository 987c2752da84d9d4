//! Tree-based image transform.
//!
//! Rewrites `img` elements for deferred loading: `src`/`srcset` move to
//! `data-*` attributes, the lazy class token is appended, and a `<noscript>`
//! fallback carrying the pre-transformation element is inserted as the
//! immediately preceding sibling.

use kuchiki::{Attribute, Attributes, ExpandedName, NodeRef};
use lazyload_config::Policy;
use markup5ever::{QualName, local_name, namespace_url, ns};

use crate::RewriteError;
use crate::fragment::{self, Rewritten};

/// Rewrite every eligible `img` element in the fragment.
///
/// Elements carrying the skip token are left untouched entirely (no
/// fallback is added). Already-transformed elements and fallbacks inside
/// `<noscript>` are also skipped, which makes repeated application a no-op.
///
/// # Errors
///
/// Returns [`RewriteError`] when the rewritten tree cannot be serialized.
/// The input is not consumed on failure; callers typically echo it.
pub fn rewrite_images(html: &str, policy: &Policy) -> Result<Rewritten, RewriteError> {
    let (document, status) = fragment::parse(html);

    // Snapshot before mutating; inserting siblings during a live traversal
    // would revisit or skip nodes.
    let images: Vec<NodeRef> = match document.select("img") {
        Ok(matches) => matches.map(|m| m.as_node().clone()).collect(),
        Err(()) => Vec::new(),
    };

    for node in &images {
        transform_image(node, policy);
    }

    let serialized = fragment::serialize(&document)?;
    Ok(Rewritten {
        html: fragment::strip_document_wrapper(&serialized),
        status,
    })
}

fn transform_image(node: &NodeRef, policy: &Policy) {
    let Some(element) = node.as_element() else {
        return;
    };
    if in_noscript(node) {
        return;
    }

    // Clone the pre-mutation state first; it becomes the no-script fallback.
    let fallback = {
        let attrs = element.attributes.borrow();
        if has_token(&attrs, &policy.markers.skip_class)
            || attrs.contains("data-src")
            || has_token(&attrs, &policy.markers.lazy_class)
        {
            return;
        }
        clone_element(&element.name, &attrs)
    };

    {
        let mut attrs = element.attributes.borrow_mut();
        if let Some(src) = attrs.get("src").map(ToOwned::to_owned) {
            attrs.insert("data-src", src);
            attrs.remove("src");
        }
        if let Some(srcset) = attrs.get("srcset").map(ToOwned::to_owned) {
            attrs.insert("data-srcset", srcset);
            attrs.remove("srcset");
        }
        let lazy = policy.markers.lazy_class.as_str();
        let classes = match attrs.get("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {lazy}"),
            _ => lazy.to_owned(),
        };
        attrs.insert("class", classes);
    }

    let noscript = NodeRef::new_element(
        QualName::new(None, ns!(html), local_name!("noscript")),
        Vec::<(ExpandedName, Attribute)>::new(),
    );
    noscript.append(fallback);
    node.insert_before(noscript);
}

/// Detached clone of an element's current state. `img` is a void element,
/// so attributes are the whole state.
fn clone_element(name: &QualName, attrs: &Attributes) -> NodeRef {
    NodeRef::new_element(
        name.clone(),
        attrs
            .map
            .iter()
            .map(|(attr_name, attr)| (attr_name.clone(), attr.clone())),
    )
}

fn has_token(attrs: &Attributes, token: &str) -> bool {
    attrs
        .get("class")
        .is_some_and(|classes| classes.split_whitespace().any(|t| t == token))
}

fn in_noscript(node: &NodeRef) -> bool {
    node.ancestors().any(|ancestor| {
        ancestor
            .as_element()
            .is_some_and(|el| el.name.local.as_ref() == "noscript")
    })
}
