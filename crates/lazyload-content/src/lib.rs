//! Document-scope orchestration for lazy-load rewriting.
//!
//! Decides whether a content body is eligible for rewriting — policy flags,
//! view kind, content-type whitelist, per-document opt-out — and runs the
//! image and iframe transforms over it in a fixed order. Ineligibility and
//! transform failure are not errors: the body passes through unchanged.
//!
//! # Example
//!
//! ```
//! use lazyload_config::Policy;
//! use lazyload_content::{DocumentContext, transform_body};
//!
//! let policy = Policy::default();
//! let context = DocumentContext::single("post");
//! let out = transform_body(r#"<img src="a.jpg">"#, &context, &policy);
//! assert!(out.contains("lazy-load"));
//! ```

use std::collections::HashMap;

use lazyload_config::Policy;
use lazyload_rewrite::{ParseStatus, rewrite_iframes, rewrite_images};
use serde_json::Value;

/// Rendering context of the current request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    /// A single-document view.
    Single,
    /// A listing or archive view.
    Listing,
    /// A syndication feed.
    Feed,
}

/// Document-scope context supplied by the hosting application.
#[derive(Clone, Debug)]
pub struct DocumentContext {
    /// Content type of the rendered document, when known.
    pub content_type: Option<String>,
    /// The view being rendered.
    pub view: ViewKind,
    /// Content type of the active query; consulted in feed views, where
    /// the rendered document's own type is not meaningful.
    pub queried_type: Option<String>,
    /// Per-document metadata owned by the hosting application.
    pub metadata: HashMap<String, Value>,
}

impl DocumentContext {
    /// Context for a single-document view of the given content type.
    #[must_use]
    pub fn single(content_type: &str) -> Self {
        Self {
            content_type: Some(content_type.to_owned()),
            view: ViewKind::Single,
            queried_type: None,
            metadata: HashMap::new(),
        }
    }

    /// Content type checked against the whitelist for this view.
    fn effective_type(&self) -> Option<&str> {
        match self.view {
            ViewKind::Feed => self.queried_type.as_deref(),
            ViewKind::Single | ViewKind::Listing => self.content_type.as_deref(),
        }
    }

    /// Whether this document's metadata opts it out of rewriting.
    fn opted_out(&self, opt_out_key: &str) -> bool {
        self.metadata
            .get(opt_out_key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Why a body was left untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Skip {
    Disabled,
    NotSingular,
    TypeNotEnabled,
    OptedOut,
}

impl Skip {
    fn reason(self) -> &'static str {
        match self {
            Self::Disabled => "lazy-loading disabled by policy",
            Self::NotSingular => "not a single-document view",
            Self::TypeNotEnabled => "content type not enabled",
            Self::OptedOut => "document opted out",
        }
    }
}

/// Check the document-scope gate, in priority order.
fn eligibility(context: &DocumentContext, policy: &Policy) -> Result<(), Skip> {
    if !policy.enabled {
        return Err(Skip::Disabled);
    }
    if context.view == ViewKind::Listing {
        return Err(Skip::NotSingular);
    }
    match context.effective_type() {
        Some(content_type)
            if policy
                .content_types
                .iter()
                .any(|enabled| enabled == content_type) => {}
        _ => return Err(Skip::TypeNotEnabled),
    }
    if context.opted_out(&policy.markers.opt_out_key) {
        return Err(Skip::OptedOut);
    }
    Ok(())
}

/// Transform a full content body, or return it unchanged when the document
/// scope is ineligible.
///
/// On the eligible path the image transform runs first, then the iframe
/// transform, each gated by its policy flag. A transform failure leaves
/// the body as of the last successful stage.
#[must_use]
pub fn transform_body(body: &str, context: &DocumentContext, policy: &Policy) -> String {
    if let Err(skip) = eligibility(context, policy) {
        tracing::debug!("skipping lazy-load rewrite: {}", skip.reason());
        return body.to_owned();
    }

    let mut current = body.to_owned();

    if policy.images {
        match rewrite_images(&current, policy) {
            Ok(rewritten) => {
                if rewritten.status == ParseStatus::Recovered {
                    tracing::debug!("image rewrite recovered from malformed markup");
                }
                current = rewritten.html;
            }
            Err(err) => tracing::warn!("image rewrite failed, keeping body: {err}"),
        }
    }

    if policy.iframes {
        match rewrite_iframes(&current) {
            Ok(rewritten) => current = rewritten.html,
            Err(err) => tracing::warn!("iframe rewrite failed, keeping body: {err}"),
        }
    }

    current
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const BODY: &str = r#"<p>intro</p><img src="a.jpg"><iframe src="https://x.test/e"></iframe>"#;

    #[test]
    fn test_single_post_view_transforms_both_kinds() {
        let out = transform_body(BODY, &DocumentContext::single("post"), &Policy::default());
        assert!(out.contains("<noscript>"));
        assert!(out.contains(r#"<img class="lazy-load" data-src="a.jpg">"#));
        assert!(out.contains(r#"<iframe data-src="https://x.test/e"></iframe>"#));
        assert!(out.starts_with("<p>intro</p>"));
    }

    #[test]
    fn test_disabled_policy_passes_through() {
        let mut policy = Policy::default();
        policy.enabled = false;
        assert_eq!(
            transform_body(BODY, &DocumentContext::single("post"), &policy),
            BODY
        );
    }

    #[test]
    fn test_listing_view_passes_through() {
        let mut context = DocumentContext::single("post");
        context.view = ViewKind::Listing;
        assert_eq!(transform_body(BODY, &context, &Policy::default()), BODY);
    }

    #[test]
    fn test_content_type_outside_whitelist_passes_through() {
        assert_eq!(
            transform_body(BODY, &DocumentContext::single("page"), &Policy::default()),
            BODY
        );
    }

    #[test]
    fn test_missing_content_type_passes_through() {
        let mut context = DocumentContext::single("post");
        context.content_type = None;
        assert_eq!(transform_body(BODY, &context, &Policy::default()), BODY);
    }

    #[test]
    fn test_feed_view_uses_queried_type() {
        let context = DocumentContext {
            content_type: None,
            view: ViewKind::Feed,
            queried_type: Some("post".to_owned()),
            metadata: HashMap::new(),
        };
        let out = transform_body(BODY, &context, &Policy::default());
        assert!(out.contains("data-src"));
    }

    #[test]
    fn test_feed_view_with_foreign_queried_type_passes_through() {
        let context = DocumentContext {
            content_type: Some("post".to_owned()),
            view: ViewKind::Feed,
            queried_type: Some("attachment".to_owned()),
            metadata: HashMap::new(),
        };
        assert_eq!(transform_body(BODY, &context, &Policy::default()), BODY);
    }

    #[test]
    fn test_document_opt_out_passes_through() {
        let mut context = DocumentContext::single("post");
        context
            .metadata
            .insert("lazyload_disable".to_owned(), json!(true));
        assert_eq!(transform_body(BODY, &context, &Policy::default()), BODY);
    }

    #[test]
    fn test_non_boolean_opt_out_value_does_not_opt_out() {
        let mut context = DocumentContext::single("post");
        context
            .metadata
            .insert("lazyload_disable".to_owned(), json!("yes"));
        let out = transform_body(BODY, &context, &Policy::default());
        assert!(out.contains("data-src"));
    }

    #[test]
    fn test_opt_out_false_does_not_opt_out() {
        let mut context = DocumentContext::single("post");
        context
            .metadata
            .insert("lazyload_disable".to_owned(), json!(false));
        let out = transform_body(BODY, &context, &Policy::default());
        assert!(out.contains("data-src"));
    }

    #[test]
    fn test_images_disabled_leaves_images_alone() {
        let mut policy = Policy::default();
        policy.images = false;
        let out = transform_body(BODY, &DocumentContext::single("post"), &policy);
        assert!(out.contains(r#"<img src="a.jpg">"#));
        assert!(!out.contains("noscript"));
        assert!(out.contains(r#"<iframe data-src="https://x.test/e"></iframe>"#));
    }

    #[test]
    fn test_iframes_disabled_leaves_iframes_alone() {
        let mut policy = Policy::default();
        policy.iframes = false;
        let out = transform_body(BODY, &DocumentContext::single("post"), &policy);
        assert!(out.contains(r#"data-src="a.jpg""#));
        assert!(out.contains(r#"<iframe src="https://x.test/e"></iframe>"#));
    }

    #[test]
    fn test_both_kinds_disabled_is_identity_modulo_normalization() {
        let mut policy = Policy::default();
        policy.images = false;
        policy.iframes = false;
        assert_eq!(
            transform_body(BODY, &DocumentContext::single("post"), &policy),
            BODY
        );
    }

    #[test]
    fn test_custom_whitelist_enables_other_types() {
        let mut policy = Policy::default();
        policy.content_types = vec!["page".to_owned(), "post".to_owned()];
        let out = transform_body(BODY, &DocumentContext::single("page"), &policy);
        assert!(out.contains("data-src"));
    }

    #[test]
    fn test_custom_opt_out_key() {
        let mut policy = Policy::default();
        policy.markers.opt_out_key = "defer_off".to_owned();
        let mut context = DocumentContext::single("post");
        context.metadata.insert("defer_off".to_owned(), json!(true));
        assert_eq!(transform_body(BODY, &context, &policy), BODY);
    }

    #[test]
    fn test_malformed_body_best_effort_never_panics() {
        let out = transform_body(
            r#"<div><img src="a.jpg"><p>unclosed"#,
            &DocumentContext::single("post"),
            &Policy::default(),
        );
        assert!(out.contains(r#"data-src="a.jpg""#));
    }

    #[test]
    fn test_double_application_is_stable() {
        let context = DocumentContext::single("post");
        let policy = Policy::default();
        let once = transform_body(BODY, &context, &policy);
        let twice = transform_body(&once, &context, &policy);
        assert_eq!(twice, once);
    }
}
