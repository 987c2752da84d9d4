//! Tag-kind dispatch for single-markup rewriting.
//!
//! The hosting application classifies each piece of markup it wants
//! rewritten and calls [`rewrite_tag`]; unrecognized kinds pass through
//! unchanged. Per-kind enablement is the whole-body orchestrator's concern;
//! this entry point honors only the master switch, matching the behavior
//! the markup contract was written against.

use lazyload_config::Policy;

use crate::script::{ScriptParams, script_placeholder};
use crate::{rewrite_iframes, rewrite_images};

/// Caller-supplied classification selecting which transform applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagKind {
    /// Tree-based image transform.
    Img,
    /// Iframe `src` rewrite.
    Iframe,
    /// Script placeholder substitution.
    Script,
    /// Anything else; passed through unchanged.
    Other(String),
}

impl TagKind {
    /// Classify a tag name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "img" => Self::Img,
            "iframe" => Self::Iframe,
            "script" => Self::Script,
            _ => Self::Other(name.to_owned()),
        }
    }
}

/// Inbound payload for [`rewrite_tag`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewriteInput {
    /// A markup string to transform in place.
    Markup(String),
    /// Parameters for a script placeholder; there is no original markup to
    /// preserve.
    Script(ScriptParams),
}

/// Rewrite a single piece of markup according to its tag kind.
///
/// This entry point never fails: transforms that cannot complete degrade
/// to echoing the input (logged at warn), a disabled policy and
/// unrecognized kinds pass markup through unchanged, and a kind/payload
/// mismatch echoes whatever markup was supplied — or an empty string for a
/// payload that carries none.
#[must_use]
pub fn rewrite_tag(input: RewriteInput, kind: &TagKind, policy: &Policy) -> String {
    if !policy.enabled {
        return match input {
            RewriteInput::Markup(markup) => markup,
            RewriteInput::Script(_) => String::new(),
        };
    }

    match (kind, input) {
        (TagKind::Script, RewriteInput::Script(params)) => script_placeholder(&params, policy),
        (TagKind::Script, RewriteInput::Markup(markup)) => {
            tracing::debug!("script rewrite requires placeholder params; echoing markup");
            markup
        }
        (TagKind::Img, RewriteInput::Markup(markup)) => match rewrite_images(&markup, policy) {
            Ok(rewritten) => rewritten.html,
            Err(err) => {
                tracing::warn!("image rewrite failed, echoing input: {err}");
                markup
            }
        },
        (TagKind::Iframe, RewriteInput::Markup(markup)) => match rewrite_iframes(&markup) {
            Ok(rewritten) => rewritten.html,
            Err(err) => {
                tracing::warn!("iframe rewrite failed, echoing input: {err}");
                markup
            }
        },
        (TagKind::Other(_), RewriteInput::Markup(markup)) => markup,
        (_, RewriteInput::Script(_)) => {
            tracing::debug!("placeholder params supplied for a non-script tag kind");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn markup(s: &str) -> RewriteInput {
        RewriteInput::Markup(s.to_owned())
    }

    #[test]
    fn test_from_name_case_insensitive() {
        assert_eq!(TagKind::from_name("IMG"), TagKind::Img);
        assert_eq!(TagKind::from_name("IFrame"), TagKind::Iframe);
        assert_eq!(TagKind::from_name("script"), TagKind::Script);
        assert_eq!(
            TagKind::from_name("blockquote"),
            TagKind::Other("blockquote".to_owned())
        );
    }

    #[test]
    fn test_img_kind_dispatches_to_image_transform() {
        let out = rewrite_tag(
            markup(r#"<img src="a.jpg">"#),
            &TagKind::Img,
            &Policy::default(),
        );
        assert!(out.contains("<noscript>"));
        assert!(out.contains(r#"data-src="a.jpg""#));
    }

    #[test]
    fn test_iframe_kind_dispatches_to_iframe_transform() {
        let out = rewrite_tag(
            markup(r#"<iframe src="https://x.test/e"></iframe>"#),
            &TagKind::Iframe,
            &Policy::default(),
        );
        assert_eq!(out, r#"<iframe data-src="https://x.test/e"></iframe>"#);
    }

    #[test]
    fn test_script_kind_emits_placeholder() {
        let out = rewrite_tag(
            RewriteInput::Script(ScriptParams {
                url: "https://x.test/s.js".to_owned(),
            }),
            &TagKind::Script,
            &Policy::default(),
        );
        assert_eq!(
            out,
            r#"<div class="lozad" data-src="https://x.test/s.js"></div>"#
        );
    }

    #[test]
    fn test_unrecognized_kind_passes_through() {
        let input = r#"<video src="a.mp4"></video>"#;
        let out = rewrite_tag(
            markup(input),
            &TagKind::Other("video".to_owned()),
            &Policy::default(),
        );
        assert_eq!(out, input);
    }

    #[test]
    fn test_disabled_policy_passes_through() {
        let mut policy = Policy::default();
        policy.enabled = false;
        let input = r#"<img src="a.jpg">"#;
        assert_eq!(rewrite_tag(markup(input), &TagKind::Img, &policy), input);
    }

    #[test]
    fn test_script_kind_with_markup_payload_echoes() {
        let input = r#"<script>inline()</script>"#;
        let out = rewrite_tag(markup(input), &TagKind::Script, &Policy::default());
        assert_eq!(out, input);
    }
}
