//! Tolerant fragment parsing and serialization.
//!
//! Fragments are parsed as full no-quirks documents (a doctype is prepended
//! when absent) and the document wrapper introduced by that parse is
//! stripped from the serialized output. The parser never rejects input;
//! recoverable errors are counted and surfaced as
//! [`ParseStatus::Recovered`].

use std::borrow::Cow;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::LazyLock;

use html5ever::tree_builder::TreeBuilderOpts;
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;
use regex::Regex;

use crate::RewriteError;

/// Matches a doctype declaration at the start of the markup.
static DOCTYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*<!DOCTYPE[^>]*>").unwrap());

/// Whether the tolerant parse consumed the input without recoverable errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseStatus {
    /// The input parsed without recoverable errors.
    Clean,
    /// The parser recovered from malformed markup; the tree is best-effort.
    Recovered,
}

/// Output of a tree-based rewrite.
#[derive(Clone, Debug)]
pub struct Rewritten {
    /// The serialized, wrapper-stripped markup.
    pub html: String,
    /// Parse quality observed while building the tree.
    pub status: ParseStatus,
}

/// Parse markup into a DOM tree, counting recoverable parse errors.
pub(crate) fn parse(html: &str) -> (NodeRef, ParseStatus) {
    // A missing doctype is an artifact of fragment input, not a defect in
    // the markup; prepending one keeps the error count meaningful and the
    // parse out of quirks mode.
    let input: Cow<'_, str> = if DOCTYPE_RE.is_match(html) {
        Cow::Borrowed(html)
    } else {
        Cow::Owned(format!("<!DOCTYPE html>{html}"))
    };

    let errors = Rc::new(Cell::new(0_usize));
    let hook = Rc::clone(&errors);
    let opts = kuchiki::ParseOpts {
        tree_builder: TreeBuilderOpts {
            // noscript children must parse as elements so fallbacks
            // round-trip.
            scripting_enabled: false,
            ..TreeBuilderOpts::default()
        },
        on_parse_error: Some(Box::new(move |_| hook.set(hook.get() + 1))),
        ..kuchiki::ParseOpts::default()
    };

    let document = kuchiki::parse_html_with_options(opts).one(&*input);

    let status = if errors.get() == 0 {
        ParseStatus::Clean
    } else {
        tracing::debug!("tolerant parse recovered from {} error(s)", errors.get());
        ParseStatus::Recovered
    };
    (document, status)
}

/// Serialize a tree back to a markup string.
pub(crate) fn serialize(node: &NodeRef) -> Result<String, RewriteError> {
    let mut out = Vec::new();
    node.serialize(&mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Strip the document wrapper introduced by parsing a fragment as a full
/// document: the doctype plus the literal `<html>`, `<head>`, and `<body>`
/// tag pairs.
///
/// Best-effort cleanup; formatting elsewhere is not preserved byte-exactly.
pub(crate) fn strip_document_wrapper(html: &str) -> String {
    let mut out = DOCTYPE_RE.replace(html, "").into_owned();
    for artifact in ["<html>", "</html>", "<head></head>", "<body>", "</body>"] {
        out = out.replace(artifact, "");
    }
    out
}
