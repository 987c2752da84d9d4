//! Tolerant HTML rewriting for deferred resource loading.
//!
//! This crate rewrites markup so that images and iframes defer their
//! resource fetch until a viewport-intersection observer triggers: resource
//! locators move into `data-*` attributes, a recognizable class token marks
//! the element for the observer, and a `<noscript>` fallback preserves the
//! original element for clients without script execution.
//!
//! Input is near-arbitrary, possibly malformed HTML. Parsing is tolerant
//! and transformation is best-effort: no path panics or corrupts unrelated
//! markup, and re-applying a transform to its own output is a no-op.
//!
//! # Example
//!
//! ```
//! use lazyload_config::Policy;
//! use lazyload_rewrite::rewrite_images;
//!
//! let policy = Policy::default();
//! let out = rewrite_images(r#"<img src="a.jpg">"#, &policy).unwrap();
//! assert!(out.html.contains(r#"data-src="a.jpg""#));
//! assert!(out.html.contains("<noscript>"));
//! ```

mod dispatch;
mod error;
mod fragment;
mod iframe;
mod image;
mod script;

pub use dispatch::{RewriteInput, TagKind, rewrite_tag};
pub use error::RewriteError;
pub use fragment::{ParseStatus, Rewritten};
pub use iframe::rewrite_iframes;
pub use image::rewrite_images;
pub use script::{ScriptParams, script_placeholder};
