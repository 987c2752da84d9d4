//! Error types for markup rewriting.

/// Error during markup rewriting.
///
/// The tolerant parse itself cannot fail — see
/// [`ParseStatus`](crate::ParseStatus) for parse quality. Errors here come
/// from serializing the rewritten tree; entry points that must always
/// return markup respond to them by echoing their input.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// HTML serialization error.
    #[error("serialize error: {0}")]
    Serialize(#[from] std::io::Error),
}
