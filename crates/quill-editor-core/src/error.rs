//! Error types for applying check responses.

use thiserror::Error;

use crate::sequence::RequestId;

/// A check response that cannot be applied to the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApplyError {
    /// The tokens do not concatenate back to the submitted text.
    #[error(
        "response {id} does not reproduce the submitted text \
         (submitted {submitted_chars} chars, tokens cover {token_chars})"
    )]
    RoundTrip {
        id: RequestId,
        submitted_chars: usize,
        token_chars: usize,
    },
}
