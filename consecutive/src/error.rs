// vim: tw=80
use crate::BoxError;

/// Errors raised while registering expectations.
///
/// Argument mismatches are not reported through this type.  They fail the
/// running test directly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The registration itself was malformed: no expectations, an unknown
    /// method, and the like.
    #[error("{0}")]
    Precondition(String),

    /// Something unexpected failed while registering.  `call` describes the
    /// whole registration call.
    #[error("Failure in {call}")]
    Registration {
        call: String,
        #[source]
        source: BoxError,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
