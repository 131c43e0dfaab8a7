//! Diagnosed protocol failures.
//!
//! Everything else (I/O, OT extension) travels as [anyhow::Error] with a location context.
//! These variants can be recovered from an [anyhow::Error] with `downcast_ref::<PsiError>()`.

use thiserror::Error;

/// Errors detected by the protocol itself rather than by its collaborators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PsiError {
    /// A locally supplied parameter is outside of the supported range.
    #[error("invalid parameter `{field}` (= {value}): {reason}")]
    InvalidParameter {
        /// Name of the parameter.
        field: &'static str,
        /// Supplied value.
        value: usize,
        /// What the value has to satisfy.
        reason: &'static str,
    },

    /// The peer announced a different value for an agreed parameter.
    #[error("parameter mismatch on `{field}`: ours = {ours}, peer's = {theirs}")]
    ParameterMismatch {
        /// Name of the parameter.
        field: &'static str,
        /// Our value.
        ours: usize,
        /// The peer's value.
        theirs: usize,
    },

    /// The fingerprint of the peer's common seed differs from ours.
    #[error("the peer uses a different common seed")]
    CommonSeedMismatch,

    /// The input set does not have the agreed number of items.
    #[error("set has {actual} items but {expected} were agreed")]
    SetSizeMismatch {
        /// Agreed size.
        expected: usize,
        /// Size of the set handed to the protocol.
        actual: usize,
    },

    /// The OT extension returned a different number of outputs than columns.
    #[error("OT extension produced {actual} outputs for {expected} columns")]
    OtOutputLength {
        /// Number of matrix columns.
        expected: usize,
        /// Number of outputs.
        actual: usize,
    },
}
