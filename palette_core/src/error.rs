use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// Everything a palette operation can report besides "not found",
/// which is `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    #[error("lock index {index} is out of range (palette has {len} swatches)")]
    LockIndexOutOfRange { index: i64, len: usize },

    #[error("a palette holds at most {max} swatches, got {got}")]
    TooManySwatches { got: usize, max: usize },

    #[error("palette name must not be empty")]
    EmptyName,

    #[error("palette code must not be empty")]
    EmptyCode,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse class of a [`PaletteError`], as reported on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Bad input. The caller can fix it and retry.
    Validation,
    /// The backing store could not be read or written.
    StoreUnavailable,
}

impl PaletteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(_) => ErrorKind::StoreUnavailable,
            _ => ErrorKind::Validation,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = PaletteError::LockIndexOutOfRange { index: 7, len: 5 };
        assert_eq!(
            err.to_string(),
            "lock index 7 is out of range (palette has 5 swatches)"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn store_errors_are_hard_failures() {
        let err = PaletteError::from(StoreError::Poisoned);
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert!(!err.is_retryable());
    }
}
