use thiserror::Error;

/// Configuration errors raised when building effect models.
///
/// Nothing on a per-frame path returns these; they only guard construction so
/// that a model which could never settle or would blow the frame budget cannot
/// exist in the first place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FxError {
    #[error("invalid spring config: {0}")]
    InvalidSpring(String),

    #[error("particle count {requested} exceeds cap {max}")]
    TooManyParticles { requested: usize, max: usize },

    #[error("invalid keyframes: {0}")]
    InvalidKeyframes(String),

    #[error("field needs 2 to 4 anchors, got {0}")]
    InvalidAnchors(usize),

    #[error("field line references anchor {index} of {len}")]
    AnchorOutOfRange { index: usize, len: usize },
}

pub type FxResult<T> = Result<T, FxError>;
