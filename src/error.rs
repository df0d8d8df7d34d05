//! Error taxonomy for a render run.
//!
//! Validation errors are raised before any request is sent. Tile and
//! aggregation failures abort the run with no image written. Encoding and
//! sink errors are reported separately from remote failures.

use std::io;

use thiserror::Error;

use crate::aggregate::AggregateError;
use crate::client::ClientError;
use crate::dispatch::TileFailure;
use crate::encode::EncodeError;

/// Exit status for a run that wrote its image.
pub const EXIT_OK: i32 = 0;

/// Exit status for malformed input.
pub const EXIT_INVALID: i32 = 2;

/// Exit status for remote or aggregation failures.
pub const EXIT_REMOTE: i32 = 3;

/// Exit status for encoding or output failures.
pub const EXIT_OUTPUT: i32 = 4;

/// Invalid region bounds, dimensions or run parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("complex bounds must be finite [min_c={min_re}+{min_im}i, max_c={max_re}+{max_im}i]")]
    NonFinite {
        min_re: f64,
        min_im: f64,
        max_re: f64,
        max_im: f64,
    },

    #[error("min_c_re must be less than max_c_re [min_c_re={min}, max_c_re={max}]")]
    ReRange { min: f64, max: f64 },

    #[error("min_c_im must be less than max_c_im [min_c_im={min}, max_c_im={max}]")]
    ImRange { min: f64, max: f64 },

    #[error("re range [{min}, {max}] has no distinct finite value per pixel across {pixels} pixels")]
    ReResolution { min: f64, max: f64, pixels: u32 },

    #[error("im range [{min}, {max}] has no distinct finite value per pixel across {pixels} pixels")]
    ImResolution { min: f64, max: f64, pixels: u32 },

    #[error("width is 0")]
    ZeroWidth,

    #[error("height is 0")]
    ZeroHeight,

    #[error("tile edge must be a positive integer")]
    ZeroTileEdge,

    #[error("concurrency must be a positive integer")]
    ZeroConcurrency,

    #[error("timeout must be positive")]
    ZeroTimeout,

    #[error("only a region at offset (0, 0) can be split [offset=({x}, {y})]")]
    OffsetSplit { x: u32, y: u32 },

    #[error("invalid server url {url:?}: {reason}")]
    ServerUrl { url: String, reason: String },
}

/// Fatal failure of a render run.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Tile(#[from] TileFailure),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("tile results stopped arriving with {remaining} parts outstanding")]
    Incomplete { remaining: usize },

    #[error("failed to encode image: {0}")]
    Encode(#[from] EncodeError),

    #[error("failed to write image: {0}")]
    Io(#[from] io::Error),
}

impl RenderError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RenderError::Invalid(_) => EXIT_INVALID,
            RenderError::Client(_)
            | RenderError::Tile(_)
            | RenderError::Aggregate(_)
            | RenderError::Incomplete { .. } => EXIT_REMOTE,
            RenderError::Encode(_) | RenderError::Io(_) => EXIT_OUTPUT,
        }
    }
}
