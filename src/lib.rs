//! Mandelbrot renderer that delegates per-pixel iteration to a remote
//! compute service.
//!
//! The requested region is split into parts ([`region`]), one request per
//! part is issued with bounded concurrency ([`dispatch`]), the results are
//! reassembled into a single canvas ([`aggregate`]) and the canvas is
//! written out as PNG ([`encode`]).

pub mod aggregate;
pub mod bench;
pub mod client;
mod complex;
pub mod config;
pub mod coord;
pub mod dispatch;
pub mod encode;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod painter;
pub mod region;
pub mod render;
pub mod threads;

pub use aggregate::{AggregateState, Aggregator};
pub use client::{HttpTileService, TileService};
pub use complex::{c, C};
pub use config::RenderConfig;
pub use coord::{Dimension, Position};
pub use dispatch::{Dispatcher, RetryPolicy};
pub use error::{RenderError, ValidationError};
pub use painter::{GreyscalePainter, Painter, Palette, RainbowPainter};
pub use region::{Region, TileResult};
pub use render::{http_service, render, render_canvas, RenderSummary};
