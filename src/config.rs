use std::time::Duration;

use reqwest::Url;

use crate::client::base_url;
use crate::complex::{c, C};
use crate::coord::Dimension;
use crate::dispatch::RetryPolicy;
use crate::error::ValidationError;
use crate::region::Region;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080/";
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_TILE_EDGE: u32 = 1000;
pub const DEFAULT_MAX_STEPS: u32 = 256 * 4;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);

/// Parameters of one render run.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    pub min_c: C<f64>,
    pub max_c: C<f64>,
    pub width: u32,
    pub height: u32,
    pub max_steps: u32,
    /// Largest width or height, in pixels, of a single request.
    pub tile_edge: u32,
    /// Most requests in flight at once.
    pub concurrency: usize,
    pub server_url: String,
    /// Per-request transport timeout.
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            min_c: c(-2.0, -2.0),
            max_c: c(2.0, 2.0),
            width: 1000,
            height: 1000,
            max_steps: DEFAULT_MAX_STEPS,
            tile_edge: DEFAULT_TILE_EDGE,
            concurrency: DEFAULT_CONCURRENCY,
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::fail_fast(),
        }
    }
}

impl RenderConfig {
    pub fn canvas_size(&self) -> Dimension {
        Dimension::new(self.width, self.height)
    }

    /// The undivided region covering the whole canvas.
    pub fn region(&self) -> Result<Region, ValidationError> {
        Region::create(self.canvas_size(), self.min_c, self.max_c, self.max_steps)
    }

    pub fn server_url(&self) -> Result<Url, ValidationError> {
        base_url(&self.server_url)
    }

    /// Checks every parameter, before any request is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.region()?;
        if self.tile_edge == 0 {
            return Err(ValidationError::ZeroTileEdge);
        }
        if self.concurrency == 0 {
            return Err(ValidationError::ZeroConcurrency);
        }
        if self.timeout.is_zero() {
            return Err(ValidationError::ZeroTimeout);
        }
        self.server_url()?;
        Ok(())
    }
}
