//! Remote compute service boundary.
//!
//! The service computes escape iteration counts for one region per request:
//!
//! ```text
//! GET {base}/mandelbrot/{min_re}/{min_im}/{max_re}/{max_im}/{width}/{height}/{max_steps}
//! -> {"pixels": [u32, ...]}
//! ```

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::error::ValidationError;
use crate::region::Region;

/// Errors from a single compute request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to create HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("expected {expected} pixels, got {actual}")]
    PixelCount { expected: usize, actual: usize },
}

/// Computes iteration counts for a region.
///
/// Implementations must be shareable between dispatcher workers.
pub trait TileService: Send + Sync {
    /// Returns `width * height` iteration counts in row-major order.
    fn compute(&self, region: &Region) -> Result<Vec<u32>, ClientError>;
}

#[derive(Debug, Deserialize)]
struct MandelbrotResponse {
    pixels: Vec<u32>,
}

/// Parses the server's base address, appending the trailing `/` needed to
/// join relative request paths onto it.
pub fn base_url(url: &str) -> Result<Url, ValidationError> {
    let normalized = if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{}/", url)
    };
    let parsed = Url::parse(&normalized).map_err(|e| ValidationError::ServerUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.cannot_be_a_base() {
        return Err(ValidationError::ServerUrl {
            url: url.to_string(),
            reason: "not a base url".to_string(),
        });
    }
    Ok(parsed)
}

/// Request URL for `region` relative to `base`.
pub fn request_url(base: &Url, region: &Region) -> String {
    let min_c = region.min_c();
    let max_c = region.max_c();
    let size = region.size();
    format!(
        "{}mandelbrot/{}/{}/{}/{}/{}/{}/{}",
        base,
        min_c.re,
        min_c.im,
        max_c.re,
        max_c.im,
        size.width,
        size.height,
        region.max_steps()
    )
}

/// Decodes a response body and checks it holds one count per pixel.
pub fn decode_response(url: &str, body: &[u8], region: &Region) -> Result<Vec<u32>, ClientError> {
    let response: MandelbrotResponse =
        serde_json::from_slice(body).map_err(|source| ClientError::Decode {
            url: url.to_string(),
            source,
        })?;

    let expected = region.size().area();
    if response.pixels.len() != expected {
        return Err(ClientError::PixelCount {
            expected,
            actual: response.pixels.len(),
        });
    }
    Ok(response.pixels)
}

/// Compute service reached over HTTP with a blocking reqwest client.
#[derive(Clone, Debug)]
pub struct HttpTileService {
    client: reqwest::blocking::Client,
    base: Url,
}

impl HttpTileService {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { client, base })
    }
}

impl TileService for HttpTileService {
    fn compute(&self, region: &Region) -> Result<Vec<u32>, ClientError> {
        let url = request_url(&self.base, region);
        trace!(url = %url, "HTTP GET request starting");

        let response = self.client.get(&url).send().map_err(|source| {
            warn!(
                url = %url,
                error = %source,
                is_connect = source.is_connect(),
                is_timeout = source.is_timeout(),
                "HTTP request failed"
            );
            ClientError::Transport {
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "HTTP response received");
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|source| ClientError::Transport {
            url: url.clone(),
            source,
        })?;
        decode_response(&url, &body, region)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::complex::c;
    use crate::coord::Dimension;

    fn region() -> Region {
        Region::create(Dimension::new(3, 2), c(-2.0, -1.5), c(1.0, 1.5), 256).unwrap()
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let base = base_url("http://localhost:8080/dev").unwrap();
        assert_eq!(base.as_str(), "http://localhost:8080/dev/");
        let base = base_url("http://localhost:8080/dev/").unwrap();
        assert_eq!(base.as_str(), "http://localhost:8080/dev/");
    }

    #[test]
    fn test_base_url_rejects_garbage() {
        assert!(matches!(
            base_url("not a url"),
            Err(ValidationError::ServerUrl { .. })
        ));
        assert!(matches!(
            base_url("mailto:someone@example.com"),
            Err(ValidationError::ServerUrl { .. })
        ));
    }

    #[test]
    fn test_request_url_uses_width_and_height() {
        let base = base_url("http://localhost:8080/dev").unwrap();
        assert_eq!(
            request_url(&base, &region()),
            "http://localhost:8080/dev/mandelbrot/-2/-1.5/1/1.5/3/2/256"
        );
    }

    #[test]
    fn test_decode_response() {
        let body = br#"{"pixels": [1, 2, 3, 4, 5, 6], "elapsed": 12}"#;
        assert_eq!(
            decode_response("u", body, &region()).unwrap(),
            vec![1, 2, 3, 4, 5, 6]
        );
    }

    #[test]
    fn test_decode_response_checks_pixel_count() {
        let body = br#"{"pixels": [1, 2, 3]}"#;
        assert!(matches!(
            decode_response("u", body, &region()),
            Err(ClientError::PixelCount {
                expected: 6,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_decode_response_rejects_negative_counts() {
        let body = br#"{"pixels": [1, 2, 3, 4, 5, -6]}"#;
        assert!(matches!(
            decode_response("u", body, &region()),
            Err(ClientError::Decode { .. })
        ));
    }
}
