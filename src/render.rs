use std::io::Write;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use tracing::{error, info};

use crate::aggregate::Aggregator;
use crate::client::{HttpTileService, TileService};
use crate::config::RenderConfig;
use crate::coord::Dimension;
use crate::dispatch::Dispatcher;
use crate::encode::write_png;
use crate::error::RenderError;
use crate::painter::Painter;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderSummary {
    pub canvas: Dimension,
    pub parts: usize,
    pub elapsed: Duration,
}

/// HTTP compute service for the configured server and timeout.
pub fn http_service(config: &RenderConfig) -> Result<Arc<dyn TileService>, RenderError> {
    let service = HttpTileService::new(config.server_url()?, config.timeout)?;
    Ok(Arc::new(service))
}

/// Splits the configured region, computes every part through `service` and
/// assembles the results.
///
/// Blocks until every part is in or the first part fails. On failure the
/// remaining requests are abandoned and no canvas is returned.
pub fn render_canvas<P>(
    config: &RenderConfig,
    service: Arc<dyn TileService>,
    painter: P,
) -> Result<(RgbaImage, usize), RenderError>
where
    P: Painter,
{
    config.validate()?;
    let region = config.region()?;
    let parts = region.split(config.tile_edge)?;
    info!(
        canvas = %region.size(),
        tile_edge = config.tile_edge,
        parts = parts.len(),
        concurrency = config.concurrency,
        "split region"
    );

    let aggregator = Aggregator::new(region.size(), &parts, painter);
    let (tx, rx) = channel();
    let mut dispatcher = Dispatcher::start(service, config.concurrency, config.retry, tx)?;
    dispatcher.dispatch(&parts);

    match aggregator.collect(&rx) {
        Ok(canvas) => {
            dispatcher.join();
            Ok((canvas, parts.len()))
        }
        Err(err) => {
            dispatcher.abandon();
            Err(err)
        }
    }
}

/// Renders the configured region and writes it to `sink` as PNG.
///
/// Nothing is written unless every part was received.
pub fn render<P, W>(
    config: &RenderConfig,
    service: Arc<dyn TileService>,
    painter: P,
    sink: &mut W,
) -> Result<RenderSummary, RenderError>
where
    P: Painter,
    W: Write,
{
    let start = Instant::now();
    let (canvas, parts) = render_canvas(config, service, painter)?;
    if let Err(err) = write_png(&canvas, sink) {
        error!(error = %err, "failed to write image");
        return Err(err);
    }

    let elapsed = start.elapsed();
    info!(elapsed_ms = elapsed.as_millis() as u64, "done");
    Ok(RenderSummary {
        canvas: config.canvas_size(),
        parts,
        elapsed,
    })
}
