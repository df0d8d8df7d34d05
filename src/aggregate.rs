//! Reassembly of tile results into the canvas.
//!
//! The [`Aggregator`] is the only owner of the canvas and of the set of
//! outstanding parts. It is driven from a single consumer, so canvas writes
//! never race even though results arrive from many workers.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;

use image::{imageops, RgbaImage};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::coord::{Dimension, Position};
use crate::dispatch::TileOutcome;
use crate::error::RenderError;
use crate::painter::Painter;
use crate::region::{Region, TileResult};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AggregateState {
    Collecting,
    Completed,
    Failed,
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("part at {offset} has {actual} pixels, expected {expected}")]
    PixelCount {
        offset: Position,
        expected: usize,
        actual: usize,
    },
}

pub struct Aggregator<P> {
    canvas: RgbaImage,
    outstanding: HashMap<Position, Dimension>,
    painter: P,
    state: AggregateState,
}

impl<P> Aggregator<P>
where
    P: Painter,
{
    /// Starts collecting results for `parts` on a canvas of `canvas_size`.
    pub fn new(canvas_size: Dimension, parts: &[Region], painter: P) -> Self {
        let outstanding: HashMap<Position, Dimension> =
            parts.iter().map(|p| (p.offset(), p.size())).collect();
        let state = if outstanding.is_empty() {
            AggregateState::Completed
        } else {
            AggregateState::Collecting
        };
        Self {
            canvas: RgbaImage::new(canvas_size.width, canvas_size.height),
            outstanding,
            painter,
            state,
        }
    }

    pub fn state(&self) -> AggregateState {
        self.state
    }

    pub fn remaining(&self) -> usize {
        self.outstanding.len()
    }

    /// Writes one tile into the canvas and marks its part as done.
    ///
    /// Results for unknown or already received parts, and results arriving
    /// after the run finished, are logged and ignored.
    pub fn accept(&mut self, tile: TileResult) -> Result<AggregateState, AggregateError> {
        let offset = tile.region.offset();
        let size = tile.region.size();

        if self.state != AggregateState::Collecting {
            warn!(
                x = offset.x,
                y = offset.y,
                state = ?self.state,
                "ignoring part received after the run finished"
            );
            return Ok(self.state);
        }

        match self.outstanding.get(&offset) {
            Some(expected) if *expected == size => {}
            _ => {
                warn!(
                    x = offset.x,
                    y = offset.y,
                    width = size.width,
                    height = size.height,
                    "ignoring unexpected or duplicate part"
                );
                return Ok(self.state);
            }
        }

        if tile.iterations.len() != size.area() {
            self.state = AggregateState::Failed;
            return Err(AggregateError::PixelCount {
                offset,
                expected: size.area(),
                actual: tile.iterations.len(),
            });
        }

        let block = self.painter.paint(size, &tile.iterations);
        imageops::replace(
            &mut self.canvas,
            &block,
            i64::from(offset.x),
            i64::from(offset.y),
        );
        self.outstanding.remove(&offset);

        info!(
            x = offset.x,
            y = offset.y,
            size = %size,
            pixels = tile.iterations.len(),
            remaining = self.outstanding.len(),
            "received part"
        );

        if self.outstanding.is_empty() {
            self.state = AggregateState::Completed;
        }
        Ok(self.state)
    }

    /// Marks the run as failed. The canvas is not written again.
    pub fn fail(&mut self) {
        if self.state == AggregateState::Collecting {
            self.state = AggregateState::Failed;
        }
    }

    /// The finished canvas, only once every part has been received.
    pub fn into_canvas(self) -> Option<RgbaImage> {
        match self.state {
            AggregateState::Completed => Some(self.canvas),
            _ => None,
        }
    }

    /// Consumes outcomes until every part is in or one of them fails.
    ///
    /// Returns as soon as a terminal state is reached; later outcomes are
    /// left in the channel.
    pub fn collect(mut self, results: &Receiver<TileOutcome>) -> Result<RgbaImage, RenderError> {
        while self.state == AggregateState::Collecting {
            match results.recv() {
                Ok(Ok(tile)) => {
                    if let Err(err) = self.accept(tile) {
                        error!(error = %err, "failed to assemble part");
                        return Err(err.into());
                    }
                }
                Ok(Err(failure)) => {
                    // Already logged by the worker that gave up on the part
                    self.fail();
                    return Err(failure.into());
                }
                Err(_) => {
                    self.fail();
                    return Err(RenderError::Incomplete {
                        remaining: self.remaining(),
                    });
                }
            }
        }
        let remaining = self.remaining();
        self.into_canvas()
            .ok_or(RenderError::Incomplete { remaining })
    }
}
