use crate::complex::{c, is_finite, C};
use crate::coord::{Axis, Dimension, Position};
use crate::error::ValidationError;

/// Mandelbrot parameters for a rectangular part of the canvas.
///
/// A region is immutable. The top-level region sits at offset `(0, 0)` with
/// `size == canvas_size`; every other region is produced by [`Region::split`].
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    size: Dimension,
    min_c: C<f64>,
    max_c: C<f64>,
    max_steps: u32,
    canvas_size: Dimension,
    offset: Position,
}

impl Region {
    pub fn create(
        size: Dimension,
        min_c: C<f64>,
        max_c: C<f64>,
        max_steps: u32,
    ) -> Result<Self, ValidationError> {
        if !is_finite(&min_c) || !is_finite(&max_c) {
            return Err(ValidationError::NonFinite {
                min_re: min_c.re,
                min_im: min_c.im,
                max_re: max_c.re,
                max_im: max_c.im,
            });
        }
        if min_c.re >= max_c.re {
            return Err(ValidationError::ReRange {
                min: min_c.re,
                max: max_c.re,
            });
        }
        if min_c.im >= max_c.im {
            return Err(ValidationError::ImRange {
                min: min_c.im,
                max: max_c.im,
            });
        }
        if size.width == 0 {
            return Err(ValidationError::ZeroWidth);
        }
        if size.height == 0 {
            return Err(ValidationError::ZeroHeight);
        }
        if !Axis::new(min_c.re, max_c.re).resolves(size.width) {
            return Err(ValidationError::ReResolution {
                min: min_c.re,
                max: max_c.re,
                pixels: size.width,
            });
        }
        if !Axis::new(min_c.im, max_c.im).resolves(size.height) {
            return Err(ValidationError::ImResolution {
                min: min_c.im,
                max: max_c.im,
                pixels: size.height,
            });
        }

        Ok(Self {
            size,
            min_c,
            max_c,
            max_steps,
            canvas_size: size,
            offset: Position::origin(),
        })
    }

    pub fn size(&self) -> Dimension {
        self.size
    }

    pub fn min_c(&self) -> C<f64> {
        self.min_c
    }

    pub fn max_c(&self) -> C<f64> {
        self.max_c
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn canvas_size(&self) -> Dimension {
        self.canvas_size
    }

    pub fn offset(&self) -> Position {
        self.offset
    }

    pub fn re_axis(&self) -> Axis<f64> {
        Axis::new(self.min_c.re, self.max_c.re)
    }

    pub fn im_axis(&self) -> Axis<f64> {
        Axis::new(self.min_c.im, self.max_c.im)
    }

    /// Pixel rectangles of at most `tile_edge` per side covering the canvas,
    /// in row-major order. Trailing tiles on the right and bottom edges are
    /// narrower so that no pixel is left out. Yields nothing for a zero edge.
    fn tiles(&self, tile_edge: u32) -> TileIter {
        TileIter {
            canvas: self.size,
            edge: tile_edge,
            next: (tile_edge > 0).then(Position::origin),
        }
    }

    /// Splits this region into parts of at most `tile_edge` pixels per side.
    ///
    /// Only the top-level region (offset `(0, 0)`) can be split. Part bounds
    /// are interpolated from this region's bounds, never from another part.
    pub fn split(&self, tile_edge: u32) -> Result<Vec<Region>, ValidationError> {
        if tile_edge == 0 {
            return Err(ValidationError::ZeroTileEdge);
        }
        if !self.offset.is_origin() {
            // LIMITATION: parts know nothing about the canvas they came from
            return Err(ValidationError::OffsetSplit {
                x: self.offset.x,
                y: self.offset.y,
            });
        }

        if tile_edge >= self.size.width && tile_edge >= self.size.height {
            return Ok(vec![self.clone()]);
        }

        let re = self.re_axis();
        let im = self.im_axis();
        let Dimension { width, height } = self.size;

        let parts = self
            .tiles(tile_edge)
            .map(|(offset, size)| Region {
                size,
                min_c: c(re.lerp(offset.x, width), im.lerp(offset.y, height)),
                max_c: c(
                    re.lerp(offset.x + size.width, width),
                    im.lerp(offset.y + size.height, height),
                ),
                max_steps: self.max_steps,
                canvas_size: self.size,
                offset,
            })
            .collect();
        Ok(parts)
    }
}

struct TileIter {
    canvas: Dimension,
    edge: u32,
    next: Option<Position>,
}

impl Iterator for TileIter {
    type Item = (Position, Dimension);

    fn next(&mut self) -> Option<(Position, Dimension)> {
        let current = self.next?;
        if current.y >= self.canvas.height || current.x >= self.canvas.width {
            self.next = None;
            return None;
        }

        let width = self.edge.min(self.canvas.width - current.x);
        let height = self.edge.min(self.canvas.height - current.y);

        let x = current.x + width;
        self.next = if x < self.canvas.width {
            Some(Position::new(x, current.y))
        } else {
            Some(Position::new(0, current.y + height))
        };

        Some((current, Dimension::new(width, height)))
    }
}

/// Iteration counts for one region, row-major, as returned by the compute
/// service.
#[derive(Clone, Debug, PartialEq)]
pub struct TileResult {
    pub region: Region,
    pub iterations: Vec<u32>,
}

impl TileResult {
    pub fn new(region: Region, iterations: Vec<u32>) -> Self {
        Self { region, iterations }
    }
}
