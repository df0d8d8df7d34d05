use std::fmt;

use num::Num;

#[derive(Clone, Debug, PartialEq)]
pub struct Axis<T> {
    pub min: T,
    pub max: T,
}

impl<T> Axis<T>
where
    T: Num + Copy,
{
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn length(&self) -> T {
        self.max - self.min
    }
}

impl Axis<f64> {
    /// Value at pixel boundary `n` of `total` equal steps along the axis.
    ///
    /// Multiplies before dividing so that whole fractions of the range land
    /// on exact values, and returns `max` itself at `n == total`.
    pub fn lerp(&self, n: u32, total: u32) -> f64 {
        if n >= total {
            return self.max;
        }
        self.min + f64::from(n) * self.length() / f64::from(total)
    }

    /// Whether `total` equal steps along the axis give pixel boundaries that
    /// are all finite and strictly increasing.
    pub fn resolves(&self, total: u32) -> bool {
        let mut prev = self.min;
        for n in 1..=total {
            let next = self.lerp(n, total);
            if !next.is_finite() || next <= prev {
                return false;
            }
            prev = next;
        }
        true
    }
}

/// Size of a pixel rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Top-left corner of a pixel rectangle inside a larger canvas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub y: u32,
    pub x: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::default()
    }

    pub fn is_origin(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
