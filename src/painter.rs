use image::{Rgba, RgbaImage};

use crate::coord::Dimension;

pub trait Painter {
    fn iteration_color(&self, iterations: u32) -> Rgba<u8>;

    /// Paints a row-major block of iteration counts.
    fn paint(&self, size: Dimension, iterations: &[u32]) -> RgbaImage {
        let mut img = RgbaImage::new(size.width, size.height);
        for (pixel, &count) in img.pixels_mut().zip(iterations) {
            *pixel = self.iteration_color(count);
        }
        img
    }
}

/// Grey level `iterations mod 256`, fully opaque.
#[derive(Copy, Clone, Debug, Default)]
pub struct GreyscalePainter;

impl Painter for GreyscalePainter {
    fn iteration_color(&self, iterations: u32) -> Rgba<u8> {
        let v = (iterations % 256) as u8;
        Rgba([v, v, v, 0xff])
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct RainbowPainter;

fn rainbow_color(n: u32) -> [u8; 3] {
    match n {
        0 => [0xbe, 0x0a, 0xff],
        1 => [0x58, 0x0a, 0xff],
        2 => [0x14, 0x7d, 0xf5],
        3 => [0x0a, 0xef, 0xff],
        4 => [0x0a, 0xff, 0x99],
        5 => [0xa1, 0xff, 0x0a],
        6 => [0xde, 0xff, 0x0a],
        7 => [0xff, 0xd3, 0x00],
        8 => [0xff, 0x87, 0x00],
        _ => [0xff, 0x00, 0x00],
    }
}

fn mix(a: u8, b: u8, frac: f64) -> u8 {
    let m = f64::from(a) * (1.0 - frac) + f64::from(b) * frac;
    f64::round(m) as u8
}

impl Painter for RainbowPainter {
    fn iteration_color(&self, iterations: u32) -> Rgba<u8> {
        let scaled = 9.0 * f64::from(iterations % 256) / 256.0;
        let n = scaled.floor() as u32;
        let frac = scaled - f64::from(n);
        let rgb1 = rainbow_color(n);
        let rgb2 = rainbow_color(n + 1);
        Rgba([
            mix(rgb1[0], rgb2[0], frac),
            mix(rgb1[1], rgb2[1], frac),
            mix(rgb1[2], rgb2[2], frac),
            0xff,
        ])
    }
}

/// Palette selected at run time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Palette {
    #[default]
    Greyscale,
    Rainbow,
}

impl Painter for Palette {
    fn iteration_color(&self, iterations: u32) -> Rgba<u8> {
        match self {
            Palette::Greyscale => GreyscalePainter.iteration_color(iterations),
            Palette::Rainbow => RainbowPainter.iteration_color(iterations),
        }
    }
}

impl std::str::FromStr for Palette {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greyscale" | "grayscale" | "grey" | "gray" => Ok(Palette::Greyscale),
            "rainbow" => Ok(Palette::Rainbow),
            other => Err(format!("unknown palette {:?}", other)),
        }
    }
}
