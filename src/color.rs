//! Pixel color values.

use serde::Deserialize;

/// A 24-bit RGB pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// The clear color. Writing it at a releasing tier gives the pixel back early.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// True for the clear color.
    pub const fn is_clear(self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Scale every channel by `scale / 256`. A scale of 0 yields black.
    pub const fn scale8(self, scale: u8) -> Self {
        const fn ch(c: u8, s: u8) -> u8 {
            ((c as u16 * s as u16) >> 8) as u8
        }
        Self {
            r: ch(self.r, scale),
            g: ch(self.g, scale),
            b: ch(self.b, scale),
        }
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}
