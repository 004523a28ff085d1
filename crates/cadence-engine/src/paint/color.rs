/// Straight-alpha RGBA8 color.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns the same color with alpha replaced.
    #[inline]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Packs into the `0x00RRGGBB` layout softbuffer presents. Alpha is dropped.
    #[inline]
    pub const fn to_pixel(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Composites this color over an existing `0x00RRGGBB` pixel.
    pub fn over(self, dst: u32) -> u32 {
        match self.a {
            255 => self.to_pixel(),
            0 => dst,
            a => {
                let a = a as u32;
                let inv = 255 - a;
                let mix = |src: u8, shift: u32| {
                    let d = (dst >> shift) & 0xff;
                    ((src as u32 * a + d * inv + 127) / 255) << shift
                };
                mix(self.r, 16) | mix(self.g, 8) | mix(self.b, 0)
            }
        }
    }
}
