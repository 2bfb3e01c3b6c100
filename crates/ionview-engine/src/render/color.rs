/// Linear straight-alpha RGBA color.
///
/// Scene colors live in linear space; conversion from sRGB inputs (hex
/// literals in config files) happens at construction.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates an opaque color from a `0xRRGGBB` sRGB literal.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self::rgb(channel(16), channel(8), channel(0))
    }

    #[inline]
    pub fn to_array3(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    pub fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

/// sRGB electro-optical transfer function.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_black_and_white() {
        assert_eq!(Color::from_hex(0x000000), Color::BLACK);
        let w = Color::from_hex(0xffffff);
        assert!((w.r - 1.0).abs() < 1e-6 && (w.b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hex_channels_are_linearized() {
        let c = Color::from_hex(0x808000);
        assert!((c.r - 0.2158605).abs() < 1e-5);
        assert_eq!(c.r, c.g);
        assert_eq!(c.b, 0.0);
    }
}
