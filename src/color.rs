use std::fmt::{self, Display};

use serde::{Serialize, Serializer};

/// An sRGB color with alpha. Displays as `#rrggbb`, or `#rrggbbaa` when not opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xff }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Interpolates every channel linearly towards `other`, `t` in `[0, 1]`.
    fn lerp(self, other: Color, t: f32) -> Color {
        let mix = |a: u8, b: u8| -> u8 {
            let (a, b) = (a as f32, b as f32);
            (a + (b - a) * t).round().clamp(0., 255.) as u8
        };

        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 0xff {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The `[low, mid, high]` values pinned to the palette's three stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorDomain {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl ColorDomain {
    /// Weights and activations.
    pub const WEIGHTS: ColorDomain = ColorDomain::new(-1.0, 0.0, 1.0);
    /// Gradients are roughly an order of magnitude smaller than weights.
    pub const GRADIENTS: ColorDomain = ColorDomain::new(-0.1, 0.0, 0.1);

    pub const fn new(low: f32, mid: f32, high: f32) -> Self {
        Self { low, mid, high }
    }
}

/// A diverging three-stop palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub cold: Color,
    pub neutral: Color,
    pub warm: Color,
}

impl Palette {
    /// Blue for negatives, white around zero, red for positives.
    pub const DIVERGING: Palette = Palette {
        cold: Color::rgb(0x00, 0x74, 0xd9),
        neutral: Color::WHITE,
        warm: Color::rgb(0xff, 0x41, 0x36),
    };

    /// Maps `value` onto the palette, piecewise linearly across `domain`.
    ///
    /// Values outside the domain take the nearest endpoint color and `NaN` takes the neutral
    /// one.
    pub fn map(&self, value: f32, domain: ColorDomain) -> Color {
        if value.is_nan() {
            return self.neutral;
        }

        let v = value.clamp(domain.low.min(domain.high), domain.high.max(domain.low));
        if v <= domain.mid {
            let span = domain.mid - domain.low;
            let t = if span > 0. { (v - domain.low) / span } else { 1. };
            self.cold.lerp(self.neutral, t)
        } else {
            let span = domain.high - domain.mid;
            let t = if span > 0. { (v - domain.mid) / span } else { 1. };
            self.neutral.lerp(self.warm, t)
        }
    }
}

/// Maps `value` with the default diverging palette.
pub fn map(value: f32, domain: ColorDomain) -> Color {
    Palette::DIVERGING.map(value, domain)
}
