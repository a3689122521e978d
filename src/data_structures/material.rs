//! CPU-side material descriptions.
//!
//! The scene graph only stores *what* a node should look like. The matching GPU
//! bind groups are created from these descriptions once the card has been
//! assembled (see [`crate::hcard::model::HcardModel`]).

/// Reference to a texture by the path it was loaded from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureRef {
    pub path: String,
}

impl From<&str> for TextureRef {
    fn from(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

/// A plain diffuse (Lambert) material with an optional colour map.
#[derive(Clone, Debug, PartialEq)]
pub struct LambertMaterial {
    /// sRGB encoded RGBA multiplier. The alpha channel is ignored in favour of `opacity`.
    pub color: [f32; 4],
    pub opacity: f32,
    pub map: Option<TextureRef>,
}

impl LambertMaterial {
    pub fn new(color: [f32; 4]) -> Self {
        Self {
            color,
            opacity: 1.0,
            map: None,
        }
    }

    /// Builds the colour from a hex literal such as `0xffffee`.
    ///
    /// Only the lowest 24 bits are used, so `0xffffffee` yields the same colour
    /// as `0xffffee`.
    pub fn from_hex(hex: u32) -> Self {
        Self::new(hex_to_rgba(hex))
    }

    /// Builds the material from a linear RGBA colour such as a glTF `baseColorFactor`.
    pub fn from_linear(color: [f32; 4]) -> Self {
        let [r, g, b, a] = color;
        Self::new([linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b), 1.0]).with_opacity(a)
    }

    pub fn with_map(mut self, map: TextureRef) -> Self {
        self.map = Some(map);
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

impl Default for LambertMaterial {
    fn default() -> Self {
        Self::new([1.0; 4])
    }
}

pub fn hex_to_rgba(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
    [channel(16), channel(8), channel(0), 1.0]
}

/// Converts one sRGB encoded channel to linear light.
///
/// Colours are authored as sRGB hex values while shading happens in linear space
/// and the surface encodes back to sRGB.
pub fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.0031308 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

pub fn hex_to_linear_rgb(hex: u32) -> [f32; 3] {
    let [r, g, b, _] = hex_to_rgba(hex);
    [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b)]
}
