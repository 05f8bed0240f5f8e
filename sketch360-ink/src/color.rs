//! # Color
//!
//! Straight (non-premultiplied) 8-bit RGBA, serialized as a `#RRGGBBAA` hex
//! string in documents. Six-digit `#RRGGBB` input is accepted and treated as
//! fully opaque.

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#'")]
    MissingHash,
    #[error("color must have 6 or 8 hex digits, got {0}")]
    BadLength(usize),
    #[error("invalid hex digit")]
    BadDigit,
}

impl Color {
    pub const BLACK: Self = Self::opaque(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::opaque(0xFF, 0xFF, 0xFF);
    /// The default sketch background.
    pub const BEIGE: Self = Self::opaque(0xF5, 0xF5, 0xDC);
    pub const RED: Self = Self::opaque(0xFF, 0x00, 0x00);
    pub const TRANSPARENT: Self = Self::new(0x00, 0x00, 0x00, 0x00);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }
    /// This color with the alpha channel replaced.
    #[must_use = "returns a new color and does not modify `self`"]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.strip_prefix('#').ok_or(ColorParseError::MissingHash)?;
        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(digits.get(range).unwrap_or(""), 16)
                .map_err(|_| ColorParseError::BadDigit)
        };
        match digits.len() {
            6 => Ok(Self::opaque(byte(0..2)?, byte(2..4)?, byte(4..6)?)),
            8 => Ok(Self::new(byte(0..2)?, byte(2..4)?, byte(4..6)?, byte(6..8)?)),
            len => Err(ColorParseError::BadLength(len)),
        }
    }
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// Documents store colors as hex strings, so the serde impls go through
// `from_hex`/`to_hex` rather than deriving a struct map.
impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text: std::borrow::Cow<'_, str> = serde::Deserialize::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
