use crate::error::FormatError;

use super::consts::{PALETTE_BYTES, PALETTE_COLORS};

/// Name prefix of textures drawn half transparent.
pub const TRANSPARENT_PREFIX: &str = "glass";

pub const OPAQUE_ALPHA: u8 = 255;
pub const TRANSPARENT_ALPHA: u8 = 128;

/// Up to 256 RGB colours indexed by pixel bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Palette({} colours)", self.colors.len())
    }
}

impl Palette {
    /// Build from packed RGB triplets. Trailing bytes that do not form a triplet and
    /// colours past the 256th are ignored.
    pub fn from_rgb(bytes: &[u8]) -> Self {
        Self {
            colors: bytes
                .chunks_exact(3)
                .take(PALETTE_COLORS)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        }
    }

    /// A raw `palette.lmp`: packed triplets, at most 768 bytes.
    pub fn from_lmp(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.is_empty() || bytes.len() % 3 != 0 || bytes.len() > PALETTE_BYTES {
            return Err(FormatError::BadPalette(bytes.len()));
        }
        Ok(Self::from_rgb(bytes))
    }

    pub fn grayscale() -> Self {
        Self {
            colors: (0..=255u8).map(|i| [i, i, i]).collect(),
        }
    }

    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: u8) -> Option<[u8; 3]> {
        self.colors.get(index as usize).copied()
    }

    /// Exactly 768 bytes, black filling any missing colours.
    pub fn to_bytes(&self) -> [u8; PALETTE_BYTES] {
        let mut bytes = [0; PALETTE_BYTES];
        for (dst, color) in bytes.chunks_exact_mut(3).zip(&self.colors) {
            dst.copy_from_slice(color);
        }
        bytes
    }
}

/// RGBA pixels decoded from an indexed texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Rgba {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// Alpha was lowered for the whole texture; render premultiplied and blended.
    pub transparent: bool,
}

pub fn is_transparent_name(name: &str, prefix: &str) -> bool {
    name.starts_with(prefix)
}

/// Expand palette indices to RGBA with the default transparent marker.
pub fn decode(
    indices: &[u8],
    palette: &Palette,
    name: &str,
) -> Result<(Vec<u8>, bool), FormatError> {
    decode_with_prefix(indices, palette, name, TRANSPARENT_PREFIX)
}

pub fn decode_with_prefix(
    indices: &[u8],
    palette: &Palette,
    name: &str,
    transparent_prefix: &str,
) -> Result<(Vec<u8>, bool), FormatError> {
    let transparent = is_transparent_name(name, transparent_prefix);
    let alpha = if transparent {
        TRANSPARENT_ALPHA
    } else {
        OPAQUE_ALPHA
    };

    let mut pixels = Vec::with_capacity(indices.len() * 4);
    for &index in indices {
        let [r, g, b] = palette
            .get(index)
            .ok_or_else(|| FormatError::PaletteIndexOutOfRange {
                index,
                len: palette.len(),
            })?;
        pixels.extend_from_slice(&[r, g, b, alpha]);
    }

    Ok((pixels, transparent))
}
