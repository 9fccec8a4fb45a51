use std::io::Cursor;

use crate::{
    binaries::{read_u16, BinaryData},
    error::FormatError,
};

use super::{
    consts::{
        mip_size, mips_size, WadKind, MIPTEX_HEADER_SIZE, MIP_LEVELS, PALETTE_BYTES,
        PALETTE_COLORS,
    },
    header::MipTexHeader,
    palette::{decode_with_prefix, Palette, Rgba},
};

/// An indexed texture with up to four mip levels.
///
/// Level 0 is the displayed image; level `k` holds `(width >> k) * (height >> k)`
/// palette indices. `palette` is `None` for textures that index the shared external
/// palette of a `WAD2` archive.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterAsset {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub mips: Vec<Vec<u8>>,
    pub palette: Option<Palette>,
}

/// Borrow `len` bytes at `offset`, failing instead of reading past the buffer.
pub(crate) fn slice_at(data: &[u8], offset: usize, len: usize) -> Result<&[u8], FormatError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(FormatError::Truncated { offset, len })
}

impl RasterAsset {
    /// A texture with only level 0. Mip levels are derived when it is written.
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        palette: Option<Palette>,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            mips: vec![pixels],
            palette,
        }
    }

    /// Level 0 pixel indices.
    pub fn pixels(&self) -> &[u8] {
        self.mips.first().map(|m| &m[..]).unwrap_or(&[])
    }

    pub fn mip(&self, level: usize) -> Option<&[u8]> {
        self.mips.get(level).map(|m| &m[..])
    }

    pub fn mip_count(&self) -> usize {
        self.mips.len()
    }

    pub fn has_full_mips(&self) -> bool {
        self.mips.len() == MIP_LEVELS
    }

    /// Fill any missing levels by nearest neighbour decimation of level 0.
    pub fn with_generated_mips(mut self) -> Self {
        self.generate_mips();
        self
    }

    pub fn generate_mips(&mut self) {
        if self.mips.is_empty() {
            return;
        }
        let (width, height) = (self.width as usize, self.height as usize);
        self.mips.truncate(MIP_LEVELS);

        for level in self.mips.len()..MIP_LEVELS {
            let (w, h) = (width >> level, height >> level);
            let base = &self.mips[0];
            let mut mip = Vec::with_capacity(w * h);
            for y in 0..h {
                let row = (y << level) * width;
                for x in 0..w {
                    mip.push(base.get(row + (x << level)).copied().unwrap_or(0));
                }
            }
            self.mips.push(mip);
        }
    }

    /// Check every present level holds exactly the pixel count its dimensions imply.
    pub fn validate_mips(&self) -> Result<(), FormatError> {
        if self.mips.is_empty() || self.mips.len() > MIP_LEVELS {
            return Err(FormatError::MipSizeMismatch {
                name: self.name.clone(),
                level: self.mips.len(),
                expected: MIP_LEVELS,
                found: self.mips.len(),
            });
        }
        for (level, mip) in self.mips.iter().enumerate() {
            let expected = mip_size(self.width as usize, self.height as usize, level);
            if mip.len() != expected {
                return Err(FormatError::MipSizeMismatch {
                    name: self.name.clone(),
                    level,
                    expected,
                    found: mip.len(),
                });
            }
        }
        Ok(())
    }

    pub fn is_editor_sized(&self) -> bool {
        self.width % 16 == 0 && self.height % 16 == 0 && self.width > 0 && self.height > 0
    }

    /// Decode level 0, using the embedded palette or else `external`.
    pub fn to_rgba(
        &self,
        external: Option<&Palette>,
        transparent_prefix: &str,
    ) -> Result<Rgba, FormatError> {
        let palette = self
            .palette
            .as_ref()
            .or(external)
            .ok_or_else(|| FormatError::MissingPalette(self.name.clone()))?;

        let (pixels, transparent) =
            decode_with_prefix(self.pixels(), palette, &self.name, transparent_prefix)?;

        Ok(Rgba {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            pixels,
            transparent,
        })
    }

    /// Decode the mip texture record starting at `base`.
    ///
    /// Level 0 is found through the first relative offset; later levels follow it
    /// contiguously and are kept only while they fit in the buffer, so short legacy
    /// records still decode. `WAD3` records must also carry their palette.
    pub fn read(data: &[u8], base: usize, kind: WadKind) -> Result<Self, FormatError> {
        let header_bytes = slice_at(data, base, MIPTEX_HEADER_SIZE)?;
        let header = MipTexHeader::read(&mut Cursor::new(header_bytes))?;

        let width = header.width() as usize;
        let height = header.height() as usize;

        let mut offset = base + header.offset(0) as usize;
        let mut mips = Vec::with_capacity(MIP_LEVELS);
        for level in 0..MIP_LEVELS {
            let size = mip_size(width, height, level);
            match slice_at(data, offset, size) {
                Ok(mip) => mips.push(mip.to_vec()),
                Err(e) if level == 0 => return Err(e),
                Err(_) => {
                    log::debug!("{} stops after {} mip levels", header.name(), level);
                    break;
                }
            }
            offset += size;
        }

        let palette = if kind.has_embedded_palette() {
            let count_offset = base + MIPTEX_HEADER_SIZE + mips_size(width, height);
            let colors = read_u16(&mut Cursor::new(slice_at(data, count_offset, 2)?))?;
            if colors as usize != PALETTE_COLORS {
                log::debug!("{} declares {} palette colours", header.name(), colors);
            }
            let palette_offset = count_offset + 2;
            Some(Palette::from_rgb(slice_at(
                data,
                palette_offset,
                PALETTE_BYTES,
            )?))
        } else {
            None
        };

        Ok(Self {
            name: header.name(),
            width: header.width(),
            height: header.height(),
            mips,
            palette,
        })
    }
}
