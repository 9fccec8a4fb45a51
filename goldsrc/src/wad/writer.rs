use std::borrow::Cow;

use crate::{
    binaries::{write_name, BinaryData},
    error::FormatError,
};

use super::{
    consts::{
        mip_size, mips_size, WadKind, HEADER_SIZE, MIPTEX_HEADER_SIZE, MIP_LEVELS, NAME_LEN,
        PALETTE_BYTES, PALETTE_COLORS,
    },
    header::{MipTexHeader, WadDirEntry, WadHeader},
    miptex::RasterAsset,
};

/// Bytes one texture occupies in the data section.
pub fn record_size(width: u32, height: u32) -> usize {
    MIPTEX_HEADER_SIZE + mips_size(width as usize, height as usize) + 2 + PALETTE_BYTES + 2
}

/// Offsets and sizes are stored as little-endian `u32`.
fn field(value: usize) -> Result<u32, FormatError> {
    u32::try_from(value).map_err(|_| FormatError::TooLarge(value))
}

/// Serialise textures into a `WAD3` archive: header, one data record per texture, then
/// the directory.
///
/// Textures with only some mip levels get the rest generated. Every texture needs its
/// own palette and a name of at most 15 bytes.
pub fn write(assets: &[RasterAsset]) -> Result<Vec<u8>, FormatError> {
    let mut prepared = Vec::with_capacity(assets.len());
    for asset in assets {
        let name: [u8; NAME_LEN] =
            write_name(&asset.name).ok_or_else(|| FormatError::NameTooLong(asset.name.clone()))?;
        if asset.palette.is_none() {
            return Err(FormatError::MissingPalette(asset.name.clone()));
        }
        let asset = if asset.has_full_mips() {
            Cow::Borrowed(asset)
        } else {
            Cow::Owned(asset.clone().with_generated_mips())
        };
        asset.validate_mips()?;
        prepared.push((name, asset));
    }

    let data_size: usize = prepared
        .iter()
        .map(|(_, a)| record_size(a.width, a.height))
        .sum();
    let dir_offset = HEADER_SIZE + data_size;

    let mut buffer = Vec::with_capacity(dir_offset + prepared.len() * 32);
    WadHeader::new(WadKind::Wad3, field(prepared.len())?, field(dir_offset)?).write(&mut buffer)?;

    let mut entries = Vec::with_capacity(prepared.len());
    for (name, asset) in &prepared {
        let start = buffer.len();
        let (width, height) = (asset.width as usize, asset.height as usize);

        let mut offsets = [0u32; MIP_LEVELS];
        let mut offset = MIPTEX_HEADER_SIZE;
        for (level, slot) in offsets.iter_mut().enumerate() {
            *slot = field(offset)?;
            offset += mip_size(width, height, level);
        }

        MipTexHeader::new(*name, asset.width, asset.height, offsets).write(&mut buffer)?;
        for mip in &asset.mips {
            buffer.extend_from_slice(mip);
        }

        buffer.extend_from_slice(&(PALETTE_COLORS as u16).to_le_bytes());
        if let Some(palette) = &asset.palette {
            buffer.extend_from_slice(&palette.to_bytes());
        }
        buffer.extend_from_slice(&[0, 0]);

        let size = buffer.len() - start;
        entries.push(WadDirEntry::new(
            *name,
            field(start)?,
            field(size)?,
            WadKind::Wad3.miptex_type(),
        ));
    }

    debug_assert_eq!(buffer.len(), dir_offset);

    for entry in &entries {
        entry.write(&mut buffer)?;
    }

    Ok(buffer)
}

#[cfg(test)]
mod writer_tests {
    use super::*;
    use crate::{
        error::Warnings,
        wad::{palette::Palette, Wad},
    };

    fn textured(name: &str, width: u32, height: u32) -> RasterAsset {
        let pixels = (0..width * height).map(|i| (i % 251) as u8).collect();
        let rgb: Vec<u8> = (0..768).map(|i| (i * 7 % 256) as u8).collect();
        RasterAsset::new(name, width, height, pixels, Some(Palette::from_rgb(&rgb)))
    }

    #[test]
    fn empty_archive_is_just_a_header() {
        let bytes = write(&[]).unwrap();
        assert_eq!(bytes, b"WAD3\0\0\0\0\x0c\0\0\0");
    }

    #[test]
    fn offsets_past_four_gibibytes_are_refused() {
        assert_eq!(field(u32::MAX as usize).unwrap(), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(
            field(u32::MAX as usize + 1),
            Err(FormatError::TooLarge(v)) if v == 1 << 32
        ));
    }

    #[test]
    fn header_and_record_layout() {
        let bytes = write(&[textured("wall", 16, 16)]).unwrap();
        let record = record_size(16, 16);

        assert_eq!(&bytes[..4], b"WAD3");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);
        assert_eq!(
            u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize,
            12 + record
        );
        assert_eq!(bytes.len(), 12 + record + 32);

        // name padded with zeros, then width and height
        assert_eq!(&bytes[12..16], b"wall");
        assert!(bytes[16..28].iter().all(|&b| b == 0));
        assert_eq!(&bytes[28..32], &16u32.to_le_bytes());
        // mip offsets
        assert_eq!(&bytes[36..40], &40u32.to_le_bytes());
        assert_eq!(&bytes[40..44], &296u32.to_le_bytes());
        assert_eq!(&bytes[44..48], &360u32.to_le_bytes());
        assert_eq!(&bytes[48..52], &376u32.to_le_bytes());

        // colour count, palette, padding close the record
        let palette_at = 12 + 40 + 340;
        assert_eq!(&bytes[palette_at..palette_at + 2], &256u16.to_le_bytes());
        assert_eq!(&bytes[12 + record - 2..12 + record], &[0, 0]);

        // directory entry
        let dir = &bytes[12 + record..];
        assert_eq!(&dir[0..4], &12u32.to_le_bytes());
        assert_eq!(&dir[4..8], &(record as u32).to_le_bytes());
        assert_eq!(&dir[8..12], &(record as u32).to_le_bytes());
        assert_eq!(dir[12], 0x43);
        assert_eq!(&dir[13..16], &[0, 0, 0]);
        assert_eq!(&dir[16..20], b"wall");
    }

    #[test]
    fn rewrite_of_read_archive_is_identical() {
        let assets = vec![
            textured("brick", 64, 32),
            textured("glass_1", 16, 16),
            textured("fifteen_chars__", 16, 48),
        ];
        let first = write(&assets).unwrap();

        let wad = Wad::read(first.clone()).unwrap();
        let mut warnings = Warnings::default();
        let reread = wad.assets(&mut warnings);
        assert!(warnings.is_empty());

        let second = write(&reread).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn long_names_are_rejected() {
        let err = write(&[textured("sixteen_chars___", 16, 16)]).unwrap_err();
        assert!(matches!(err, FormatError::NameTooLong(name) if name == "sixteen_chars___"));
    }

    #[test]
    fn palette_is_required() {
        let mut asset = textured("a", 16, 16);
        asset.palette = None;
        assert!(matches!(
            write(&[asset]),
            Err(FormatError::MissingPalette(_))
        ));
    }

    #[test]
    fn wrong_level_zero_size_is_rejected() {
        let mut asset = textured("a", 16, 16);
        asset.mips[0].truncate(100);
        assert!(matches!(
            write(&[asset]),
            Err(FormatError::MipSizeMismatch { level: 0, .. })
        ));
    }
}
