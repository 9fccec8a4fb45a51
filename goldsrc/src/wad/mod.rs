// Texture archives ("WAD" files).
//
// A 12 byte header names the dialect and points at a directory of 32 byte entries
// placed after all entry data. Each mip texture entry is a 40 byte header followed by
// four mip levels of palette indices; `WAD3` archives follow the levels with a colour
// count and a 256 colour palette, `WAD2` archives share one palette kept outside the
// archive. All integers are little-endian.

pub mod consts;
pub mod header;
pub mod miptex;
pub mod palette;
pub mod texture_set;
pub mod writer;

use std::{fs, io::Cursor, path::Path};

use crate::{
    binaries::BinaryData,
    error::{FormatError, GeometryWarning, Warnings},
};

use self::{
    consts::{DIR_ENTRY_SIZE, HEADER_SIZE, MAGIC_SIZE},
    header::{WadDirEntry, WadHeader},
    miptex::slice_at,
};

pub use self::{
    consts::{LumpType, WadKind},
    miptex::RasterAsset,
    palette::Palette,
    texture_set::{MergeReport, TextureSet},
    writer::write,
};

/// A parsed archive: header and directory, with entries decoded on request.
pub struct Wad {
    header: WadHeader,
    kind: WadKind,
    directory: Vec<WadDirEntry>,
    data: Vec<u8>,
}

impl std::fmt::Debug for Wad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wad")
            .field("header", &self.header)
            .field("entries", &self.directory.len())
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Wad {
    pub fn load(path: &Path) -> Result<Self, FormatError> {
        Self::read(fs::read(path)?)
    }

    /// Validate the magic and walk the directory.
    pub fn read(data: Vec<u8>) -> Result<Self, FormatError> {
        let mut magic = [0; MAGIC_SIZE];
        magic.copy_from_slice(slice_at(&data, 0, MAGIC_SIZE)?);
        let kind = WadKind::from_magic(magic).ok_or(FormatError::BadMagic(magic))?;
        let header = WadHeader::read(&mut Cursor::new(slice_at(&data, 0, HEADER_SIZE)?))?;

        let count = header.num_entries() as usize;
        let dir_len = count
            .checked_mul(DIR_ENTRY_SIZE)
            .ok_or(FormatError::Truncated {
                offset: header.dir_offset() as usize,
                len: usize::MAX,
            })?;
        let dir_bytes = slice_at(&data, header.dir_offset() as usize, dir_len)?;

        let mut cursor = Cursor::new(dir_bytes);
        let mut directory = Vec::with_capacity(count);
        for _ in 0..count {
            directory.push(WadDirEntry::read(&mut cursor)?);
        }

        log::debug!("{:?}", header);

        Ok(Self {
            header,
            kind,
            directory,
            data,
        })
    }

    pub fn header(&self) -> &WadHeader {
        &self.header
    }

    pub fn kind(&self) -> WadKind {
        self.kind
    }

    pub fn directory(&self) -> &[WadDirEntry] {
        &self.directory
    }

    pub fn len(&self) -> usize {
        self.directory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// First entry whose name matches, ignoring ASCII case.
    pub fn entry(&self, name: &str) -> Option<&WadDirEntry> {
        self.directory.iter().find(|e| e.is_named(name))
    }

    /// Decode the entry as a mip texture of this archive's dialect.
    pub fn extract(&self, entry: &WadDirEntry) -> Result<RasterAsset, FormatError> {
        if entry.is_compressed() {
            return Err(FormatError::Compressed(entry.name()));
        }
        RasterAsset::read(&self.data, entry.offset() as usize, self.kind)
    }

    /// Look a texture up by name for a map of the given dialect.
    ///
    /// Absent names give `None` silently. Entries of the wrong type for `kind`, and
    /// entries that fail to decode, give `None` plus a warning; neither aborts the
    /// caller's parse.
    pub fn texture_from_name(
        &self,
        name: &str,
        kind: WadKind,
        warnings: &mut Warnings,
    ) -> Option<RasterAsset> {
        let entry = self.entry(name)?;

        let expected = kind.miptex_type();
        if entry.kind != expected {
            warnings.push(GeometryWarning::WrongEntryKind {
                name: entry.name(),
                expected,
                found: entry.kind,
            });
            return None;
        }

        match self.extract(entry) {
            Ok(asset) => Some(asset),
            Err(e) => {
                warnings.push(GeometryWarning::BadTexture {
                    name: entry.name(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Every mip texture of the archive's own dialect, in directory order.
    pub fn assets(&self, warnings: &mut Warnings) -> Vec<RasterAsset> {
        let expected = self.kind.miptex_type();
        let mut assets = Vec::with_capacity(self.directory.len());

        for entry in &self.directory {
            if entry.kind != expected {
                warnings.push(GeometryWarning::WrongEntryKind {
                    name: entry.name(),
                    expected,
                    found: entry.kind,
                });
                continue;
            }
            match self.extract(entry) {
                Ok(asset) => assets.push(asset),
                Err(e) => warnings.push(GeometryWarning::BadTexture {
                    name: entry.name(),
                    reason: e.to_string(),
                }),
            }
        }

        assets
    }
}

#[cfg(test)]
mod wad_tests {
    use super::*;
    use crate::{binaries::write_name, wad::header::MipTexHeader};

    fn asset(name: &str, fill: u8) -> RasterAsset {
        let mut bytes = vec![0; 768];
        bytes[..3].copy_from_slice(&[fill, fill, fill]);
        RasterAsset::new(name, 16, 16, vec![fill; 256], Some(Palette::from_rgb(&bytes)))
            .with_generated_mips()
    }

    /// A `WAD2` archive holding one 16x16 texture of the given entry type.
    fn legacy_archive(name: &str, kind: u8) -> Vec<u8> {
        let mut data = Vec::new();
        let record = 40 + 256 + 64 + 16 + 4;
        data.extend_from_slice(bytemuck::bytes_of(&WadHeader::new(
            WadKind::Wad2,
            1,
            (12 + record) as u32,
        )));
        let field = write_name::<16>(name).unwrap();
        data.extend_from_slice(bytemuck::bytes_of(&MipTexHeader::new(
            field,
            16,
            16,
            [40, 296, 360, 376],
        )));
        data.extend(std::iter::repeat(7).take(record - 40));
        data.extend_from_slice(bytemuck::bytes_of(&WadDirEntry::new(
            field,
            12,
            record as u32,
            kind,
        )));
        data
    }

    #[test]
    fn accepts_both_magics() {
        let wad3 = Wad::read(write(&[asset("a", 1)]).unwrap()).unwrap();
        assert_eq!(wad3.kind(), WadKind::Wad3);
        assert_eq!(wad3.len(), 1);

        let wad2 = Wad::read(legacy_archive("b", 0x44)).unwrap();
        assert_eq!(wad2.kind(), WadKind::Wad2);
    }

    #[test]
    fn rejects_other_magics() {
        for magic in [*b"WAD1", *b"PACK", *b"wad3", [0, 0, 0, 0]] {
            let mut bytes = write(&[]).unwrap();
            bytes[..4].copy_from_slice(&magic);
            assert!(matches!(Wad::read(bytes), Err(FormatError::BadMagic(m)) if m == magic));
        }
    }

    #[test]
    fn magic_is_checked_before_the_header_length() {
        assert!(matches!(
            Wad::read(b"PACK".to_vec()),
            Err(FormatError::BadMagic(m)) if &m == b"PACK"
        ));
        assert!(matches!(
            Wad::read(b"WA".to_vec()),
            Err(FormatError::Truncated { offset: 0, len: 4 })
        ));
    }

    #[test]
    fn compressed_entries_are_refused() {
        let mut bytes = write(&[asset("packed", 1)]).unwrap();
        let dir = u32::from_le_bytes(bytes[8..12].try_into().unwrap()) as usize;
        bytes[dir + 13] = 1;
        let wad = Wad::read(bytes).unwrap();

        let entry = wad.entry("packed").unwrap();
        assert!(entry.is_compressed());
        assert!(matches!(
            wad.extract(entry),
            Err(FormatError::Compressed(name)) if name == "packed"
        ));

        let mut warnings = Warnings::default();
        assert!(wad
            .texture_from_name("packed", WadKind::Wad3, &mut warnings)
            .is_none());
        assert!(matches!(
            warnings.as_slice(),
            [GeometryWarning::BadTexture { name, .. }] if name == "packed"
        ));
    }

    #[test]
    fn short_buffer_is_truncated() {
        assert!(matches!(
            Wad::read(b"WAD3".to_vec()),
            Err(FormatError::Truncated { offset: 0, len: 12 })
        ));

        let mut bytes = write(&[asset("a", 1)]).unwrap();
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(Wad::read(bytes), Err(FormatError::Truncated { .. })));
    }

    #[test]
    fn lookup_ignores_case() {
        let wad = Wad::read(write(&[asset("Brick1", 1), asset("DOOR", 2)]).unwrap()).unwrap();
        let mut warnings = Warnings::default();

        let door = wad
            .texture_from_name("door", WadKind::Wad3, &mut warnings)
            .unwrap();
        assert_eq!(door.name, "DOOR");
        assert_eq!(door.pixels()[0], 2);
        assert!(wad
            .texture_from_name("BRICK1", WadKind::Wad3, &mut warnings)
            .is_some());
        assert!(wad
            .texture_from_name("missing", WadKind::Wad3, &mut warnings)
            .is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn dialect_mismatch_is_soft() {
        let wad = Wad::read(write(&[asset("a", 1)]).unwrap()).unwrap();
        let mut warnings = Warnings::default();

        assert!(wad.texture_from_name("a", WadKind::Wad2, &mut warnings).is_none());
        assert_eq!(
            warnings.as_slice(),
            &[GeometryWarning::WrongEntryKind {
                name: "a".into(),
                expected: 0x44,
                found: 0x43
            }]
        );
    }

    #[test]
    fn legacy_texture_has_no_palette() {
        let wad = Wad::read(legacy_archive("sky1", 0x44)).unwrap();
        let mut warnings = Warnings::default();

        let sky = wad
            .texture_from_name("SKY1", WadKind::Wad2, &mut warnings)
            .unwrap();
        assert!(sky.palette.is_none());
        assert_eq!(sky.mip_count(), 4);
        assert!(sky.pixels().iter().all(|&p| p == 7));
    }

    #[test]
    fn assets_skip_foreign_entries() {
        let wad = Wad::read(legacy_archive("conchars", 0x42)).unwrap();
        let mut warnings = Warnings::default();

        assert!(wad.assets(&mut warnings).is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn directory_reports_layout() {
        let wad = Wad::read(write(&[asset("a", 1), asset("b", 2)]).unwrap()).unwrap();
        let record = (40 + 256 + 64 + 16 + 4 + 2 + 768 + 2) as u32;

        assert_eq!(wad.header().dir_offset(), 12 + 2 * record);
        assert_eq!(wad.directory()[0].offset(), 12);
        assert_eq!(wad.directory()[1].offset(), 12 + record);
        assert_eq!(wad.directory()[1].size(), record);
        assert_eq!(wad.directory()[1].lump_type(), Some(LumpType::MipTex));
    }
}
