use std::fmt;

use num_traits::FromPrimitive;

use crate::binaries::read_name;

use super::consts::{LumpType, WadKind, MIP_LEVELS, NAME_LEN};

/// Header layout (12 bytes)
#[repr(C, packed)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WadHeader {
    pub magic: [u8; 4], // "WAD2" or "WAD3"
    num_entries: u32,   // number of directory entries
    dir_offset: u32,    // offset into file where entries start
}

impl WadHeader {
    pub fn new(kind: WadKind, num_entries: u32, dir_offset: u32) -> Self {
        Self {
            magic: kind.magic(),
            num_entries: num_entries.to_le(),
            dir_offset: dir_offset.to_le(),
        }
    }

    pub fn num_entries(&self) -> u32 {
        u32::from_le(self.num_entries)
    }

    pub fn dir_offset(&self) -> u32 {
        u32::from_le(self.dir_offset)
    }
}

impl fmt::Debug for WadHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WadHeader")
            .field("magic", &String::from_utf8_lossy(&self.magic))
            .field("num_entries", &self.num_entries())
            .field("dir_offset", &self.dir_offset())
            .finish()
    }
}

/// Directory entry layout (32 bytes)
#[repr(C, packed)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct WadDirEntry {
    offset: u32,           // absolute offset to the entry's data
    disk_size: u32,        // size of the data in the file
    size: u32,             // uncompressed size
    pub kind: u8,          // type of entry
    pub compression: u8,   // 0 if not compressed
    padding: u16,          // unused
    name: [u8; NAME_LEN],  // null terminated
}

impl WadDirEntry {
    pub fn new(name: [u8; NAME_LEN], offset: u32, size: u32, kind: u8) -> Self {
        Self {
            offset: offset.to_le(),
            disk_size: size.to_le(),
            size: size.to_le(),
            kind,
            compression: 0,
            padding: 0,
            name,
        }
    }

    pub fn offset(&self) -> u32 {
        u32::from_le(self.offset)
    }

    pub fn disk_size(&self) -> u32 {
        u32::from_le(self.disk_size)
    }

    pub fn size(&self) -> u32 {
        u32::from_le(self.size)
    }

    pub fn name(&self) -> String {
        read_name(&self.name)
    }

    pub fn lump_type(&self) -> Option<LumpType> {
        LumpType::from_u8(self.kind)
    }

    pub fn is_compressed(&self) -> bool {
        self.compression != 0
    }

    /// Case insensitive exact match on the stored name.
    pub fn is_named(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }
}

impl fmt::Debug for WadDirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WadDirEntry")
            .field("name", &self.name())
            .field("offset", &self.offset())
            .field("disk_size", &self.disk_size())
            .field("size", &self.size())
            .field("kind", &self.lump_type())
            .field("compression", &self.compression)
            .finish()
    }
}

/// Texture record layout (record header is 40 bytes). Offsets are relative to the
/// start of this header.
#[repr(C, packed)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MipTexHeader {
    name: [u8; NAME_LEN],
    width: u32,
    height: u32,
    offsets: [u32; MIP_LEVELS], // relative offset to each mip level
}

impl MipTexHeader {
    pub fn new(name: [u8; NAME_LEN], width: u32, height: u32, offsets: [u32; MIP_LEVELS]) -> Self {
        Self {
            name,
            width: width.to_le(),
            height: height.to_le(),
            offsets: offsets.map(u32::to_le),
        }
    }

    pub fn name(&self) -> String {
        read_name(&self.name)
    }

    pub fn width(&self) -> u32 {
        u32::from_le(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from_le(self.height)
    }

    pub fn offset(&self, level: usize) -> u32 {
        let offsets = self.offsets;
        u32::from_le(offsets[level])
    }
}

impl fmt::Debug for MipTexHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let offsets = self.offsets;
        f.debug_struct("MipTexHeader")
            .field("name", &self.name())
            .field("width", &self.width())
            .field("height", &self.height())
            .field("offsets", &offsets.map(u32::from_le))
            .finish()
    }
}
