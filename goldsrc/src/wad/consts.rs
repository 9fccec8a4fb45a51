use num_derive::FromPrimitive;

pub const MAGIC_SIZE: usize = 4;
pub const HEADER_SIZE: usize = 12;
pub const DIR_ENTRY_SIZE: usize = 32;
/// Name, width, height and four mip offsets.
pub const MIPTEX_HEADER_SIZE: usize = 40;
pub const MIP_LEVELS: usize = 4;
pub const NAME_LEN: usize = 16;
pub const PALETTE_COLORS: usize = 256;
pub const PALETTE_BYTES: usize = PALETTE_COLORS * 3;

/// Archive dialect, selected by the 4-byte magic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WadKind {
    /// `WAD2`: textures index one shared external palette.
    Wad2,
    /// `WAD3`: every texture carries its own palette after the mip levels.
    Wad3,
}

impl WadKind {
    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        match &magic {
            b"WAD2" => Some(Self::Wad2),
            b"WAD3" => Some(Self::Wad3),
            _ => None,
        }
    }

    pub fn magic(&self) -> [u8; 4] {
        match self {
            Self::Wad2 => *b"WAD2",
            Self::Wad3 => *b"WAD3",
        }
    }

    /// The directory type code of a mip texture in this dialect.
    pub fn miptex_type(&self) -> u8 {
        match self {
            Self::Wad2 => LumpType::QuakeMipTex as u8,
            Self::Wad3 => LumpType::MipTex as u8,
        }
    }

    pub fn has_embedded_palette(&self) -> bool {
        matches!(self, Self::Wad3)
    }
}

/// Directory entry type codes.
#[derive(Copy, Clone, FromPrimitive, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum LumpType {
    Palette = 0x40,
    ColorMap = 0x41,
    Pic = 0x42,
    MipTex = 0x43,
    QuakeMipTex = 0x44,
    Font = 0x46,
}

/// Pixel count of mip `level` for a `width` x `height` texture.
pub const fn mip_size(width: usize, height: usize, level: usize) -> usize {
    (width >> level) * (height >> level)
}

pub const fn mips_size(width: usize, height: usize) -> usize {
    mip_size(width, height, 0)
        + mip_size(width, height, 1)
        + mip_size(width, height, 2)
        + mip_size(width, height, 3)
}
