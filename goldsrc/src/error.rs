use std::io;

use thiserror::Error;

/// Archive level failures. Fatal to the single read or write that raised them.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid archive magic {0:?}")]
    BadMagic([u8; 4]),
    #[error("name `{0}` is longer than 15 characters")]
    NameTooLong(String),
    #[error("palette index {index} is outside a palette of {len} colours")]
    PaletteIndexOutOfRange { index: u8, len: usize },
    #[error("palette lump of {0} bytes is not a whole table of colours")]
    BadPalette(usize),
    #[error("entry `{0}` is compressed")]
    Compressed(String),
    #[error("texture `{name}` mip level {level} has {found} pixels, expected {expected}")]
    MipSizeMismatch {
        name: String,
        level: usize,
        expected: usize,
        found: usize,
    },
    #[error("texture `{0}` has no palette")]
    MissingPalette(String),
    #[error("texture `{name}` is {width}x{height}, dimensions must be multiples of 16")]
    BadDimensions {
        name: String,
        width: u32,
        height: u32,
    },
    #[error("a texture named `{0}` already exists")]
    DuplicateName(String),
    #[error("no texture named `{0}`")]
    NotFound(String),
    #[error("archive offset or size {0} does not fit in 32 bits")]
    TooLarge(usize),
    #[error("{len} bytes at offset {offset} run past the end of the archive")]
    Truncated { offset: usize, len: usize },
    #[error("archive is truncated or unreadable: {0}")]
    Io(#[from] io::Error),
}

/// Conditions that drop one brush, face or texture while the rest of the parse carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryWarning {
    #[error("brush {brush} has too few planes ({faces})")]
    TooFewFaces { brush: usize, faces: usize },
    #[error("no vertices computed for brush {brush}")]
    NoVertices { brush: usize },
    #[error("brush {brush} face {face} has collinear defining points")]
    DegenerateFace { brush: usize, face: usize },
    #[error("failed to compute face polygon for brush {brush} face {face} ({vertices} vertices)")]
    DegeneratePolygon {
        brush: usize,
        face: usize,
        vertices: usize,
    },
    #[error("failed to find texture `{0}` in the archive directory")]
    MissingTexture(String),
    #[error("entry `{name}` has type {found:#04x}, expected {expected:#04x}")]
    WrongEntryKind { name: String, expected: u8, found: u8 },
    #[error("texture `{0}` needs an external palette and none was supplied")]
    MissingPalette(String),
    #[error("texture `{name}` could not be decoded: {reason}")]
    BadTexture { name: String, reason: String },
}

/// Accumulates warnings for the caller while logging each one as it happens.
#[derive(Debug, Default, Clone)]
pub struct Warnings {
    inner: Vec<GeometryWarning>,
}

impl Warnings {
    pub fn push(&mut self, warning: GeometryWarning) {
        log::warn!("{warning}");
        self.inner.push(warning);
    }

    pub fn extend(&mut self, other: Warnings) {
        self.inner.extend(other.inner);
    }

    pub fn as_slice(&self) -> &[GeometryWarning] {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeometryWarning> {
        self.inner.iter()
    }

    pub fn into_vec(self) -> Vec<GeometryWarning> {
        self.inner
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a GeometryWarning;
    type IntoIter = std::slice::Iter<'a, GeometryWarning>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
