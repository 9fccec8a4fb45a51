use std::io::{self, Read, Write};

/// Fixed-layout records that map byte for byte onto the archive.
///
/// All archive integers are little-endian, which is also the in-memory layout of the
/// `#[repr(C, packed)]` records on every target this crate builds for; the records
/// convert with `from_le`/`to_le` at their accessors so the byte copy stays valid.
pub trait BinaryData: Sized {
    fn read<R: Read>(buffer: &mut R) -> io::Result<Self>;

    fn write<W: Write>(&self, buffer: &mut W) -> io::Result<()>;
}

impl<T: bytemuck::Pod> BinaryData for T {
    fn read<R: Read>(buffer: &mut R) -> io::Result<Self> {
        let mut header = T::zeroed();
        buffer.read_exact(bytemuck::bytes_of_mut(&mut header))?;
        Ok(header)
    }

    fn write<W: Write>(&self, buffer: &mut W) -> io::Result<()> {
        buffer.write_all(bytemuck::bytes_of(self))
    }
}

/// Bytes of a NUL padded name field, up to the first terminator.
pub fn read_name(field: &[u8]) -> String {
    let end = field.iter().position(|&c| c == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// Copy `name` into a zero filled field. Returns `None` when it does not fit with a
/// terminator.
pub fn write_name<const N: usize>(name: &str) -> Option<[u8; N]> {
    let bytes = name.as_bytes();
    if bytes.len() >= N {
        return None;
    }
    let mut field = [0; N];
    field[..bytes.len()].copy_from_slice(bytes);
    Some(field)
}

pub fn read_u16<R: Read>(buffer: &mut R) -> io::Result<u16> {
    let mut bytes = [0; 2];
    buffer.read_exact(&mut bytes)?;
    Ok(u16::from_le_bytes(bytes))
}
