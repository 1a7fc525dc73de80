use std::io::{self, Read};

pub(crate) trait ValueReaderExt
where
    Self: Read,
{
    /// Reads a big-endian value and advances the reader past it.
    fn read_value<T: Readable>(&mut self) -> io::Result<T>;
}

pub(crate) trait Readable: Sized {
    fn read_from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self>;
}

impl<R: Read + ?Sized> ValueReaderExt for R {
    fn read_value<T: Readable>(&mut self) -> io::Result<T> {
        T::read_from_reader(self)
    }
}

impl<const N: usize> Readable for [u8; N] {
    fn read_from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; N];
        reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

macro_rules! impl_readable_for {
    ($($t:ty),*) => {
        $(
            impl Readable for $t {
                fn read_from_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
                    let buf = reader.read_value()?;
                    Ok(Self::from_be_bytes(buf))
                }
            }
        )*
    };
}

impl_readable_for!(u8, u16, u32, i32, i64, f32, f64);

/// Reads `len` bytes and advances the reader by `len` bytes.
pub(crate) fn read_byte_chunk<R>(reader: &mut R, len: usize) -> io::Result<Vec<u8>>
where
    R: Read + ?Sized,
{
    // Bounded by the input rather than by the declared length.
    let mut buf = Vec::new();
    let limit = u64::try_from(len).unwrap_or(u64::MAX);
    reader.take(limit).read_to_end(&mut buf)?;
    if buf.len() == len {
        Ok(buf)
    } else {
        Err(io::ErrorKind::UnexpectedEof.into())
    }
}
