//! The parsing logic for the JVM class file format.
pub(crate) mod annotation;
pub(crate) mod attribute;
mod class_file;
pub(crate) mod reader_utils;

use std::io::Read;

use bitflags::Flags;

use crate::{
    errors::{Error, FormatError},
    jvm::constant_pool::ConstantPool,
};

/// A structure read directly from the bytes of a class file, before any constant pool lookup.
pub(crate) trait FromReader: Sized {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FormatError>;
}

/// An element of a class file resolved against the constant pool from its raw form.
pub(crate) trait ClassElement: Sized {
    type Raw;

    fn from_raw(raw: Self::Raw, constant_pool: &ConstantPool) -> Result<Self, Error>;
}

/// Interprets access flag bits, rejecting the bits that are not defined for `F`.
#[inline]
pub(crate) fn parse_flags<F>(flag_bits: u16) -> Result<F, FormatError>
where
    F: Flags<Bits = u16>,
{
    F::from_bits(flag_bits).ok_or(FormatError::UnknownFlags(
        std::any::type_name::<F>(),
        flag_bits,
    ))
}

/// Runs `decode` over `bytes`, which must consume all of them.
pub(crate) fn decode_exactly<T>(
    structure: &'static str,
    bytes: &[u8],
    decode: impl FnOnce(&mut &[u8]) -> Result<T, Error>,
) -> Result<T, Error> {
    let mut reader = bytes;
    let decoded = decode(&mut reader)?;
    if reader.is_empty() {
        Ok(decoded)
    } else {
        Err(FormatError::AttributeLengthMismatch {
            attribute: structure,
            declared: bytes.len(),
            consumed: bytes.len() - reader.len(),
        }
        .into())
    }
}
