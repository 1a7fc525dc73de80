//! Errors raised while converting a class file.
use std::io;

use crate::{
    jvm::constant_pool::ConstantPoolError,
    types::{field_type::InvalidDescriptor, signature::InvalidSignature},
};

/// An error that aborts the conversion of a single class file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The header or table structure of the class file is malformed.
    #[error("Malformed class file: {0}")]
    Format(#[from] FormatError),
    /// A constant pool index does not point to an entry of the expected kind.
    #[error("Malformed constant pool: {0}")]
    MalformedConstantPool(#[from] ConstantPoolError),
    /// The class file is valid but uses a construct this converter does not model.
    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(&'static str),
}

impl From<InvalidDescriptor> for Error {
    fn from(value: InvalidDescriptor) -> Self {
        Self::Format(value.into())
    }
}

impl From<InvalidSignature> for Error {
    fn from(value: InvalidSignature) -> Self {
        Self::Format(value.into())
    }
}

/// A structural defect in a class file.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The buffer does not start with the class file magic number.
    #[error("The buffer does not contain a Java class file")]
    NotAClassFile,
    /// The class file version is not supported.
    #[error("Unsupported class file version {major}.{minor}")]
    UnsupportedVersion {
        /// The major version.
        major: u16,
        /// The minor version.
        minor: u16,
    },
    /// The input ended before a table was complete.
    #[error("Truncated class file: {0}")]
    Truncated(#[source] io::Error),
    /// There are unread bytes after the last table.
    #[error("{0} unexpected bytes after the end of the class file")]
    TrailingBytes(usize),
    /// The constant pool contains an entry with an unknown tag.
    #[error("Unexpected constant pool tag {0}")]
    UnexpectedConstantPoolTag(u8),
    /// A `Long` or `Double` entry occupies a slot beyond the declared count.
    #[error("Eight-byte constant at index {0} overflows the constant pool")]
    ConstantPoolOverflow(u16),
    /// The declared length of an attribute does not match its decoded content.
    #[error("Attribute {attribute} declares {declared} bytes but {consumed} were consumed")]
    AttributeLengthMismatch {
        /// The name of the attribute.
        attribute: &'static str,
        /// The declared `attribute_length`.
        declared: usize,
        /// The number of bytes the content actually occupies.
        consumed: usize,
    },
    /// An attribute that may appear at most once appears several times.
    #[error("Duplicated attribute {attribute} in {location}")]
    DuplicateAttribute {
        /// The name of the attribute.
        attribute: &'static str,
        /// Where the attribute was found.
        location: &'static str,
    },
    /// A known attribute appears in a location where it is not allowed.
    #[error("Unexpected attribute {attribute} in {location}")]
    UnexpectedAttribute {
        /// The name of the attribute.
        attribute: &'static str,
        /// Where the attribute was found.
        location: &'static str,
    },
    /// The access flags contain bits that are not defined.
    #[error("Unknown access flags in {0}: {1:#06x}")]
    UnknownFlags(&'static str, u16),
    /// An annotation element value has an unknown tag.
    #[error("Invalid element value tag {0:#04x}")]
    InvalidElementValueTag(u8),
    /// Annotation element values are nested deeper than supported.
    #[error("Annotation element values are nested too deeply")]
    NestingTooDeep,
    /// A descriptor cannot be parsed.
    #[error("Fail to parse descriptor: {0}")]
    InvalidDescriptor(#[from] InvalidDescriptor),
    /// A generic signature cannot be parsed.
    #[error("Fail to parse signature: {0}")]
    InvalidSignature(#[from] InvalidSignature),
    /// A field that is not `final` carries a `ConstantValue` attribute.
    #[error("Field {0} has a constant value but is not final")]
    ConstantValueOnNonFinalField(String),
    /// A field whose type cannot hold a compile-time constant carries a `ConstantValue` attribute.
    #[error("Field {0} has a constant value but its type cannot hold a constant")]
    ConstantValueOnNonConstantType(String),
    /// Other structural violations.
    #[error("{0}")]
    Malformed(&'static str),
}

impl From<io::Error> for FormatError {
    fn from(value: io::Error) -> Self {
        Self::Truncated(value)
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        Self::Format(value.into())
    }
}
