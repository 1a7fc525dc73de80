//! Erased JVM field types and their descriptors.
use std::{
    fmt::Display,
    str::{Chars, FromStr},
};

use itertools::Itertools;

use crate::macros::see_jvm_spec;

/// The maximum number of dimensions of an array type.
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

/// A primitive type in Java.
#[doc = see_jvm_spec!(4, 3, 2)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, derive_more::Display)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum PrimitiveType {
    /// The `boolean` type.
    #[display("boolean")]
    Boolean,
    /// The `char` type.
    #[display("char")]
    Char,
    /// The `float` type.
    #[display("float")]
    Float,
    /// The `double` type.
    #[display("double")]
    Double,
    /// The `byte` type.
    #[display("byte")]
    Byte,
    /// The `short` type.
    #[display("short")]
    Short,
    /// The `int` type.
    #[display("int")]
    Int,
    /// The `long` type.
    #[display("long")]
    Long,
}

impl PrimitiveType {
    /// Returns the descriptor character of the primitive type.
    #[must_use]
    pub const fn descriptor(self) -> char {
        match self {
            Self::Boolean => 'Z',
            Self::Char => 'C',
            Self::Float => 'F',
            Self::Double => 'D',
            Self::Byte => 'B',
            Self::Short => 'S',
            Self::Int => 'I',
            Self::Long => 'J',
        }
    }
}

impl TryFrom<char> for PrimitiveType {
    type Error = InvalidDescriptor;

    fn try_from(descriptor: char) -> Result<Self, Self::Error> {
        match descriptor {
            'Z' => Ok(Self::Boolean),
            'C' => Ok(Self::Char),
            'F' => Ok(Self::Float),
            'D' => Ok(Self::Double),
            'B' => Ok(Self::Byte),
            'S' => Ok(Self::Short),
            'I' => Ok(Self::Int),
            'J' => Ok(Self::Long),
            _ => Err(InvalidDescriptor(descriptor.to_string())),
        }
    }
}

/// A field type, i.e., the type of a field, a parameter, or a local variable.
#[doc = see_jvm_spec!(4, 3, 2)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub enum FieldType {
    /// A primitive type.
    Base(PrimitiveType),
    /// A class type, holding its binary name (e.g., `java/lang/String`).
    Object(String),
    /// An array type.
    Array(Box<FieldType>),
}

impl FieldType {
    /// Creates an array type with the given type as its elements.
    #[must_use]
    pub fn into_array_type(self) -> Self {
        Self::Array(Box::new(self))
    }

    /// Creates an array type of `dim` dimensions with `element` as its innermost element type.
    #[must_use]
    pub fn array_of(element: Self, dim: u8) -> Self {
        (0..dim).fold(element, |acc, _| acc.into_array_type())
    }

    /// Returns the descriptor string of the type.
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self {
            Self::Base(it) => it.descriptor().to_string(),
            Self::Object(binary_name) => format!("L{binary_name};"),
            Self::Array(inner) => format!("[{}", inner.descriptor()),
        }
    }

    /// Parses one field type starting with `prefix` and advances `remaining` past it.
    pub(crate) fn parse_prefixed(
        prefix: char,
        remaining: &mut Chars<'_>,
    ) -> Result<Self, InvalidDescriptor> {
        let mut dimensions = 0usize;
        let mut prefix = prefix;
        while prefix == '[' {
            dimensions += 1;
            if dimensions > MAX_ARRAY_DIMENSIONS {
                return Err(InvalidDescriptor(format!(
                    "more than {MAX_ARRAY_DIMENSIONS} array dimensions"
                )));
            }
            prefix = remaining
                .next()
                .ok_or_else(|| InvalidDescriptor("[".to_owned()))?;
        }
        let element = match prefix {
            'L' => {
                let binary_name: String = remaining.take_while_ref(|c| *c != ';').collect();
                match remaining.next() {
                    Some(';') if !binary_name.is_empty() => Self::Object(binary_name),
                    _ => return Err(InvalidDescriptor(format!("L{binary_name}"))),
                }
            }
            other => PrimitiveType::try_from(other).map(Self::Base)?,
        };
        Ok((0..dimensions).fold(element, |acc, _| acc.into_array_type()))
    }
}

impl FromStr for FieldType {
    type Err = InvalidDescriptor;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        let mut chars = descriptor.chars();
        let prefix = chars
            .next()
            .ok_or_else(|| InvalidDescriptor(descriptor.to_owned()))?;
        let field_type = Self::parse_prefixed(prefix, &mut chars)
            .map_err(|_| InvalidDescriptor(descriptor.to_owned()))?;
        if chars.as_str().is_empty() {
            Ok(field_type)
        } else {
            Err(InvalidDescriptor(descriptor.to_owned()))
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base(it) => it.fmt(f),
            Self::Object(binary_name) => write!(f, "{}", binary_name.replace('/', ".")),
            Self::Array(inner) => write!(f, "{inner}[]"),
        }
    }
}

/// An error indicating that a descriptor string is invalid.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Invalid descriptor: {0}")]
pub struct InvalidDescriptor(pub String);
