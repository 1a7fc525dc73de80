use std::fmt::Display;

use crate::{
    jvm::constant_pool::{Constant, ConstantKind, ConstantPool, ConstantPoolError},
    types::field_type::PrimitiveType,
};

/// A compile-time constant value.
#[derive(Debug, Clone)]
pub enum Literal {
    /// A `boolean` constant.
    Boolean(bool),
    /// A `char` constant, as a UTF-16 code unit.
    Char(u16),
    /// A `byte` constant.
    Byte(i8),
    /// A `short` constant.
    Short(i16),
    /// An `int` constant.
    Int(i32),
    /// A `long` constant.
    Long(i64),
    /// A `float` constant.
    Float(f32),
    /// A `double` constant.
    Double(f64),
    /// A `String` constant.
    String(String),
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(lhs), Self::Boolean(rhs)) => lhs == rhs,
            (Self::Char(lhs), Self::Char(rhs)) => lhs == rhs,
            (Self::Byte(lhs), Self::Byte(rhs)) => lhs == rhs,
            (Self::Short(lhs), Self::Short(rhs)) => lhs == rhs,
            (Self::Int(lhs), Self::Int(rhs)) => lhs == rhs,
            (Self::Long(lhs), Self::Long(rhs)) => lhs == rhs,
            // Bitwise, so that NaN constants compare equal to themselves.
            (Self::Float(lhs), Self::Float(rhs)) => lhs.to_bits() == rhs.to_bits(),
            (Self::Double(lhs), Self::Double(rhs)) => lhs.to_bits() == rhs.to_bits(),
            (Self::String(lhs), Self::String(rhs)) => lhs == rhs,
            _ => false,
        }
    }
}

impl Eq for Literal {}

impl Literal {
    /// Resolves a constant of the given primitive type.
    /// `boolean`, `char`, `byte`, and `short` constants are stored as `CONSTANT_Integer` and
    /// narrowed here.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "The JVM stores sub-int constants as truncated ints."
    )]
    pub(crate) fn resolve(
        primitive: PrimitiveType,
        index: u16,
        constant_pool: &ConstantPool,
    ) -> Result<Self, ConstantPoolError> {
        let expected = match primitive {
            PrimitiveType::Long => ConstantKind::Long,
            PrimitiveType::Float => ConstantKind::Float,
            PrimitiveType::Double => ConstantKind::Double,
            _ => ConstantKind::Integer,
        };
        let literal = match (primitive, constant_pool.resolve(index, expected)?) {
            (PrimitiveType::Boolean, Constant::Integer(it)) => Self::Boolean(it != 0),
            (PrimitiveType::Char, Constant::Integer(it)) => Self::Char(it as u16),
            (PrimitiveType::Byte, Constant::Integer(it)) => Self::Byte(it as i8),
            (PrimitiveType::Short, Constant::Integer(it)) => Self::Short(it as i16),
            (PrimitiveType::Int, Constant::Integer(it)) => Self::Int(it),
            (PrimitiveType::Long, Constant::Long(it)) => Self::Long(it),
            (PrimitiveType::Float, Constant::Float(it)) => Self::Float(it),
            (PrimitiveType::Double, Constant::Double(it)) => Self::Double(it),
            _ => unreachable!("resolve checks the kind of the entry"),
        };
        Ok(literal)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(it) => it.fmt(f),
            Self::Char(it) => match char::from_u32(u32::from(*it)) {
                Some(c) if !c.is_control() => write!(f, "'{c}'"),
                _ => write!(f, "'\\u{it:04X}'"),
            },
            Self::Byte(it) => it.fmt(f),
            Self::Short(it) => it.fmt(f),
            Self::Int(it) => it.fmt(f),
            Self::Long(it) => write!(f, "{it}L"),
            Self::Float(it) => write!(f, "{it:?}f"),
            Self::Double(it) => write!(f, "{it:?}"),
            Self::String(it) => write!(f, "{it:?}"),
        }
    }
}
