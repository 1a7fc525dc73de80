//! The constant pool of a class file and the resolution of its entries.
//!
//! The pool is kept as an arena addressed by the `u16` indices the class file uses.
//! Entries are stored as read; strings are decoded from modified UTF-8 only when they are
//! first resolved, and the decoded text is cached in the entry.
use std::{
    cell::OnceCell,
    io::Read,
};

use crate::{
    errors::FormatError,
    jvm::parsing::reader_utils::{ValueReaderExt, read_byte_chunk},
    macros::see_jvm_spec,
};

/// A JVM constant pool.
#[doc = see_jvm_spec!(4, 4)]
#[derive(Debug, Clone)]
pub struct ConstantPool {
    inner: Vec<Slot>,
}

#[derive(Debug, Clone)]
enum Slot {
    Entry(Entry),
    Padding,
}

impl ConstantPool {
    /// Parses a constant pool from the given reader.
    /// - `constant_pool_count` is the maximum index of entries in the constant pool plus one.
    #[doc = see_jvm_spec!(4, 1)]
    pub(crate) fn from_reader<R>(
        reader: &mut R,
        constant_pool_count: u16,
    ) -> Result<Self, FormatError>
    where
        R: Read + ?Sized,
    {
        // The `constant_pool` table is indexed from `1` to `constant_pool_count - 1`.
        let mut inner = Vec::with_capacity(usize::from(constant_pool_count).max(1));
        inner.push(Slot::Padding);
        let mut index: u16 = 1;
        while index < constant_pool_count {
            let entry = Entry::parse(reader)?;
            let width = if matches!(entry, Entry::Long(_) | Entry::Double(_)) {
                2
            } else {
                1
            };
            inner.push(Slot::Entry(entry));
            if width == 2 {
                inner.push(Slot::Padding);
            }
            index = match index.checked_add(width) {
                Some(next) if next <= constant_pool_count => next,
                _ => return Err(FormatError::ConstantPoolOverflow(index)),
            };
        }
        Ok(Self { inner })
    }

    /// Gets the count of the constant pool. Note that this is NOT the number of entries.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "The pool is read with a `u16` count and never grows afterwards."
    )]
    pub fn count(&self) -> u16 {
        self.inner.len() as u16
    }

    /// Gets the constant pool entry at the given index.
    /// # Errors
    /// - [`ConstantPoolError::BadIndex`] if `index` does not point to an entry, including
    ///   index `0` and the unusable slot after a `Long` or `Double`.
    pub fn get_entry(&self, index: u16) -> Result<&Entry, ConstantPoolError> {
        match self.inner.get(usize::from(index)) {
            Some(Slot::Entry(entry)) => Ok(entry),
            _ => Err(ConstantPoolError::BadIndex(index)),
        }
    }

    /// Resolves the entry at `index`, which must be of the `expected` kind.
    /// # Errors
    /// - [`ConstantPoolError::BadIndex`] if `index` does not point to an entry.
    /// - [`ConstantPoolError::Mismatched`] if the entry (or an entry it refers to) is of another kind.
    /// - [`ConstantPoolError::InvalidUtf8`] if a string involved is not valid modified UTF-8.
    /// - [`ConstantPoolError::Unresolvable`] if the entry is a symbolic reference with no value.
    pub fn resolve(
        &self,
        index: u16,
        expected: ConstantKind,
    ) -> Result<Constant<'_>, ConstantPoolError> {
        let entry = self.get_entry(index)?;
        let found = entry.kind();
        if found != expected {
            return Err(ConstantPoolError::Mismatched {
                index,
                expected,
                found,
            });
        }
        let constant = match entry {
            Entry::Utf8(utf8) => Constant::Utf8(utf8.decoded(index)?),
            &Entry::Integer(it) => Constant::Integer(it),
            &Entry::Float(it) => Constant::Float(it),
            &Entry::Long(it) => Constant::Long(it),
            &Entry::Double(it) => Constant::Double(it),
            &Entry::Class { name_index } => Constant::Class(self.get_str(name_index)?),
            &Entry::String { string_index } => Constant::String(self.get_str(string_index)?),
            _ => return Err(ConstantPoolError::Unresolvable { index, kind: found }),
        };
        Ok(constant)
    }

    /// Gets the text of the `CONSTANT_Utf8` entry at `index`.
    /// # Errors
    /// See [`ConstantPool::resolve`].
    pub fn get_str(&self, index: u16) -> Result<&str, ConstantPoolError> {
        match self.resolve(index, ConstantKind::Utf8)? {
            Constant::Utf8(it) => Ok(it),
            _ => unreachable!("resolve checks the kind of the entry"),
        }
    }

    /// Gets the binary name (e.g., `java/lang/String`) of the `CONSTANT_Class` entry at `index`.
    /// # Errors
    /// See [`ConstantPool::resolve`].
    pub fn get_class_name(&self, index: u16) -> Result<&str, ConstantPoolError> {
        match self.resolve(index, ConstantKind::Class)? {
            Constant::Class(it) => Ok(it),
            _ => unreachable!("resolve checks the kind of the entry"),
        }
    }

    /// Gets the value of the `CONSTANT_String` entry at `index`.
    /// # Errors
    /// See [`ConstantPool::resolve`].
    pub fn get_string(&self, index: u16) -> Result<&str, ConstantPoolError> {
        match self.resolve(index, ConstantKind::String)? {
            Constant::String(it) => Ok(it),
            _ => unreachable!("resolve checks the kind of the entry"),
        }
    }
}

/// A resolved constant pool entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constant<'a> {
    /// The text of a `CONSTANT_Utf8` entry.
    Utf8(&'a str),
    /// An `int` constant.
    Integer(i32),
    /// A `float` constant.
    Float(f32),
    /// A `long` constant.
    Long(i64),
    /// A `double` constant.
    Double(f64),
    /// The binary name of a class.
    Class(&'a str),
    /// The value of a string constant.
    String(&'a str),
}

/// The kind of a constant pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConstantKind {
    /// A `CONSTANT_Utf8` entry.
    #[display("CONSTANT_Utf8")]
    Utf8,
    /// A `CONSTANT_Integer` entry.
    #[display("CONSTANT_Integer")]
    Integer,
    /// A `CONSTANT_Float` entry.
    #[display("CONSTANT_Float")]
    Float,
    /// A `CONSTANT_Long` entry.
    #[display("CONSTANT_Long")]
    Long,
    /// A `CONSTANT_Double` entry.
    #[display("CONSTANT_Double")]
    Double,
    /// A `CONSTANT_Class` entry.
    #[display("CONSTANT_Class")]
    Class,
    /// A `CONSTANT_String` entry.
    #[display("CONSTANT_String")]
    String,
    /// A `CONSTANT_Fieldref` entry.
    #[display("CONSTANT_Fieldref")]
    FieldRef,
    /// A `CONSTANT_Methodref` entry.
    #[display("CONSTANT_Methodref")]
    MethodRef,
    /// A `CONSTANT_InterfaceMethodref` entry.
    #[display("CONSTANT_InterfaceMethodref")]
    InterfaceMethodRef,
    /// A `CONSTANT_NameAndType` entry.
    #[display("CONSTANT_NameAndType")]
    NameAndType,
    /// A `CONSTANT_MethodHandle` entry.
    #[display("CONSTANT_MethodHandle")]
    MethodHandle,
    /// A `CONSTANT_MethodType` entry.
    #[display("CONSTANT_MethodType")]
    MethodType,
    /// A `CONSTANT_Dynamic` entry.
    #[display("CONSTANT_Dynamic")]
    Dynamic,
    /// A `CONSTANT_InvokeDynamic` entry.
    #[display("CONSTANT_InvokeDynamic")]
    InvokeDynamic,
    /// A `CONSTANT_Module` entry.
    #[display("CONSTANT_Module")]
    Module,
    /// A `CONSTANT_Package` entry.
    #[display("CONSTANT_Package")]
    Package,
}

/// An error when resolving an entry of the constant pool.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConstantPoolError {
    /// The index used to access the constant pool is invalid.
    #[error("Bad constant pool index: {0}")]
    BadIndex(u16),
    /// The index points to an entry of an unexpected kind.
    #[error("Mismatched constant pool entry #{index}, expected {expected}, but found {found}")]
    Mismatched {
        /// The index of the offending entry.
        index: u16,
        /// The kind that was expected.
        expected: ConstantKind,
        /// The kind that was found.
        found: ConstantKind,
    },
    /// The bytes of a `CONSTANT_Utf8` entry are not valid modified UTF-8.
    #[error("Entry #{0} is not valid modified UTF-8")]
    InvalidUtf8(u16),
    /// The entry is a symbolic reference and has no constant value.
    #[error("Entry #{index} of kind {kind} has no constant value")]
    Unresolvable {
        /// The index of the entry.
        index: u16,
        /// The kind of the entry.
        kind: ConstantKind,
    },
}

/// The payload of a `CONSTANT_Utf8` entry.
#[derive(Debug, Clone)]
pub struct Utf8 {
    bytes: Vec<u8>,
    decoded: OnceCell<Option<String>>,
}

impl Utf8 {
    pub(crate) fn decoded(&self, index: u16) -> Result<&str, ConstantPoolError> {
        self.decoded
            .get_or_init(|| {
                cesu8::from_java_cesu8(&self.bytes)
                    .ok()
                    .map(std::borrow::Cow::into_owned)
            })
            .as_deref()
            .ok_or(ConstantPoolError::InvalidUtf8(index))
    }
}

impl PartialEq for Utf8 {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

/// An entry in the [`ConstantPool`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Entry {
    /// A string in modified UTF-8.
    #[doc = see_jvm_spec!(4, 4, 7)]
    Utf8(Utf8),
    /// An integer.
    #[doc = see_jvm_spec!(4, 4, 4)]
    Integer(i32),
    /// A float.
    #[doc = see_jvm_spec!(4, 4, 4)]
    Float(f32),
    /// A long.
    #[doc = see_jvm_spec!(4, 4, 5)]
    Long(i64),
    /// A double.
    #[doc = see_jvm_spec!(4, 4, 5)]
    Double(f64),
    /// A class.
    #[doc = see_jvm_spec!(4, 4, 1)]
    Class {
        /// The index in the constant pool of its binary name.
        name_index: u16,
    },
    /// A string.
    #[doc = see_jvm_spec!(4, 4, 3)]
    String {
        /// The index in the constant pool of its UTF-8 value.
        string_index: u16,
    },
    /// A field reference.
    #[doc = see_jvm_spec!(4, 4, 2)]
    FieldRef {
        /// The index of the class containing the field.
        class_index: u16,
        /// The index of the name and type of the field.
        name_and_type_index: u16,
    },
    /// A method reference.
    #[doc = see_jvm_spec!(4, 4, 2)]
    MethodRef {
        /// The index of the class containing the method.
        class_index: u16,
        /// The index of the name and type of the method.
        name_and_type_index: u16,
    },
    /// An interface method reference.
    #[doc = see_jvm_spec!(4, 4, 2)]
    InterfaceMethodRef {
        /// The index of the interface containing the method.
        class_index: u16,
        /// The index of the name and type of the method.
        name_and_type_index: u16,
    },
    /// A name and type.
    #[doc = see_jvm_spec!(4, 4, 6)]
    NameAndType {
        /// The index of the name.
        name_index: u16,
        /// The index of the descriptor.
        descriptor_index: u16,
    },
    /// A method handle.
    #[doc = see_jvm_spec!(4, 4, 8)]
    MethodHandle {
        /// The kind of method handle.
        reference_kind: u8,
        /// The index of the referenced member.
        reference_index: u16,
    },
    /// A method type.
    #[doc = see_jvm_spec!(4, 4, 9)]
    MethodType {
        /// The index of the method descriptor.
        descriptor_index: u16,
    },
    /// A dynamically computed constant.
    #[doc = see_jvm_spec!(4, 4, 10)]
    Dynamic {
        /// The index of the bootstrap method in the bootstrap method table.
        bootstrap_method_attr_index: u16,
        /// The index of the name and type of the constant.
        name_and_type_index: u16,
    },
    /// A call site of an `invokedynamic` instruction.
    #[doc = see_jvm_spec!(4, 4, 10)]
    InvokeDynamic {
        /// The index of the bootstrap method in the bootstrap method table.
        bootstrap_method_attr_index: u16,
        /// The index of the name and type of the call site.
        name_and_type_index: u16,
    },
    /// A module.
    #[doc = see_jvm_spec!(4, 4, 11)]
    Module {
        /// The index of the module name.
        name_index: u16,
    },
    /// A package.
    #[doc = see_jvm_spec!(4, 4, 12)]
    Package {
        /// The index of the package name.
        name_index: u16,
    },
}

impl Entry {
    fn parse<R>(reader: &mut R) -> Result<Self, FormatError>
    where
        R: Read + ?Sized,
    {
        let tag: u8 = reader.read_value()?;
        let entry = match tag {
            1 => {
                let length: u16 = reader.read_value()?;
                let bytes = read_byte_chunk(reader, usize::from(length))?;
                Self::Utf8(Utf8 {
                    bytes,
                    decoded: OnceCell::new(),
                })
            }
            3 => Self::Integer(reader.read_value()?),
            4 => Self::Float(reader.read_value()?),
            5 => Self::Long(reader.read_value()?),
            6 => Self::Double(reader.read_value()?),
            7 => Self::Class {
                name_index: reader.read_value()?,
            },
            8 => Self::String {
                string_index: reader.read_value()?,
            },
            9 => Self::FieldRef {
                class_index: reader.read_value()?,
                name_and_type_index: reader.read_value()?,
            },
            10 => Self::MethodRef {
                class_index: reader.read_value()?,
                name_and_type_index: reader.read_value()?,
            },
            11 => Self::InterfaceMethodRef {
                class_index: reader.read_value()?,
                name_and_type_index: reader.read_value()?,
            },
            12 => Self::NameAndType {
                name_index: reader.read_value()?,
                descriptor_index: reader.read_value()?,
            },
            15 => Self::MethodHandle {
                reference_kind: reader.read_value()?,
                reference_index: reader.read_value()?,
            },
            16 => Self::MethodType {
                descriptor_index: reader.read_value()?,
            },
            17 => Self::Dynamic {
                bootstrap_method_attr_index: reader.read_value()?,
                name_and_type_index: reader.read_value()?,
            },
            18 => Self::InvokeDynamic {
                bootstrap_method_attr_index: reader.read_value()?,
                name_and_type_index: reader.read_value()?,
            },
            19 => Self::Module {
                name_index: reader.read_value()?,
            },
            20 => Self::Package {
                name_index: reader.read_value()?,
            },
            unknown => return Err(FormatError::UnexpectedConstantPoolTag(unknown)),
        };
        Ok(entry)
    }

    /// Gets the kind of this constant pool entry.
    #[must_use]
    pub const fn kind(&self) -> ConstantKind {
        match self {
            Self::Utf8(_) => ConstantKind::Utf8,
            Self::Integer(_) => ConstantKind::Integer,
            Self::Float(_) => ConstantKind::Float,
            Self::Long(_) => ConstantKind::Long,
            Self::Double(_) => ConstantKind::Double,
            Self::Class { .. } => ConstantKind::Class,
            Self::String { .. } => ConstantKind::String,
            Self::FieldRef { .. } => ConstantKind::FieldRef,
            Self::MethodRef { .. } => ConstantKind::MethodRef,
            Self::InterfaceMethodRef { .. } => ConstantKind::InterfaceMethodRef,
            Self::NameAndType { .. } => ConstantKind::NameAndType,
            Self::MethodHandle { .. } => ConstantKind::MethodHandle,
            Self::MethodType { .. } => ConstantKind::MethodType,
            Self::Dynamic { .. } => ConstantKind::Dynamic,
            Self::InvokeDynamic { .. } => ConstantKind::InvokeDynamic,
            Self::Module { .. } => ConstantKind::Module,
            Self::Package { .. } => ConstantKind::Package,
        }
    }
}
