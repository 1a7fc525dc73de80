//! The tables of a parsed class file.
use bitflags::bitflags;

use crate::{errors::FormatError, macros::see_jvm_spec};

use super::constant_pool::ConstantPool;

/// A parsed class file.
/// Indices refer to the [`ConstantPool`]; attribute payloads are kept as raw bytes.
#[doc = see_jvm_spec!(4, 1)]
#[derive(Debug, Clone)]
pub struct BinaryClass {
    /// The version of the class file.
    pub version: Version,
    /// The constant pool.
    pub constant_pool: ConstantPool,
    /// The raw access flags of the class.
    pub access_flags: u16,
    /// The index of the class itself.
    pub this_class: u16,
    /// The index of the superclass, or `0` for `java/lang/Object`.
    pub super_class: u16,
    /// The indices of the direct superinterfaces.
    pub interfaces: Vec<u16>,
    /// The field table.
    pub fields: Vec<MemberInfo>,
    /// The method table.
    pub methods: Vec<MemberInfo>,
    /// The class attribute table.
    pub attributes: Vec<AttributeInfo>,
}

/// An entry in the field table or in the method table.
#[doc = see_jvm_spec!(4, 5)]
#[doc = see_jvm_spec!(4, 6)]
#[derive(Debug, Clone)]
pub struct MemberInfo {
    /// The raw access flags.
    pub access_flags: u16,
    /// The index of the name.
    pub name_index: u16,
    /// The index of the descriptor.
    pub descriptor_index: u16,
    /// The attributes of the member.
    pub attributes: Vec<AttributeInfo>,
}

/// An attribute as it appears in the class file.
#[doc = see_jvm_spec!(4, 7)]
#[derive(Debug, Clone)]
pub struct AttributeInfo {
    /// The index of the attribute name.
    pub name_index: u16,
    /// The payload, exactly `attribute_length` bytes.
    pub info: Vec<u8>,
}

/// The version of a class file.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Version {
    major: u16,
    minor: u16,
}

/// The first major version (JDK 1.1).
pub const MIN_MAJOR_VERSION: u16 = 45;
/// The latest supported major version (JDK 25).
pub const MAX_MAJOR_VERSION: u16 = 69;

impl Version {
    /// Creates a version, checking that it is one that a JDK can produce.
    /// # Errors
    /// [`FormatError::UnsupportedVersion`] if the major version is out of range, or if the minor
    /// version is neither `0` nor `0xFFFF` (preview features) from JDK 12 on.
    pub fn new(major: u16, minor: u16) -> Result<Self, FormatError> {
        match (major, minor) {
            (45, _) | (46..=55, 0x0000) | (56..=MAX_MAJOR_VERSION, 0x0000 | 0xFFFF) => {
                Ok(Self { major, minor })
            }
            _ => Err(FormatError::UnsupportedVersion { major, minor }),
        }
    }

    /// The major version.
    #[must_use]
    pub const fn major(&self) -> u16 {
        self.major
    }

    /// The minor version.
    #[must_use]
    pub const fn minor(&self) -> u16 {
        self.minor
    }

    /// Checks if the class is compiled with preview features enabled.
    #[must_use]
    pub const fn is_preview_enabled(&self) -> bool {
        self.major >= 56 && self.minor == 0xFFFF
    }
}

/// An entry of the `InnerClasses` attribute.
#[doc = see_jvm_spec!(4, 7, 6)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    /// The binary name of the inner class.
    pub inner_class: String,
    /// The binary name of the outer class. `None` for local and anonymous classes.
    pub outer_class: Option<String>,
    /// The simple name of the inner class. `None` for anonymous classes.
    pub inner_name: Option<String>,
    /// The access flags of the inner class.
    pub access_flags: NestedClassAccessFlags,
}

bitflags! {
    /// The access flags of a class.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct ClassAccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `final`; no subclasses allowed.
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by the invokespecial instruction.
        const SUPER = 0x0020;
        /// Is an interface, not a class.
        const INTERFACE = 0x0200;
        /// Declared `abstract`; must not be instantiated.
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface.
        const ANNOTATION = 0x2000;
        /// Declared as an enum class.
        const ENUM = 0x4000;
        /// Is a module, not a class or interface.
        const MODULE = 0x8000;
    }
}

bitflags! {
    /// The access flags of a field.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct FieldAccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `private`; accessible only within the defining class and other classes belonging to the same nest.
        const PRIVATE = 0x0002;
        /// Declared `protected`; may be accessed within subclasses.
        const PROTECTED = 0x0004;
        /// Declared `static`.
        const STATIC = 0x0008;
        /// Declared `final`; never directly assigned to after object construction.
        const FINAL = 0x0010;
        /// Declared `volatile`; cannot be cached.
        const VOLATILE = 0x0040;
        /// Declared `transient`; not written or read by a persistent object manager.
        const TRANSIENT = 0x0080;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an element of an enum class.
        const ENUM = 0x4000;
    }
}

bitflags! {
    /// The access flags of a method.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct MethodAccessFlags: u16 {
        /// Declared `public`; may be accessed from outside its package.
        const PUBLIC = 0x0001;
        /// Declared `private`; accessible only within the defining class and other classes belonging to the same nest.
        const PRIVATE = 0x0002;
        /// Declared `protected`; may be accessed within subclasses.
        const PROTECTED = 0x0004;
        /// Declared `static`.
        const STATIC = 0x0008;
        /// Declared `final`; must not be overridden.
        const FINAL = 0x0010;
        /// Declared `synchronized`; invocation is wrapped by a monitor use.
        const SYNCHRONIZED = 0x0020;
        /// A bridge method, generated by the compiler.
        const BRIDGE = 0x0040;
        /// Declared with variable number of arguments.
        const VARARGS = 0x0080;
        /// Declared `native`; implemented in a language other than Java.
        const NATIVE = 0x0100;
        /// Declared `abstract`; no implementation is provided.
        const ABSTRACT = 0x0400;
        /// In a class file whose major version number is at least 46 and at most 60, declared `strictfp`.
        const STRICT = 0x0800;
        /// Declared synthetic; not present in the source code.
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    /// The access flags of a nested class.
    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    pub struct NestedClassAccessFlags: u16 {
        /// Marked or implicitly `public` in source.
        const PUBLIC = 0x0001;
        /// Marked `private` in source.
        const PRIVATE = 0x0002;
        /// Marked `protected` in source.
        const PROTECTED = 0x0004;
        /// Marked or implicitly `static` in source.
        const STATIC = 0x0008;
        /// Marked `final` in source.
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by the invokespecial instruction.
        /// NOTE: This is not mentioned for nested classes in the JVM Specification,
        /// but it appears in some class files.
        const SUPER = 0x0020;
        /// Was an `interface` in source.
        const INTERFACE = 0x0200;
        /// Marked or implicitly `abstract` in source.
        const ABSTRACT = 0x0400;
        /// Declared `synthetic`; not present in the source code.
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface.
        const ANNOTATION = 0x2000;
        /// Declared as an enum class.
        const ENUM = 0x4000;
    }
}
