//! The declaration tree reconstructed from a class file.
//!
//! The tree is what a source parser would produce for the declarations of a type: no method
//! bodies, effective modifiers, and generic types wherever the class file records them.
use std::fmt::Display;

use bitflags::bitflags;

use crate::{
    jvm::annotation::{AnnotationInstance, AnnotationValue},
    types::signature::{ResultType, TypeParameter, TypeReference},
};

pub(crate) mod assembler;
mod literal;
pub(crate) mod member;

pub use literal::Literal;

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationNode {
    /// The kind of the declaration.
    pub kind: DeclarationKind,
    /// The qualified name, with `$` between nesting levels (e.g., `java.util.Map$Entry`).
    pub name: String,
    /// The effective modifiers.
    pub modifiers: Modifiers,
    /// The type parameters.
    pub type_parameters: Vec<TypeParameter>,
    /// The superclass. `None` when it is implied by the kind of the declaration.
    pub superclass: Option<TypeReference>,
    /// The direct superinterfaces.
    pub interfaces: Vec<TypeReference>,
    /// The annotations, visible ones first.
    pub annotations: Vec<AnnotationInstance>,
    /// The constants of an enum, in declaration order.
    pub enum_constants: Vec<EnumConstant>,
    /// The fields, methods and constructors, fields first and otherwise in class file order.
    pub members: Vec<MemberDeclaration>,
    /// The qualified names of the member types declared directly in this type.
    pub nested_types: Vec<String>,
}

impl DeclarationNode {
    /// Gets the package of the declaration, or an empty string for the unnamed package.
    #[must_use]
    pub fn package_name(&self) -> &str {
        self.name
            .rsplit_once('.')
            .map_or("", |(package, _)| package)
    }

    /// Gets the simple name of the declaration.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        let name = self
            .name
            .rsplit_once('.')
            .map_or(self.name.as_str(), |(_, name)| name);
        name.rsplit_once('$').map_or(name, |(_, inner)| inner)
    }

    /// Iterates over the fields.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDeclaration> {
        self.members.iter().filter_map(|it| match it {
            MemberDeclaration::Field(field) => Some(field),
            _ => None,
        })
    }

    /// Iterates over the methods.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDeclaration> {
        self.members.iter().filter_map(|it| match it {
            MemberDeclaration::Method(method) => Some(method),
            _ => None,
        })
    }

    /// Iterates over the constructors.
    pub fn constructors(&self) -> impl Iterator<Item = &ConstructorDeclaration> {
        self.members.iter().filter_map(|it| match it {
            MemberDeclaration::Constructor(constructor) => Some(constructor),
            _ => None,
        })
    }
}

/// The kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum DeclarationKind {
    /// A class.
    #[display("class")]
    Class,
    /// An interface.
    #[display("interface")]
    Interface,
    /// An enum class.
    #[display("enum")]
    Enum,
    /// An annotation interface.
    #[display("@interface")]
    AnnotationType,
}

impl DeclarationKind {
    /// Checks if this is an interface or an annotation interface.
    #[must_use]
    pub const fn is_interface(self) -> bool {
        matches!(self, Self::Interface | Self::AnnotationType)
    }
}

bitflags! {
    /// Source-level modifiers.
    #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
    pub struct Modifiers: u16 {
        /// `public`
        const PUBLIC = 1 << 0;
        /// `protected`
        const PROTECTED = 1 << 1;
        /// `private`
        const PRIVATE = 1 << 2;
        /// `abstract`
        const ABSTRACT = 1 << 3;
        /// `static`
        const STATIC = 1 << 4;
        /// `final`
        const FINAL = 1 << 5;
        /// `transient`
        const TRANSIENT = 1 << 6;
        /// `volatile`
        const VOLATILE = 1 << 7;
        /// `synchronized`
        const SYNCHRONIZED = 1 << 8;
        /// `native`
        const NATIVE = 1 << 9;
        /// `strictfp`
        const STRICTFP = 1 << 10;
        /// `default`, on interface methods with a body.
        const DEFAULT = 1 << 11;
    }
}

impl Display for Modifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const KEYWORDS: [(Modifiers, &str); 12] = [
            (Modifiers::PUBLIC, "public"),
            (Modifiers::PROTECTED, "protected"),
            (Modifiers::PRIVATE, "private"),
            (Modifiers::ABSTRACT, "abstract"),
            (Modifiers::STATIC, "static"),
            (Modifiers::DEFAULT, "default"),
            (Modifiers::FINAL, "final"),
            (Modifiers::TRANSIENT, "transient"),
            (Modifiers::VOLATILE, "volatile"),
            (Modifiers::SYNCHRONIZED, "synchronized"),
            (Modifiers::NATIVE, "native"),
            (Modifiers::STRICTFP, "strictfp"),
        ];
        let keywords = KEYWORDS
            .iter()
            .filter(|(modifier, _)| self.contains(*modifier))
            .map(|(_, keyword)| keyword);
        write!(f, "{}", itertools::join(keywords, " "))
    }
}

/// A constant of an enum class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    /// The name of the constant.
    pub name: String,
    /// The annotations on the constant.
    pub annotations: Vec<AnnotationInstance>,
}

/// A member of a type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberDeclaration {
    /// A field.
    Field(FieldDeclaration),
    /// A method.
    Method(MethodDeclaration),
    /// A constructor.
    Constructor(ConstructorDeclaration),
}

/// A field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    /// The name of the field.
    pub name: String,
    /// The effective modifiers.
    pub modifiers: Modifiers,
    /// The type of the field.
    pub field_type: TypeReference,
    /// The compile-time constant the field is initialized to.
    pub constant_value: Option<Literal>,
    /// The annotations, visible ones first.
    pub annotations: Vec<AnnotationInstance>,
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDeclaration {
    /// The name of the method.
    pub name: String,
    /// The effective modifiers.
    pub modifiers: Modifiers,
    /// The type parameters.
    pub type_parameters: Vec<TypeParameter>,
    /// The parameters.
    pub parameters: Vec<Parameter>,
    /// The result type.
    pub result: ResultType,
    /// Whether the last parameter is variable arity.
    pub is_varargs: bool,
    /// The types in the `throws` clause.
    pub thrown_types: Vec<TypeReference>,
    /// The annotations, visible ones first.
    pub annotations: Vec<AnnotationInstance>,
    /// The default value of an annotation interface element.
    pub default_value: Option<AnnotationValue>,
}

/// A constructor declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorDeclaration {
    /// The effective modifiers.
    pub modifiers: Modifiers,
    /// The type parameters.
    pub type_parameters: Vec<TypeParameter>,
    /// The parameters.
    pub parameters: Vec<Parameter>,
    /// Whether the last parameter is variable arity.
    pub is_varargs: bool,
    /// The types in the `throws` clause.
    pub thrown_types: Vec<TypeReference>,
    /// The annotations, visible ones first.
    pub annotations: Vec<AnnotationInstance>,
}

/// A formal parameter. Parameter names are not kept in class files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// The type of the parameter.
    pub parameter_type: TypeReference,
    /// The annotations, visible ones first.
    pub annotations: Vec<AnnotationInstance>,
}

impl Parameter {
    /// Creates a parameter without annotations.
    #[must_use]
    pub fn new(parameter_type: TypeReference) -> Self {
        Self {
            parameter_type,
            annotations: Vec::new(),
        }
    }
}
