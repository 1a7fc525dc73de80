//! Generic type signatures in the JVM.
//!
//! Signatures keep the type variables and parameterizations that are erased from descriptors.
//! Class names in the parsed types are qualified names (`java.util.Map$Entry`), not binary names.
//!
//! See the [JVM Specification §4.7.9.1](https://docs.oracle.com/javase/specs/jvms/se21/html/jvms-4.html#jvms-4.7.9.1) for more information.
use std::{
    fmt::{Display, Formatter},
    iter::Peekable,
    str::{Chars, FromStr},
};

use itertools::Itertools;

use super::{
    field_type::{FieldType, PrimitiveType},
    method_descriptor::{MethodDescriptor, ReturnType},
    qualified_name,
};

/// The maximum nesting depth of type arguments and array components in a signature.
pub const MAX_NESTING_DEPTH: usize = 256;

/// A reference to a type at source level.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum TypeReference {
    /// A primitive type.
    Primitive(PrimitiveType),
    /// An array type.
    Array(Box<TypeReference>),
    /// A class or interface type, possibly parameterized.
    Class(ClassType),
    /// A type variable.
    TypeVariable(String),
    /// A wildcard type argument.
    Wildcard(WildcardBound),
}

/// A class or interface type.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ClassType {
    /// The qualified name of the class.
    pub name: String,
    /// The type arguments of this segment.
    pub type_arguments: Vec<TypeReference>,
    /// The enclosing class segment, when the enclosing class is parameterized
    /// (e.g., `Outer<T>.Inner`).
    pub outer: Option<Box<ClassType>>,
}

/// The bound of a wildcard type argument.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum WildcardBound {
    /// `?`
    Unbounded,
    /// `? extends T`
    Extends(Box<TypeReference>),
    /// `? super T`
    Super(Box<TypeReference>),
}

/// The result of a method, or the type named by a class literal.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum ResultType {
    /// `void`.
    Void,
    /// A type.
    Type(TypeReference),
}

/// A formal type parameter of a class or a method.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct TypeParameter {
    /// The name of the type variable.
    pub name: String,
    /// The bounds, class bound first. Empty when the only bound is `java.lang.Object`.
    pub bounds: Vec<TypeReference>,
}

/// The generic signature of a class.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ClassSignature {
    /// The type parameters.
    pub type_parameters: Vec<TypeParameter>,
    /// The superclass.
    pub superclass: TypeReference,
    /// The direct superinterfaces.
    pub interfaces: Vec<TypeReference>,
}

/// The generic signature of a method.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct MethodSignature {
    /// The type parameters.
    pub type_parameters: Vec<TypeParameter>,
    /// The parameter types.
    pub parameters: Vec<TypeReference>,
    /// The result type.
    pub result: ResultType,
    /// The thrown types. Empty if the signature does not declare them.
    pub throws: Vec<TypeReference>,
}

/// An error indicating that a signature string is invalid.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Invalid signature `{signature}`: {reason}")]
pub struct InvalidSignature {
    /// The signature that failed to parse.
    pub signature: String,
    /// What is wrong with it.
    pub reason: &'static str,
}

impl ClassType {
    /// Creates a non-parameterized class type with the given qualified name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_arguments: Vec::new(),
            outer: None,
        }
    }

    fn has_type_arguments(&self) -> bool {
        !self.type_arguments.is_empty()
            || self.outer.as_ref().is_some_and(|it| it.has_type_arguments())
    }
}

impl TypeReference {
    /// Creates a reference to the non-parameterized class with the given qualified name.
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(ClassType::new(name))
    }

    /// Gets the qualified name if this is a class type.
    #[must_use]
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class(ClassType { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// Checks if this is an array type.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

impl From<FieldType> for TypeReference {
    fn from(value: FieldType) -> Self {
        match value {
            FieldType::Base(it) => Self::Primitive(it),
            FieldType::Object(binary_name) => Self::class(qualified_name(&binary_name)),
            FieldType::Array(inner) => Self::Array(Box::new((*inner).into())),
        }
    }
}

impl From<ReturnType> for ResultType {
    fn from(value: ReturnType) -> Self {
        match value {
            ReturnType::Void => Self::Void,
            ReturnType::Some(it) => Self::Type(it.into()),
        }
    }
}

impl From<MethodDescriptor> for MethodSignature {
    fn from(value: MethodDescriptor) -> Self {
        Self {
            type_parameters: Vec::new(),
            parameters: value.parameters_types.into_iter().map_into().collect(),
            result: value.return_type.into(),
            throws: Vec::new(),
        }
    }
}

/// Parses a field signature, i.e., a reference type signature.
/// # Errors
/// See [`InvalidSignature`].
pub fn parse_field_signature(signature: &str) -> Result<TypeReference, InvalidSignature> {
    SignatureParser::run(signature, |p| p.reference_type(0))
}

/// Parses a method signature.
/// # Errors
/// See [`InvalidSignature`].
pub fn parse_method_signature(signature: &str) -> Result<MethodSignature, InvalidSignature> {
    SignatureParser::run(signature, SignatureParser::method_signature)
}

/// Parses a class signature.
/// # Errors
/// See [`InvalidSignature`].
pub fn parse_class_signature(signature: &str) -> Result<ClassSignature, InvalidSignature> {
    SignatureParser::run(signature, SignatureParser::class_signature)
}

impl FromStr for MethodSignature {
    type Err = InvalidSignature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_method_signature(s)
    }
}

impl FromStr for ClassSignature {
    type Err = InvalidSignature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_class_signature(s)
    }
}

type ParseResult<T> = Result<T, &'static str>;

struct SignatureParser<'s> {
    chars: Peekable<Chars<'s>>,
}

impl<'s> SignatureParser<'s> {
    fn run<T>(
        signature: &'s str,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> Result<T, InvalidSignature> {
        let mut parser = Self {
            chars: signature.chars().peekable(),
        };
        parse(&mut parser)
            .and_then(|it| match parser.chars.next() {
                None => Ok(it),
                Some(_) => Err("trailing characters"),
            })
            .map_err(|reason| InvalidSignature {
                signature: signature.to_owned(),
                reason,
            })
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn expect(&mut self, expected: char, reason: &'static str) -> ParseResult<()> {
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            _ => Err(reason),
        }
    }

    fn identifier(&mut self) -> ParseResult<String> {
        let ident: String = self
            .chars
            .peeking_take_while(|c| !matches!(c, '.' | ';' | '[' | '/' | '<' | '>' | ':'))
            .collect();
        if ident.is_empty() {
            Err("expected an identifier")
        } else {
            Ok(ident)
        }
    }

    fn class_signature(&mut self) -> ParseResult<ClassSignature> {
        let type_parameters = self.type_parameters()?;
        let superclass = self.class_type(0)?;
        let mut interfaces = Vec::new();
        while self.peek().is_some() {
            interfaces.push(self.class_type(0)?);
        }
        Ok(ClassSignature {
            type_parameters,
            superclass,
            interfaces,
        })
    }

    fn method_signature(&mut self) -> ParseResult<MethodSignature> {
        let type_parameters = self.type_parameters()?;
        self.expect('(', "expected `(`")?;
        let mut parameters = Vec::new();
        loop {
            match self.peek() {
                Some(')') => break,
                Some(_) => parameters.push(self.java_type(0)?),
                None => return Err("unterminated parameter list"),
            }
        }
        self.chars.next();
        let result = if self.chars.next_if_eq(&'V').is_some() {
            ResultType::Void
        } else {
            ResultType::Type(self.java_type(0)?)
        };
        let mut throws = Vec::new();
        while self.chars.next_if_eq(&'^').is_some() {
            let thrown = match self.peek() {
                Some('L') => self.class_type(0)?,
                Some('T') => self.type_variable()?,
                _ => return Err("expected a class type or a type variable after `^`"),
            };
            throws.push(thrown);
        }
        Ok(MethodSignature {
            type_parameters,
            parameters,
            result,
            throws,
        })
    }

    fn type_parameters(&mut self) -> ParseResult<Vec<TypeParameter>> {
        let mut type_parameters = Vec::new();
        if self.chars.next_if_eq(&'<').is_none() {
            return Ok(type_parameters);
        }
        while self.chars.next_if_eq(&'>').is_none() {
            type_parameters.push(self.type_parameter()?);
        }
        if type_parameters.is_empty() {
            return Err("empty type parameter list");
        }
        Ok(type_parameters)
    }

    fn type_parameter(&mut self) -> ParseResult<TypeParameter> {
        let name = self.identifier()?;
        self.expect(':', "expected `:` after a type parameter name")?;
        let mut bounds = Vec::new();
        if matches!(self.peek(), Some('L' | 'T' | '[')) {
            bounds.push(self.reference_type(0)?);
        }
        while self.chars.next_if_eq(&':').is_some() {
            bounds.push(self.reference_type(0)?);
        }
        if matches!(
            bounds.as_slice(),
            [TypeReference::Class(only)]
                if only.name == "java.lang.Object" && only.type_arguments.is_empty()
        ) {
            bounds.clear();
        }
        Ok(TypeParameter { name, bounds })
    }

    fn java_type(&mut self, depth: usize) -> ParseResult<TypeReference> {
        if let Some(primitive) = self.peek().and_then(|c| PrimitiveType::try_from(c).ok()) {
            self.chars.next();
            return Ok(TypeReference::Primitive(primitive));
        }
        self.reference_type(depth)
    }

    fn reference_type(&mut self, depth: usize) -> ParseResult<TypeReference> {
        if depth > MAX_NESTING_DEPTH {
            return Err("nested too deeply");
        }
        match self.peek() {
            Some('L') => self.class_type(depth),
            Some('T') => self.type_variable(),
            Some('[') => {
                self.chars.next();
                let component = self.java_type(depth + 1)?;
                Ok(TypeReference::Array(Box::new(component)))
            }
            _ => Err("expected a reference type"),
        }
    }

    fn type_variable(&mut self) -> ParseResult<TypeReference> {
        self.expect('T', "expected a type variable")?;
        let name = self.identifier()?;
        self.expect(';', "expected `;` after a type variable")?;
        Ok(TypeReference::TypeVariable(name))
    }

    fn class_type(&mut self, depth: usize) -> ParseResult<TypeReference> {
        self.expect('L', "expected a class type")?;
        let mut name = self.identifier()?;
        while self.chars.next_if_eq(&'/').is_some() {
            name.push('.');
            name.push_str(&self.identifier()?);
        }
        let mut class_type = ClassType {
            name,
            type_arguments: self.type_arguments(depth)?,
            outer: None,
        };
        while self.chars.next_if_eq(&'.').is_some() {
            let simple_name = self.identifier()?;
            let type_arguments = self.type_arguments(depth)?;
            let name = format!("{}${simple_name}", class_type.name);
            let outer = class_type.has_type_arguments().then(|| Box::new(class_type));
            class_type = ClassType {
                name,
                type_arguments,
                outer,
            };
        }
        self.expect(';', "expected `;` after a class type")?;
        Ok(TypeReference::Class(class_type))
    }

    fn type_arguments(&mut self, depth: usize) -> ParseResult<Vec<TypeReference>> {
        let mut type_arguments = Vec::new();
        if self.chars.next_if_eq(&'<').is_none() {
            return Ok(type_arguments);
        }
        let depth = depth + 1;
        while self.chars.next_if_eq(&'>').is_none() {
            let argument = match self.peek() {
                Some('*') => {
                    self.chars.next();
                    TypeReference::Wildcard(WildcardBound::Unbounded)
                }
                Some('+') => {
                    self.chars.next();
                    let bound = self.reference_type(depth)?;
                    TypeReference::Wildcard(WildcardBound::Extends(Box::new(bound)))
                }
                Some('-') => {
                    self.chars.next();
                    let bound = self.reference_type(depth)?;
                    TypeReference::Wildcard(WildcardBound::Super(Box::new(bound)))
                }
                Some(_) => self.reference_type(depth)?,
                None => return Err("unterminated type argument list"),
            };
            type_arguments.push(argument);
        }
        if type_arguments.is_empty() {
            return Err("empty type argument list");
        }
        Ok(type_arguments)
    }
}

impl Display for TypeReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primitive(it) => it.fmt(f),
            Self::Array(component) => write!(f, "{component}[]"),
            Self::Class(class_type) => class_type.fmt(f),
            Self::TypeVariable(name) => f.write_str(name),
            Self::Wildcard(WildcardBound::Unbounded) => f.write_str("?"),
            Self::Wildcard(WildcardBound::Extends(bound)) => write!(f, "? extends {bound}"),
            Self::Wildcard(WildcardBound::Super(bound)) => write!(f, "? super {bound}"),
        }
    }
}

impl Display for ClassType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.outer {
            Some(outer) => {
                let simple_name = self.name.rsplit('$').next().unwrap_or(&self.name);
                write!(f, "{outer}.{simple_name}")?;
            }
            None => f.write_str(&self.name)?,
        }
        if !self.type_arguments.is_empty() {
            write!(f, "<{}>", self.type_arguments.iter().join(", "))?;
        }
        Ok(())
    }
}

impl Display for ResultType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Type(it) => it.fmt(f),
        }
    }
}

impl Display for TypeParameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if !self.bounds.is_empty() {
            write!(f, " extends {}", self.bounds.iter().join(" & "))?;
        }
        Ok(())
    }
}
