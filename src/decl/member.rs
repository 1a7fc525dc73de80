//! Reconstruction of fields, methods and constructors from the member tables.
use std::str::FromStr;

use bitflags::Flags;

use crate::{
    errors::{Error, FormatError},
    jvm::{
        annotation::AnnotationInstance,
        class::{FieldAccessFlags, MemberInfo, MethodAccessFlags},
        constant_pool::ConstantPool,
        parsing::{attribute::resolve_attributes, parse_flags},
    },
    macros::{extract_attributes, malform},
    types::{
        field_type::{FieldType, PrimitiveType},
        method_descriptor::{MethodDescriptor, ReturnType},
        qualified_name,
        signature::{
            MethodSignature, TypeReference, parse_field_signature, parse_method_signature,
        },
    },
};

use super::{
    ConstructorDeclaration, DeclarationKind, EnumConstant, FieldDeclaration, Literal,
    MemberDeclaration, MethodDeclaration, Modifiers, Parameter,
};

const CONSTRUCTOR_NAME: &str = "<init>";
const CLASS_INITIALIZER_NAME: &str = "<clinit>";
const STRING_CLASS: &str = "java/lang/String";

/// What the reconstruction of a member needs to know about the declaring class.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MemberContext<'a> {
    pub(crate) constant_pool: &'a ConstantPool,
    /// The binary name of the declaring class.
    pub(crate) class_name: &'a str,
    pub(crate) kind: DeclarationKind,
    /// The binary name of the enclosing class when the declaring class is an inner
    /// (non-static member) class.
    pub(crate) outer_instance: Option<&'a str>,
}

/// A reconstructed entry of the field table.
#[derive(Debug)]
pub(crate) enum FieldMember {
    Field(FieldDeclaration),
    EnumConstant(EnumConstant),
}

/// Translates access flags to modifiers through a table of corresponding bits.
pub(crate) fn translate_flags<F>(flags: F, table: &[(F, Modifiers)]) -> Modifiers
where
    F: Flags + Copy,
{
    table
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .fold(Modifiers::empty(), |acc, (_, modifier)| acc | *modifier)
}

const FIELD_MODIFIERS: [(FieldAccessFlags, Modifiers); 7] = [
    (FieldAccessFlags::PUBLIC, Modifiers::PUBLIC),
    (FieldAccessFlags::PRIVATE, Modifiers::PRIVATE),
    (FieldAccessFlags::PROTECTED, Modifiers::PROTECTED),
    (FieldAccessFlags::STATIC, Modifiers::STATIC),
    (FieldAccessFlags::FINAL, Modifiers::FINAL),
    (FieldAccessFlags::VOLATILE, Modifiers::VOLATILE),
    (FieldAccessFlags::TRANSIENT, Modifiers::TRANSIENT),
];

const METHOD_MODIFIERS: [(MethodAccessFlags, Modifiers); 9] = [
    (MethodAccessFlags::PUBLIC, Modifiers::PUBLIC),
    (MethodAccessFlags::PRIVATE, Modifiers::PRIVATE),
    (MethodAccessFlags::PROTECTED, Modifiers::PROTECTED),
    (MethodAccessFlags::STATIC, Modifiers::STATIC),
    (MethodAccessFlags::FINAL, Modifiers::FINAL),
    (MethodAccessFlags::SYNCHRONIZED, Modifiers::SYNCHRONIZED),
    (MethodAccessFlags::NATIVE, Modifiers::NATIVE),
    (MethodAccessFlags::ABSTRACT, Modifiers::ABSTRACT),
    (MethodAccessFlags::STRICT, Modifiers::STRICTFP),
];

const ACCESS_MODIFIERS: Modifiers = Modifiers::PUBLIC
    .union(Modifiers::PROTECTED)
    .union(Modifiers::PRIVATE);

fn field_modifiers(flags: FieldAccessFlags, kind: DeclarationKind) -> Modifiers {
    if kind.is_interface() {
        Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL
    } else {
        translate_flags(flags, &FIELD_MODIFIERS)
    }
}

fn method_modifiers(flags: MethodAccessFlags, kind: DeclarationKind) -> Modifiers {
    let mut modifiers = translate_flags(flags, &METHOD_MODIFIERS);
    if kind.is_interface() {
        if !modifiers.contains(Modifiers::PRIVATE) {
            modifiers.insert(Modifiers::PUBLIC);
        }
        if !modifiers.intersects(Modifiers::STATIC | Modifiers::PRIVATE | Modifiers::ABSTRACT) {
            modifiers.insert(Modifiers::DEFAULT);
        }
    }
    modifiers
}

/// Reconstructs an entry of the field table.
/// Returns `None` for fields without a source counterpart.
pub(crate) fn reconstruct_field(
    info: MemberInfo,
    ctx: &MemberContext<'_>,
) -> Result<Option<FieldMember>, Error> {
    let MemberInfo {
        access_flags,
        name_index,
        descriptor_index,
        attributes,
    } = info;
    let constant_pool = ctx.constant_pool;
    let access_flags: FieldAccessFlags = parse_flags(access_flags)?;
    let name = constant_pool.get_str(name_index)?.to_owned();
    let descriptor = FieldType::from_str(constant_pool.get_str(descriptor_index)?)?;
    let attributes = resolve_attributes(attributes, constant_pool)?;
    extract_attributes! {
        for attributes in "field_info" {
            let constant_value: ConstantValue,
            let signature: Signature,
            let visible_annotations: RuntimeVisibleAnnotations as unwrap_or_default,
            let invisible_annotations: RuntimeInvisibleAnnotations as unwrap_or_default,
            if let is_synthetic: Synthetic,
            if let _is_deprecated: Deprecated,
        }
    }

    if is_synthetic || access_flags.contains(FieldAccessFlags::SYNTHETIC) {
        tracing::debug!(class = ctx.class_name, field = %name, "dropping synthetic field");
        return Ok(None);
    }
    let annotations = [visible_annotations, invisible_annotations].concat();

    let is_enum_constant = ctx.kind == DeclarationKind::Enum
        && access_flags.contains(FieldAccessFlags::ENUM)
        && matches!(&descriptor, FieldType::Object(class) if class == ctx.class_name);
    if is_enum_constant {
        return Ok(Some(FieldMember::EnumConstant(EnumConstant { name, annotations })));
    }

    let constant_value = constant_value
        .map(|index| {
            if !access_flags.contains(FieldAccessFlags::FINAL) {
                return Err(Error::from(FormatError::ConstantValueOnNonFinalField(
                    name.clone(),
                )));
            }
            constant_literal(&name, &descriptor, index, constant_pool)
        })
        .transpose()?;
    let field_type = match signature {
        Some(signature) => parse_field_signature(&signature)?,
        None => descriptor.into(),
    };

    Ok(Some(FieldMember::Field(FieldDeclaration {
        name,
        modifiers: field_modifiers(access_flags, ctx.kind),
        field_type,
        constant_value,
        annotations,
    })))
}

/// Decodes the value of a `ConstantValue` attribute, whose kind is determined by the field type.
fn constant_literal(
    field_name: &str,
    field_type: &FieldType,
    index: u16,
    constant_pool: &ConstantPool,
) -> Result<Literal, Error> {
    match field_type {
        &FieldType::Base(primitive) => Ok(Literal::resolve(primitive, index, constant_pool)?),
        FieldType::Object(class) if class == STRING_CLASS => {
            Ok(Literal::String(constant_pool.get_string(index)?.to_owned()))
        }
        _ => Err(FormatError::ConstantValueOnNonConstantType(field_name.to_owned()).into()),
    }
}

/// Reconstructs an entry of the method table as a method or a constructor.
/// Returns `None` for methods without a source counterpart.
pub(crate) fn reconstruct_method(
    info: MemberInfo,
    ctx: &MemberContext<'_>,
) -> Result<Option<MemberDeclaration>, Error> {
    let MemberInfo {
        access_flags,
        name_index,
        descriptor_index,
        attributes,
    } = info;
    let constant_pool = ctx.constant_pool;
    let access_flags: MethodAccessFlags = parse_flags(access_flags)?;
    let name = constant_pool.get_str(name_index)?;
    let raw_descriptor = constant_pool.get_str(descriptor_index)?;
    let descriptor = MethodDescriptor::from_str(raw_descriptor)?;
    let attributes = resolve_attributes(attributes, constant_pool)?;
    extract_attributes! {
        for attributes in "method_info" {
            let signature: Signature,
            let exceptions: Exceptions as unwrap_or_default,
            let visible_annotations: RuntimeVisibleAnnotations as unwrap_or_default,
            let invisible_annotations: RuntimeInvisibleAnnotations as unwrap_or_default,
            let visible_parameter_annotations
                : RuntimeVisibleParameterAnnotations as unwrap_or_default,
            let invisible_parameter_annotations
                : RuntimeInvisibleParameterAnnotations as unwrap_or_default,
            let default_value: AnnotationDefault,
            if let is_synthetic: Synthetic,
            if let _is_deprecated: Deprecated,
        }
    }

    if name == CLASS_INITIALIZER_NAME {
        tracing::debug!(class = ctx.class_name, "dropping static initializer");
        return Ok(None);
    }
    if is_synthetic || access_flags.contains(MethodAccessFlags::SYNTHETIC) {
        tracing::debug!(class = ctx.class_name, method = name, "dropping synthetic method");
        return Ok(None);
    }
    if access_flags.contains(MethodAccessFlags::BRIDGE) {
        tracing::debug!(class = ctx.class_name, method = name, "dropping bridge method");
        return Ok(None);
    }
    if ctx.kind == DeclarationKind::Enum
        && is_enum_helper(name, access_flags, raw_descriptor, ctx)
    {
        tracing::debug!(class = ctx.class_name, method = name, "dropping implicit enum method");
        return Ok(None);
    }
    if default_value.is_some() && ctx.kind != DeclarationKind::AnnotationType {
        return Err(FormatError::UnexpectedAttribute {
            attribute: "AnnotationDefault",
            location: "method_info",
        }
        .into());
    }

    let is_constructor = name == CONSTRUCTOR_NAME;
    if is_constructor {
        if ctx.kind.is_interface() {
            malform!("Interfaces cannot declare constructors");
        }
        if descriptor.return_type != ReturnType::Void {
            malform!("Constructors must return void");
        }
    }

    let MethodSignature {
        type_parameters,
        parameters,
        result,
        throws,
    } = match signature {
        Some(signature) => parse_method_signature(&signature)?,
        None if is_constructor => {
            let mut signature = MethodSignature::from(descriptor);
            let implicit = implicit_constructor_parameters(&signature.parameters, ctx)?;
            signature.parameters.drain(..implicit);
            signature
        }
        None => descriptor.into(),
    };
    let parameters = attach_parameter_annotations(
        parameters,
        visible_parameter_annotations,
        invisible_parameter_annotations,
    )?;
    let is_varargs = access_flags.contains(MethodAccessFlags::VARARGS)
        && parameters
            .last()
            .is_some_and(|it| it.parameter_type.is_array());
    let thrown_types = if throws.is_empty() {
        exceptions
            .iter()
            .map(|it| TypeReference::class(qualified_name(it)))
            .collect()
    } else {
        throws
    };
    let annotations = [visible_annotations, invisible_annotations].concat();

    let member = if is_constructor {
        MemberDeclaration::Constructor(ConstructorDeclaration {
            modifiers: translate_flags(access_flags, &METHOD_MODIFIERS) & ACCESS_MODIFIERS,
            type_parameters,
            parameters,
            is_varargs,
            thrown_types,
            annotations,
        })
    } else {
        MemberDeclaration::Method(MethodDeclaration {
            name: name.to_owned(),
            modifiers: method_modifiers(access_flags, ctx.kind),
            type_parameters,
            parameters,
            result,
            is_varargs,
            thrown_types,
            annotations,
            default_value,
        })
    };
    Ok(Some(member))
}

/// Checks for the `values()` and `valueOf(String)` methods javac generates for enums.
fn is_enum_helper(
    name: &str,
    access_flags: MethodAccessFlags,
    descriptor: &str,
    ctx: &MemberContext<'_>,
) -> bool {
    if !access_flags.contains(MethodAccessFlags::STATIC) {
        return false;
    }
    match name {
        "values" => descriptor == format!("()[L{};", ctx.class_name),
        "valueOf" => descriptor == format!("(L{STRING_CLASS};)L{};", ctx.class_name),
        _ => false,
    }
}

/// Counts the leading parameters of a descriptor-derived constructor that javac adds:
/// the name and ordinal of an enum constant, or the outer instance of an inner class.
fn implicit_constructor_parameters(
    parameters: &[TypeReference],
    ctx: &MemberContext<'_>,
) -> Result<usize, Error> {
    if ctx.kind == DeclarationKind::Enum {
        let string = TypeReference::class(qualified_name(STRING_CLASS));
        let int = TypeReference::Primitive(PrimitiveType::Int);
        if parameters.starts_with(&[string, int]) {
            return Ok(2);
        }
        malform!("Enum constructors must take the name and the ordinal first");
    }
    if let Some(outer) = ctx.outer_instance {
        if parameters.first() == Some(&TypeReference::class(qualified_name(outer))) {
            return Ok(1);
        }
        malform!("Constructors of inner classes must take the outer instance first");
    }
    Ok(0)
}

/// Pairs parameters with their annotations.
/// The annotation tables may list fewer entries than there are parameters, in which case they
/// belong to the trailing parameters. Extra leading tables belong to implicit parameters and
/// must be empty.
fn attach_parameter_annotations(
    parameter_types: Vec<TypeReference>,
    visible: Vec<Vec<AnnotationInstance>>,
    invisible: Vec<Vec<AnnotationInstance>>,
) -> Result<Vec<Parameter>, Error> {
    let mut parameters: Vec<_> = parameter_types.into_iter().map(Parameter::new).collect();
    for tables in [visible, invisible] {
        let count = parameters.len();
        let skipped = tables.len().saturating_sub(count);
        if tables[..skipped].iter().any(|it| !it.is_empty()) {
            malform!("Parameter annotations do not match the parameters");
        }
        let offset = count - (tables.len() - skipped);
        for (parameter, annotations) in parameters[offset..]
            .iter_mut()
            .zip(tables.into_iter().skip(skipped))
        {
            parameter.annotations.extend(annotations);
        }
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(name: &str) -> AnnotationInstance {
        AnnotationInstance {
            annotation_type: name.to_owned(),
            arguments: Vec::new(),
        }
    }

    #[test]
    fn interface_method_modifiers() {
        let kind = DeclarationKind::Interface;
        let abstract_method = MethodAccessFlags::PUBLIC | MethodAccessFlags::ABSTRACT;
        assert_eq!(
            method_modifiers(abstract_method, kind),
            Modifiers::PUBLIC | Modifiers::ABSTRACT
        );
        assert_eq!(
            method_modifiers(MethodAccessFlags::PUBLIC, kind),
            Modifiers::PUBLIC | Modifiers::DEFAULT
        );
        assert_eq!(
            method_modifiers(MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC, kind),
            Modifiers::PUBLIC | Modifiers::STATIC
        );
        assert_eq!(
            method_modifiers(MethodAccessFlags::PRIVATE, kind),
            Modifiers::PRIVATE
        );
    }

    #[test]
    fn non_modifier_bits_are_stripped() {
        let flags = MethodAccessFlags::PUBLIC
            | MethodAccessFlags::VARARGS
            | MethodAccessFlags::BRIDGE
            | MethodAccessFlags::SYNTHETIC;
        assert_eq!(
            method_modifiers(flags, DeclarationKind::Class),
            Modifiers::PUBLIC
        );
        let flags = FieldAccessFlags::PRIVATE | FieldAccessFlags::ENUM | FieldAccessFlags::VOLATILE;
        assert_eq!(
            field_modifiers(flags, DeclarationKind::Class),
            Modifiers::PRIVATE | Modifiers::VOLATILE
        );
    }

    #[test]
    fn interface_fields_are_constants() {
        assert_eq!(
            field_modifiers(FieldAccessFlags::empty(), DeclarationKind::AnnotationType),
            Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL
        );
    }

    #[test]
    fn parameter_annotations_align_to_trailing_parameters() {
        let types = vec![
            TypeReference::Primitive(PrimitiveType::Int),
            TypeReference::Primitive(PrimitiveType::Long),
        ];
        let parameters =
            attach_parameter_annotations(types, vec![vec![annotation("A")]], vec![]).unwrap();
        assert!(parameters[0].annotations.is_empty());
        assert_eq!(parameters[1].annotations, vec![annotation("A")]);
    }

    #[test]
    fn visible_parameter_annotations_come_first() {
        let types = vec![TypeReference::Primitive(PrimitiveType::Int)];
        let parameters = attach_parameter_annotations(
            types,
            vec![vec![annotation("V")]],
            vec![vec![annotation("I")]],
        )
        .unwrap();
        assert_eq!(
            parameters[0].annotations,
            vec![annotation("V"), annotation("I")]
        );
    }

    #[test]
    fn extra_parameter_annotations() {
        let types = vec![TypeReference::Primitive(PrimitiveType::Int)];
        let parameters =
            attach_parameter_annotations(types.clone(), vec![vec![], vec![annotation("A")]], vec![])
                .unwrap();
        assert_eq!(parameters[0].annotations, vec![annotation("A")]);

        let result = attach_parameter_annotations(
            types,
            vec![vec![annotation("A")], vec![]],
            vec![],
        );
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::Malformed(_)))
        ));
    }
}
