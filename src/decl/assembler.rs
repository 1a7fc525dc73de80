//! Composition of a [`DeclarationNode`] from a parsed class file.
use crate::{
    errors::Error,
    jvm::{
        class::{BinaryClass, ClassAccessFlags, InnerClassInfo, NestedClassAccessFlags},
        parsing::{attribute::resolve_attributes, parse_flags},
    },
    macros::{extract_attributes, malform},
    types::{
        qualified_name,
        signature::{ClassSignature, TypeReference, parse_class_signature},
    },
};

use super::{
    DeclarationKind, DeclarationNode, MemberDeclaration, Modifiers,
    member::{FieldMember, MemberContext, reconstruct_field, reconstruct_method, translate_flags},
};

const OBJECT_CLASS: &str = "java/lang/Object";
const ENUM_CLASS: &str = "java/lang/Enum";
const RECORD_CLASS: &str = "java/lang/Record";
const ANNOTATION_INTERFACE: &str = "java.lang.annotation.Annotation";

const CLASS_MODIFIERS: [(ClassAccessFlags, Modifiers); 3] = [
    (ClassAccessFlags::PUBLIC, Modifiers::PUBLIC),
    (ClassAccessFlags::FINAL, Modifiers::FINAL),
    (ClassAccessFlags::ABSTRACT, Modifiers::ABSTRACT),
];

const NESTED_CLASS_MODIFIERS: [(NestedClassAccessFlags, Modifiers); 6] = [
    (NestedClassAccessFlags::PUBLIC, Modifiers::PUBLIC),
    (NestedClassAccessFlags::PRIVATE, Modifiers::PRIVATE),
    (NestedClassAccessFlags::PROTECTED, Modifiers::PROTECTED),
    (NestedClassAccessFlags::STATIC, Modifiers::STATIC),
    (NestedClassAccessFlags::FINAL, Modifiers::FINAL),
    (NestedClassAccessFlags::ABSTRACT, Modifiers::ABSTRACT),
];

/// Assembles the declaration tree of a parsed class file.
pub(crate) fn assemble(class: BinaryClass) -> Result<DeclarationNode, Error> {
    let BinaryClass {
        version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    } = class;
    let access_flags: ClassAccessFlags = parse_flags(access_flags)?;
    if access_flags.contains(ClassAccessFlags::MODULE) {
        return Err(Error::UnsupportedConstruct("module descriptors"));
    }
    let binary_name = constant_pool.get_class_name(this_class)?;
    let super_name = if super_class == 0 {
        if binary_name != OBJECT_CLASS {
            malform!("Only java.lang.Object has no superclass");
        }
        None
    } else {
        Some(constant_pool.get_class_name(super_class)?)
    };
    let interface_names = interfaces
        .into_iter()
        .map(|index| constant_pool.get_class_name(index))
        .collect::<Result<Vec<_>, _>>()?;

    let attributes = resolve_attributes(attributes, &constant_pool)?;
    extract_attributes! {
        for attributes in "class_file" {
            let signature: Signature,
            let inner_classes: InnerClasses as unwrap_or_default,
            let visible_annotations: RuntimeVisibleAnnotations as unwrap_or_default,
            let invisible_annotations: RuntimeInvisibleAnnotations as unwrap_or_default,
            if let is_synthetic: Synthetic,
            if let _is_deprecated: Deprecated,
            if let is_local: EnclosingMethod,
            if let is_record: Record,
            if let is_module: Module,
        }
    }

    if is_module {
        return Err(Error::UnsupportedConstruct("module descriptors"));
    }
    let kind = declaration_kind(access_flags, super_name)?;
    if is_record || super_name == Some(RECORD_CLASS) {
        return Err(Error::UnsupportedConstruct("records"));
    }
    if is_synthetic || access_flags.contains(ClassAccessFlags::SYNTHETIC) {
        return Err(Error::UnsupportedConstruct("synthetic classes"));
    }
    let nesting = inner_classes
        .iter()
        .find(|it| it.inner_class == binary_name);
    let is_anonymous_or_local =
        nesting.is_some_and(|it| it.outer_class.is_none() || it.inner_name.is_none());
    if is_local || is_anonymous_or_local {
        return Err(Error::UnsupportedConstruct("local and anonymous classes"));
    }

    let modifiers = match nesting {
        Some(entry) => translate_flags(entry.access_flags, &NESTED_CLASS_MODIFIERS),
        None => translate_flags(access_flags, &CLASS_MODIFIERS),
    };
    let outer_instance = nesting
        .filter(|it| {
            kind == DeclarationKind::Class
                && !it.access_flags.contains(NestedClassAccessFlags::STATIC)
        })
        .and_then(|it| it.outer_class.as_deref());

    let (type_parameters, superclass, mut interfaces) = match signature {
        Some(signature) => {
            let ClassSignature {
                type_parameters,
                superclass,
                interfaces,
            } = parse_class_signature(&signature)?;
            (type_parameters, Some(superclass), interfaces)
        }
        None => (
            Vec::new(),
            super_name.map(|it| TypeReference::class(qualified_name(it))),
            interface_names
                .iter()
                .map(|it| TypeReference::class(qualified_name(it)))
                .collect(),
        ),
    };
    let superclass = superclass.filter(|it| !is_implied_superclass(it, kind));
    if kind == DeclarationKind::AnnotationType {
        interfaces.retain(|it| it.class_name() != Some(ANNOTATION_INTERFACE));
    }

    let ctx = MemberContext {
        constant_pool: &constant_pool,
        class_name: binary_name,
        kind,
        outer_instance,
    };
    let mut enum_constants = Vec::new();
    let mut members = Vec::with_capacity(fields.len() + methods.len());
    for field in fields {
        match reconstruct_field(field, &ctx)? {
            Some(FieldMember::Field(field)) => members.push(MemberDeclaration::Field(field)),
            Some(FieldMember::EnumConstant(constant)) => enum_constants.push(constant),
            None => {}
        }
    }
    for method in methods {
        members.extend(reconstruct_method(method, &ctx)?);
    }
    if kind == DeclarationKind::Enum {
        if inner_classes.iter().any(is_enum_constant_body) {
            return Err(Error::UnsupportedConstruct("enum constant body classes"));
        }
        // The arguments of each constant live in `<clinit>`, so any constructor taking
        // parameters may be in use.
        let has_constructor_parameters = members.iter().any(|it| {
            matches!(it, MemberDeclaration::Constructor(ctor) if !ctor.parameters.is_empty())
        });
        if !enum_constants.is_empty() && has_constructor_parameters {
            return Err(Error::UnsupportedConstruct(
                "enum constants built with constructor arguments",
            ));
        }
    }

    let nested_types = nested_member_types(&inner_classes, binary_name);
    let name = qualified_name(binary_name);
    tracing::debug!(
        class = %name,
        %kind,
        major_version = version.major(),
        members = members.len(),
        "assembled declaration"
    );
    Ok(DeclarationNode {
        kind,
        name,
        modifiers,
        type_parameters,
        superclass,
        interfaces,
        annotations: [visible_annotations, invisible_annotations].concat(),
        enum_constants,
        members,
        nested_types,
    })
}

fn declaration_kind(
    access_flags: ClassAccessFlags,
    super_name: Option<&str>,
) -> Result<DeclarationKind, Error> {
    let kind = if access_flags.contains(ClassAccessFlags::INTERFACE) {
        if access_flags.contains(ClassAccessFlags::ANNOTATION) {
            DeclarationKind::AnnotationType
        } else {
            DeclarationKind::Interface
        }
    } else if access_flags.contains(ClassAccessFlags::ANNOTATION) {
        malform!("Annotation interfaces must have the interface flag");
    } else if access_flags.contains(ClassAccessFlags::ENUM) {
        if super_name != Some(ENUM_CLASS) {
            return Err(Error::UnsupportedConstruct("enum constant body classes"));
        }
        DeclarationKind::Enum
    } else {
        DeclarationKind::Class
    };
    Ok(kind)
}

fn is_implied_superclass(superclass: &TypeReference, kind: DeclarationKind) -> bool {
    let Some(name) = superclass.class_name() else {
        return false;
    };
    kind.is_interface()
        || name == qualified_name(OBJECT_CLASS)
        || (kind == DeclarationKind::Enum && name == qualified_name(ENUM_CLASS))
}

fn is_enum_constant_body(entry: &InnerClassInfo) -> bool {
    entry.outer_class.is_none()
        && entry.inner_name.is_none()
        && entry.access_flags.contains(NestedClassAccessFlags::ENUM)
}

/// Lists the member types declared directly in `binary_name`.
fn nested_member_types(inner_classes: &[InnerClassInfo], binary_name: &str) -> Vec<String> {
    inner_classes
        .iter()
        .filter(|it| {
            it.outer_class.as_deref() == Some(binary_name)
                && it.inner_name.is_some()
                && !it.access_flags.contains(NestedClassAccessFlags::SYNTHETIC)
        })
        .map(|it| qualified_name(&it.inner_class))
        .collect()
}
