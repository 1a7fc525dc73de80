//! Annotations and the decoding of annotation attributes.
use crate::{
    decl::Literal,
    errors::Error,
    macros::see_jvm_spec,
    types::signature::ResultType,
};

use super::{
    constant_pool::ConstantPool,
    parsing::{
        ClassElement, FromReader,
        annotation::{RawAnnotation, RawElementValue},
        decode_exactly,
        reader_utils::ValueReaderExt,
    },
};

/// The maximum nesting depth of element values.
pub const MAX_ELEMENT_VALUE_DEPTH: usize = 256;

/// An annotation on a class, a member, or a parameter.
#[doc = see_jvm_spec!(4, 7, 16)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationInstance {
    /// The qualified name of the annotation type.
    pub annotation_type: String,
    /// The arguments in the order they appear in the class file.
    pub arguments: Vec<(String, AnnotationValue)>,
}

impl AnnotationInstance {
    /// Gets the value of the argument with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AnnotationValue> {
        self.arguments
            .iter()
            .find_map(|(arg_name, value)| (arg_name == name).then_some(value))
    }
}

/// The value of an annotation argument, or the default value of an annotation type element.
#[doc = see_jvm_spec!(4, 7, 16, 1)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    /// A primitive constant.
    Primitive(Literal),
    /// A string constant.
    String(String),
    /// An enum constant.
    EnumConstant {
        /// The qualified name of the enum type.
        enum_type: String,
        /// The name of the constant.
        constant_name: String,
    },
    /// A class literal, such as `String.class` or `void.class`.
    ClassLiteral(ResultType),
    /// A nested annotation.
    Annotation(AnnotationInstance),
    /// An array of values.
    Array(Vec<AnnotationValue>),
}

/// Decodes the payload of a `RuntimeVisibleAnnotations` or `RuntimeInvisibleAnnotations`
/// attribute.
/// # Errors
/// - [`Error::Format`] if the payload is malformed or not consumed completely.
/// - [`Error::MalformedConstantPool`] if an index does not resolve to the expected entry.
pub fn decode_annotations(
    bytes: &[u8],
    constant_pool: &ConstantPool,
) -> Result<Vec<AnnotationInstance>, Error> {
    decode_exactly("annotations", bytes, |reader| {
        read_annotation_table(reader, constant_pool)
    })
}

/// Decodes the payload of a `RuntimeVisibleParameterAnnotations` or
/// `RuntimeInvisibleParameterAnnotations` attribute, one table per parameter.
/// # Errors
/// See [`decode_annotations`].
pub fn decode_parameter_annotations(
    bytes: &[u8],
    constant_pool: &ConstantPool,
) -> Result<Vec<Vec<AnnotationInstance>>, Error> {
    decode_exactly("parameter annotations", bytes, |reader| {
        let num_parameters: u8 = reader.read_value()?;
        (0..num_parameters)
            .map(|_| read_annotation_table(reader, constant_pool))
            .collect()
    })
}

/// Decodes a single element value, such as the payload of an `AnnotationDefault` attribute.
/// # Errors
/// See [`decode_annotations`].
pub fn decode_element_value(
    bytes: &[u8],
    constant_pool: &ConstantPool,
) -> Result<AnnotationValue, Error> {
    decode_exactly("element value", bytes, |reader| {
        let raw = RawElementValue::from_reader(reader)?;
        AnnotationValue::from_raw(raw, constant_pool)
    })
}

fn read_annotation_table(
    reader: &mut &[u8],
    constant_pool: &ConstantPool,
) -> Result<Vec<AnnotationInstance>, Error> {
    let num_annotations: u16 = reader.read_value()?;
    (0..num_annotations)
        .map(|_| {
            let raw = RawAnnotation::from_reader(reader)?;
            AnnotationInstance::from_raw(raw, constant_pool)
        })
        .collect()
}
