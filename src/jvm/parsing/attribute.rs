use crate::{
    errors::Error,
    jvm::{
        annotation::{
            AnnotationInstance, AnnotationValue, decode_annotations, decode_element_value,
            decode_parameter_annotations,
        },
        class::{AttributeInfo, InnerClassInfo, NestedClassAccessFlags},
        constant_pool::ConstantPool,
    },
    macros::see_jvm_spec,
};

use super::{ClassElement, decode_exactly, parse_flags, reader_utils::ValueReaderExt};

/// A resolved attribute.
/// Only the attributes that contribute to declarations are decoded.
#[doc = see_jvm_spec!(4, 7)]
#[derive(Debug)]
pub(crate) enum Attribute {
    /// The constant pool index of the value; its expected kind depends on the field type.
    ConstantValue(u16),
    Signature(String),
    /// Binary names of the thrown classes.
    Exceptions(Vec<String>),
    InnerClasses(Vec<InnerClassInfo>),
    RuntimeVisibleAnnotations(Vec<AnnotationInstance>),
    RuntimeInvisibleAnnotations(Vec<AnnotationInstance>),
    RuntimeVisibleParameterAnnotations(Vec<Vec<AnnotationInstance>>),
    RuntimeInvisibleParameterAnnotations(Vec<Vec<AnnotationInstance>>),
    AnnotationDefault(AnnotationValue),
    Synthetic,
    Deprecated,
    // Recognized by name only; their presence alone marks a construct.
    EnclosingMethod,
    Record,
    Module,
    Unrecognized(String),
}

impl Attribute {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::ConstantValue(_) => "ConstantValue",
            Self::Signature(_) => "Signature",
            Self::Exceptions(_) => "Exceptions",
            Self::InnerClasses(_) => "InnerClasses",
            Self::RuntimeVisibleAnnotations(_) => "RuntimeVisibleAnnotations",
            Self::RuntimeInvisibleAnnotations(_) => "RuntimeInvisibleAnnotations",
            Self::RuntimeVisibleParameterAnnotations(_) => "RuntimeVisibleParameterAnnotations",
            Self::RuntimeInvisibleParameterAnnotations(_) => "RuntimeInvisibleParameterAnnotations",
            Self::AnnotationDefault(_) => "AnnotationDefault",
            Self::Synthetic => "Synthetic",
            Self::Deprecated => "Deprecated",
            Self::EnclosingMethod => "EnclosingMethod",
            Self::Record => "Record",
            Self::Module => "Module",
            Self::Unrecognized(_) => "Unrecognized",
        }
    }
}

impl ClassElement for Attribute {
    type Raw = AttributeInfo;

    fn from_raw(raw: Self::Raw, constant_pool: &ConstantPool) -> Result<Self, Error> {
        let AttributeInfo { name_index, info } = raw;
        let name = constant_pool.get_str(name_index)?;
        let bytes = info.as_slice();
        let attribute = match name {
            "ConstantValue" => {
                decode_exactly("ConstantValue", bytes, |reader| Ok(reader.read_value::<u16>()?))
                    .map(Self::ConstantValue)
            }
            "Signature" => decode_exactly("Signature", bytes, |reader| {
                let signature_index: u16 = reader.read_value()?;
                Ok(constant_pool.get_str(signature_index)?.to_owned())
            })
            .map(Self::Signature),
            "Exceptions" => decode_exactly("Exceptions", bytes, |reader| {
                let number_of_exceptions: u16 = reader.read_value()?;
                (0..number_of_exceptions)
                    .map(|_| -> Result<String, Error> {
                        let class_index: u16 = reader.read_value()?;
                        Ok(constant_pool.get_class_name(class_index)?.to_owned())
                    })
                    .collect()
            })
            .map(Self::Exceptions),
            "InnerClasses" => decode_exactly("InnerClasses", bytes, |reader| {
                let number_of_classes: u16 = reader.read_value()?;
                (0..number_of_classes)
                    .map(|_| -> Result<InnerClassInfo, Error> {
                        let raw = RawInnerClass {
                            inner_class_info_index: reader.read_value()?,
                            outer_class_info_index: reader.read_value()?,
                            inner_name_index: reader.read_value()?,
                            inner_class_access_flags: reader.read_value()?,
                        };
                        InnerClassInfo::from_raw(raw, constant_pool)
                    })
                    .collect()
            })
            .map(Self::InnerClasses),
            "RuntimeVisibleAnnotations" => {
                decode_annotations(bytes, constant_pool).map(Self::RuntimeVisibleAnnotations)
            }
            "RuntimeInvisibleAnnotations" => {
                decode_annotations(bytes, constant_pool).map(Self::RuntimeInvisibleAnnotations)
            }
            "RuntimeVisibleParameterAnnotations" => {
                decode_parameter_annotations(bytes, constant_pool)
                    .map(Self::RuntimeVisibleParameterAnnotations)
            }
            "RuntimeInvisibleParameterAnnotations" => {
                decode_parameter_annotations(bytes, constant_pool)
                    .map(Self::RuntimeInvisibleParameterAnnotations)
            }
            "AnnotationDefault" => {
                decode_element_value(bytes, constant_pool).map(Self::AnnotationDefault)
            }
            "Synthetic" => decode_exactly("Synthetic", bytes, |_| Ok(Self::Synthetic)),
            "Deprecated" => decode_exactly("Deprecated", bytes, |_| Ok(Self::Deprecated)),
            "EnclosingMethod" => Ok(Self::EnclosingMethod),
            "Record" => Ok(Self::Record),
            "Module" => Ok(Self::Module),
            unrecognized => Ok(Self::Unrecognized(unrecognized.to_owned())),
        }?;
        Ok(attribute)
    }
}

/// Resolves an attribute table.
pub(crate) fn resolve_attributes(
    attributes: Vec<AttributeInfo>,
    constant_pool: &ConstantPool,
) -> Result<Vec<Attribute>, Error> {
    attributes
        .into_iter()
        .map(|it| Attribute::from_raw(it, constant_pool))
        .collect()
}

#[derive(Debug)]
pub(crate) struct RawInnerClass {
    inner_class_info_index: u16,
    outer_class_info_index: u16,
    inner_name_index: u16,
    inner_class_access_flags: u16,
}

impl ClassElement for InnerClassInfo {
    type Raw = RawInnerClass;

    fn from_raw(raw: Self::Raw, constant_pool: &ConstantPool) -> Result<Self, Error> {
        let Self::Raw {
            inner_class_info_index,
            outer_class_info_index,
            inner_name_index,
            inner_class_access_flags,
        } = raw;
        let inner_class = constant_pool
            .get_class_name(inner_class_info_index)?
            .to_owned();
        let outer_class = if outer_class_info_index == 0 {
            None
        } else {
            Some(constant_pool.get_class_name(outer_class_info_index)?.to_owned())
        };
        let inner_name = if inner_name_index == 0 {
            None
        } else {
            Some(constant_pool.get_str(inner_name_index)?.to_owned())
        };
        let access_flags = parse_flags::<NestedClassAccessFlags>(inner_class_access_flags)?;
        Ok(Self {
            inner_class,
            outer_class,
            inner_name,
            access_flags,
        })
    }
}
