use std::{io::Read, str::FromStr};

use crate::{
    decl::Literal,
    errors::{Error, FormatError},
    jvm::{
        annotation::{AnnotationInstance, AnnotationValue, MAX_ELEMENT_VALUE_DEPTH},
        constant_pool::ConstantPool,
    },
    macros::malform,
    types::{
        field_type::{FieldType, PrimitiveType},
        method_descriptor::ReturnType,
        qualified_name,
    },
};

use super::{ClassElement, FromReader, reader_utils::ValueReaderExt};

#[derive(Debug)]
pub(crate) struct RawAnnotation {
    type_index: u16,
    element_value_pairs: Vec<(u16, RawElementValue)>,
}

#[derive(Debug)]
pub(crate) enum RawElementValue {
    ConstValue(u8, u16),
    EnumConstValue {
        type_name_index: u16,
        const_name_index: u16,
    },
    ClassInfo(u16),
    AnnotationValue(RawAnnotation),
    ArrayValue(Vec<RawElementValue>),
}

impl RawAnnotation {
    fn read_nested<R: Read + ?Sized>(reader: &mut R, depth: usize) -> Result<Self, FormatError> {
        let type_index = reader.read_value()?;
        let num_element_value_pairs: u16 = reader.read_value()?;
        let element_value_pairs = (0..num_element_value_pairs)
            .map(|_| {
                let element_name_index = reader.read_value()?;
                let element_value = RawElementValue::read_nested(reader, depth + 1)?;
                Ok((element_name_index, element_value))
            })
            .collect::<Result<_, FormatError>>()?;
        Ok(Self {
            type_index,
            element_value_pairs,
        })
    }
}

impl RawElementValue {
    fn read_nested<R: Read + ?Sized>(reader: &mut R, depth: usize) -> Result<Self, FormatError> {
        if depth > MAX_ELEMENT_VALUE_DEPTH {
            return Err(FormatError::NestingTooDeep);
        }
        let tag: u8 = reader.read_value()?;
        let value = match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => {
                Self::ConstValue(tag, reader.read_value()?)
            }
            b'e' => Self::EnumConstValue {
                type_name_index: reader.read_value()?,
                const_name_index: reader.read_value()?,
            },
            b'c' => Self::ClassInfo(reader.read_value()?),
            b'@' => Self::AnnotationValue(RawAnnotation::read_nested(reader, depth + 1)?),
            b'[' => {
                let num_values: u16 = reader.read_value()?;
                let values = (0..num_values)
                    .map(|_| Self::read_nested(reader, depth + 1))
                    .collect::<Result<_, _>>()?;
                Self::ArrayValue(values)
            }
            unexpected => return Err(FormatError::InvalidElementValueTag(unexpected)),
        };
        Ok(value)
    }
}

impl FromReader for RawAnnotation {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FormatError> {
        Self::read_nested(reader, 0)
    }
}

impl FromReader for RawElementValue {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FormatError> {
        Self::read_nested(reader, 0)
    }
}

impl ClassElement for AnnotationInstance {
    type Raw = RawAnnotation;

    fn from_raw(raw: Self::Raw, constant_pool: &ConstantPool) -> Result<Self, Error> {
        let Self::Raw {
            type_index,
            element_value_pairs,
        } = raw;
        let annotation_type = class_name_of_descriptor(constant_pool.get_str(type_index)?)?;
        let arguments = element_value_pairs
            .into_iter()
            .map(|(name_index, raw_value)| {
                let element_name = constant_pool.get_str(name_index)?;
                let element_value = AnnotationValue::from_raw(raw_value, constant_pool)?;
                Ok((element_name.to_owned(), element_value))
            })
            .collect::<Result<_, Error>>()?;
        Ok(AnnotationInstance {
            annotation_type,
            arguments,
        })
    }
}

impl ClassElement for AnnotationValue {
    type Raw = RawElementValue;

    fn from_raw(raw: Self::Raw, constant_pool: &ConstantPool) -> Result<Self, Error> {
        match raw {
            Self::Raw::ConstValue(b's', const_value_index) => constant_pool
                .get_str(const_value_index)
                .map(ToOwned::to_owned)
                .map(Self::String)
                .map_err(Into::into),
            Self::Raw::ConstValue(tag, const_value_index) => {
                let primitive = PrimitiveType::try_from(char::from(tag))?;
                Literal::resolve(primitive, const_value_index, constant_pool)
                    .map(Self::Primitive)
                    .map_err(Into::into)
            }
            Self::Raw::EnumConstValue {
                type_name_index,
                const_name_index,
            } => {
                let enum_type = class_name_of_descriptor(constant_pool.get_str(type_name_index)?)?;
                let constant_name = constant_pool.get_str(const_name_index)?.to_owned();
                Ok(Self::EnumConstant {
                    enum_type,
                    constant_name,
                })
            }
            Self::Raw::ClassInfo(class_info_index) => {
                let descriptor = constant_pool.get_str(class_info_index)?;
                let return_descriptor = ReturnType::from_str(descriptor)?;
                Ok(Self::ClassLiteral(return_descriptor.into()))
            }
            Self::Raw::AnnotationValue(annotation) => {
                AnnotationInstance::from_raw(annotation, constant_pool).map(Self::Annotation)
            }
            Self::Raw::ArrayValue(values) => values
                .into_iter()
                .map(|raw_value| Self::from_raw(raw_value, constant_pool))
                .collect::<Result<_, _>>()
                .map(Self::Array),
        }
    }
}

/// Annotation and enum types are referenced by field descriptors (`Ljava/lang/Deprecated;`).
fn class_name_of_descriptor(descriptor: &str) -> Result<String, Error> {
    match FieldType::from_str(descriptor)? {
        FieldType::Object(binary_name) => Ok(qualified_name(&binary_name)),
        _ => malform!("Annotation and enum types must be class types"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::Error,
        jvm::{
            annotation::{decode_annotations, decode_element_value, decode_parameter_annotations},
            constant_pool::ConstantPoolError,
        },
        types::signature::{ResultType, TypeReference},
    };

    #[rustfmt::skip]
    const POOL: &[u8] = &[
        0x01, 0x00, 0x16, b'L', b'j', b'a', b'v', b'a', b'/', b'l', b'a', b'n', b'g',
            b'/', b'D', b'e', b'p', b'r', b'e', b'c', b'a', b't', b'e', b'd', b';', // #1
        0x01, 0x00, 0x05, b'v', b'a', b'l', b'u', b'e', // #2 "value"
        0x03, 0x00, 0x00, 0x00, 0x2A, // #3 Integer 42
        0x01, 0x00, 0x05, b'L', b'p', b'/', b'E', b';', // #4 "Lp/E;"
        0x01, 0x00, 0x01, b'A', // #5 "A"
        0x01, 0x00, 0x01, b'V', // #6 "V"
        0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, // #7 Long 1, #8 unusable
        0x01, 0x00, 0x01, b'I', // #9 "I"
    ];

    fn pool() -> ConstantPool {
        ConstantPool::from_reader(&mut &POOL[..], 10).unwrap()
    }

    fn deprecated() -> AnnotationInstance {
        AnnotationInstance {
            annotation_type: "java.lang.Deprecated".to_owned(),
            arguments: vec![],
        }
    }

    #[test]
    fn marker_annotation() {
        let bytes = [0x00, 0x01, 0x00, 0x01, 0x00, 0x00];
        let annotations = decode_annotations(&bytes, &pool()).unwrap();
        assert_eq!(annotations, vec![deprecated()]);
    }

    #[test]
    fn primitive_arguments_are_narrowed() {
        let cp = pool();
        let value = decode_element_value(&[b'B', 0x00, 0x03], &cp).unwrap();
        assert_eq!(value, AnnotationValue::Primitive(Literal::Byte(42)));
        let value = decode_element_value(&[b'Z', 0x00, 0x03], &cp).unwrap();
        assert_eq!(value, AnnotationValue::Primitive(Literal::Boolean(true)));
        let value = decode_element_value(&[b'C', 0x00, 0x03], &cp).unwrap();
        assert_eq!(value, AnnotationValue::Primitive(Literal::Char(42)));
        let value = decode_element_value(&[b'J', 0x00, 0x07], &cp).unwrap();
        assert_eq!(value, AnnotationValue::Primitive(Literal::Long(1)));
    }

    #[test]
    fn mismatched_constant_kind() {
        let result = decode_element_value(&[b'J', 0x00, 0x03], &pool());
        assert!(matches!(
            result,
            Err(Error::MalformedConstantPool(ConstantPoolError::Mismatched { index: 3, .. }))
        ));
    }

    #[test]
    fn enum_and_class_values() {
        let cp = pool();
        let value = decode_element_value(&[b'e', 0x00, 0x04, 0x00, 0x05], &cp).unwrap();
        assert_eq!(
            value,
            AnnotationValue::EnumConstant {
                enum_type: "p.E".to_owned(),
                constant_name: "A".to_owned(),
            }
        );
        let value = decode_element_value(&[b'c', 0x00, 0x06], &cp).unwrap();
        assert_eq!(value, AnnotationValue::ClassLiteral(ResultType::Void));
        let value = decode_element_value(&[b'c', 0x00, 0x04], &cp).unwrap();
        assert_eq!(
            value,
            AnnotationValue::ClassLiteral(ResultType::Type(TypeReference::class("p.E")))
        );
    }

    #[test]
    fn arrays_and_nested_annotations() {
        #[rustfmt::skip]
        let bytes = [
            b'[', 0x00, 0x02,
                b's', 0x00, 0x02,
                b'@', 0x00, 0x01, 0x00, 0x01,
                    0x00, 0x02, b'I', 0x00, 0x03,
        ];
        let value = decode_element_value(&bytes, &pool()).unwrap();
        let nested = AnnotationInstance {
            annotation_type: "java.lang.Deprecated".to_owned(),
            arguments: vec![(
                "value".to_owned(),
                AnnotationValue::Primitive(Literal::Int(42)),
            )],
        };
        assert_eq!(
            value,
            AnnotationValue::Array(vec![
                AnnotationValue::String("value".to_owned()),
                AnnotationValue::Annotation(nested),
            ])
        );
        if let AnnotationValue::Array(values) = &value {
            let AnnotationValue::Annotation(it) = &values[1] else {
                panic!("expected a nested annotation");
            };
            assert_eq!(it.get("value"), Some(&AnnotationValue::Primitive(Literal::Int(42))));
        }
    }

    #[test]
    fn parameter_annotations() {
        let bytes = [0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00];
        let parameters = decode_parameter_annotations(&bytes, &pool()).unwrap();
        assert_eq!(parameters, vec![vec![], vec![deprecated()]]);
    }

    #[test]
    fn invalid_tag() {
        let result = decode_element_value(&[b'X', 0x00, 0x01], &pool());
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::InvalidElementValueTag(b'X')))
        ));
    }

    #[test]
    fn extra_bytes_are_rejected() {
        let bytes = [0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0xFF];
        let result = decode_annotations(&bytes, &pool());
        assert!(matches!(
            result,
            Err(Error::Format(FormatError::AttributeLengthMismatch {
                declared: 7,
                consumed: 6,
                ..
            }))
        ));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let mut bytes = Vec::new();
        for _ in 0..=MAX_ELEMENT_VALUE_DEPTH {
            bytes.extend([b'[', 0x00, 0x01]);
        }
        bytes.extend([b'I', 0x00, 0x03]);
        let result = decode_element_value(&bytes, &pool());
        assert!(matches!(result, Err(Error::Format(FormatError::NestingTooDeep))));
    }

    #[test]
    fn annotation_type_must_be_a_class() {
        let bytes = [0x00, 0x01, 0x00, 0x09, 0x00, 0x00];
        assert!(decode_annotations(&bytes, &pool()).is_err());
    }
}
