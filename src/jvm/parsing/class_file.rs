use std::io::Read;

use crate::{
    errors::FormatError,
    jvm::{
        class::{AttributeInfo, BinaryClass, MemberInfo, Version},
        constant_pool::ConstantPool,
    },
};

use super::{
    FromReader,
    reader_utils::{ValueReaderExt, read_byte_chunk},
};

const JAVA_CLASS_MAGIC: u32 = 0xCAFE_BABE;

impl BinaryClass {
    /// Parses a class file from its bytes.
    /// The whole buffer must be consumed by the class file structure.
    /// # Errors
    /// See [`FormatError`] for more information.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut reader = bytes;
        let class = Self::from_reader(&mut reader)?;
        if reader.is_empty() {
            Ok(class)
        } else {
            Err(FormatError::TrailingBytes(reader.len()))
        }
    }
}

impl FromReader for BinaryClass {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FormatError> {
        let magic: u32 = reader.read_value()?;
        if magic != JAVA_CLASS_MAGIC {
            return Err(FormatError::NotAClassFile);
        }
        let minor_version = reader.read_value()?;
        let major_version = reader.read_value()?;
        let version = Version::new(major_version, minor_version)?;
        let constant_pool_count = reader.read_value()?;
        let constant_pool = ConstantPool::from_reader(reader, constant_pool_count)?;
        let access_flags = reader.read_value()?;
        let this_class = reader.read_value()?;
        let super_class = reader.read_value()?;
        let interfaces_count: u16 = reader.read_value()?;
        let interfaces = (0..interfaces_count)
            .map(|_| reader.read_value())
            .collect::<std::io::Result<_>>()?;
        let fields_count: u16 = reader.read_value()?;
        let fields = (0..fields_count)
            .map(|_| MemberInfo::from_reader(reader))
            .collect::<Result<_, _>>()?;
        let methods_count: u16 = reader.read_value()?;
        let methods = (0..methods_count)
            .map(|_| MemberInfo::from_reader(reader))
            .collect::<Result<_, _>>()?;
        let attributes = read_attribute_table(reader)?;

        Ok(Self {
            version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }
}

impl FromReader for MemberInfo {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FormatError> {
        let access_flags = reader.read_value()?;
        let name_index = reader.read_value()?;
        let descriptor_index = reader.read_value()?;
        let attributes = read_attribute_table(reader)?;
        Ok(Self {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }
}

impl FromReader for AttributeInfo {
    fn from_reader<R: Read + ?Sized>(reader: &mut R) -> Result<Self, FormatError> {
        let name_index = reader.read_value()?;
        let attribute_length: u32 = reader.read_value()?;
        let attribute_length = usize::try_from(attribute_length)
            .map_err(|_| FormatError::Malformed("Attribute length exceeds the address space"))?;
        let info = read_byte_chunk(reader, attribute_length)?;
        Ok(Self { name_index, info })
    }
}

fn read_attribute_table<R: Read + ?Sized>(
    reader: &mut R,
) -> Result<Vec<AttributeInfo>, FormatError> {
    let attributes_count: u16 = reader.read_value()?;
    (0..attributes_count)
        .map(|_| AttributeInfo::from_reader(reader))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::empty_class_with_version;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn truncated_input_is_rejected(len in 0usize..62) {
            let bytes = empty_class_with_version(65, 0);
            let result = BinaryClass::parse(&bytes[..len]);
            prop_assert!(matches!(result, Err(FormatError::Truncated(_))), "{:?}", result);
        }

        #[test]
        fn trailing_bytes_are_rejected(tail in prop::collection::vec(any::<u8>(), 1..16)) {
            let mut bytes = empty_class_with_version(65, 0).to_vec();
            bytes.extend(&tail);
            let result = BinaryClass::parse(&bytes);
            prop_assert!(matches!(result, Err(FormatError::TrailingBytes(n)) if n == tail.len()));
        }
    }

    #[test]
    fn parse_empty_class() {
        let bytes = empty_class_with_version(65, 0);
        let class = BinaryClass::parse(&bytes).unwrap();
        assert_eq!(class.version.major(), 65);
        assert_eq!(class.constant_pool.count(), 5);
        assert_eq!(class.constant_pool.get_class_name(class.this_class), Ok("HelloWorld"));
        assert_eq!(class.constant_pool.get_class_name(class.super_class), Ok("java/lang/Object"));
        assert_eq!(class.access_flags, 0x0021);
        assert!(class.interfaces.is_empty());
        assert!(class.fields.is_empty());
        assert!(class.methods.is_empty());
        assert!(class.attributes.is_empty());
    }

    #[test]
    fn not_a_class_file() {
        let mut bytes = empty_class_with_version(65, 0);
        bytes[0] = 0xCB;
        assert!(matches!(
            BinaryClass::parse(&bytes),
            Err(FormatError::NotAClassFile)
        ));
    }

    #[test]
    fn unsupported_version() {
        let bytes = empty_class_with_version(44, 0);
        assert!(matches!(
            BinaryClass::parse(&bytes),
            Err(FormatError::UnsupportedVersion {
                major: 44,
                minor: 0
            })
        ));
    }

    #[test]
    fn attribute_shorter_than_declared_length() {
        let mut bytes = empty_class_with_version(65, 0).to_vec();
        // attributes_count = 1, name #2, length 8, but only 2 bytes follow
        let len = bytes.len();
        bytes[len - 2..].copy_from_slice(&[0x00, 0x01]);
        bytes.extend([0x00, 0x02, 0x00, 0x00, 0x00, 0x08, 0xAB, 0xCD]);
        assert!(matches!(
            BinaryClass::parse(&bytes),
            Err(FormatError::Truncated(_))
        ));
    }

    #[test]
    fn raw_attribute_payload_is_kept() {
        let mut bytes = empty_class_with_version(65, 0).to_vec();
        let len = bytes.len();
        bytes[len - 2..].copy_from_slice(&[0x00, 0x01]);
        bytes.extend([0x00, 0x02, 0x00, 0x00, 0x00, 0x02, 0xAB, 0xCD]);
        let class = BinaryClass::parse(&bytes).unwrap();
        assert_eq!(class.attributes.len(), 1);
        assert_eq!(class.attributes[0].name_index, 2);
        assert_eq!(class.attributes[0].info, vec![0xAB, 0xCD]);
    }
}
