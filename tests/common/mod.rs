//! Writes class files with the layout javac produces, so that tests do not need a JDK.
#![allow(dead_code)]

use std::collections::HashMap;

pub mod flags {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const SYNCHRONIZED: u16 = 0x0020;
    pub const VOLATILE: u16 = 0x0040;
    pub const BRIDGE: u16 = 0x0040;
    pub const TRANSIENT: u16 = 0x0080;
    pub const VARARGS: u16 = 0x0080;
    pub const NATIVE: u16 = 0x0100;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;
    pub const ANNOTATION: u16 = 0x2000;
    pub const ENUM: u16 = 0x4000;
}

/// An attribute ready to be written, including its header.
pub type Attribute = Vec<u8>;
/// An encoded `element_value`.
pub type ElementValue = Vec<u8>;
/// An encoded `annotation`.
pub type Annotation = Vec<u8>;

#[derive(Debug, Hash, PartialEq, Eq)]
enum PoolKey {
    Utf8(String),
    Class(String),
    String(String),
    Integer(i32),
    Long(i64),
    Float(u32),
    Double(u64),
}

#[derive(Debug)]
pub struct ClassFileBuilder {
    major_version: u16,
    pool: Vec<u8>,
    pool_count: u16,
    interned: HashMap<PoolKey, u16>,
    access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Vec<u8>>,
    methods: Vec<Vec<u8>>,
    attributes: Vec<Attribute>,
}

fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend(value.to_be_bytes());
}

fn push_len(buf: &mut Vec<u8>, len: usize) {
    push_u16(buf, u16::try_from(len).expect("Too many entries"));
}

impl ClassFileBuilder {
    /// Starts a class with the given binary name, extending `super_name`.
    /// The `SourceFile` attribute is added as javac does.
    pub fn new(access_flags: u16, name: &str, super_name: Option<&str>) -> Self {
        let mut builder = Self {
            major_version: 65,
            pool: Vec::new(),
            pool_count: 1,
            interned: HashMap::new(),
            access_flags,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        };
        builder.this_class = builder.class(name);
        builder.super_class = super_name.map_or(0, |it| builder.class(it));
        let simple_name = name.rsplit('/').next().unwrap_or(name);
        let source_file = format!("{}.java", simple_name.split('$').next().unwrap_or(simple_name));
        let source_file = builder.utf8(&source_file);
        let source_file = source_file.to_be_bytes().to_vec();
        builder.add_attribute_raw("SourceFile", source_file);
        builder
    }

    pub fn with_version(mut self, major_version: u16) -> Self {
        self.major_version = major_version;
        self
    }

    fn intern(&mut self, key: PoolKey, entry: Vec<u8>, slots: u16) -> u16 {
        if let Some(&index) = self.interned.get(&key) {
            return index;
        }
        let index = self.pool_count;
        self.pool.extend(entry);
        self.pool_count += slots;
        self.interned.insert(key, index);
        index
    }

    pub fn utf8(&mut self, value: &str) -> u16 {
        let mut entry = vec![0x01];
        let bytes = cesu8::to_java_cesu8(value);
        push_len(&mut entry, bytes.len());
        entry.extend(bytes.iter());
        self.intern(PoolKey::Utf8(value.to_owned()), entry, 1)
    }

    pub fn class(&mut self, binary_name: &str) -> u16 {
        let name_index = self.utf8(binary_name);
        let mut entry = vec![0x07];
        push_u16(&mut entry, name_index);
        self.intern(PoolKey::Class(binary_name.to_owned()), entry, 1)
    }

    pub fn string(&mut self, value: &str) -> u16 {
        let string_index = self.utf8(value);
        let mut entry = vec![0x08];
        push_u16(&mut entry, string_index);
        self.intern(PoolKey::String(value.to_owned()), entry, 1)
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        let mut entry = vec![0x03];
        entry.extend(value.to_be_bytes());
        self.intern(PoolKey::Integer(value), entry, 1)
    }

    pub fn float(&mut self, value: f32) -> u16 {
        let mut entry = vec![0x04];
        entry.extend(value.to_be_bytes());
        self.intern(PoolKey::Float(value.to_bits()), entry, 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        let mut entry = vec![0x05];
        entry.extend(value.to_be_bytes());
        self.intern(PoolKey::Long(value), entry, 2)
    }

    pub fn double(&mut self, value: f64) -> u16 {
        let mut entry = vec![0x06];
        entry.extend(value.to_be_bytes());
        self.intern(PoolKey::Double(value.to_bits()), entry, 2)
    }

    pub fn implements(&mut self, interface: &str) -> &mut Self {
        let index = self.class(interface);
        self.interfaces.push(index);
        self
    }

    /// Wraps a payload into an attribute with the given name.
    pub fn attribute(&mut self, name: &str, payload: Vec<u8>) -> Attribute {
        let mut attribute = Vec::new();
        push_u16(&mut attribute, self.utf8(name));
        attribute.extend(u32::try_from(payload.len()).expect("Payload too long").to_be_bytes());
        attribute.extend(payload);
        attribute
    }

    fn add_attribute_raw(&mut self, name: &str, payload: Vec<u8>) {
        let attribute = self.attribute(name, payload);
        self.attributes.push(attribute);
    }

    pub fn class_attribute(&mut self, attribute: Attribute) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    fn member(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attribute>,
    ) -> Vec<u8> {
        let mut member = Vec::new();
        push_u16(&mut member, access_flags);
        push_u16(&mut member, self.utf8(name));
        push_u16(&mut member, self.utf8(descriptor));
        push_len(&mut member, attributes.len());
        for attribute in attributes {
            member.extend(attribute);
        }
        member
    }

    pub fn field(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attribute>,
    ) -> &mut Self {
        let field = self.member(access_flags, name, descriptor, attributes);
        self.fields.push(field);
        self
    }

    pub fn method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Attribute>,
    ) -> &mut Self {
        let method = self.member(access_flags, name, descriptor, attributes);
        self.methods.push(method);
        self
    }

    /// A `Code` attribute whose body is a single `return`.
    pub fn code(&mut self) -> Attribute {
        #[rustfmt::skip]
        let payload = vec![
            0x00, 0x01, // max_stack
            0x00, 0x01, // max_locals
            0x00, 0x00, 0x00, 0x01, 0xB1, // return
            0x00, 0x00, // exception_table_length
            0x00, 0x00, // attributes_count
        ];
        self.attribute("Code", payload)
    }

    pub fn signature(&mut self, signature: &str) -> Attribute {
        let index = self.utf8(signature);
        self.attribute("Signature", index.to_be_bytes().to_vec())
    }

    pub fn constant_value(&mut self, index: u16) -> Attribute {
        self.attribute("ConstantValue", index.to_be_bytes().to_vec())
    }

    pub fn exceptions(&mut self, classes: &[&str]) -> Attribute {
        let mut payload = Vec::new();
        push_len(&mut payload, classes.len());
        for class in classes {
            push_u16(&mut payload, self.class(class));
        }
        self.attribute("Exceptions", payload)
    }

    pub fn synthetic(&mut self) -> Attribute {
        self.attribute("Synthetic", Vec::new())
    }

    pub fn deprecated(&mut self) -> Attribute {
        self.attribute("Deprecated", Vec::new())
    }

    /// An `InnerClasses` attribute with `(inner, outer, simple name, flags)` entries.
    pub fn inner_classes(
        &mut self,
        entries: &[(&str, Option<&str>, Option<&str>, u16)],
    ) -> Attribute {
        let mut payload = Vec::new();
        push_len(&mut payload, entries.len());
        for &(inner, outer, name, access_flags) in entries {
            push_u16(&mut payload, self.class(inner));
            push_u16(&mut payload, outer.map_or(0, |it| self.class(it)));
            push_u16(&mut payload, name.map_or(0, |it| self.utf8(it)));
            push_u16(&mut payload, access_flags);
        }
        self.attribute("InnerClasses", payload)
    }

    pub fn annotation(
        &mut self,
        type_descriptor: &str,
        arguments: Vec<(&str, ElementValue)>,
    ) -> Annotation {
        let mut annotation = Vec::new();
        push_u16(&mut annotation, self.utf8(type_descriptor));
        push_len(&mut annotation, arguments.len());
        for (name, value) in arguments {
            push_u16(&mut annotation, self.utf8(name));
            annotation.extend(value);
        }
        annotation
    }

    /// `RuntimeVisibleAnnotations` or `RuntimeInvisibleAnnotations`.
    pub fn annotations(&mut self, visible: bool, annotations: Vec<Annotation>) -> Attribute {
        let name = if visible {
            "RuntimeVisibleAnnotations"
        } else {
            "RuntimeInvisibleAnnotations"
        };
        let mut payload = Vec::new();
        push_len(&mut payload, annotations.len());
        for annotation in annotations {
            payload.extend(annotation);
        }
        self.attribute(name, payload)
    }

    pub fn parameter_annotations(
        &mut self,
        visible: bool,
        parameters: Vec<Vec<Annotation>>,
    ) -> Attribute {
        let name = if visible {
            "RuntimeVisibleParameterAnnotations"
        } else {
            "RuntimeInvisibleParameterAnnotations"
        };
        let mut payload = vec![u8::try_from(parameters.len()).expect("Too many parameters")];
        for annotations in parameters {
            push_len(&mut payload, annotations.len());
            for annotation in annotations {
                payload.extend(annotation);
            }
        }
        self.attribute(name, payload)
    }

    pub fn annotation_default(&mut self, value: ElementValue) -> Attribute {
        self.attribute("AnnotationDefault", value)
    }

    pub fn const_element(tag: u8, index: u16) -> ElementValue {
        let mut value = vec![tag];
        push_u16(&mut value, index);
        value
    }

    pub fn int_element(&mut self, value: i32) -> ElementValue {
        let index = self.integer(value);
        Self::const_element(b'I', index)
    }

    pub fn string_element(&mut self, value: &str) -> ElementValue {
        let index = self.utf8(value);
        Self::const_element(b's', index)
    }

    pub fn enum_element(&mut self, type_descriptor: &str, constant: &str) -> ElementValue {
        let mut value = vec![b'e'];
        push_u16(&mut value, self.utf8(type_descriptor));
        push_u16(&mut value, self.utf8(constant));
        value
    }

    pub fn class_element(&mut self, return_descriptor: &str) -> ElementValue {
        let index = self.utf8(return_descriptor);
        Self::const_element(b'c', index)
    }

    pub fn annotation_element(annotation: Annotation) -> ElementValue {
        let mut value = vec![b'@'];
        value.extend(annotation);
        value
    }

    pub fn array_element(values: Vec<ElementValue>) -> ElementValue {
        let mut value = vec![b'['];
        push_len(&mut value, values.len());
        for it in values {
            value.extend(it);
        }
        value
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = vec![0xCA, 0xFE, 0xBA, 0xBE];
        push_u16(&mut bytes, 0);
        push_u16(&mut bytes, self.major_version);
        push_u16(&mut bytes, self.pool_count);
        bytes.extend(&self.pool);
        push_u16(&mut bytes, self.access_flags);
        push_u16(&mut bytes, self.this_class);
        push_u16(&mut bytes, self.super_class);
        push_len(&mut bytes, self.interfaces.len());
        for &interface in &self.interfaces {
            push_u16(&mut bytes, interface);
        }
        for table in [&self.fields, &self.methods] {
            push_len(&mut bytes, table.len());
            for member in table {
                bytes.extend(member);
            }
        }
        push_len(&mut bytes, self.attributes.len());
        for attribute in &self.attributes {
            bytes.extend(attribute);
        }
        bytes
    }
}
