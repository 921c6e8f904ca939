//! Structural class file codec.
//!
//! Decodes the full class layout (constant pool, members, attributes) and
//! writes it back. Attribute payloads stay opaque bytes except for the
//! annotation attributes, which [`annotation`] can decode on demand.

pub mod annotation;
mod constpool;
mod error;
pub mod mutf8;
mod reader;
mod writer;

pub use constpool::{Constant, ConstantPool};
pub use error::{ClassFileError, Result};
pub use writer::ClassfileWritable;

pub const MAGIC: u32 = 0xCAFE_BABE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        reader::read_class(bytes)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_classfile_bytes()
    }

    /// Position of the first class-level attribute called `name`.
    pub fn find_attribute(&self, name: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| self.constant_pool.utf8_eq(a.name_index, name))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_then_write_is_bit_identical() {
        let bytes = fixtures::metadata_class("a/B", &["net/minecraft/class_1;", "\0x"]).to_bytes();
        let parsed = ClassFile::parse(&bytes).unwrap();
        assert_eq!(parsed.to_bytes(), bytes);
        assert_eq!(
            fixtures::detail_strings(&bytes).unwrap(),
            vec!["net/minecraft/class_1;".to_string(), "\0x".to_string()]
        );
    }

    #[test]
    fn rejects_non_class_input() {
        assert!(matches!(
            ClassFile::parse(b"PK\x03\x04rest"),
            Err(ClassFileError::BadMagic(0x504B_0304))
        ));
        let bytes = fixtures::plain_class("a/B").to_bytes();
        assert!(matches!(
            ClassFile::parse(&bytes[..bytes.len() - 1]),
            Err(ClassFileError::UnexpectedEof { .. })
        ));
        let mut padded = bytes.clone();
        padded.push(0);
        assert!(matches!(
            ClassFile::parse(&padded),
            Err(ClassFileError::TrailingBytes(1))
        ));
    }

    #[test]
    fn find_attribute_matches_by_name() {
        let class = fixtures::metadata_class("a/B", &[]);
        assert_eq!(
            class.find_attribute(annotation::RUNTIME_VISIBLE_ANNOTATIONS),
            Some(0)
        );
        assert_eq!(class.find_attribute("SourceFile"), None);
    }
}
