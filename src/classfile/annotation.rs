//! `RuntimeVisibleAnnotations` attribute payloads.
//!
//! Only the structure is decoded; every index still points into the owning
//! class file's constant pool.

use super::error::{ClassFileError, Result};
use super::reader::ByteReader;

pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Utf8 index of the field descriptor of the annotation type.
    pub type_index: u16,
    pub elements: Vec<ElementPair>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementPair {
    pub name_index: u16,
    pub value: ElementValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// Tags `B C D F I J S Z s`; `s` points at a Utf8 constant.
    Const { tag: u8, index: u16 },
    Enum { type_name_index: u16, const_name_index: u16 },
    Class(u16),
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    pub const STRING_TAG: u8 = b's';

    /// Utf8 index when this is a string constant.
    pub fn string_index(&self) -> Option<u16> {
        match self {
            ElementValue::Const { tag, index } if *tag == Self::STRING_TAG => Some(*index),
            _ => None,
        }
    }
}

pub fn parse_annotations(info: &[u8]) -> Result<Vec<Annotation>> {
    let mut r = ByteReader::new(info);
    let count = r.u16()?;
    let mut annotations = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        annotations.push(read_annotation(&mut r)?);
    }
    r.finish()?;
    Ok(annotations)
}

pub fn encode_annotations(annotations: &[Annotation]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(annotations.len() as u16).to_be_bytes());
    for annotation in annotations {
        write_annotation(annotation, &mut out);
    }
    out
}

fn read_annotation(r: &mut ByteReader<'_>) -> Result<Annotation> {
    let type_index = r.u16()?;
    let count = r.u16()?;
    let mut elements = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        elements.push(ElementPair {
            name_index: r.u16()?,
            value: read_element_value(r)?,
        });
    }
    Ok(Annotation {
        type_index,
        elements,
    })
}

fn read_element_value(r: &mut ByteReader<'_>) -> Result<ElementValue> {
    let tag = r.u8()?;
    Ok(match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => ElementValue::Const {
            tag,
            index: r.u16()?,
        },
        b'e' => ElementValue::Enum {
            type_name_index: r.u16()?,
            const_name_index: r.u16()?,
        },
        b'c' => ElementValue::Class(r.u16()?),
        b'@' => ElementValue::Annotation(read_annotation(r)?),
        b'[' => {
            let count = r.u16()?;
            let mut values = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                values.push(read_element_value(r)?);
            }
            ElementValue::Array(values)
        }
        other => return Err(ClassFileError::UnknownElementTag(other)),
    })
}

fn write_annotation(annotation: &Annotation, out: &mut Vec<u8>) {
    out.extend_from_slice(&annotation.type_index.to_be_bytes());
    out.extend_from_slice(&(annotation.elements.len() as u16).to_be_bytes());
    for pair in &annotation.elements {
        out.extend_from_slice(&pair.name_index.to_be_bytes());
        write_element_value(&pair.value, out);
    }
}

fn write_element_value(value: &ElementValue, out: &mut Vec<u8>) {
    match value {
        ElementValue::Const { tag, index } => {
            out.push(*tag);
            out.extend_from_slice(&index.to_be_bytes());
        }
        ElementValue::Enum {
            type_name_index,
            const_name_index,
        } => {
            out.push(b'e');
            out.extend_from_slice(&type_name_index.to_be_bytes());
            out.extend_from_slice(&const_name_index.to_be_bytes());
        }
        ElementValue::Class(index) => {
            out.push(b'c');
            out.extend_from_slice(&index.to_be_bytes());
        }
        ElementValue::Annotation(nested) => {
            out.push(b'@');
            write_annotation(nested, out);
        }
        ElementValue::Array(values) => {
            out.push(b'[');
            out.extend_from_slice(&(values.len() as u16).to_be_bytes());
            for v in values {
                write_element_value(v, out);
            }
        }
    }
}
