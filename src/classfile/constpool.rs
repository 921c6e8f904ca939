//! Constant pool of a decoded class file.

use std::borrow::Cow;

use super::error::{ClassFileError, Result};
use super::mutf8;

pub(crate) mod tags {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

/// One constant pool slot.
///
/// Utf8 constants keep their raw modified UTF-8 bytes so that constants this
/// crate never touches are written back bit-identically. Numeric constants are
/// kept as raw bits for the same reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Utf8(Vec<u8>),
    Integer(u32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
    /// Second slot of a Long or Double.
    Unusable,
}

impl Constant {
    /// Long and Double take up two pool indices.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstantPool {
    /// Slot `i` holds pool index `i + 1`.
    pub(crate) constants: Vec<Constant>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `constant_pool_count` in the class file.
    pub fn count(&self) -> u16 {
        (self.constants.len() + 1) as u16
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        usize::from(index)
            .checked_sub(1)
            .and_then(|slot| self.constants.get(slot))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.constants
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c, Constant::Unusable))
            .map(|(slot, c)| ((slot + 1) as u16, c))
    }

    pub fn utf8_bytes(&self, index: u16) -> Result<&[u8]> {
        match self.get(index) {
            Some(Constant::Utf8(bytes)) => Ok(bytes),
            _ => Err(ClassFileError::InvalidConstantIndex(index)),
        }
    }

    pub fn utf8(&self, index: u16) -> Result<Cow<'_, str>> {
        let bytes = self.utf8_bytes(index)?;
        if bytes.iter().all(|b| (0x01..0x80).contains(b)) {
            // Plain ASCII is identical in both encodings.
            return Ok(Cow::Borrowed(
                std::str::from_utf8(bytes).map_err(|_| ClassFileError::InvalidUtf8(index))?,
            ));
        }
        mutf8::decode(bytes)
            .map(Cow::Owned)
            .ok_or(ClassFileError::InvalidUtf8(index))
    }

    /// Whether `index` names a Utf8 constant equal to `expected`.
    pub fn utf8_eq(&self, index: u16, expected: &str) -> bool {
        self.utf8(index).is_ok_and(|value| value == expected)
    }

    /// Appends `constant`, returning its pool index.
    pub fn push(&mut self, constant: Constant) -> Result<u16> {
        let wide = constant.is_wide();
        let needed = if wide { 2 } else { 1 };
        if self.constants.len() + needed > usize::from(u16::MAX) - 1 {
            return Err(ClassFileError::ConstantPoolOverflow);
        }
        self.constants.push(constant);
        let index = self.constants.len() as u16;
        if wide {
            self.constants.push(Constant::Unusable);
        }
        Ok(index)
    }

    /// Index of a Utf8 constant holding `value`, appending one if none exists.
    pub fn find_or_add_utf8(&mut self, value: &str) -> Result<u16> {
        let encoded = mutf8::encode(value);
        if encoded.len() > usize::from(u16::MAX) {
            return Err(ClassFileError::StringTooLong(encoded.len()));
        }
        let existing = self.iter().find_map(|(index, c)| match c {
            Constant::Utf8(bytes) if *bytes == encoded => Some(index),
            _ => None,
        });
        match existing {
            Some(index) => Ok(index),
            None => self.push(Constant::Utf8(encoded)),
        }
    }
}
