use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClassFileError>;

#[derive(Debug, Error)]
pub enum ClassFileError {
    #[error("not a class file (magic {0:#010x})")]
    BadMagic(u32),

    #[error("unexpected end of data at offset {offset} (wanted {wanted} more bytes)")]
    UnexpectedEof { offset: usize, wanted: usize },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("constant pool index {0} does not refer to a Utf8 constant")]
    InvalidConstantIndex(u16),

    #[error("malformed modified UTF-8 in constant {0}")]
    InvalidUtf8(u16),

    #[error("string of {0} bytes does not fit in a Utf8 constant")]
    StringTooLong(usize),

    #[error("constant pool is full")]
    ConstantPoolOverflow,

    #[error("unknown annotation element tag {0:#04x}")]
    UnknownElementTag(u8),

    #[error("{0} trailing bytes after class structure")]
    TrailingBytes(usize),
}
