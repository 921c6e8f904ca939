//! Decoding of class file bytes into [`ClassFile`].

use super::constpool::{Constant, ConstantPool, tags};
use super::error::{ClassFileError, Result};
use super::{AttributeInfo, ClassFile, MAGIC, MemberInfo};

/// Big-endian cursor over a byte slice.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ClassFileError::UnexpectedEof {
                offset: self.pos,
                wanted: n,
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        let hi = u64::from(self.u32()?);
        let lo = u64::from(self.u32()?);
        Ok((hi << 32) | lo)
    }

    pub(crate) fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(ClassFileError::TrailingBytes(n)),
        }
    }
}

pub(crate) fn read_class(bytes: &[u8]) -> Result<ClassFile> {
    let mut r = ByteReader::new(bytes);

    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    let minor_version = r.u16()?;
    let major_version = r.u16()?;
    let constant_pool = read_constant_pool(&mut r)?;
    let access_flags = r.u16()?;
    let this_class = r.u16()?;
    let super_class = r.u16()?;

    let interface_count = r.u16()?;
    let mut interfaces = Vec::with_capacity(usize::from(interface_count));
    for _ in 0..interface_count {
        interfaces.push(r.u16()?);
    }

    let fields = read_members(&mut r)?;
    let methods = read_members(&mut r)?;
    let attributes = read_attributes(&mut r)?;
    r.finish()?;

    Ok(ClassFile {
        minor_version,
        major_version,
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

fn read_constant_pool(r: &mut ByteReader<'_>) -> Result<ConstantPool> {
    let count = r.u16()?;
    let mut pool = ConstantPool::new();
    let mut index: u32 = 1;
    while index < u32::from(count) {
        let tag = r.u8()?;
        let constant = match tag {
            tags::UTF8 => {
                let len = usize::from(r.u16()?);
                Constant::Utf8(r.take(len)?.to_vec())
            }
            tags::INTEGER => Constant::Integer(r.u32()?),
            tags::FLOAT => Constant::Float(r.u32()?),
            tags::LONG => Constant::Long(r.u64()?),
            tags::DOUBLE => Constant::Double(r.u64()?),
            tags::CLASS => Constant::Class(r.u16()?),
            tags::STRING => Constant::String(r.u16()?),
            tags::FIELDREF => Constant::FieldRef(r.u16()?, r.u16()?),
            tags::METHODREF => Constant::MethodRef(r.u16()?, r.u16()?),
            tags::INTERFACE_METHODREF => Constant::InterfaceMethodRef(r.u16()?, r.u16()?),
            tags::NAME_AND_TYPE => Constant::NameAndType(r.u16()?, r.u16()?),
            tags::METHOD_HANDLE => Constant::MethodHandle(r.u8()?, r.u16()?),
            tags::METHOD_TYPE => Constant::MethodType(r.u16()?),
            tags::DYNAMIC => Constant::Dynamic(r.u16()?, r.u16()?),
            tags::INVOKE_DYNAMIC => Constant::InvokeDynamic(r.u16()?, r.u16()?),
            tags::MODULE => Constant::Module(r.u16()?),
            tags::PACKAGE => Constant::Package(r.u16()?),
            tag => {
                return Err(ClassFileError::UnknownConstantTag {
                    tag,
                    index: index as u16,
                });
            }
        };
        let wide = constant.is_wide();
        pool.constants.push(constant);
        index += 1;
        if wide {
            pool.constants.push(Constant::Unusable);
            index += 1;
        }
    }
    Ok(pool)
}

fn read_members(r: &mut ByteReader<'_>) -> Result<Vec<MemberInfo>> {
    let count = r.u16()?;
    let mut members = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        members.push(MemberInfo {
            access_flags: r.u16()?,
            name_index: r.u16()?,
            descriptor_index: r.u16()?,
            attributes: read_attributes(r)?,
        });
    }
    Ok(members)
}

fn read_attributes(r: &mut ByteReader<'_>) -> Result<Vec<AttributeInfo>> {
    let count = r.u16()?;
    let mut attributes = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let name_index = r.u16()?;
        let len = r.u32()? as usize;
        attributes.push(AttributeInfo {
            name_index,
            info: r.take(len)?.to_vec(),
        });
    }
    Ok(attributes)
}
