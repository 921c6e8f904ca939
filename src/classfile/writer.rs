//! Serialization of [`ClassFile`] back into class file bytes.

use std::io::Write;

use super::constpool::{Constant, ConstantPool, tags};
use super::{AttributeInfo, ClassFile, MAGIC, MemberInfo};

/// An object which can be written into a class file.
pub trait ClassfileWritable {
    fn write_to_classfile<W: Write>(&self, buffer: &mut W) -> std::io::Result<()>;

    fn to_classfile_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to_classfile(&mut buffer);
        buffer
    }
}

impl ClassfileWritable for ClassFile {
    fn write_to_classfile<W: Write>(&self, buffer: &mut W) -> std::io::Result<()> {
        buffer.write_all(&MAGIC.to_be_bytes())?;
        buffer.write_all(&self.minor_version.to_be_bytes())?;
        buffer.write_all(&self.major_version.to_be_bytes())?;

        self.constant_pool.write_to_classfile(buffer)?;

        buffer.write_all(&self.access_flags.to_be_bytes())?;
        buffer.write_all(&self.this_class.to_be_bytes())?;
        buffer.write_all(&self.super_class.to_be_bytes())?;

        buffer.write_all(&(self.interfaces.len() as u16).to_be_bytes())?;
        for interface in &self.interfaces {
            buffer.write_all(&interface.to_be_bytes())?;
        }

        write_members(&self.fields, buffer)?;
        write_members(&self.methods, buffer)?;
        write_attributes(&self.attributes, buffer)
    }
}

impl ClassfileWritable for ConstantPool {
    fn write_to_classfile<W: Write>(&self, buffer: &mut W) -> std::io::Result<()> {
        buffer.write_all(&self.count().to_be_bytes())?;
        for constant in &self.constants {
            constant.write_to_classfile(buffer)?;
        }
        Ok(())
    }
}

impl ClassfileWritable for Constant {
    fn write_to_classfile<W: Write>(&self, buffer: &mut W) -> std::io::Result<()> {
        match self {
            Constant::Utf8(bytes) => {
                buffer.write_all(&[tags::UTF8])?;
                buffer.write_all(&(bytes.len() as u16).to_be_bytes())?;
                buffer.write_all(bytes)?;
            }
            Constant::Integer(bits) => {
                buffer.write_all(&[tags::INTEGER])?;
                buffer.write_all(&bits.to_be_bytes())?;
            }
            Constant::Float(bits) => {
                buffer.write_all(&[tags::FLOAT])?;
                buffer.write_all(&bits.to_be_bytes())?;
            }
            Constant::Long(bits) => {
                buffer.write_all(&[tags::LONG])?;
                buffer.write_all(&bits.to_be_bytes())?;
            }
            Constant::Double(bits) => {
                buffer.write_all(&[tags::DOUBLE])?;
                buffer.write_all(&bits.to_be_bytes())?;
            }
            Constant::Class(name_index) => write_u16_constant(buffer, tags::CLASS, *name_index)?,
            Constant::String(string_index) => {
                write_u16_constant(buffer, tags::STRING, *string_index)?
            }
            Constant::FieldRef(a, b) => write_pair_constant(buffer, tags::FIELDREF, *a, *b)?,
            Constant::MethodRef(a, b) => write_pair_constant(buffer, tags::METHODREF, *a, *b)?,
            Constant::InterfaceMethodRef(a, b) => {
                write_pair_constant(buffer, tags::INTERFACE_METHODREF, *a, *b)?
            }
            Constant::NameAndType(a, b) => {
                write_pair_constant(buffer, tags::NAME_AND_TYPE, *a, *b)?
            }
            Constant::MethodHandle(reference_kind, reference_index) => {
                buffer.write_all(&[tags::METHOD_HANDLE, *reference_kind])?;
                buffer.write_all(&reference_index.to_be_bytes())?;
            }
            Constant::MethodType(descriptor_index) => {
                write_u16_constant(buffer, tags::METHOD_TYPE, *descriptor_index)?
            }
            Constant::Dynamic(a, b) => write_pair_constant(buffer, tags::DYNAMIC, *a, *b)?,
            Constant::InvokeDynamic(a, b) => {
                write_pair_constant(buffer, tags::INVOKE_DYNAMIC, *a, *b)?
            }
            Constant::Module(name_index) => write_u16_constant(buffer, tags::MODULE, *name_index)?,
            Constant::Package(name_index) => {
                write_u16_constant(buffer, tags::PACKAGE, *name_index)?
            }
            Constant::Unusable => {}
        }
        Ok(())
    }
}

fn write_u16_constant<W: Write>(buffer: &mut W, tag: u8, value: u16) -> std::io::Result<()> {
    buffer.write_all(&[tag])?;
    buffer.write_all(&value.to_be_bytes())
}

fn write_pair_constant<W: Write>(buffer: &mut W, tag: u8, a: u16, b: u16) -> std::io::Result<()> {
    buffer.write_all(&[tag])?;
    buffer.write_all(&a.to_be_bytes())?;
    buffer.write_all(&b.to_be_bytes())
}

fn write_members<W: Write>(members: &[MemberInfo], buffer: &mut W) -> std::io::Result<()> {
    buffer.write_all(&(members.len() as u16).to_be_bytes())?;
    for member in members {
        buffer.write_all(&member.access_flags.to_be_bytes())?;
        buffer.write_all(&member.name_index.to_be_bytes())?;
        buffer.write_all(&member.descriptor_index.to_be_bytes())?;
        write_attributes(&member.attributes, buffer)?;
    }
    Ok(())
}

fn write_attributes<W: Write>(attributes: &[AttributeInfo], buffer: &mut W) -> std::io::Result<()> {
    buffer.write_all(&(attributes.len() as u16).to_be_bytes())?;
    for attribute in attributes {
        buffer.write_all(&attribute.name_index.to_be_bytes())?;
        buffer.write_all(&(attribute.info.len() as u32).to_be_bytes())?;
        buffer.write_all(&attribute.info)?;
    }
    Ok(())
}
