//! Rewrites the detail strings of a class's metadata annotation.

use anyhow::Result;
use tracing::trace;

use crate::classfile::ClassFile;
use crate::classfile::annotation::{
    ElementValue, RUNTIME_VISIBLE_ANNOTATIONS, encode_annotations, parse_annotations,
};
use crate::metadata::MetadataRemapper;

/// Descriptor of the compiler-emitted metadata annotation.
pub const METADATA_DESCRIPTOR: &str = "Lkotlin/Metadata;";

/// Key of the detail strings array inside the metadata annotation.
pub const DETAIL_STRINGS_KEY: &str = "d2";

/// Returns the re-encoded class when at least one detail string changed,
/// `None` when the bytes should be kept as they are.
pub fn rewrite_class(bytes: &[u8], remapper: &MetadataRemapper<'_>) -> Result<Option<Vec<u8>>> {
    let mut class = ClassFile::parse(bytes)?;

    let Some(attr) = class.find_attribute(RUNTIME_VISIBLE_ANNOTATIONS) else {
        return Ok(None);
    };
    let mut annotations = parse_annotations(&class.attributes[attr].info)?;

    let pool = &class.constant_pool;
    let Some(metadata) = annotations
        .iter_mut()
        .find(|a| pool.utf8_eq(a.type_index, METADATA_DESCRIPTOR))
    else {
        return Ok(None);
    };
    let Some(pair) = metadata
        .elements
        .iter_mut()
        .find(|p| pool.utf8_eq(p.name_index, DETAIL_STRINGS_KEY))
    else {
        return Ok(None);
    };
    let ElementValue::Array(values) = &mut pair.value else {
        trace!("metadata {DETAIL_STRINGS_KEY} is not an array");
        return Ok(None);
    };

    let mut originals = Vec::with_capacity(values.len());
    for value in values.iter() {
        let decoded = value
            .string_index()
            .and_then(|index| pool.utf8(index).ok());
        match decoded {
            Some(s) => originals.push(s.into_owned()),
            None => {
                trace!("metadata {DETAIL_STRINGS_KEY} holds a non-string element");
                return Ok(None);
            }
        }
    }

    let remapped: Vec<String> = originals.iter().map(|s| remapper.remap(s)).collect();
    if remapped == originals {
        return Ok(None);
    }

    for ((value, old), new) in values.iter_mut().zip(&originals).zip(&remapped) {
        if old != new {
            let index = class.constant_pool.find_or_add_utf8(new)?;
            *value = ElementValue::Const {
                tag: ElementValue::STRING_TAG,
                index,
            };
        }
    }
    class.attributes[attr].info = encode_annotations(&annotations);

    Ok(Some(class.to_bytes()))
}
