//! Rewriting of class references inside metadata detail strings.
//!
//! A reference starts at the mode's sentinel (`net/minecraft/class_` or
//! `net/minecraft/unmapped/C_`) and runs up to the next `;`, or to the end of
//! the string when no `;` follows. References the resolver cannot map are
//! left exactly as they were.

use crate::config::{NamespaceMode, ReplaceStrategy};
use crate::mapping::ClassResolver;

pub const REFERENCE_TERMINATOR: char = ';';

/// Spliced into unresolved references by the legacy strategy so the sentinel
/// no longer matches them; stripped before returning.
pub const LEGACY_MARKER: char = '\0';

#[derive(Debug, Clone)]
pub struct MetadataRemapper<'a> {
    resolver: ClassResolver<'a>,
    sentinel: String,
    strategy: ReplaceStrategy,
}

/// One class reference found in a detail string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpan<'s> {
    pub start: usize,
    pub end: usize,
    pub name: &'s str,
}

impl<'a> MetadataRemapper<'a> {
    pub fn new(resolver: ClassResolver<'a>, mode: NamespaceMode, strategy: ReplaceStrategy) -> Self {
        Self {
            resolver,
            sentinel: mode.sentinel(),
            strategy,
        }
    }

    pub fn remap(&self, detail: &str) -> String {
        match self.strategy {
            ReplaceStrategy::Spans => self.remap_spans(detail),
            ReplaceStrategy::Legacy => self.remap_legacy(detail),
        }
    }

    /// All sentinel-started references, in order, non-overlapping.
    pub fn references<'s>(&self, detail: &'s str) -> Vec<ReferenceSpan<'s>> {
        let mut spans = Vec::new();
        let mut cursor = 0;
        while let Some(offset) = detail[cursor..].find(&self.sentinel) {
            let start = cursor + offset;
            let end = detail[start..]
                .find(REFERENCE_TERMINATOR)
                .map_or(detail.len(), |i| start + i);
            spans.push(ReferenceSpan {
                start,
                end,
                name: &detail[start..end],
            });
            cursor = end;
        }
        spans
    }

    fn lookup(&self, name: &str) -> Option<&'a str> {
        // A target that would match again is not a usable mapping.
        self.resolver
            .resolve(name)
            .filter(|mapped| !mapped.contains(&self.sentinel))
    }

    fn remap_spans(&self, detail: &str) -> String {
        let spans = self.references(detail);
        if spans.is_empty() {
            return detail.to_string();
        }

        let mut out = String::with_capacity(detail.len());
        let mut last = 0;
        for span in spans {
            out.push_str(&detail[last..span.start]);
            out.push_str(self.lookup(span.name).unwrap_or(span.name));
            last = span.end;
        }
        out.push_str(&detail[last..]);
        out
    }

    fn remap_legacy(&self, detail: &str) -> String {
        let mut current = detail.to_string();
        while let Some(start) = current.find(&self.sentinel) {
            let end = current[start..]
                .find(REFERENCE_TERMINATOR)
                .map_or(current.len(), |i| start + i);
            let unmapped = current[start..end].to_string();
            let mapped = match self.lookup(&unmapped) {
                Some(mapped) => mapped.to_string(),
                None => mark_unresolved(&unmapped),
            };
            current = current.replace(&unmapped, &mapped);
        }
        current.replace(LEGACY_MARKER, "")
    }
}

/// `net` -> `ne\0t` everywhere in `name`, breaking the sentinel match.
fn mark_unresolved(name: &str) -> String {
    name.replace("net", &format!("ne{LEGACY_MARKER}t"))
}
