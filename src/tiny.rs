//! Parser for tiny mapping files (v1 and v2), auto-detected from the header.
//!
//! Only class records are kept; member and comment records are skipped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MappingError {
    #[error("mapping file is empty")]
    Empty,

    #[error("unsupported mapping format (header: {0:?})")]
    UnsupportedFormat(String),

    #[error("mapping header declares no namespaces")]
    NoNamespaces,

    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TinyVersion {
    V1,
    V2,
}

/// Raw parse result: namespace names plus one name per namespace per class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TinyFile {
    pub version: TinyVersion,
    pub namespaces: Vec<String>,
    pub classes: Vec<Vec<String>>,
}

pub fn detect_version(header: &str) -> Option<TinyVersion> {
    let mut cols = header.split('\t');
    match cols.next()? {
        "v1" => Some(TinyVersion::V1),
        "tiny" if cols.next() == Some("2") => Some(TinyVersion::V2),
        _ => None,
    }
}

pub fn parse(text: &str) -> Result<TinyFile, MappingError> {
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().ok_or(MappingError::Empty)?;
    let header = header.trim_end_matches('\r');
    let version =
        detect_version(header).ok_or_else(|| MappingError::UnsupportedFormat(header.to_string()))?;

    let namespaces: Vec<String> = match version {
        TinyVersion::V1 => header.split('\t').skip(1),
        TinyVersion::V2 => header.split('\t').skip(3),
    }
    .map(str::to_string)
    .collect();
    if namespaces.is_empty() {
        return Err(MappingError::NoNamespaces);
    }

    let mut file = TinyFile {
        version,
        namespaces,
        classes: Vec::new(),
    };
    match version {
        TinyVersion::V1 => parse_v1_body(lines, &mut file)?,
        TinyVersion::V2 => parse_v2_body(lines, &mut file)?,
    }
    Ok(file)
}

fn parse_v1_body<'a>(
    lines: impl Iterator<Item = (usize, &'a str)>,
    file: &mut TinyFile,
) -> Result<(), MappingError> {
    for (idx, line) in lines {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut cols = line.split('\t');
        match cols.next() {
            Some("CLASS") => {
                let names = class_names(cols, file.namespaces.len(), idx + 1, false)?;
                file.classes.push(names);
            }
            Some("FIELD") | Some("METHOD") => {}
            Some(kind) => {
                return Err(MappingError::Malformed {
                    line: idx + 1,
                    message: format!("unknown record kind {kind:?}"),
                });
            }
            None => {}
        }
    }
    Ok(())
}

fn parse_v2_body<'a>(
    lines: impl Iterator<Item = (usize, &'a str)>,
    file: &mut TinyFile,
) -> Result<(), MappingError> {
    let mut in_header = true;
    let mut escaped = false;

    for (idx, line) in lines {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if let Some(property) = line.strip_prefix('\t') {
            if in_header && property.split('\t').next() == Some("escaped-names") {
                escaped = true;
            }
            // Header properties and indented member/comment records.
            continue;
        }
        in_header = false;

        let mut cols = line.split('\t');
        match cols.next() {
            Some("c") => {
                let names = class_names(cols, file.namespaces.len(), idx + 1, escaped)?;
                file.classes.push(names);
            }
            Some(kind) => {
                return Err(MappingError::Malformed {
                    line: idx + 1,
                    message: format!("unexpected top-level record {kind:?}"),
                });
            }
            None => {}
        }
    }
    Ok(())
}

fn class_names<'a>(
    cols: impl Iterator<Item = &'a str>,
    namespace_count: usize,
    line: usize,
    escaped: bool,
) -> Result<Vec<String>, MappingError> {
    let mut names: Vec<String> = Vec::with_capacity(namespace_count);
    for col in cols {
        let name = if escaped {
            unescape(col).ok_or_else(|| MappingError::Malformed {
                line,
                message: format!("bad escape sequence in {col:?}"),
            })?
        } else {
            col.to_string()
        };
        names.push(name);
    }
    if names.len() > namespace_count {
        return Err(MappingError::Malformed {
            line,
            message: format!(
                "{} names for {namespace_count} namespaces",
                names.len()
            ),
        });
    }
    names.resize(namespace_count, String::new());
    Ok(names)
}

fn unescape(value: &str) -> Option<String> {
    if !value.contains('\\') {
        return Some(value.to_string());
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push(match chars.next()? {
            '\\' => '\\',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            _ => return None,
        });
    }
    Some(out)
}
