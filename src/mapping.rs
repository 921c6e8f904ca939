//! Class name mapping table and the resolver bound to one source namespace.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use crate::tiny;

pub const TARGET_NAMESPACE: &str = "named";

/// Immutable cross-namespace class table.
#[derive(Debug, Clone)]
pub struct MappingTable {
    namespaces: Vec<String>,
    classes: Vec<Vec<String>>,
    /// Per namespace: name -> row in `classes`.
    index: Vec<HashMap<String, usize>>,
}

impl MappingTable {
    pub fn parse(text: &str) -> Result<Self> {
        let file = tiny::parse(text).context("Failed to parse mapping file")?;
        Ok(Self::from_rows(file.namespaces, file.classes))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read mapping file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid mapping file: {}", path.display()))
    }

    /// Builds the table from one row per class. Rows are padded with empty
    /// names, or truncated, to one name per namespace.
    pub fn from_rows(namespaces: Vec<String>, classes: Vec<Vec<String>>) -> Self {
        let classes: Vec<Vec<String>> = classes
            .into_iter()
            .map(|mut names| {
                names.resize(namespaces.len(), String::new());
                names
            })
            .collect();
        let mut index = vec![HashMap::new(); namespaces.len()];
        for (row, names) in classes.iter().enumerate() {
            for (ns, name) in names.iter().enumerate() {
                if name.is_empty() {
                    continue;
                }
                // First record wins on duplicates.
                index[ns].entry(name.clone()).or_insert(row);
            }
        }
        Self {
            namespaces,
            classes,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn namespace_id(&self, namespace: &str) -> Option<usize> {
        self.namespaces.iter().position(|n| n == namespace)
    }

    /// Raw `named` name for the class called `name` in `namespace`.
    /// May be empty when the mapping leaves the class unnamed.
    pub fn resolve(&self, namespace: &str, name: &str) -> Option<&str> {
        let from = self.namespace_id(namespace)?;
        let to = self.namespace_id(TARGET_NAMESPACE)?;
        self.lookup(from, to, name)
    }

    fn lookup(&self, from: usize, to: usize, name: &str) -> Option<&str> {
        let row = *self.index.get(from)?.get(name)?;
        self.classes[row].get(to).map(String::as_str)
    }

    /// Binds a resolver to `source`, failing if either side is missing.
    pub fn resolver(&self, source: &str) -> Result<ClassResolver<'_>> {
        let from = self.namespace_id(source).with_context(|| {
            format!(
                "Mapping has no {source:?} namespace (found: {})",
                self.namespaces.join(", ")
            )
        })?;
        let to = self.namespace_id(TARGET_NAMESPACE).with_context(|| {
            format!(
                "Mapping has no {TARGET_NAMESPACE:?} namespace (found: {})",
                self.namespaces.join(", ")
            )
        })?;
        Ok(ClassResolver {
            table: self,
            from,
            to,
        })
    }
}

/// Lookups from a fixed source namespace into `named`.
#[derive(Debug, Clone, Copy)]
pub struct ClassResolver<'a> {
    table: &'a MappingTable,
    from: usize,
    to: usize,
}

impl<'a> ClassResolver<'a> {
    /// Target name, or `None` on a miss or an empty target name.
    pub fn resolve(&self, name: &str) -> Option<&'a str> {
        self.table
            .lookup(self.from, self.to, name)
            .filter(|mapped| !mapped.is_empty())
    }

    pub fn source_namespace(&self) -> &'a str {
        &self.table.namespaces[self.from]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MappingTable {
        MappingTable::parse(
            "tiny\t2\t0\tofficial\tintermediary\tnamed\n\
             c\ta\tnet/minecraft/class_1\tnamed/Foo\n\
             c\tb\tnet/minecraft/class_2\t\n\
             c\tc\tnet/minecraft/class_1\tnamed/Shadowed\n",
        )
        .unwrap()
    }

    #[test]
    fn resolve_by_namespace() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.resolve("intermediary", "net/minecraft/class_1"),
            Some("named/Foo")
        );
        assert_eq!(table.resolve("official", "a"), Some("named/Foo"));
        assert_eq!(table.resolve("intermediary", "net/minecraft/class_9"), None);
        assert_eq!(table.resolve("hashed", "a"), None);
    }

    #[test]
    fn resolver_treats_empty_names_as_misses() {
        let table = table();
        let resolver = table.resolver("intermediary").unwrap();
        assert_eq!(table.resolve("intermediary", "net/minecraft/class_2"), Some(""));
        assert_eq!(resolver.resolve("net/minecraft/class_2"), None);
        assert_eq!(resolver.source_namespace(), "intermediary");
    }

    #[test]
    fn resolver_requires_both_namespaces() {
        let table = table();
        assert!(table.resolver("hashed").is_err());

        let unnamed = MappingTable::from_rows(
            vec!["official".into(), "intermediary".into()],
            vec![vec!["a".into(), "net/minecraft/class_1".into()]],
        );
        assert!(unnamed.resolver("intermediary").is_err());
    }

    #[test]
    fn from_rows_fits_rows_to_namespaces() {
        let table = MappingTable::from_rows(
            vec!["intermediary".into(), "named".into()],
            vec![
                vec![
                    "net/minecraft/class_1".into(),
                    "named/Foo".into(),
                    "extra/Column".into(),
                ],
                vec!["net/minecraft/class_2".into()],
            ],
        );
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.resolve("intermediary", "net/minecraft/class_1"),
            Some("named/Foo")
        );
        assert_eq!(table.resolve("intermediary", "net/minecraft/class_2"), Some(""));
        assert_eq!(table.resolve("named", "extra/Column"), None);
    }
}
