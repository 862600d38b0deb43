//! Externally sourced option lists.
//!
//! Some enumerations are too large or too volatile for the ontology, most
//! notably IANA media types. An [`OptionCatalog`] attaches such lists to a
//! property path. For enumerations they extend the vocabulary options; for
//! literal properties they narrow the accepted values to the listed ones.

use std::collections::BTreeMap;
use std::io::Read;

use spdx_ontology::{ClassProperty, PropertyOption};
use tracing::debug;

/// Option lists keyed by property path IRI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionCatalog {
    lists: BTreeMap<String, Vec<PropertyOption>>,
}

impl OptionCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends options for a property path.
    pub fn extend(&mut self, path: impl Into<String>, options: impl IntoIterator<Item = PropertyOption>) {
        self.lists.entry(path.into()).or_default().extend(options);
    }

    /// Options registered for `path`.
    pub fn options(&self, path: &str) -> &[PropertyOption] {
        self.lists.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    /// True if any option is registered for `path`.
    pub fn has_options(&self, path: &str) -> bool {
        !self.options(path).is_empty()
    }

    /// True if `value` is a registered option of `path`.
    pub fn contains(&self, path: &str, value: &str) -> bool {
        self.options(path).iter().any(|o| o.value == value)
    }

    /// Vocabulary options of `cp` followed by the catalog options for its path.
    pub fn options_for<'a>(&'a self, cp: &'a ClassProperty) -> Vec<&'a PropertyOption> {
        cp.options()
            .unwrap_or_default()
            .iter()
            .chain(self.options(&cp.path))
            .collect()
    }

    /// Reads an IANA media type registry CSV (`Name,Template,...`).
    ///
    /// The header row is skipped; each record contributes
    /// `{ label: Name, value: Template }`. Records without a template are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns the CSV reader error for malformed input.
    pub fn read_media_types<R: Read>(reader: R) -> Result<Vec<PropertyOption>, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut options = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let (Some(label), Some(value)) = (record.get(0), record.get(1)) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            options.push(PropertyOption {
                label: label.to_owned(),
                value: value.to_owned(),
            });
        }
        debug!(count = options.len(), "read media types");
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spdx_ontology::{ClassPropertyKind, LiteralType};

    const CSV: &str = "Name,Template,Reference\n\
        json,application/json,[RFC8259]\n\
        vnd.example,,[Vendor]\n\
        xml,application/xml,[RFC7303]\n";

    #[test]
    fn media_type_csv_skips_header_and_blank_templates() {
        let options = OptionCatalog::read_media_types(CSV.as_bytes()).unwrap();
        let values: Vec<&str> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, ["application/json", "application/xml"]);
        assert_eq!(options[0].label, "json");
    }

    #[test]
    fn options_for_merges_vocabulary_and_catalog() {
        let mut catalog = OptionCatalog::new();
        catalog.extend(
            "https://example.org/contentType",
            OptionCatalog::read_media_types(CSV.as_bytes()).unwrap(),
        );
        let cp = ClassProperty {
            parent_class: "https://example.org/Package".into(),
            path: "https://example.org/contentType".into(),
            name: "contentType".into(),
            min_count: None,
            max_count: Some(1),
            kind: ClassPropertyKind::Literal {
                datatype: LiteralType::MediaType,
            },
        };
        assert_eq!(catalog.options_for(&cp).len(), 2);
        assert!(catalog.contains(&cp.path, "application/json"));
        assert!(!catalog.contains(&cp.path, "text/plain"));
        assert!(catalog.options("https://example.org/other").is_empty());
    }
}
