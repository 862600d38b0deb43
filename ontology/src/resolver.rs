//! Inheritance and constraint resolution.
//!
//! [`Resolver::recursive_properties`] walks `subClassOf` from a class to the
//! root and returns each class's *own* property set, most specific first.
//! Results are memoized per class IRI until the model is replaced.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::ResolveError;
use crate::model::{ClassProperty, Model};

/// The properties declared directly on one class of an inheritance chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPropertySet {
    /// IRI of the declaring class.
    pub class_iri: String,
    /// Name of the declaring class.
    pub class_name: String,
    /// Properties keyed by name.
    pub properties: BTreeMap<String, Arc<ClassProperty>>,
}

/// Own and inherited property sets of a class, ordered child to root.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecursiveProperties {
    sets: Vec<ClassPropertySet>,
}

impl RecursiveProperties {
    /// Iterates the per-class sets, most specific first.
    pub fn iter(&self) -> std::slice::Iter<'_, ClassPropertySet> {
        self.sets.iter()
    }

    /// Number of classes on the chain.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// True for an empty chain.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The set declared by `class_iri`.
    pub fn get(&self, class_iri: &str) -> Option<&ClassPropertySet> {
        self.sets.iter().find(|s| s.class_iri == class_iri)
    }

    /// True if `class_iri` is on the chain.
    pub fn contains_class(&self, class_iri: &str) -> bool {
        self.get(class_iri).is_some()
    }

    /// Class IRIs from the class itself up to the root.
    pub fn class_iris(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|s| s.class_iri.as_str())
    }

    /// Every class property of the chain, nearest declaration first.
    pub fn properties(&self) -> impl Iterator<Item = &Arc<ClassProperty>> {
        self.sets.iter().flat_map(|s| s.properties.values())
    }

    /// The nearest declaration of the property with IRI `path`.
    pub fn find_by_path(&self, path: &str) -> Option<&Arc<ClassProperty>> {
        self.properties().find(|cp| cp.path == path)
    }

    /// Class properties with `minCount >= 1`.
    pub fn required(&self) -> impl Iterator<Item = &Arc<ClassProperty>> {
        self.properties().filter(|cp| cp.is_required())
    }
}

impl<'a> IntoIterator for &'a RecursiveProperties {
    type Item = &'a ClassPropertySet;
    type IntoIter = std::slice::Iter<'a, ClassPropertySet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}

/// Memoizing inheritance resolver over a compiled [`Model`].
#[derive(Debug, Clone)]
pub struct Resolver {
    model: Arc<Model>,
    cache: RefCell<HashMap<String, Arc<RecursiveProperties>>>,
}

impl Resolver {
    /// Creates a resolver with an empty cache.
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// The model being resolved against.
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Swaps the model and invalidates every cached result.
    pub fn replace_model(&mut self, model: Arc<Model>) {
        self.model = model;
        self.cache.get_mut().clear();
    }

    /// True if `iri` has a cached result.
    pub fn is_cached(&self, iri: &str) -> bool {
        self.cache.borrow().contains_key(iri)
    }

    /// Own and inherited property sets of the class `iri`, child to root.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::UnknownClass`] if `iri` or one of its
    /// ancestors is not a class of the model, and
    /// [`ResolveError::InheritanceCycle`] if the chain revisits a class.
    pub fn recursive_properties(&self, iri: &str) -> Result<Arc<RecursiveProperties>, ResolveError> {
        if let Some(hit) = self.cache.borrow().get(iri) {
            return Ok(Arc::clone(hit));
        }
        debug!(class = iri, "resolving recursive properties");

        let mut sets = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(iri);
        while let Some(current) = next {
            if !visited.insert(current) {
                return Err(ResolveError::InheritanceCycle(current.to_owned()));
            }
            let class = self
                .model
                .find_class(current)
                .ok_or_else(|| ResolveError::UnknownClass(current.to_owned()))?;
            sets.push(ClassPropertySet {
                class_iri: class.iri.clone(),
                class_name: class.name.clone(),
                properties: class.properties.clone(),
            });
            next = class.sub_class_of.as_deref();
        }

        let resolved = Arc::new(RecursiveProperties { sets });
        self.cache
            .borrow_mut()
            .insert(iri.to_owned(), Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Class IRIs from `iri` up to the root.
    ///
    /// # Errors
    ///
    /// Same as [`recursive_properties`](Self::recursive_properties).
    pub fn inheritance_list(&self, iri: &str) -> Result<Vec<String>, ResolveError> {
        Ok(self
            .recursive_properties(iri)?
            .class_iris()
            .map(str::to_owned)
            .collect())
    }

    /// True if `iri` is `ancestor` or inherits from it.
    ///
    /// # Errors
    ///
    /// Same as [`recursive_properties`](Self::recursive_properties).
    pub fn is_subclass_of(&self, iri: &str, ancestor: &str) -> Result<bool, ResolveError> {
        Ok(self.recursive_properties(iri)?.contains_class(ancestor))
    }

    /// Resolves every class of the model and returns how many were resolved.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error, so a malformed hierarchy fails
    /// the load instead of the first lookup.
    pub fn warm(&self) -> Result<usize, ResolveError> {
        let mut count = 0;
        for class in self.model.classes() {
            self.recursive_properties(&class.iri)?;
            count += 1;
        }
        debug!(classes = count, "warmed resolver cache");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::LiteralType;
    use crate::model::{Class, ClassPropertyKind, OntologyInfo, Profile};

    const NS: &str = "https://example.org/Core/";

    fn class(name: &str, parent: Option<&str>, props: &[&str]) -> Arc<Class> {
        let iri = format!("{NS}{name}");
        let properties = props
            .iter()
            .map(|p| {
                let cp = ClassProperty {
                    parent_class: iri.clone(),
                    path: format!("{NS}{p}"),
                    name: (*p).to_owned(),
                    min_count: Some(1),
                    max_count: None,
                    kind: ClassPropertyKind::Literal {
                        datatype: LiteralType::String,
                    },
                };
                ((*p).to_owned(), Arc::new(cp))
            })
            .collect();
        Arc::new(Class {
            iri,
            name: name.into(),
            profile_name: "Core".into(),
            summary: None,
            description: None,
            is_abstract: false,
            sub_class_of: parent.map(|p| format!("{NS}{p}")),
            properties,
        })
    }

    fn model(classes: Vec<Arc<Class>>) -> Arc<Model> {
        let mut core = Profile::default();
        for c in classes {
            core.classes.insert(c.name.clone(), c);
        }
        let mut profiles = BTreeMap::new();
        profiles.insert("Core".to_owned(), core);
        Arc::new(Model::from_profiles(OntologyInfo::default(), profiles))
    }

    fn hierarchy() -> Arc<Model> {
        model(vec![
            class("Element", None, &["spdxId", "name"]),
            class("Artifact", Some("Element"), &["suppliedBy"]),
            class("Package", Some("Artifact"), &["packageVersion", "name"]),
        ])
    }

    #[test]
    fn chain_is_child_to_root() {
        let resolver = Resolver::new(hierarchy());
        let rec = resolver
            .recursive_properties(&format!("{NS}Package"))
            .unwrap();
        let names: Vec<&str> = rec.iter().map(|s| s.class_name.as_str()).collect();
        assert_eq!(names, ["Package", "Artifact", "Element"]);
        assert_eq!(rec.get(&format!("{NS}Artifact")).unwrap().properties.len(), 1);
    }

    #[test]
    fn nearest_declaration_wins() {
        let resolver = Resolver::new(hierarchy());
        let rec = resolver
            .recursive_properties(&format!("{NS}Package"))
            .unwrap();
        let name = rec.find_by_path(&format!("{NS}name")).unwrap();
        assert_eq!(name.parent_class, format!("{NS}Package"));
        assert_eq!(rec.required().count(), 5);
    }

    #[test]
    fn results_are_memoized_until_replacement() {
        let mut resolver = Resolver::new(hierarchy());
        let iri = format!("{NS}Artifact");
        let first = resolver.recursive_properties(&iri).unwrap();
        assert!(resolver.is_cached(&iri));
        let second = resolver.recursive_properties(&iri).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        resolver.replace_model(hierarchy());
        assert!(!resolver.is_cached(&iri));
    }

    #[test]
    fn unknown_classes_are_reported() {
        let resolver = Resolver::new(hierarchy());
        assert_eq!(
            resolver.recursive_properties("https://example.org/Nope"),
            Err(ResolveError::UnknownClass("https://example.org/Nope".into()))
        );
    }

    #[test]
    fn cycles_are_detected() {
        let resolver = Resolver::new(model(vec![
            class("A", Some("B"), &[]),
            class("B", Some("A"), &[]),
        ]));
        assert!(matches!(
            resolver.recursive_properties(&format!("{NS}A")),
            Err(ResolveError::InheritanceCycle(_))
        ));
        assert!(resolver.warm().is_err());
    }

    #[test]
    fn warm_resolves_every_class() {
        let resolver = Resolver::new(hierarchy());
        assert_eq!(resolver.warm().unwrap(), 3);
        assert!(resolver.is_cached(&format!("{NS}Element")));
        assert!(resolver
            .is_subclass_of(&format!("{NS}Package"), &format!("{NS}Element"))
            .unwrap());
        assert_eq!(
            resolver.inheritance_list(&format!("{NS}Artifact")).unwrap(),
            vec![format!("{NS}Artifact"), format!("{NS}Element")]
        );
    }
}
