//! Immutable lookup table of language backends

use super::cedar::CedarLanguageAbstraction;
use super::LanguageAbstraction;
use crate::error::{PolicyError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Language backends keyed by language name
///
/// Built once through [`LanguageRegistryBuilder`] and shared by reference;
/// there is no way to add a backend afterwards.
#[derive(Clone)]
pub struct LanguageRegistry {
    languages: BTreeMap<String, Arc<dyn LanguageAbstraction>>,
}

impl LanguageRegistry {
    pub fn builder() -> LanguageRegistryBuilder {
        LanguageRegistryBuilder::default()
    }

    /// Registry with every backend shipped in this crate
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::builder()
            .register(Arc::new(CedarLanguageAbstraction::new()))?
            .build())
    }

    /// Backend registered under `name`
    pub fn get(&self, name: &str) -> Result<Arc<dyn LanguageAbstraction>> {
        self.languages
            .get(name)
            .cloned()
            .ok_or_else(|| PolicyError::UnknownLanguage(name.to_string()))
    }

    /// Backend whose stored representation matches a blob header's ids
    pub fn find_by_backend(
        &self,
        language_id: u32,
        language_version_id: u32,
    ) -> Option<Arc<dyn LanguageAbstraction>> {
        self.languages
            .values()
            .find(|lang| {
                let spec = lang.language_specification();
                spec.backend_language_id == language_id
                    && spec.language_version_id == language_version_id
            })
            .cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.languages.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
pub struct LanguageRegistryBuilder {
    languages: BTreeMap<String, Arc<dyn LanguageAbstraction>>,
}

impl LanguageRegistryBuilder {
    /// Add a backend under its specification's language name
    pub fn register(mut self, language: Arc<dyn LanguageAbstraction>) -> Result<Self> {
        let name = language.language_specification().language.clone();
        if self.languages.contains_key(&name) {
            return Err(PolicyError::BadRequest(format!(
                "language '{}' is already registered",
                name
            )));
        }
        debug!(language = %name, "registered language backend");
        self.languages.insert(name, language);
        Ok(self)
    }

    pub fn build(self) -> LanguageRegistry {
        LanguageRegistry {
            languages: self.languages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::cedar::{LANGUAGE_CEDAR, LANGUAGE_CEDAR_JSON_ID, LANGUAGE_SYNTAX_VERSION_ID};

    #[test]
    fn test_default_registry() {
        let registry = LanguageRegistry::with_defaults().unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec![LANGUAGE_CEDAR]);

        let cedar = registry.get(LANGUAGE_CEDAR).unwrap();
        assert_eq!(cedar.language_specification().language, LANGUAGE_CEDAR);

        assert!(matches!(
            registry.get("rego"),
            Err(PolicyError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn test_find_by_backend_ids() {
        let registry = LanguageRegistry::with_defaults().unwrap();
        assert!(registry
            .find_by_backend(LANGUAGE_CEDAR_JSON_ID, LANGUAGE_SYNTAX_VERSION_ID)
            .is_some());
        assert!(registry.find_by_backend(LANGUAGE_CEDAR_JSON_ID, 9).is_none());
        assert!(registry.find_by_backend(99, LANGUAGE_SYNTAX_VERSION_ID).is_none());
    }

    #[test]
    fn test_duplicate_registration() {
        let result = LanguageRegistry::builder()
            .register(Arc::new(CedarLanguageAbstraction::new()))
            .and_then(|b| b.register(Arc::new(CedarLanguageAbstraction::new())));
        assert!(result.is_err());
    }
}
