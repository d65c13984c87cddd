//! Part lookup service.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::info::PartInfo;

/// Resolves part names to shared definitions.
pub trait PartLibrary {
    /// Look up a part by name. With `create_placeholder`, an unknown name
    /// yields a new placeholder definition instead of `None`.
    fn find_part(&self, name: &str, create_placeholder: bool) -> Option<Arc<PartInfo>>;
}

/// In-memory part library keyed by normalized part name.
#[derive(Debug, Default)]
pub struct PartCatalog {
    parts: RwLock<HashMap<String, Arc<PartInfo>>>,
}

/// Case-insensitive key without the `.dat` extension.
fn normalize(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    match upper.strip_suffix(".DAT") {
        Some(stem) => stem.to_string(),
        None => upper,
    }
}

impl PartCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, replacing any part with the same name.
    pub fn register(&self, part: PartInfo) -> Arc<PartInfo> {
        self.register_shared(Arc::new(part))
    }

    /// Add an already shared definition (e.g. a model document's own part).
    pub fn register_shared(&self, part: Arc<PartInfo>) -> Arc<PartInfo> {
        let key = normalize(part.name());
        self.parts
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, part.clone());
        part
    }

    pub fn len(&self) -> usize {
        self.parts.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartLibrary for PartCatalog {
    fn find_part(&self, name: &str, create_placeholder: bool) -> Option<Arc<PartInfo>> {
        let key = normalize(name);
        if let Some(part) = self.parts.read().unwrap_or_else(|e| e.into_inner()).get(&key) {
            return Some(part.clone());
        }

        if !create_placeholder || key.is_empty() {
            return None;
        }

        log::warn!("Part '{}' not found, using placeholder", name);
        Some(self.register(PartInfo::placeholder(name.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::PartKind;

    #[test]
    fn test_lookup_ignores_case_and_extension() {
        let catalog = PartCatalog::new();
        catalog.register(PartInfo::placeholder("3001.dat"));

        assert!(catalog.find_part("3001.DAT", false).is_some());
        assert!(catalog.find_part("3001", false).is_some());
        assert!(catalog.find_part("3002", false).is_none());
    }

    #[test]
    fn test_placeholder_created_once() {
        let catalog = PartCatalog::new();

        let a = catalog.find_part("9999.dat", true).unwrap();
        let b = catalog.find_part("9999.dat", true).unwrap();

        assert_eq!(a.kind(), PartKind::Placeholder);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_empty_name_never_creates_placeholder() {
        let catalog = PartCatalog::new();
        assert!(catalog.find_part("  ", true).is_none());
        assert!(catalog.is_empty());
    }
}
