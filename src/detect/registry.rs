use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::backend::PoseBackend;

/// Registry of constructed pose backends.
///
/// Each backend owns a non-reentrant session, so the registry hands backends out by
/// value: whoever takes one becomes its only driver.
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn PoseBackend>>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: PoseBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Box::new(backend));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// List registered backends, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove a backend by name and hand it to the caller.
    pub fn take(&mut self, name: &str) -> Result<Box<dyn PoseBackend>> {
        self.backends.remove(name).ok_or_else(|| {
            anyhow!(
                "backend '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            )
        })
    }

    /// Remove the default backend and hand it to the caller.
    pub fn take_default(&mut self) -> Result<Box<dyn PoseBackend>> {
        let name = self
            .default_name
            .clone()
            .ok_or_else(|| anyhow!("no backends registered"))?;
        self.take(&name)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::backends::{ScriptedBackend, StubBackend};

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new());
        registry.register(ScriptedBackend::new());
        assert_eq!(registry.default_name(), Some("stub"));
        assert_eq!(registry.list(), vec!["scripted", "stub"]);

        registry.set_default("scripted").unwrap();
        let backend = registry.take_default().unwrap();
        assert_eq!(backend.name(), "scripted");
        assert_eq!(registry.list(), vec!["stub"]);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new());
        assert!(registry.set_default("tract").is_err());
        let err = registry.take("tract").err().unwrap();
        assert!(err.to_string().contains("available: stub"));
    }
}
