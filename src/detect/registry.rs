use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Result};

use super::backend::{DetectorOptions, FaceDetector};
use super::backends::ScriptedDetector;

/// Builds a detector for one session.
///
/// Receives the session's detector options and the configured model path,
/// if any. Backends that need a model file must reject a missing path.
pub type DetectorFactory =
    Box<dyn Fn(&DetectorOptions, Option<&Path>) -> Result<Box<dyn FaceDetector>> + Send + Sync>;

/// Registry of detector backends by name.
///
/// Sessions own their detector outright, so the registry stores factories
/// rather than shared instances: every session gets a fresh detector and
/// tears it down on its own schedule.
pub struct DetectorRegistry {
    factories: BTreeMap<String, DetectorFactory>,
    default_name: Option<String>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
            default_name: None,
        }
    }

    /// Registry with every backend compiled into this build.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register("stub", |_, _| Ok(Box::new(ScriptedDetector::demo())));
        #[cfg(feature = "backend-tract")]
        registry.register("tract", |options, model_path| {
            let path = model_path
                .ok_or_else(|| anyhow!("the tract backend requires detector.model_path"))?;
            Ok(Box::new(super::backends::TractBackend::new(path, options)?))
        });
        registry
    }

    /// Register a backend factory. The first registered backend becomes the default.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&DetectorOptions, Option<&Path>) -> Result<Box<dyn FaceDetector>>
            + Send
            + Sync
            + 'static,
    {
        if self.default_name.is_none() {
            self.default_name = Some(name.to_string());
        }
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.factories.contains_key(name) {
            return Err(anyhow!("detector backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// List registered backends.
    pub fn list(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Build a detector from the named backend.
    pub fn create(
        &self,
        name: &str,
        options: &DetectorOptions,
        model_path: Option<&Path>,
    ) -> Result<Box<dyn FaceDetector>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            anyhow!(
                "detector backend '{}' not registered (available: {})",
                name,
                self.list().join(", ")
            )
        })?;
        let detector = factory(options, model_path)?;
        log::info!(
            "detector backend {} ready (model={}, min_confidence={:.2})",
            detector.name(),
            options.model,
            options.min_confidence
        );
        Ok(detector)
    }

    /// Build a detector from the default backend.
    pub fn create_default(
        &self,
        options: &DetectorOptions,
        model_path: Option<&Path>,
    ) -> Result<Box<dyn FaceDetector>> {
        let name = self
            .default_name
            .as_deref()
            .ok_or_else(|| anyhow!("no detector backends registered"))?;
        self.create(name, options, model_path)
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
