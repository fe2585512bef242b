//! Script catalogs
//!
//! A catalog lists and reads scripts by name. Every read parses a fresh
//! [`Script`]; scripts are never shared between executions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::engine::Engine;
use crate::error::CatalogError;
use crate::script::{Executor, Script};

/// Scripts carrying this flag cannot be read
pub const DISABLE_FLAG: &str = "DISABLE";

const SCRIPT_EXTENSION: &str = "txt";

pub trait ScriptCatalog: Send + Sync {
    /// Every script, including disabled ones, for inspection only
    fn list_scripts(&self) -> Vec<Script>;

    /// A fresh, runnable instance of `name`
    fn read_script(&self, name: &str, executor: Executor) -> Result<Script, CatalogError>;
}

fn load(engine: &Arc<Engine>, name: &str, source: &str, executor: Executor) -> Result<Script, CatalogError> {
    let script = engine.parse_script(name, source, executor);
    if script.has_flag(DISABLE_FLAG).is_some() {
        script.dispose();
        return Err(CatalogError::Disabled(name.to_string()));
    }
    Ok(script)
}

/// Reads `<name>.txt` files from a directory
pub struct DirectoryCatalog {
    dir: PathBuf,
    engine: Arc<Engine>,
}

impl DirectoryCatalog {
    pub fn new(dir: impl Into<PathBuf>, engine: Arc<Engine>) -> Self {
        Self {
            dir: dir.into(),
            engine,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Script names in the directory, sorted
    pub fn script_names(&self) -> Vec<String> {
        if !self.dir.exists() {
            info!(
                target: "scripting",
                "Script directory does not exist: {} (this is fine if no scripts are being used)",
                self.dir.display()
            );
            return Vec::new();
        }

        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    target: "scripting",
                    "Failed to read script directory {}: {}",
                    self.dir.display(),
                    e
                );
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some(SCRIPT_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn read_source(&self, name: &str) -> Result<String, CatalogError> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(CatalogError::NotFound(name.to_string()));
        }

        let path = self.dir.join(format!("{}.{}", name, SCRIPT_EXTENSION));
        if !path.is_file() {
            return Err(CatalogError::NotFound(name.to_string()));
        }

        std::fs::read_to_string(&path).map_err(|source| CatalogError::Io {
            name: name.to_string(),
            source,
        })
    }
}

impl ScriptCatalog for DirectoryCatalog {
    fn list_scripts(&self) -> Vec<Script> {
        let mut scripts = Vec::new();
        for name in self.script_names() {
            match self.read_source(&name) {
                Ok(source) => {
                    scripts.push(self.engine.parse_script(&name, &source, Executor::Automatic))
                }
                Err(e) => warn!(target: "scripting", "Skipping script {}: {}", name, e),
            }
        }
        debug!(target: "scripting", "Listed {} script(s) from {}", scripts.len(), self.dir.display());
        scripts
    }

    fn read_script(&self, name: &str, executor: Executor) -> Result<Script, CatalogError> {
        let source = self.read_source(name)?;
        load(&self.engine, name, &source, executor)
    }
}

/// Scripts held in memory, keyed by name
pub struct MemoryCatalog {
    sources: RwLock<BTreeMap<String, String>>,
    engine: Arc<Engine>,
}

impl MemoryCatalog {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            sources: RwLock::new(BTreeMap::new()),
            engine,
        }
    }

    pub fn with_scripts<N, S>(engine: Arc<Engine>, scripts: impl IntoIterator<Item = (N, S)>) -> Self
    where
        N: Into<String>,
        S: Into<String>,
    {
        let catalog = Self::new(engine);
        for (name, source) in scripts {
            catalog.insert(name, source);
        }
        catalog
    }

    pub fn insert(&self, name: impl Into<String>, source: impl Into<String>) {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), source.into());
    }

    pub fn remove(&self, name: &str) -> bool {
        self.sources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sources.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScriptCatalog for MemoryCatalog {
    fn list_scripts(&self) -> Vec<Script> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources
            .iter()
            .map(|(name, source)| self.engine.parse_script(name, source, Executor::Automatic))
            .collect()
    }

    fn read_script(&self, name: &str, executor: Executor) -> Result<Script, CatalogError> {
        let source = self
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))?;
        load(&self.engine, name, &source, executor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MessageKind;
    use scripted_events::MemoryWorld;
    use std::fs;
    use tempfile::TempDir;

    fn engine() -> Arc<Engine> {
        Arc::new(Engine::new(Arc::new(MemoryWorld::new())))
    }

    #[test]
    fn test_directory_catalog_reads_txt_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("greet.txt"), "!-- EVENT Joined\nLOG hi").unwrap();
        fs::write(temp_dir.path().join("off.txt"), "!-- DISABLE\nLOG no").unwrap();
        fs::write(temp_dir.path().join("notes.md"), "not a script").unwrap();

        let catalog = DirectoryCatalog::new(temp_dir.path(), engine());
        assert_eq!(catalog.script_names(), vec!["greet", "off"]);
        assert_eq!(catalog.list_scripts().len(), 2);

        let script = catalog.read_script("greet", Executor::Console).unwrap();
        assert_eq!(script.queued(), 1);

        let err = catalog.read_script("off", Executor::Console).unwrap_err();
        assert_eq!(err.kind(), MessageKind::DisabledScript);

        let err = catalog.read_script("missing", Executor::Console).unwrap_err();
        assert_eq!(err.kind(), MessageKind::NotFoundScript);

        let err = catalog.read_script("../greet", Executor::Console).unwrap_err();
        assert_eq!(err.kind(), MessageKind::NotFoundScript);
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = DirectoryCatalog::new(temp_dir.path().join("absent"), engine());
        assert!(catalog.list_scripts().is_empty());
    }

    #[test]
    fn test_memory_catalog_reads_fresh_instances() {
        let catalog = MemoryCatalog::with_scripts(engine(), [("a", "LOG one\nLOG two")]);

        let mut first = catalog.read_script("a", Executor::Automatic).unwrap();
        first.execute().unwrap();
        let second = catalog.read_script("a", Executor::Automatic).unwrap();
        assert!(!second.is_executed());
        assert_eq!(second.queued(), 2);

        assert!(catalog.remove("a"));
        assert!(catalog.is_empty());
    }
}
