//! # Library Reflection Cache
//!
//! Maps external shader-library paths to their reflected struct/function
//! catalogues. Entries are refreshed by a low-frequency poll that checks
//! recorded dependency files against the previous scan timestamp; change
//! detection is deliberately no finer than mtimes, since preprocessing
//! directives can invalidate any line-level diff.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::pipeline::{FunctionDecl, StructDecl};

/// Reflected metadata for one external source file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub structs: Vec<StructDecl>,
    pub functions: Vec<FunctionDecl>,
    /// Files this library transitively includes, relative to its own
    /// directory. Any of them changing invalidates the entry.
    pub sub_paths: Vec<PathBuf>,
}

impl LibraryEntry {
    pub fn struct_decl(&self, name: &str) -> Option<&StructDecl> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn function_decl(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// External reflection service: given a batch of library paths, returns
/// the reflected entry for every path it could parse. Unreadable or
/// unparseable paths are simply absent from the result; their cache
/// entries stay pending and dependent nodes fail configuration.
pub trait ReflectionProvider {
    fn reflect(&self, paths: &HashSet<PathBuf>) -> HashMap<PathBuf, LibraryEntry>;
}

/// Process-scoped cache of reflected libraries, owned by the embedding
/// application and passed by reference to whatever needs it.
#[derive(Debug)]
pub struct LibraryCache {
    entries: HashMap<PathBuf, Option<LibraryEntry>>,
    /// Timestamp of the previous successful scan.
    timestamp: SystemTime,
}

impl Default for LibraryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryCache {
    pub fn new() -> Self {
        Self { entries: HashMap::new(), timestamp: SystemTime::now() }
    }

    /// The reflected entry for `path`, if it has been resolved.
    pub fn entry(&self, path: &Path) -> Option<&LibraryEntry> {
        self.entries.get(path).and_then(|e| e.as_ref())
    }

    /// One poll pass: purges entries for paths no longer referenced,
    /// re-reflects pending paths and paths whose dependency mtimes passed
    /// the previous scan, all in a single batched provider call. Returns
    /// the paths whose entries were freshly updated so the caller can
    /// recompile only the graphs that reference them.
    pub fn track_changes(
        &mut self,
        referenced: &[PathBuf],
        provider: &dyn ReflectionProvider,
    ) -> Vec<PathBuf> {
        let scan_start = SystemTime::now();

        let mut entries = HashMap::new();
        for path in referenced {
            let entry = self.entries.remove(path).unwrap_or(None);
            entries.insert(path.clone(), entry);
        }
        self.entries = entries;

        let mut needs_update: HashSet<PathBuf> = HashSet::new();
        for (path, entry) in &self.entries {
            if !path.exists() {
                continue;
            }
            match entry {
                None => {
                    needs_update.insert(path.clone());
                }
                Some(entry) => {
                    let root_dir = path.parent().unwrap_or(Path::new(""));
                    for sub_path in &entry.sub_paths {
                        let sub_path = root_dir.join(sub_path);
                        if modified_since(&sub_path, self.timestamp) {
                            needs_update.insert(path.clone());
                            break;
                        }
                    }
                }
            }
        }

        let mut updated = Vec::new();
        if !needs_update.is_empty() {
            tracing::info!(count = needs_update.len(), "reflecting changed libraries");
            let results = provider.reflect(&needs_update);
            for (path, entry) in results {
                self.entries.insert(path.clone(), Some(entry));
                updated.push(path);
            }
            for path in &needs_update {
                if !updated.contains(path) {
                    tracing::warn!(path = %path.display(), "library reflection failed");
                }
            }
        }

        self.timestamp = scan_start;
        updated.sort();
        updated
    }

    #[cfg(test)]
    pub(crate) fn set_timestamp(&mut self, timestamp: SystemTime) {
        self.timestamp = timestamp;
    }
}

fn modified_since(path: &Path, timestamp: SystemTime) -> bool {
    match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(mtime) => mtime > timestamp,
        Err(_) => false,
    }
}
