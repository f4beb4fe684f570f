//! Project configuration and state.
//!
//! A project file lists the VHDL sources and the top module choice:
//!
//! ```toml
//! sources = ["rtl/*.vhd", "tb/tb_top.vhd"]
//! top = "tb_top"
//! auto_top = false
//! ```
//!
//! Source entries are resolved relative to the project file. Entries with
//! glob metacharacters are expanded in sorted order; plain entries are kept
//! as written, so a missing file surfaces when it is analyzed.

use std::path::{Path, PathBuf};

use ggfront_syntax::{SourceAnalysis, SourceError};
use indexmap::IndexSet;
use serde::Deserialize;
use smol_str::SmolStr;
use tracing::{debug, warn};

use crate::error::ProjectError;
use crate::hierarchy::{Hierarchy, TopSelection};
use crate::settings::VhdlStandard;

/// Sources and top module choice as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Source files in compile order.
    pub sources: Vec<PathBuf>,
    /// Top module choice.
    pub top: TopSelection,
}

impl ProjectConfig {
    /// Load a project file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ProjectError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: ProjectToml = toml::from_str(&text).map_err(|source| ProjectError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path.parent().unwrap_or_else(|| Path::new(""));
        raw.into_config(root)
    }

    /// Project made of the given files, with an automatic top module
    /// unless one is named.
    pub fn from_sources(
        sources: impl IntoIterator<Item = PathBuf>,
        top: Option<&str>,
    ) -> Result<Self, ProjectError> {
        let sources: Vec<PathBuf> = sources.into_iter().collect();
        if sources.is_empty() {
            return Err(ProjectError::NoSources);
        }
        Ok(Self {
            sources,
            top: top.map_or_else(TopSelection::default, |name| TopSelection::explicit(name)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProjectToml {
    sources: Vec<String>,
    top: Option<String>,
    auto_top: Option<bool>,
}

impl ProjectToml {
    fn into_config(self, root: &Path) -> Result<ProjectConfig, ProjectError> {
        let mut sources: IndexSet<PathBuf> = IndexSet::new();
        for entry in &self.sources {
            let joined = root.join(entry);
            if !is_glob(entry) {
                sources.insert(joined);
                continue;
            }
            let pattern = joined.to_string_lossy();
            let paths = glob::glob(&pattern).map_err(|source| ProjectError::Pattern {
                pattern: entry.clone(),
                source,
            })?;
            for path in paths {
                match path {
                    Ok(path) => {
                        sources.insert(path);
                    }
                    Err(err) => warn!("skipping unreadable match of {entry}: {err}"),
                }
            }
        }
        if sources.is_empty() {
            return Err(ProjectError::NoSources);
        }

        let top = match (self.top, self.auto_top) {
            (Some(name), auto) => TopSelection {
                name: SmolStr::new(name.to_ascii_lowercase()),
                auto: auto.unwrap_or(false),
            },
            (None, _) => TopSelection::default(),
        };
        Ok(ProjectConfig {
            sources: sources.into_iter().collect(),
            top,
        })
    }
}

fn is_glob(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// A project with its current hierarchy.
#[derive(Debug, Clone)]
pub struct Project {
    sources: Vec<PathBuf>,
    top: TopSelection,
    hierarchy: Hierarchy,
}

impl Project {
    /// Project with an empty hierarchy. Call [`Self::refresh`] before use.
    #[must_use]
    pub fn new(config: ProjectConfig) -> Self {
        Self {
            sources: config.sources,
            top: config.top,
            hierarchy: Hierarchy::default(),
        }
    }

    /// Source files in compile order.
    #[must_use]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Current hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Trace path of the current top module.
    #[must_use]
    pub fn wave_path(&self) -> Option<&Path> {
        self.hierarchy.wave_path()
    }

    /// Whether to compile as VHDL-2008 under `standard`.
    #[must_use]
    pub fn use_vhdl2008(&self, standard: VhdlStandard) -> bool {
        standard.use_vhdl2008(self.hierarchy.uses_vhdl2008())
    }

    /// Analyze every source in order. Index `i` of the result is source
    /// `src<i + 1>.vhd`.
    #[must_use]
    pub fn analyze(&self) -> Vec<Result<SourceAnalysis, SourceError>> {
        self.sources
            .iter()
            .enumerate()
            .map(|(index, path)| SourceAnalysis::from_path(path, index + 1))
            .collect()
    }

    /// Re-read the sources and rebuild the hierarchy. Unreadable sources
    /// are left out of the hierarchy and returned.
    pub fn refresh(&mut self) -> Vec<SourceError> {
        let mut analyses = Vec::with_capacity(self.sources.len());
        let mut errors = Vec::new();
        for result in self.analyze() {
            match result {
                Ok(analysis) => analyses.push(analysis),
                Err(err) => {
                    warn!("{err}");
                    errors.push(err);
                }
            }
        }
        self.hierarchy = Hierarchy::resolve(&analyses, &self.top);
        self.top = self.hierarchy.selection().clone();
        debug!(
            "hierarchy refreshed: {:?}, top {:?}",
            self.hierarchy.status(),
            self.hierarchy.top()
        );
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_detection() {
        assert!(is_glob("rtl/*.vhd"));
        assert!(is_glob("tb_?.vhd"));
        assert!(is_glob("[ab].vhd"));
        assert!(!is_glob("rtl/adder.vhd"));
    }

    #[test]
    fn named_top_defaults_to_explicit() {
        let raw = ProjectToml {
            sources: vec!["a.vhd".into()],
            top: Some("TB".into()),
            auto_top: None,
        };
        let config = raw.into_config(Path::new("proj")).unwrap();
        assert_eq!(config.top, TopSelection::explicit("tb"));
        assert_eq!(config.sources, vec![PathBuf::from("proj").join("a.vhd")]);
    }
}
