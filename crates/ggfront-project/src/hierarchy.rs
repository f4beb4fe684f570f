//! Entity hierarchy of a project.
//!
//! The hierarchy is rebuilt from the per-file analyses whenever the source
//! list changes. Entities that no other entity references are roots; each
//! root is expanded depth first through the component references of its
//! architecture. A project with duplicate entity names, no entities at all,
//! or a reference cycle has no hierarchy and is reported as a single
//! invalid pseudo node instead.

use std::path::{Path, PathBuf};

use ggfront_syntax::{SourceAnalysis, SubmoduleRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::{debug, info};

/// Extension of the trace file derived from the top module's source.
pub const WAVE_EXTENSION: &str = "vcd";

/// Short path shown for a referenced entity that is declared nowhere.
pub const UNKNOWN_SOURCE: &str = "???";

const NO_MODULES_MESSAGE: &str = "<!> Entity が見つかりません．";
const CYCLIC_MESSAGE: &str = "<!> Entity の循環参照を検出しました．";
const DUPLICATES_MESSAGE: &str = "<!> Entity が重複して定義されています．";

/// Top module choice of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopSelection {
    /// Entity name (lower case). Empty when no top module is usable.
    pub name: SmolStr,
    /// When set, the root of the largest tree is chosen on every refresh.
    pub auto: bool,
}

impl TopSelection {
    /// An explicit choice that is kept as long as the entity exists.
    pub fn explicit(name: impl AsRef<str>) -> Self {
        Self {
            name: SmolStr::new(name.as_ref().to_ascii_lowercase()),
            auto: false,
        }
    }
}

impl Default for TopSelection {
    fn default() -> Self {
        Self {
            name: SmolStr::default(),
            auto: true,
        }
    }
}

/// Result class of a hierarchy refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyStatus {
    /// Trees were built and a top module selected.
    Resolved,
    /// No source declares an entity.
    NoModules,
    /// At least one entity is declared more than once.
    Duplicates,
    /// The entities reference each other in a cycle.
    Cyclic,
}

/// One row of the flattened hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyItem {
    /// Entity name, or the failure message for a pseudo node.
    pub name: SmolStr,
    /// Depth below the tree root.
    pub depth: usize,
    /// False for undeclared entities and failure rows.
    pub valid: bool,
    /// Source declaring the entity.
    pub long_path: Option<PathBuf>,
    /// File name of [`Self::long_path`], or `???` for an undeclared entity.
    pub short_path: Option<String>,
    /// True for the selected top module.
    pub is_top: bool,
}

impl HierarchyItem {
    fn node(name: SmolStr, depth: usize, valid: bool) -> Self {
        Self {
            name,
            depth,
            valid,
            long_path: None,
            short_path: None,
            is_top: false,
        }
    }

    fn with_source(mut self, path: &Path) -> Self {
        self.short_path = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.long_path = Some(path.to_path_buf());
        self
    }
}

/// Flattened entity hierarchy with the resolved top module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hierarchy {
    status: HierarchyStatus,
    items: Vec<HierarchyItem>,
    top: TopSelection,
    wave_path: Option<PathBuf>,
    uses_vhdl2008: bool,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Self {
            status: HierarchyStatus::NoModules,
            items: Vec::new(),
            top: TopSelection::default(),
            wave_path: None,
            uses_vhdl2008: false,
        }
    }
}

impl Hierarchy {
    /// Build the hierarchy from analyses given in project file order.
    ///
    /// `selection` is the current top module choice. It is kept when the
    /// entity still exists and `auto` is off; otherwise the root of the
    /// largest tree is chosen.
    pub fn resolve<'a>(
        sources: impl IntoIterator<Item = &'a SourceAnalysis>,
        selection: &TopSelection,
    ) -> Self {
        let mut owners: IndexMap<SmolStr, PathBuf> = IndexMap::new();
        let mut duplicates: IndexMap<SmolStr, Vec<PathBuf>> = IndexMap::new();
        let mut references: Vec<SubmoduleRef> = Vec::new();
        let mut uses_vhdl2008 = false;

        for source in sources {
            let path = &source.file.original;
            uses_vhdl2008 |= source.uses_vhdl2008;
            for module in &source.modules {
                if let Some(first) = owners.get(module) {
                    duplicates
                        .entry(module.clone())
                        .or_insert_with(|| vec![first.clone()])
                        .push(path.clone());
                } else {
                    owners.insert(module.clone(), path.clone());
                }
            }
            references.extend(source.submodules.iter().cloned());
        }

        let failed = |status, items| Self {
            status,
            items,
            top: TopSelection {
                name: SmolStr::default(),
                auto: selection.auto,
            },
            wave_path: None,
            uses_vhdl2008,
        };

        if !duplicates.is_empty() {
            info!("{} entities are declared more than once", duplicates.len());
            let mut items = vec![pseudo_node(DUPLICATES_MESSAGE)];
            for (name, paths) in &duplicates {
                items.extend(
                    paths
                        .iter()
                        .map(|path| HierarchyItem::node(name.clone(), 1, false).with_source(path)),
                );
            }
            return failed(HierarchyStatus::Duplicates, items);
        }
        if owners.is_empty() {
            info!("no entity declarations found");
            return failed(HierarchyStatus::NoModules, vec![pseudo_node(NO_MODULES_MESSAGE)]);
        }

        let roots: Vec<&SmolStr> = owners
            .keys()
            .filter(|name| !references.iter().any(|reference| &reference.name == *name))
            .collect();
        let expander = Expander {
            owners: &owners,
            references: &references,
        };
        let mut trees = Vec::with_capacity(roots.len());
        for root in roots {
            let mut tree = Vec::new();
            if expander.expand(root, 0, &mut Vec::new(), &mut tree).is_err() {
                info!("entity {root} is part of a reference cycle");
                return failed(HierarchyStatus::Cyclic, vec![pseudo_node(CYCLIC_MESSAGE)]);
            }
            trees.push(tree);
        }
        // Every entity is referenced by another one.
        let Some(largest) = trees.iter().map(Vec::len).max() else {
            info!("no root entity; references are cyclic");
            return failed(HierarchyStatus::Cyclic, vec![pseudo_node(CYCLIC_MESSAGE)]);
        };
        trees.sort_by(|a, b| b.len().cmp(&a.len()));
        debug!("{} trees, largest has {largest} nodes", trees.len());

        let top = if selection.auto || !owners.contains_key(&selection.name) {
            TopSelection {
                name: trees[0][0].name.clone(),
                auto: true,
            }
        } else {
            selection.clone()
        };
        let wave_path = owners.get(&top.name).map(|path| wave_path_for(path));

        let items = trees
            .into_iter()
            .flatten()
            .map(|item| {
                let is_top = item.name == top.name;
                let item = match owners.get(&item.name) {
                    Some(path) => item.with_source(path),
                    None => item,
                };
                HierarchyItem { is_top, ..item }
            })
            .collect();

        Self {
            status: HierarchyStatus::Resolved,
            items,
            top,
            wave_path,
            uses_vhdl2008,
        }
    }

    /// Outcome of the last refresh.
    #[must_use]
    pub fn status(&self) -> HierarchyStatus {
        self.status
    }

    /// True when trees were built.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.status == HierarchyStatus::Resolved
    }

    /// Flattened rows in display order.
    #[must_use]
    pub fn items(&self) -> &[HierarchyItem] {
        &self.items
    }

    /// Resolved top module selection. The name is empty after a failure.
    #[must_use]
    pub fn selection(&self) -> &TopSelection {
        &self.top
    }

    /// Resolved top module, if any.
    #[must_use]
    pub fn top(&self) -> Option<&str> {
        (!self.top.name.is_empty()).then_some(self.top.name.as_str())
    }

    /// Trace path derived from the top module's source file.
    #[must_use]
    pub fn wave_path(&self) -> Option<&Path> {
        self.wave_path.as_deref()
    }

    /// True when any source uses a VHDL-2008 only construct.
    #[must_use]
    pub fn uses_vhdl2008(&self) -> bool {
        self.uses_vhdl2008
    }

    /// Whether `entity` is instantiated under the top module (the top
    /// module itself included).
    #[must_use]
    pub fn referenced(&self, entity: &str) -> bool {
        let mut top_depth = None;
        for item in &self.items {
            if item.is_top {
                top_depth = Some(item.depth);
            } else if top_depth.is_some_and(|depth| item.depth <= depth) {
                top_depth = None;
            }
            if top_depth.is_some() && item.name == entity {
                return true;
            }
        }
        false
    }
}

struct Cycle;

struct Expander<'a> {
    owners: &'a IndexMap<SmolStr, PathBuf>,
    references: &'a [SubmoduleRef],
}

impl Expander<'_> {
    fn expand(
        &self,
        target: &SmolStr,
        depth: usize,
        chain: &mut Vec<SmolStr>,
        out: &mut Vec<HierarchyItem>,
    ) -> Result<(), Cycle> {
        if chain.contains(target) {
            return Err(Cycle);
        }
        let declared = self.owners.contains_key(target);
        let mut item = HierarchyItem::node(target.clone(), depth, declared);
        if !declared {
            item.short_path = Some(UNKNOWN_SOURCE.to_string());
            out.push(item);
            return Ok(());
        }
        out.push(item);

        chain.push(target.clone());
        for reference in self.references.iter().filter(|r| &r.parent == target) {
            self.expand(&reference.name, depth + 1, chain, out)?;
        }
        chain.pop();
        Ok(())
    }
}

fn pseudo_node(message: &str) -> HierarchyItem {
    HierarchyItem::node(SmolStr::new(message), 0, false)
}

fn wave_path_for(source: &Path) -> PathBuf {
    let dir = source.parent().unwrap_or_else(|| Path::new(""));
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(WAVE_EXTENSION);
    dir.join(name)
}
