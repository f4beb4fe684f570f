//! Tool settings.
//!
//! Settings live in a TOML file that carries the version of the data
//! layout that wrote it. Files older than 0.8 use a flat legacy layout and
//! are upgraded once when loaded; only fields that existed in the writing
//! version are taken over, everything else keeps its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SettingsError;

/// Version written by [`Settings::save`].
pub const DATA_VERSION: &str = "0.9";

/// File name of the per-user settings file in the home directory.
pub const SETTINGS_FILE_NAME: &str = ".ggfront.toml";

/// Default simulation stop time in milliseconds.
pub const SIM_LIMIT_DEFAULT_MS: u32 = 1;

/// Default wall-clock limit for one tool run in milliseconds.
pub const PROC_LIMIT_DEFAULT_MS: u64 = 3000;

const FIRST_CURRENT_LAYOUT: (u32, u32) = (0, 8);

/// VHDL standard passed to GHDL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum VhdlStandard {
    /// VHDL-2008 when any source needs it, VHDL-93 with Synopsys
    /// packages otherwise.
    #[default]
    Guess,
    /// VHDL-93 with Synopsys packages.
    Vhdl1993,
    /// VHDL-2008.
    Vhdl2008,
}

impl VhdlStandard {
    /// Whether to compile as VHDL-2008, given whether the sources use
    /// VHDL-2008 only constructs.
    #[must_use]
    pub fn use_vhdl2008(self, sources_need_it: bool) -> bool {
        match self {
            Self::Guess => sources_need_it,
            Self::Vhdl1993 => false,
            Self::Vhdl2008 => true,
        }
    }
}

impl TryFrom<u16> for VhdlStandard {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Guess),
            1993 => Ok(Self::Vhdl1993),
            2008 => Ok(Self::Vhdl2008),
            other => Err(format!("unsupported VHDL standard {other} (expected 0, 1993 or 2008)")),
        }
    }
}

impl From<VhdlStandard> for u16 {
    fn from(value: VhdlStandard) -> Self {
        match value {
            VhdlStandard::Guess => 0,
            VhdlStandard::Vhdl1993 => 1993,
            VhdlStandard::Vhdl2008 => 2008,
        }
    }
}

/// Location of an external executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPath {
    /// Configured executable.
    pub path: PathBuf,
    /// Ignore `path` and look for the tool next to the front-end, falling
    /// back to the search path.
    pub guess: bool,
}

impl Default for ToolPath {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            guess: true,
        }
    }
}

impl ToolPath {
    /// Executable to launch. A guessed tool is `<base>/<bundled>` when that
    /// file exists and the bare program name otherwise.
    #[must_use]
    pub fn resolve(&self, base_dir: &Path, bundled: &str, program: &str) -> PathBuf {
        if !self.guess {
            return self.path.clone();
        }
        let mut candidate = base_dir.join(bundled);
        candidate.set_extension(std::env::consts::EXE_EXTENSION);
        if candidate.is_file() {
            candidate
        } else {
            PathBuf::from(program)
        }
    }
}

/// Front-end settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// GHDL executable.
    pub ghdl: ToolPath,
    /// GTKWave executable.
    pub gtkwave: ToolPath,
    /// Simulation stop time in milliseconds.
    pub sim_limit_ms: u32,
    /// Wall-clock limit for each tool run in milliseconds.
    pub proc_limit_ms: u64,
    /// Standard selection.
    pub vhdl_std: VhdlStandard,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ghdl: ToolPath::default(),
            gtkwave: ToolPath::default(),
            sim_limit_ms: SIM_LIMIT_DEFAULT_MS,
            proc_limit_ms: PROC_LIMIT_DEFAULT_MS,
            vhdl_std: VhdlStandard::default(),
        }
    }
}

impl Settings {
    /// Per-user settings path (`$HOME/.ggfront.toml`).
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        home::home_dir().map(|home| home.join(SETTINGS_FILE_NAME))
    }

    /// Load settings, upgrading a legacy file in place.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: SettingsToml = toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let (settings, migrated) = raw.into_settings()?;
        if migrated {
            info!("旧バージョンの GGFront から設定を読み取りました．");
            if let Err(err) = settings.save(path) {
                warn!("{err}");
            }
        }
        Ok(settings)
    }

    /// Load settings from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the settings in the current layout.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let raw = SettingsFile {
            version: DATA_VERSION.to_string(),
            ghdl: ToolSection::from(&self.ghdl),
            gtkwave: ToolSection::from(&self.gtkwave),
            simulation: SimulationSection {
                sim_limit_ms: self.sim_limit_ms,
                proc_limit_ms: self.proc_limit_ms,
                vhdl_std: self.vhdl_std,
            },
        };
        let text = toml::to_string_pretty(&raw)?;
        std::fs::write(path, text).map_err(|source| SettingsError::Save {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate that both tools can be located.
    pub fn check(&self) -> Result<(), SettingsError> {
        if self.ghdl.path.as_os_str().is_empty() && !self.ghdl.guess {
            return Err(SettingsError::MissingGhdl);
        }
        if self.gtkwave.path.as_os_str().is_empty() && !self.gtkwave.guess {
            return Err(SettingsError::MissingGtkwave);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SettingsFile {
    version: String,
    ghdl: ToolSection,
    gtkwave: ToolSection,
    simulation: SimulationSection,
}

#[derive(Debug, Deserialize)]
struct SettingsToml {
    version: String,
    ghdl: Option<ToolSection>,
    gtkwave: Option<ToolSection>,
    simulation: Option<SimulationSection>,
    #[serde(flatten)]
    legacy: LegacyFields,
}

/// Flat layout written before 0.8.
#[derive(Debug, Default, Deserialize)]
struct LegacyFields {
    ghdl_path: Option<String>,
    gtkwave_path: Option<String>,
    guess_ghdl_path: Option<bool>,
    guess_gtkwave_path: Option<bool>,
    sim_limit: Option<String>,
    proc_limit: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ToolSection {
    #[serde(default)]
    path: String,
    #[serde(default = "default_true")]
    guess: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct SimulationSection {
    #[serde(default = "default_sim_limit")]
    sim_limit_ms: u32,
    #[serde(default = "default_proc_limit")]
    proc_limit_ms: u64,
    #[serde(default)]
    vhdl_std: VhdlStandard,
}

fn default_true() -> bool {
    true
}

fn default_sim_limit() -> u32 {
    SIM_LIMIT_DEFAULT_MS
}

fn default_proc_limit() -> u64 {
    PROC_LIMIT_DEFAULT_MS
}

impl From<&ToolPath> for ToolSection {
    fn from(tool: &ToolPath) -> Self {
        Self {
            path: tool.path.to_string_lossy().into_owned(),
            guess: tool.guess,
        }
    }
}

impl From<ToolSection> for ToolPath {
    fn from(section: ToolSection) -> Self {
        Self {
            path: PathBuf::from(section.path),
            guess: section.guess,
        }
    }
}

impl SettingsToml {
    /// Settings plus whether the file used the legacy layout.
    fn into_settings(self) -> Result<(Settings, bool), SettingsError> {
        let version = parse_version(&self.version)?;
        if version < FIRST_CURRENT_LAYOUT {
            return Ok((self.legacy.migrate(version)?, true));
        }

        let mut settings = Settings::default();
        if let Some(ghdl) = self.ghdl {
            settings.ghdl = ghdl.into();
        }
        if let Some(gtkwave) = self.gtkwave {
            settings.gtkwave = gtkwave.into();
        }
        if let Some(simulation) = self.simulation {
            settings.sim_limit_ms = simulation.sim_limit_ms;
            settings.proc_limit_ms = simulation.proc_limit_ms;
            settings.vhdl_std = simulation.vhdl_std;
        }
        Ok((settings, false))
    }
}

impl LegacyFields {
    fn migrate(self, version: (u32, u32)) -> Result<Settings, SettingsError> {
        let mut settings = Settings::default();
        settings.ghdl.path = PathBuf::from(self.ghdl_path.unwrap_or_default());
        settings.gtkwave.path = PathBuf::from(self.gtkwave_path.unwrap_or_default());
        if version >= (0, 3) {
            settings.ghdl.guess = self.guess_ghdl_path.unwrap_or(false);
            settings.gtkwave.guess = self.guess_gtkwave_path.unwrap_or(false);
        } else {
            // Paths were always explicit before guessing existed.
            settings.ghdl.guess = false;
            settings.gtkwave.guess = false;
        }
        if version >= (0, 4) {
            if let Some(limit) = self.sim_limit {
                settings.sim_limit_ms = parse_legacy_limit(&limit)?;
            }
            if let Some(limit) = self.proc_limit {
                settings.proc_limit_ms = limit;
            }
        }
        Ok(settings)
    }
}

/// Parse `"<major>.<minor>[.<patch>]"`, ignoring the patch level.
fn parse_version(text: &str) -> Result<(u32, u32), SettingsError> {
    let mut parts = text.trim().split('.');
    let major = parts.next().and_then(|part| part.parse().ok());
    let minor = parts.next().map_or(Some(0), |part| part.parse().ok());
    match (major, minor) {
        (Some(major), Some(minor)) => Ok((major, minor)),
        _ => Err(SettingsError::Version(text.to_string())),
    }
}

/// Legacy limits were stored with their unit, such as `"10ms"`.
fn parse_legacy_limit(text: &str) -> Result<u32, SettingsError> {
    text.trim()
        .strip_suffix("ms")
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| SettingsError::Legacy {
            reason: format!("sim_limit = {text:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_compare_by_major_and_minor() {
        assert_eq!(parse_version("0.9").unwrap(), (0, 9));
        assert_eq!(parse_version("0.4.4").unwrap(), (0, 4));
        assert_eq!(parse_version("1").unwrap(), (1, 0));
        assert!(parse_version("abc").is_err());
        assert!(parse_version("0.x").is_err());
    }

    #[test]
    fn legacy_limit_has_unit_suffix() {
        assert_eq!(parse_legacy_limit("10ms").unwrap(), 10);
        assert_eq!(parse_legacy_limit(" 100 ms").unwrap(), 100);
        assert!(parse_legacy_limit("10").is_err());
    }

    #[test]
    fn standard_selection() {
        assert!(VhdlStandard::Guess.use_vhdl2008(true));
        assert!(!VhdlStandard::Guess.use_vhdl2008(false));
        assert!(!VhdlStandard::Vhdl1993.use_vhdl2008(true));
        assert!(VhdlStandard::Vhdl2008.use_vhdl2008(false));
        assert!(VhdlStandard::try_from(2002).is_err());
    }

    #[test]
    fn check_requires_a_way_to_find_tools() {
        let mut settings = Settings::default();
        assert!(settings.check().is_ok());
        settings.ghdl.guess = false;
        assert!(matches!(settings.check(), Err(SettingsError::MissingGhdl)));
        settings.ghdl.path = PathBuf::from("/opt/ghdl/bin/ghdl");
        settings.gtkwave.guess = false;
        assert!(matches!(settings.check(), Err(SettingsError::MissingGtkwave)));
    }
}
