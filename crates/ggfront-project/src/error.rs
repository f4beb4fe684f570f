//! Error types of the project services.
//!
//! Display strings are the messages shown to the user.

use std::io;
use std::path::PathBuf;

use ggfront_syntax::SourceError;
use smol_str::SmolStr;
use thiserror::Error;

/// Failure while preparing or reading back the working directory.
#[derive(Debug, Error)]
pub enum StageError {
    /// The working directory could not be created or cleaned.
    #[error("作業ディレクトリ {} の準備に失敗しました．", .path.display())]
    Prepare {
        /// Working directory.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A rewritten source could not be written.
    #[error("一時ファイル {internal} の書き込みに失敗しました．")]
    WriteSource {
        /// Sandboxed name of the source.
        internal: SmolStr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A data file could not be copied into or out of the working directory.
    #[error("ファイル {opened_by} から開かれるファイル {file_name} のコピーに失敗しました．")]
    CopyData {
        /// File name of the source that opens the data file.
        opened_by: String,
        /// File name of the data file.
        file_name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Failure while postprocessing a simulation trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace produced by the simulator could not be read.
    #[error("波形ファイル {} の読み込みに失敗しました．", .path.display())]
    Read {
        /// Trace path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The rewritten trace could not be written.
    #[error("波形ファイルの {} への書き込みに失敗しました．", .path.display())]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Failure while loading, validating or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("設定ファイル {} の読み込みに失敗しました．", .path.display())]
    Read {
        /// Settings path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The settings file is not valid TOML for any known layout.
    #[error("設定ファイルのロードに失敗しました．形式が正しくありません．")]
    Parse {
        /// Settings path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },

    /// The `version` field is not a version number.
    #[error("設定ファイルのバージョン {0} を解釈できません．")]
    Version(String),

    /// A legacy settings file could not be migrated.
    #[error("旧バージョンの GGFront からの設定ファイルの読み取りに失敗しました．({reason})")]
    Legacy {
        /// What was wrong with the legacy content.
        reason: String,
    },

    /// The settings could not be encoded.
    #[error("設定ファイルのセーブ中にエラーが発生しました．\nエラー内容: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The settings file could not be written.
    #[error("設定ファイルのセーブ中にエラーが発生しました．\nエラー内容: {source}")]
    Save {
        /// Settings path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// No GHDL path and no request to guess it.
    #[error("GHDLのパスが指定されていません．")]
    MissingGhdl,

    /// No GTKWave path and no request to guess it.
    #[error("GTKWaveのパスが指定されていません．")]
    MissingGtkwave,
}

/// Failure while loading a project.
#[derive(Debug, Error)]
pub enum ProjectError {
    /// The project file could not be read.
    #[error("プロジェクトファイル {} の読み込みに失敗しました．", .path.display())]
    Read {
        /// Project path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The project file is not valid TOML.
    #[error("プロジェクトファイル {} の形式が正しくありません．", .path.display())]
    Parse {
        /// Project path.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: toml::de::Error,
    },

    /// A source entry is not a valid glob pattern.
    #[error("ソースの指定 {pattern} が正しくありません．")]
    Pattern {
        /// The offending entry.
        pattern: String,
        /// Glob parser error.
        #[source]
        source: glob::PatternError,
    },

    /// The project names no source files.
    #[error("ソースファイルが指定されていません．")]
    NoSources,
}

/// Failure to launch or supervise an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The configured executable does not exist.
    #[error("{name} が {} に見つかりません．\n設定ファイルで実行ファイルのパスを適切に設定してください．", .dir.display())]
    NotFound {
        /// Executable file name.
        name: String,
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// The process could not be started or waited on.
    #[error("{name} の起動中にエラーが発生しました．\nエラー:{source}")]
    Launch {
        /// Executable file name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The process exceeded the configured time limit and was killed.
    #[error("GHDLが指定した時間内に終了しなかったため，強制停止しました．\n再度試すか，無限ループとなる記述がないか確認してください．")]
    TimedOut,
}

/// Failure that aborts a compile-and-simulate request.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Settings failed validation.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// A source could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Staging files failed.
    #[error(transparent)]
    Stage(#[from] StageError),

    /// Trace postprocessing failed.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// The external tool failed to run.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The hierarchy has no usable top module.
    #[error("Hierarchy リストに表示された問題を解決してください．")]
    NoTop,
}
