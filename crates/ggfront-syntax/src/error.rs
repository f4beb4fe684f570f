//! Source loading errors.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a user source file. The message is shown to the user.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be opened or read.
    #[error("ソースファイル {} の読み込みに失敗しました．", .path.display())]
    Read {
        /// Path as given in the project.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
