//! Error types for the interception core

use thiserror::Error;

/// Errors raised while resolving symbols or writing the key log.
///
/// None of these ever reach the host process: the exported entry points either
/// abort (unresolvable symbol) or log and carry on.
#[derive(Error, Debug)]
pub enum Error {
    /// The fallback library could not be loaded
    #[error("Failed to load fallback library {library}: {source}")]
    FallbackLoad {
        library: String,
        #[source]
        source: libloading::Error,
    },

    /// Symbol missing from both the process image and the fallback library
    #[error("Cannot find symbol {symbol} in the process or in {library}")]
    SymbolNotFound { symbol: String, library: String },

    /// Key-log line could not be hex encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] hex::FromHexError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
