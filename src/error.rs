//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della libreria.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` enum per gli errori "duri" (input invalido, configurazione)
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Cosa NON è un errore:
//! Tool mancante, nessuna riduzione di dimensione, tipo MIME non supportato:
//! questi casi producono `Ok(None)` e non passano mai da qui.
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file sorgente illeggibile, scratch dir non scrivibile)
//! - `Detection`: Impossibile rilevare il tipo MIME del file
//! - `InvalidMimeType`: Stringa MIME malformata (es. `"image"` senza sottotipo)
//! - `InvalidCommandName`: Nome tool con caratteri fuori da `[A-Za-z0-9_-]`
//! - `Template`: Numero di placeholder diverso dal numero di argomenti
//! - `ToolFailed`: Il tool esterno è terminato con exit code non zero
//! - `Timeout`: Il tool esterno ha superato il tempo massimo
//! - `DriverNotFound` / `HandlerNotFound`: Tabelle dei tipi mal configurate
//! - `Config`: Parametri di configurazione fuori range
//!
//! ## Esempio:
//! ```rust,ignore
//! if !is_valid_command_name(name) {
//!     return Err(CompressError::InvalidCommandName(name.to_string()));
//! }
//! ```

/// Errors surfaced to callers of the compression core
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("MIME detection failed for {path}: {reason}")]
    Detection { path: String, reason: String },

    #[error("Invalid MIME type: {0:?}")]
    InvalidMimeType(String),

    #[error("Invalid command name {0:?}: use only letters, digits, '-' and '_'")]
    InvalidCommandName(String),

    #[error("Command template error: {0}")]
    Template(String),

    #[error("{tool} exited with status {code:?}: {stderr}")]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} did not finish within {limit:?}")]
    Timeout { tool: String, limit: std::time::Duration },

    #[error("Driver {driver:?} referenced by subtype {subtype:?} does not exist")]
    DriverNotFound { subtype: String, driver: String },

    #[error("No handler implementation for MIME group {0:?}")]
    HandlerNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CompressError>;
