//! # compressit
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Sceglie una strategia di compressione in base al tipo MIME del file
//! - Esegue il tool esterno adatto (pngquant, jpegoptim, gifsicle) su una copia temporanea
//! - Riporta il risultato solo quando la riduzione di dimensione è verificata
//!
//! ## Architettura dei moduli:
//! - `dispatcher`: Entry point pubblico (`Compressor`)
//! - `handler`: Handler per gruppo MIME (`Image`) e tabelle sottotipo → driver
//! - `driver`: Un driver per ogni tool esterno, con pipeline condivisa
//! - `process` / `platform` / `tool_resolver`: Esecuzione sicura dei comandi esterni
//! - `file_manager`: File temporanei (scratch) e utilità sulle dimensioni
//! - `mime`: Parsing e rilevamento del tipo MIME
//! - `config`: Configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use compressit::{Compressor, Config};
//!
//! # async fn run() -> compressit::Result<()> {
//! let compressor = Compressor::new(Config::default())?;
//! match compressor.compress("upload.png", Some("image/png")).await? {
//!     Some(result) => println!("saved {} at {}", result.savings_label(), result.path.display()),
//!     None => println!("nothing to do"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod file_manager;
pub mod handler;
pub mod json_output;
pub mod mime;
pub mod platform;
pub mod process;
pub mod progress;
pub mod result;
pub mod tool_resolver;
pub mod utils;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use config::Config;
pub use dispatcher::Compressor;
pub use driver::{Driver, DriverKind};
pub use error::{CompressError, Result};
pub use mime::{MagicMimeDetector, MimeDetector, MimeType};
pub use result::{CompressionRequest, CompressionResult};
