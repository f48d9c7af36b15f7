//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON della CLI, per
//! l'integrazione con pipeline di upload scritte in altri linguaggi.
//!
//! ## Tipi di messaggi:
//! - `compressed`: Compressione riuscita, con path e statistiche
//! - `skipped`: Nessuna compressione (tool assente, nessun guadagno, tipo non supportato)
//! - `tools`: Report dei tool disponibili
//! - `error`: Errore durante l'elaborazione

use crate::result::CompressionResult;
use serde::Serialize;
use std::path::PathBuf;

/// One line of CLI JSON output
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum JsonMessage {
    #[serde(rename = "compressed")]
    Compressed {
        compressed: bool,
        #[serde(flatten)]
        result: CompressionResult,
    },

    #[serde(rename = "skipped")]
    Skipped {
        compressed: bool,
        source: PathBuf,
    },

    #[serde(rename = "tools")]
    Tools { tools: Vec<ToolAvailability> },

    #[serde(rename = "error")]
    Error {
        message: String,
        details: Option<String>,
    },
}

#[derive(Debug, Serialize)]
pub struct ToolAvailability {
    pub name: String,
    pub available: bool,
    pub install_hint: Option<String>,
}

impl JsonMessage {
    pub fn compressed(result: CompressionResult) -> Self {
        Self::Compressed {
            compressed: true,
            result,
        }
    }

    pub fn skipped(source: PathBuf) -> Self {
        Self::Skipped {
            compressed: false,
            source,
        }
    }

    pub fn error(message: impl Into<String>, details: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            details,
        }
    }

    /// Emit the message as one line on stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }
}
