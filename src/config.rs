//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione del compressore.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri dei driver
//! - Fornisce validazione dei parametri prima di costruire il `Compressor`
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `png_quality_min` / `png_quality_max`: Finestra di qualità pngquant (default: 45-65)
//! - `jpeg_quality`: Qualità massima jpegoptim (0-100, default: 90, 0 = lossless)
//! - `temp_dir`: Scratch directory per i file temporanei (default: `$TMPDIR/compressit`)
//! - `timeout_secs`: Tempo massimo per ogni tool esterno (default: 120, `null` = nessun limite)
//! - `search_path`: Directory in cui cercare i tool (default: `PATH`)
//! - `handlers`: Tabelle gruppo MIME → sottotipo → driver
//!
//! ## Validazione:
//! - Controlla che le qualità siano 0-100 e che min <= max
//! - Controlla che il timeout sia > 0
//!
//! ## Esempio:
//! ```rust
//! use compressit::Config;
//!
//! let config = Config {
//!     jpeg_quality: 0,
//!     timeout_secs: Some(30),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::driver::{DriverKind, DriverSettings};
use crate::error::{CompressError, Result};
use crate::file_manager::TempFileStore;
use crate::handler::image::DEFAULT_SUBTYPES;
use crate::tool_resolver::ToolPathResolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the compression core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// pngquant lower quality bound (0-100)
    pub png_quality_min: u8,
    /// pngquant upper quality bound (0-100)
    pub png_quality_max: u8,
    /// jpegoptim max quality (0-100, 0 = lossless)
    pub jpeg_quality: u8,
    /// Scratch directory (None = system temp dir + "compressit")
    pub temp_dir: Option<PathBuf>,
    /// Per-tool execution limit in seconds (None = wait forever)
    pub timeout_secs: Option<u64>,
    /// Directories searched for tools (None = PATH)
    pub search_path: Option<Vec<PathBuf>>,
    /// MIME group → subtype → driver name
    pub handlers: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        let image_types = DEFAULT_SUBTYPES
            .iter()
            .map(|(subtype, kind)| (subtype.to_string(), kind.name().to_string()))
            .collect();

        let mut handlers = BTreeMap::new();
        handlers.insert("image".to_string(), image_types);

        Self {
            png_quality_min: crate::driver::png::DEFAULT_QUALITY_MIN,
            png_quality_max: crate::driver::png::DEFAULT_QUALITY_MAX,
            jpeg_quality: crate::driver::jpeg::DEFAULT_QUALITY,
            temp_dir: None,
            timeout_secs: Some(120),
            search_path: None,
            handlers,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.png_quality_max > 100 || self.png_quality_min > 100 {
            return Err(CompressError::Config("PNG quality must be between 0 and 100".to_string()));
        }

        if self.png_quality_min > self.png_quality_max {
            return Err(CompressError::Config(format!(
                "PNG quality min ({}) must not exceed max ({})",
                self.png_quality_min, self.png_quality_max
            )));
        }

        if self.jpeg_quality > 100 {
            return Err(CompressError::Config("JPEG quality must be between 0 and 100".to_string()));
        }

        if self.timeout_secs == Some(0) {
            return Err(CompressError::Config("Timeout must be greater than 0".to_string()));
        }

        for subtypes in self.handlers.values() {
            for (subtype, driver) in subtypes {
                if DriverKind::from_name(driver).is_none() {
                    return Err(CompressError::DriverNotFound {
                        subtype: subtype.clone(),
                        driver: driver.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn driver_settings(&self) -> DriverSettings {
        DriverSettings {
            png_quality_min: self.png_quality_min,
            png_quality_max: self.png_quality_max,
            jpeg_quality: self.jpeg_quality,
        }
    }

    pub fn temp_store(&self) -> TempFileStore {
        match self.temp_dir {
            Some(ref dir) => TempFileStore::new(dir),
            None => TempFileStore::default(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn resolver(&self) -> ToolPathResolver {
        match self.search_path {
            Some(ref dirs) => ToolPathResolver::with_search_path(dirs.clone()),
            None => ToolPathResolver::new(),
        }
    }

    /// `<config dir>/compressit/config.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("compressit").join("config.json"))
    }

    /// Load the configuration the CLI asked for.
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present and built-in defaults otherwise.
    pub async fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Self::from_file(path).await
            }
            None => match Self::default_path() {
                Some(path) => Self::from_file(&path).await,
                None => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from file, defaults if it does not exist
    pub async fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
