//! Configuração do hive-rounds carregada a partir de `hive-rounds.toml`.
//!
//! A struct [`HiveRoundsConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `HIVE_ROUNDS_DATA_DIR` tem precedência sobre o arquivo.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sites::Apiary;
use crate::workflow::RenamePolicy;

const CONFIG_FILE: &str = "hive-rounds.toml";
const DATA_DIR_ENV: &str = "HIVE_ROUNDS_DATA_DIR";

/// Configuração de nível superior carregada de `hive-rounds.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct HiveRoundsConfig {
    /// Diretório onde o armazenamento em arquivos guarda as sessões.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Nível de log padrão quando `RUST_LOG` não está definido.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Em quais estados uma sessão pode ser renomeada.
    #[serde(default)]
    pub rename_policy: RenamePolicy,

    /// Apiários conhecidos e suas colmeias.
    #[serde(default, rename = "apiary")]
    pub apiaries: Vec<Apiary>,
}

// Valor padrão para o diretório de dados: ".hive-rounds".
fn default_data_dir() -> PathBuf {
    PathBuf::from(".hive-rounds")
}

// Valor padrão para o nível de log: "info".
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HiveRoundsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            rename_policy: RenamePolicy::default(),
            apiaries: Vec::new(),
        }
    }
}

impl HiveRoundsConfig {
    /// Carrega a configuração de `hive-rounds.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_or_default(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito, que precisa existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        Ok(Self::read_file(path)?.with_env_overrides())
    }

    // Arquivo implícito: ausência significa valores padrão.
    fn load_or_default(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            Self::read_file(path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    fn read_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str::<HiveRoundsConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    // Variável de ambiente tem precedência sobre o arquivo de configuração.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV)
            && !dir.is_empty()
        {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }
}
