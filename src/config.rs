// src/config.rs

use anyhow::{bail, Context};
use std::{env, path::PathBuf, sync::Arc};

use crate::{
    db::{CustomerRepository, FileStore, RecordStore},
    services::{CustomerService, MigrationEngine, UuidAllocator},
};

/// Textos usados quando `community` / `address` faltam no registro.
/// Os padrões são os mesmos que já existem nos dados antigos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    pub community: String,
    pub address: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            community: "未指定小区".to_string(),
            address: "未指定地址".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub customers_key: String,
    pub repairs_key: String,
    pub placeholders: Placeholders,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            bind_addr: "0.0.0.0:3000".to_string(),
            customers_key: "customers".to_string(),
            repairs_key: "repairs".to_string(),
            placeholders: Placeholders::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();
        let placeholders = Placeholders {
            community: env_or("PLACEHOLDER_COMMUNITY", &defaults.placeholders.community),
            address: env_or("PLACEHOLDER_ADDRESS", &defaults.placeholders.address),
        };

        // Placeholder vazio quebraria a regra "community/address nunca vazios"
        if placeholders.community.trim().is_empty() || placeholders.address.trim().is_empty() {
            bail!("PLACEHOLDER_COMMUNITY e PLACEHOLDER_ADDRESS não podem ser vazios");
        }

        Ok(Self {
            data_dir: env::var_os("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            bind_addr: env_or("BIND_ADDR", &defaults.bind_addr),
            customers_key: env_or("CUSTOMERS_KEY", &defaults.customers_key),
            repairs_key: env_or("REPAIRS_KEY", &defaults.repairs_key),
            placeholders,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub customer_service: CustomerService,
}

impl AppState {
    /// Monta o estado com o armazenamento em arquivo de `DATA_DIR`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = FileStore::new(&config.data_dir)
            .with_context(|| format!("não foi possível preparar {}", config.data_dir.display()))?;

        tracing::info!("✅ Armazenamento pronto em {}", store.root().display());

        Ok(Self::with_store(config, Arc::new(store)))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_store(config: &Config, store: Arc<dyn RecordStore>) -> Self {
        let repo = CustomerRepository::new(store, &config.customers_key, &config.repairs_key);
        let engine = MigrationEngine::new(Arc::new(UuidAllocator), config.placeholders.clone());
        let customer_service = CustomerService::new(repo, engine);

        Self { customer_service }
    }
}
