// src/db/record_store.rs

use std::{
    collections::{HashMap, HashSet},
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("erro de E/S: {0}")]
    Io(#[from] io::Error),

    #[error("chave inválida: '{0}'")]
    InvalidKey(String),

    #[error("armazenamento indisponível: {0}")]
    Unavailable(String),
}

/// Armazenamento chave/valor de texto, injetado no núcleo.
///
/// Nenhuma atomicidade entre duas chaves é garantida: quem grava duas
/// coleções faz duas chamadas e trata cada resultado separadamente.
pub trait RecordStore: Send + Sync {
    /// `Ok(None)` quando a chave não existe (não é erro).
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn save(&self, key: &str, text: &str) -> Result<(), StoreError>;
}

// =========================================================================
//  MEMÓRIA (testes e desenvolvimento)
// =========================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    failing_loads: Mutex<HashSet<String>>,
    failing_saves: Mutex<HashSet<String>>,
    save_counts: Mutex<HashMap<String, usize>>,
}

// Um teste que entrou em pânico não deve envenenar os próximos acessos
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: &str, text: &str) -> Self {
        lock(&self.entries).insert(key.to_string(), text.to_string());
        self
    }

    /// Leituras dessa chave passam a falhar.
    pub fn fail_loads_for(&self, key: &str) {
        lock(&self.failing_loads).insert(key.to_string());
    }

    /// Gravações dessa chave passam a falhar.
    pub fn fail_saves_for(&self, key: &str) {
        lock(&self.failing_saves).insert(key.to_string());
    }

    pub fn clear_failures(&self) {
        lock(&self.failing_loads).clear();
        lock(&self.failing_saves).clear();
    }

    /// Lê direto, sem passar pela injeção de falhas.
    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    /// Quantas gravações bem-sucedidas a chave recebeu.
    pub fn save_count(&self, key: &str) -> usize {
        lock(&self.save_counts).get(key).copied().unwrap_or(0)
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        if lock(&self.failing_loads).contains(key) {
            return Err(StoreError::Unavailable(format!("falha injetada na leitura de '{key}'")));
        }
        Ok(self.get(key))
    }

    fn save(&self, key: &str, text: &str) -> Result<(), StoreError> {
        if lock(&self.failing_saves).contains(key) {
            return Err(StoreError::Unavailable(format!("falha injetada na gravação de '{key}'")));
        }
        lock(&self.entries).insert(key.to_string(), text.to_string());
        *lock(&self.save_counts).entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }
}

// =========================================================================
//  ARQUIVO (um <chave>.json por coleção)
// =========================================================================

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Cria o diretório se ainda não existir.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let acceptable = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !acceptable {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl RecordStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, text: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        // Grava num temporário exclusivo do escritor e renomeia: a chave nunca fica pela metade
        let mut staging = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(".tmp")
            .tempfile_in(&self.root)?;
        staging.write_all(text.as_bytes())?;
        staging.as_file().sync_all()?;
        staging.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_reports_absent_keys_as_none() {
        let store = MemoryStore::new();
        assert!(store.load("customers").unwrap().is_none());
    }

    #[test]
    fn memory_store_injected_save_failure_leaves_value_untouched() {
        let store = MemoryStore::new().with_entry("customers", "[]");
        store.fail_saves_for("customers");

        assert!(store.save("customers", "[1]").is_err());
        assert_eq!(store.get("customers").as_deref(), Some("[]"));
        assert_eq!(store.save_count("customers"), 0);

        store.clear_failures();
        store.save("customers", "[1]").unwrap();
        assert_eq!(store.save_count("customers"), 1);
    }

    #[test]
    fn file_store_round_trips_and_treats_missing_file_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data")).unwrap();

        assert!(store.load("repairs").unwrap().is_none());

        store.save("repairs", r#"[{"id":"r1"}]"#).unwrap();
        assert_eq!(store.load("repairs").unwrap().as_deref(), Some(r#"[{"id":"r1"}]"#));
        assert!(store.root().join("repairs.json").exists());
        let leftovers: Vec<_> = fs::read_dir(store.root())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name.to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temporários sobrando: {leftovers:?}");
    }

    #[test]
    fn file_store_concurrent_saves_to_the_same_key_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::new(dir.path()).unwrap());

        for round in 0..50 {
            let handles: Vec<_> = (0..4)
                .map(|writer| {
                    let store = store.clone();
                    std::thread::spawn(move || store.save("customers", &format!("[{round},{writer}]")))
                })
                .collect();

            for handle in handles {
                handle.join().unwrap().unwrap();
            }

            // Vence um dos escritores, inteiro
            let text = store.load("customers").unwrap().unwrap();
            let written: Vec<u32> = serde_json::from_str(&text).unwrap();
            assert_eq!(written[0], round);
        }
    }

    #[test]
    fn file_store_rejects_keys_that_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert!(matches!(store.save("../etc", "x"), Err(StoreError::InvalidKey(_))));
        assert!(matches!(store.load(""), Err(StoreError::InvalidKey(_))));
    }
}
