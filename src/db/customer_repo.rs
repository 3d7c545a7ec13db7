// src/db/customer_repo.rs

use serde_json::Value;
use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::RecordStore,
    models::customer::Customer,
};

// O repositório das duas coleções (clientes e tickets), cada uma na sua chave.
// Só lê e grava texto; interpretar o conteúdo é trabalho dos serviços.
#[derive(Clone)]
pub struct CustomerRepository {
    store: Arc<dyn RecordStore>,
    customers_key: String,
    repairs_key: String,
}

impl CustomerRepository {
    pub fn new(store: Arc<dyn RecordStore>, customers_key: &str, repairs_key: &str) -> Self {
        Self {
            store,
            customers_key: customers_key.to_string(),
            repairs_key: repairs_key.to_string(),
        }
    }

    pub fn customers_key(&self) -> &str {
        &self.customers_key
    }

    pub fn repairs_key(&self) -> &str {
        &self.repairs_key
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub fn load_customers(&self) -> Result<Option<String>, AppError> {
        self.store
            .load(&self.customers_key)
            .map_err(|e| AppError::store_read(&self.customers_key, e))
    }

    pub fn save_customers(&self, customers: &[Customer]) -> Result<(), AppError> {
        let text = serde_json::to_string(customers).map_err(anyhow::Error::from)?;
        self.store
            .save(&self.customers_key, &text)
            .map_err(|e| AppError::store_write(&self.customers_key, e))
    }

    /// Grava só se o texto serializado mudou. Retorna `true` quando gravou.
    pub fn save_customers_if_changed(
        &self,
        customers: &[Customer],
        previous: Option<&str>,
    ) -> Result<bool, AppError> {
        let text = serde_json::to_string(customers).map_err(anyhow::Error::from)?;
        if previous == Some(text.as_str()) {
            return Ok(false);
        }

        self.store
            .save(&self.customers_key, &text)
            .map_err(|e| AppError::store_write(&self.customers_key, e))?;

        Ok(true)
    }

    // =========================================================================
    //  TICKETS (coleção independente, ligada por `customerId`)
    // =========================================================================

    pub fn load_repairs(&self) -> Result<Option<String>, AppError> {
        self.store
            .load(&self.repairs_key)
            .map_err(|e| AppError::store_read(&self.repairs_key, e))
    }

    pub fn save_repairs(&self, repairs: &[Value]) -> Result<(), AppError> {
        let text = serde_json::to_string(repairs).map_err(anyhow::Error::from)?;
        self.store
            .save(&self.repairs_key, &text)
            .map_err(|e| AppError::store_write(&self.repairs_key, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use serde_json::json;

    fn sample_customer() -> Customer {
        Customer {
            id: "3f2b8c1e-9a4d-4e7f-8b21-6c0d5e9a1f34".into(),
            name: None,
            phone: Some("13800138000".into()),
            unit: None,
            community: "阳光花园".into(),
            address: "5-3-502".into(),
            full_address: "阳光花园 5-3-502".into(),
            repair_count: 0,
            last_repair_date: None,
            repairs: vec![],
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn save_if_changed_skips_identical_text() {
        let store = Arc::new(MemoryStore::new());
        let repo = CustomerRepository::new(store.clone(), "customers", "repairs");
        let customers = vec![sample_customer()];

        assert!(repo.save_customers_if_changed(&customers, None).unwrap());
        let stored = store.get("customers");
        assert!(!repo.save_customers_if_changed(&customers, stored.as_deref()).unwrap());
        assert_eq!(store.save_count("customers"), 1);
    }

    #[test]
    fn write_failure_is_attributed_to_its_collection() {
        let store = Arc::new(MemoryStore::new());
        store.fail_saves_for("repairs");
        let repo = CustomerRepository::new(store, "customers", "repairs");

        let err = repo.save_repairs(&[json!({"id": "r1"})]).unwrap_err();
        assert!(matches!(err, AppError::StoreWriteError { ref key, .. } if key == "repairs"));
    }
}
