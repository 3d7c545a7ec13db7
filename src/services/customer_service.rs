// src/services/customer_service.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::{CustomerDetail, CustomerFilter, CustomerPage, DeleteOutcome, LoadReport},
    services::{cascade::CascadeDeleter, migration::MigrationEngine, repair_index},
};

// IDs que chegam de links quebrados na tela
const BROKEN_LINK_IDS: [&str; 2] = ["undefined", "null"];

// Toda operação lê, altera e grava. O `gate` faz as requisições deste
// processo passarem uma de cada vez; outro processo no mesmo DATA_DIR
// ainda exigiria um contador de revisão.
#[derive(Clone)]
pub struct CustomerService {
    repo: CustomerRepository,
    engine: MigrationEngine,
    deleter: CascadeDeleter,
    gate: Arc<Mutex<()>>,
}

impl CustomerService {
    pub fn new(repo: CustomerRepository, engine: MigrationEngine) -> Self {
        let deleter = CascadeDeleter::new(repo.clone(), engine.clone());
        Self { repo, engine, deleter, gate: Arc::new(Mutex::new(())) }
    }

    // O `()` não guarda estado, então um pânico anterior não deixa nada inconsistente
    fn exclusive(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    //  1. CARGA (com migração e regravação)
    // =========================================================================

    /// Lê, migra e devolve a coleção. A regravação é "melhor esforço":
    /// se falhar, só loga; o resultado em memória continua valendo.
    pub fn load(&self) -> Result<LoadReport, AppError> {
        let _turn = self.exclusive();
        self.load_and_repair()
    }

    fn load_and_repair(&self) -> Result<LoadReport, AppError> {
        let raw = self.repo.load_customers()?;
        let report = self
            .engine
            .migrate_collection(raw.as_deref())
            .map_err(|e| AppError::parse(self.repo.customers_key(), e))?;

        // Nada gravado ainda: não cria a chave só para gravar "[]"
        if raw.is_some() {
            match self.repo.save_customers_if_changed(&report.customers, raw.as_deref()) {
                Ok(true) => tracing::info!(
                    "✅ Coleção migrada regravada ({} clientes, {} avisos)",
                    report.customers.len(),
                    report.warnings.len()
                ),
                Ok(false) => {}
                Err(e) => tracing::warn!("⚠️ Falha ao salvar dados migrados: {}", e),
            }
        }

        Ok(report)
    }

    // =========================================================================
    //  2. CONSULTAS
    // =========================================================================

    pub fn find_customer(&self, customer_id: &str) -> Result<CustomerDetail, AppError> {
        let customer_id = customer_id.trim();
        if customer_id.is_empty() || BROKEN_LINK_IDS.contains(&customer_id) {
            return Err(AppError::InvalidCustomerId);
        }

        let _turn = self.exclusive();
        let LoadReport { customers, warnings } = self.load_and_repair()?;

        let customer = customers
            .into_iter()
            .find(|c| c.id == customer_id)
            .ok_or_else(|| AppError::CustomerNotFound(customer_id.to_string()))?;

        Ok(CustomerDetail {
            repairs: repair_index::display_rows(&customer.repairs),
            customer,
            warnings,
        })
    }

    pub fn list_customers(&self, filter: &CustomerFilter) -> Result<CustomerPage, AppError> {
        let _turn = self.exclusive();
        let LoadReport { customers, warnings } = self.load_and_repair()?;
        let total = customers.len();

        let customers: Vec<_> = customers.into_iter().filter(|c| filter.matches(c)).collect();

        Ok(CustomerPage {
            matched: customers.len(),
            customers,
            total,
            warnings,
        })
    }

    // =========================================================================
    //  3. EXCLUSÃO EM CASCATA
    // =========================================================================

    pub fn delete_customer(&self, customer_id: &str) -> Result<DeleteOutcome, AppError> {
        let customer_id = customer_id.trim();
        if customer_id.is_empty() || BROKEN_LINK_IDS.contains(&customer_id) {
            return Err(AppError::InvalidCustomerId);
        }

        let _turn = self.exclusive();
        self.deleter.delete_customer(customer_id)
    }
}
