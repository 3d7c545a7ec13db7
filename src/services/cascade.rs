// src/services/cascade.rs

use serde_json::Value;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::DeleteOutcome,
    services::migration::{parse_collection, MigrationEngine},
};

// Remove o cliente e todos os tickets da coleção independente que apontam
// para ele. São duas gravações separadas: aplicação parcial é possível e
// vem explícita no `DeleteOutcome`.
#[derive(Clone)]
pub struct CascadeDeleter {
    repo: CustomerRepository,
    engine: MigrationEngine,
}

impl CascadeDeleter {
    pub fn new(repo: CustomerRepository, engine: MigrationEngine) -> Self {
        Self { repo, engine }
    }

    /// Só uma coleção de clientes ilegível aborta a operação. Qualquer falha
    /// depois disso fica registrada em `errors` e o passo seguinte roda mesmo assim.
    pub fn delete_customer(&self, customer_id: &str) -> Result<DeleteOutcome, AppError> {
        let mut outcome = DeleteOutcome::default();

        // 1. Carrega (já migrado: os IDs são os mesmos que a tela mostrou)
        let raw = self.repo.load_customers()?;
        let mut customers = self
            .engine
            .migrate_collection(raw.as_deref())
            .map_err(|e| AppError::parse(self.repo.customers_key(), e))?
            .customers;

        let before = customers.len();
        customers.retain(|c| c.id != customer_id);

        // Excluir duas vezes não é erro, e nada é gravado
        if customers.len() == before {
            tracing::info!("Cliente {} não existe; nada a excluir", customer_id);
            return Ok(outcome);
        }

        // 2. Grava os clientes. Se falhar, segue para os tickets.
        match self.repo.save_customers(&customers) {
            Ok(()) => outcome.customer_removed = true,
            Err(e) => {
                tracing::warn!("⚠️ Exclusão parcial do cliente {}: {}", customer_id, e);
                outcome.errors.push(e);
            }
        }

        // 3. Tickets que apontam para o cliente
        match self.purge_repairs(customer_id) {
            Ok(removed) => outcome.repairs_removed = removed,
            Err(e) => {
                tracing::warn!("⚠️ Tickets do cliente {} não foram removidos: {}", customer_id, e);
                outcome.errors.push(e);
            }
        }

        tracing::info!(
            "🗑️ Cliente {} excluído (removido: {}, tickets removidos: {}, falhas: {})",
            customer_id,
            outcome.customer_removed,
            outcome.repairs_removed,
            outcome.errors.len()
        );

        Ok(outcome)
    }

    fn purge_repairs(&self, customer_id: &str) -> Result<usize, AppError> {
        // Coleção ausente = zero tickets
        let raw = self.repo.load_repairs()?;
        let mut repairs = parse_collection(raw.as_deref())
            .map_err(|e| AppError::parse(self.repo.repairs_key(), e))?;

        let before = repairs.len();
        repairs.retain(|ticket| !belongs_to(ticket, customer_id));
        let removed = before - repairs.len();

        if removed > 0 {
            self.repo.save_repairs(&repairs)?;
        }

        Ok(removed)
    }
}

fn belongs_to(ticket: &Value, customer_id: &str) -> bool {
    ticket.get("customerId").and_then(Value::as_str) == Some(customer_id)
}
