// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- CUSTOMERS ---
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::delete_customer,
    ),
    components(
        schemas(
            // --- Clientes ---
            models::customer::Customer,
            models::customer::CustomerPage,
            models::customer::CustomerDetail,
            models::customer::NormalizationWarning,
            models::customer::DeleteOutcome,

            // --- Tickets ---
            models::repair::RepairRow,
            models::repair::StatusTone,
        )
    ),
    tags(
        (name = "Customers", description = "Cadastro de clientes e seus tickets de reparo")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_customer_route() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/customers"));
        assert!(doc.paths.paths.contains_key("/api/customers/{id}"));
    }
}
