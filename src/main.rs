//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use repair_records::{
    build_router,
    config::{AppState, Config},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger (RUST_LOG manda; padrão "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config)?;

    // Migra a coleção já na subida, para os avisos aparecerem no log cedo.
    match app_state.customer_service.load() {
        Ok(report) => tracing::info!(
            "✅ {} clientes carregados ({} avisos de migração)",
            report.customers.len(),
            report.warnings.len()
        ),
        Err(e) => tracing::error!("🔥 Coleção de clientes não pôde ser carregada: {}", e),
    }

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
