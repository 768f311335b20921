//! Documents API - Entry Point

#[tokio::main]
async fn main() -> eyre::Result<()> {
    core_config::tracing::install_color_eyre();
    docs_api::run().await
}
