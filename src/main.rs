use tracing_subscriber::EnvFilter;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    budget_backend::rocket_instance()
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Rocket server failed to launch: {}", e))?;
    Ok(())
}
