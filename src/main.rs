use work_hours::config::ServerConfig;
use work_hours::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("⏱  Work Hours Tracker v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening: http://{}/", config.bind_addr());
    eprintln!("   Admin: http://{}/admin/", config.bind_addr());
    eprintln!("   Database: {}", config.db_path.display());
    eprintln!("   Static files: {}", config.static_dir.display());
    eprintln!("   Page size: {}\n", config.page_size);

    web::serve(config).await?;
    Ok(())
}
