// [apps/scanner/src/main.rs]
use sentinel_scanner::prelude::*;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    sentinel_shared_telemetry::init_tracing("sentinel_scanner");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let config = ScannerConfig::from_env();
        info!(port = config.http_port, "starting scanning control plane");

        let kernel = ScannerKernel::ignite(config).await;
        kernel.launch().await;
    });

    Ok(())
}
