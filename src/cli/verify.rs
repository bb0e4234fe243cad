use tracing::info;

use crate::cli::commands::ConfigArgs;
use crate::engine::ExecutionEngine;
use crate::errors::SondoError;

pub async fn handle_verify(args: ConfigArgs) -> Result<(), SondoError> {
    let config = args.load().await?;
    info!(vendor = %config.vendor, product = %config.product, "Re-verifying confirmed scripts");

    let engine = ExecutionEngine::new(&config.base_dir(), config.engine.clone())?;
    let report = engine.verify_successes().await?;
    println!("Verification: {}/{} confirmed", report.verified, report.total);
    Ok(())
}
