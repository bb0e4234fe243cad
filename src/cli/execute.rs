use console::Term;
use tracing::info;

use crate::cli::commands::ExecuteArgs;
use crate::engine::ExecutionEngine;
use crate::errors::SondoError;

pub async fn handle_execute(args: ExecuteArgs) -> Result<(), SondoError> {
    let config = args.common.load().await?;
    info!(vendor = %config.vendor, product = %config.product, "Starting execution pass");

    let reset = if args.reset {
        true
    } else if args.keep {
        false
    } else {
        ask_reset()?
    };

    let mut engine = ExecutionEngine::new(&config.base_dir(), config.engine.clone())?;
    let report = engine.run(reset).await?;
    println!(
        "Execution complete: {} scripts run, {} skipped (same prefix), {} hits",
        report.attempted, report.skipped_same_prefix, report.successes
    );

    let verify = engine.verify_successes().await?;
    println!("Verification: {}/{} confirmed", verify.verified, verify.total);
    Ok(())
}

fn ask_reset() -> Result<bool, SondoError> {
    let term = Term::stdout();
    term.write_str("Empty the success set before running? [y/N] ")?;
    let answer = term.read_line()?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
