use clap::Args;

#[derive(Args, Debug)]
pub struct ResetArgs {}

pub async fn execute(_args: ResetArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let deployment = global.create_deployment().await?;

    let report = deployment.reset().await?;
    if report.is_cancelled() {
        println!("Reset cancelled, nothing was removed");
        return Ok(());
    }

    super::print_warnings(&report);
    println!("Done. To start Ambar use `sudo ambar start`");
    Ok(())
}
