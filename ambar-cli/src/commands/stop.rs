use clap::Args;

#[derive(Args, Debug)]
pub struct StopArgs {}

pub async fn execute(_args: StopArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let deployment = global.create_deployment().await?;

    println!("Stopping Ambar...");
    let report = deployment.stop().await?;

    super::print_warnings(&report);
    println!("Ambar is stopped");
    Ok(())
}
