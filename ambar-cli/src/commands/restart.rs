use clap::Args;

use crate::cli::WaitArgs;

#[derive(Args, Debug)]
pub struct RestartArgs {
    #[command(flatten)]
    pub wait: WaitArgs,
}

pub async fn execute(args: RestartArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let deployment = global.create_deployment().await?;

    println!("Restarting Ambar...");
    let report = deployment.restart(args.wait.policy()).await?;

    // Stop failures do not prevent the start
    super::print_warnings(&report);
    super::print_frontend(&report);
    Ok(())
}
