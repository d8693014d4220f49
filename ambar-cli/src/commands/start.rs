use clap::Args;

use crate::cli::WaitArgs;

#[derive(Args, Debug)]
pub struct StartArgs {
    #[command(flatten)]
    pub wait: WaitArgs,
}

pub async fn execute(args: StartArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let deployment = global.create_deployment().await?;

    if !args.wait.nowait {
        println!("Waiting for Ambar to start...");
    }
    let report = deployment.start(args.wait.policy()).await?;

    super::print_frontend(&report);
    Ok(())
}
