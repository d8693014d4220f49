use clap::Args;

use crate::cli::WaitArgs;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub wait: WaitArgs,
}

pub async fn execute(args: UpdateArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let deployment = global.create_deployment().await?;

    println!("Updating Ambar...");
    let report = deployment.update(args.wait.policy()).await?;

    super::print_warnings(&report);
    super::print_frontend(&report);
    Ok(())
}
