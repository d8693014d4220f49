use clap::Args;

#[derive(Args, Debug)]
pub struct UninstallArgs {}

pub async fn execute(_args: UninstallArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let deployment = global.create_deployment().await?;

    let report = deployment.uninstall().await?;
    if report.is_cancelled() {
        println!("Uninstall cancelled, nothing was removed");
        return Ok(());
    }

    super::print_warnings(&report);
    println!(
        "Ambar is uninstalled from {}. You can send your feedback to hello@ambar.cloud.",
        deployment.layout().home_dir().display()
    );
    Ok(())
}
