use ambar::{ConfigSource, InstallOptions};
use ambar_shared::constants::urls;
use clap::Args;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Use config.json already present in the home directory
    #[arg(long)]
    pub use_local_config: bool,

    /// URL of the configuration file
    #[arg(
        long,
        value_name = "URL",
        default_value = urls::DEFAULT_CONFIG,
        conflicts_with = "use_local_config"
    )]
    pub config_url: String,
}

pub async fn execute(args: InstallArgs, global: &crate::cli::GlobalFlags) -> anyhow::Result<()> {
    let deployment = global.create_deployment().await?;

    let source = if args.use_local_config {
        ConfigSource::Local
    } else {
        ConfigSource::Remote(args.config_url)
    };
    let detected_address = ambar::util::machine_address().await;

    deployment
        .install(InstallOptions {
            source,
            detected_address,
        })
        .await?;

    println!("Ambar installed successfully! Run `sudo ambar start` to start Ambar");
    Ok(())
}
