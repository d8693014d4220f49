mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

const BANNER: &str = r"
    _    __  __ ___   _   ___
   /_\  |  \/  | _ ) /_\ | _ \
  / _ \ | |\/| | _ \/ _ \|   /
 /_/ \_\|_|  |_|___/_/ \_\_|_\
";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    println!("{BANNER}");
    println!("ambar {}\n", env!("CARGO_PKG_VERSION"));

    let directive = if cli.global.verbose { "info" } else { "warn" };
    let _log_guard = ambar::util::init_logging(Some(&cli.global.layout().logs_dir()), directive);

    match cli.command {
        Commands::Install(args) => commands::install::execute(args, &cli.global).await,
        Commands::Start(args) => commands::start::execute(args, &cli.global).await,
        Commands::Stop(args) => commands::stop::execute(args, &cli.global).await,
        Commands::Restart(args) => commands::restart::execute(args, &cli.global).await,
        Commands::Update(args) => commands::update::execute(args, &cli.global).await,
        Commands::Reset(args) => commands::reset::execute(args, &cli.global).await,
        Commands::Uninstall(args) => commands::uninstall::execute(args, &cli.global).await,
    }
}
