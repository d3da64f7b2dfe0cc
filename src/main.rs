use clap::Parser;

use mergelog::{Result, cli, command, config::Config};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("mergelog")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli_args = cli::Args::parse();

    initialize_logger(cli_args.debug)?;

    let config = Config::load(cli_args.config.as_deref())?;

    match &cli_args.command {
        cli::Command::Serve { bind } => {
            command::serve::execute(&config, bind.as_deref()).await
        }
        cli::Command::Generate(args) => {
            command::generate::execute(&config, args).await
        }
        cli::Command::Check(args) => {
            command::check::execute(&config, args).await
        }
    }
}
