mod config;
mod platform;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = config::Cli::parse();
    let config = config::AppConfig::load(&cli.config)?.with_cli(&cli);
    platform::run_app(config, cli.links)
}
