use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod loader;

use commands::convert::ConvertArgs;
use config::LuapyConfig;

#[derive(Parser)]
#[command(name = "luapy")]
#[command(about = "Convert Lua scripts to Python")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    args: ConvertArgs,

    /// Log conversion decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = std::env::current_dir().unwrap_or_default();
    let config = LuapyConfig::load(&root);
    std::process::exit(commands::convert::run(cli.args, &config));
}
