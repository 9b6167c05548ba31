mod commands;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use commands::util::Context;
use commands::{
    ConfigCmd, HistoryArgs, ImportArgs, ListArgs, PathsArgs, SampleArgs, ScanArgs, SchemaArgs,
    ServeArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "insight-cli", version, about = "Import and browse insight packets")]
struct Cli {
    /// Config file (TOML); falls back to INSIGHT_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the insight database; overrides config and env
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a packet and store it (reads stdin when no source is given)
    Import(ImportArgs),
    /// Show stored insights ordered by date
    History(HistoryArgs),
    /// Dump stored records as JSON
    List(ListArgs),
    /// Delete every stored insight
    Clear,
    /// Print a valid demo packet dated today
    Sample(SampleArgs),
    /// Import the first QR code decoded from a line-oriented scanner feed
    Scan(ScanArgs),
    /// Serve a directory over HTTP on 127.0.0.1 for local testing
    Serve(ServeArgs),
    /// Print effective state/database/log paths (JSON)
    Paths(PathsArgs),
    /// Configuration helpers
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
    /// Print a built-in packet schema in its declarative JSON form
    Schema(SchemaArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
struct CompletionsArgs {
    /// Target shell (bash, zsh, fish, powershell, elvish)
    shell: clap_complete::Shell,
    /// Output directory (writes a file). If not set, prints to stdout.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    let config = match insight_core::discover_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            insight_telemetry::init();
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    };
    insight_telemetry::init_with(
        insight_core::paths::logs_dir(&config).as_deref(),
        config.logging.rotation.as_deref(),
    );

    let ctx = Context::new(config, cli.state_dir);
    if let Err(e) = run(cli.command, &ctx) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Import(args) => commands::import::run(ctx, args),
        Commands::History(args) => commands::history::run(ctx, args),
        Commands::List(args) => commands::history::list(ctx, args),
        Commands::Clear => commands::history::clear(ctx),
        Commands::Sample(args) => commands::sample::run(args),
        Commands::Scan(args) => commands::scan::run(ctx, args),
        Commands::Serve(args) => commands::serve::run(args),
        Commands::Paths(args) => commands::paths::run(ctx, args),
        Commands::Config { cmd } => commands::config::execute(cmd),
        Commands::Schema(args) => commands::schema::run(args),
        Commands::Completions(args) => cmd_completions(args.shell, args.out_dir.as_deref()),
    }
}

fn cmd_completions(shell: clap_complete::Shell, out_dir: Option<&std::path::Path>) -> Result<()> {
    use clap_complete::{generate, generate_to};
    use std::io::stdout;
    let mut cmd = Cli::command();
    let bin = "insight-cli";
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)?;
        let path = generate_to(shell, &mut cmd, bin, dir)?;
        println!("{}", path.display());
    } else {
        generate(shell, &mut cmd, bin, &mut stdout());
    }
    Ok(())
}
