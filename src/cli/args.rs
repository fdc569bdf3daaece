use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "rehearse")]
#[command(about = "Mock interview rehearsal service", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// List the interview questions the service will ask
    Questions,
    /// Query a running service for its session status
    Status(StatusCliArgs),
}

#[derive(ClapArgs, Debug)]
pub struct StatusCliArgs {
    /// Port the service is listening on (defaults to the configured port)
    #[arg(short, long)]
    pub port: Option<u16>,
}
