use crate::demo::{run_availability, run_demo, AvailabilityArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use crew_booking::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Crew Booking",
    about = "Run the crew booking service or explore crew availability from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print crew availability for a date, or for a window when --start is given
    Availability(AvailabilityArgs),
    /// Seed the fleet, make sample bookings and print the resulting schedule
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Availability(args) => run_availability(args),
        Command::Demo(args) => run_demo(args),
    }
}
