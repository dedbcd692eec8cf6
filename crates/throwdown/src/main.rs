use clap::Parser;
use throwdown::prelude::*;

/// Rock/paper/scissors lobby server for line-based TCP clients.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 1338)]
    port: u16,
}

fn main() -> Result<(), ThrowdownError> {
    throwdown::logging::init();
    let args = Args::parse();

    let server = ThrowdownServer::builder()
        .host(&args.host)
        .port(args.port)
        .build()?;
    tracing::info!(host = %args.host, port = args.port, "starting");
    server.run()
}
