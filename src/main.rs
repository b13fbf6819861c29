use clap::Parser;
use spooldex::cli::{handle_hash_password, handle_serve, init_tracing, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Serve {
            config,
            data_file,
            bind,
        } => handle_serve(config, data_file, bind),
        Commands::HashPassword { password, stdin } => handle_hash_password(password, stdin),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
