use clap::Parser;

fn main() {
    // Load .env early; ignore if missing.
    dotenvy::dotenv().ok();

    let cli = sqlvis::Cli::parse();
    if let Err(err) = sqlvis::run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
