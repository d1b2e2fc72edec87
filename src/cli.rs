use clap::Parser;

/// All behaviour is configured through the config file; see
/// `ARTWORK_HEALER_CONFIG` or `./artwork-healer.toml`.
#[derive(Parser)]
#[command(name = "artwork-healer")]
#[command(
    author,
    version,
    about = "Repair missing or broken poster and background artwork in a Plex library"
)]
pub struct Cli {}
