use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "tailgram",
    author,
    version,
    about = "Terminal client for a tailgram relay"
)]
pub struct Cli {
    /// Relay server to connect to (host:port or full URL).
    #[arg(long, env = "TAILGRAM_SERVER", default_value = "127.0.0.1:3000")]
    pub server: String,

    /// Milliseconds between poll cycles.
    #[arg(long, env = "TAILGRAM_POLL_INTERVAL_MS", default_value_t = 1000)]
    pub poll_interval_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_a_local_relay() {
        let cli = Cli::parse_from(["tailgram"]);
        assert_eq!(cli.server, "127.0.0.1:3000");
        assert_eq!(cli.poll_interval_ms, 1000);
    }
}
