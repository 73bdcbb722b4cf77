use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use uniqueid::{KeyRegistry, MachineId, SnowflakeGenerator, WallClock};

/// Clock used by the local generator.
pub type Clock = WallClock;

/// The local Snowflake generator served by this binary.
pub type Generator = SnowflakeGenerator<Clock>;

/// Log output format for the console subscriber.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Runtime configuration for the `uniqueid-server` binary.
///
/// All values are parsed from CLI arguments or environment variables. A `.env`
/// file in the working directory is loaded first, so any of the variables
/// below may also live there.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "uniqueid-server",
    version,
    about = "An HTTP service for Snowflake and shared-counter IDs"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Machine ID embedded in every Snowflake ID from this instance.
    ///
    /// Must be in `0..=1023` and unique across every instance that shares an
    /// ID namespace. Two instances with the same machine ID can produce
    /// duplicate IDs.
    ///
    /// Environment variable: `MACHINE_ID`
    #[arg(long, env = "MACHINE_ID", allow_negative_numbers = true)]
    pub machine_id: i64,

    /// Comma-separated list of accepted partition keys, e.g. `ORDER,USER`.
    ///
    /// Matching is case-sensitive.
    ///
    /// Environment variable: `VALID_KEY_PREFIXES`
    #[arg(long, env = "VALID_KEY_PREFIXES")]
    pub valid_key_prefixes: String,

    /// Enable the Redis-backed shared-counter route.
    ///
    /// Environment variable: `ENABLE_REDIS`
    #[arg(long, env = "ENABLE_REDIS", default_value_t = false)]
    pub enable_redis: bool,

    /// Redis connection URL, used only when `--enable-redis` is set.
    ///
    /// Environment variable: `REDIS_URL`
    #[arg(long, env = "REDIS_URL", default_value_t = String::from("redis://127.0.0.1:6379"))]
    pub redis_url: String,

    /// Largest backwards clock jump, in milliseconds, that the local generator
    /// waits out instead of failing. `0` rejects every backwards jump.
    ///
    /// Environment variable: `MAX_CLOCK_SKEW_MS`
    #[arg(long, env = "MAX_CLOCK_SKEW_MS", default_value_t = 0)]
    pub max_clock_skew_ms: u64,

    /// Console log format.
    ///
    /// Environment variable: `LOG_FORMAT`
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub machine_id: MachineId,
    pub key_registry: KeyRegistry,
    pub enable_redis: bool,
    pub redis_url: String,
    pub max_clock_skew_ms: u64,
    pub log_format: LogFormat,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let machine_id = MachineId::try_from(args.machine_id).context("invalid MACHINE_ID")?;

        let key_registry: KeyRegistry = args
            .valid_key_prefixes
            .parse()
            .context("invalid VALID_KEY_PREFIXES")?;

        if args.enable_redis && args.redis_url.trim().is_empty() {
            bail!("REDIS_URL must be set when ENABLE_REDIS is true");
        }

        Ok(Self {
            server_addr: args.server_addr,
            machine_id,
            key_registry,
            enable_redis: args.enable_redis,
            redis_url: args.redis_url,
            max_clock_skew_ms: args.max_clock_skew_ms,
            log_format: args.log_format,
        })
    }
}

impl ServerConfig {
    /// Builds the local generator described by this configuration.
    pub fn generator(&self) -> Generator {
        Generator::new(self.machine_id, Clock::new()).with_max_backward_skew(self.max_clock_skew_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> anyhow::Result<ServerConfig> {
        let mut argv = vec!["uniqueid-server"];
        argv.extend_from_slice(extra);
        let args = CliArgs::try_parse_from(argv)?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn minimal_arguments_use_defaults() {
        let config = parse(&["--machine-id", "1", "--valid-key-prefixes", "ORDER,USER"]).unwrap();
        assert_eq!(config.machine_id.get(), 1);
        assert_eq!(config.key_registry.prefixes(), ["ORDER", "USER"]);
        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert!(!config.enable_redis);
        assert_eq!(config.max_clock_skew_ms, 0);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn machine_id_out_of_range_is_rejected() {
        let err = parse(&["--machine-id", "1024", "--valid-key-prefixes", "ORDER"]).unwrap_err();
        assert!(format!("{err:#}").contains("Machine ID must be between 0 and 1023"));

        assert!(parse(&["--machine-id", "-1", "--valid-key-prefixes", "ORDER"]).is_err());
        assert!(parse(&["--machine-id", "1023", "--valid-key-prefixes", "ORDER"]).is_ok());
    }

    #[test]
    fn empty_key_prefix_entry_is_rejected() {
        assert!(parse(&["--machine-id", "1", "--valid-key-prefixes", "ORDER,,USER"]).is_err());
        assert!(parse(&["--machine-id", "1", "--valid-key-prefixes", ""]).is_err());
    }

    #[test]
    fn generator_carries_machine_id_and_tolerance() {
        let config = parse(&[
            "--machine-id",
            "42",
            "--valid-key-prefixes",
            "ORDER",
            "--max-clock-skew-ms",
            "5",
            "--log-format",
            "json",
        ])
        .unwrap();
        let generator = config.generator();
        assert_eq!(generator.machine_id().get(), 42);
        assert_eq!(generator.max_backward_skew(), 5);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
