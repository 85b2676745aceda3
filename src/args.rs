use crate::config::Config;
use clap::{ArgAction, Args};
use std::path::PathBuf;

// Global flags shared across every subcommand.
//
//   -c / --config      Path to a config.toml file
//   --api-url          Base URL of the recruiting API
//   --token            Bearer token
//   --no-stream        Only use the synchronous endpoint
//   --no-color         Disable coloured terminal output
//   -v / --verbose     Debug logging to stderr
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Path to a config.toml file
    #[arg(
        short = 'c',
        long,
        value_name = "PATH",
        env = "HIRESTREAM_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// Base URL of the recruiting API
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token for the API
    #[arg(long, value_name = "TOKEN", global = true)]
    pub token: Option<String>,

    /// Skip streaming and call /chat directly
    #[arg(long = "no-stream", action = ArgAction::SetTrue, global = true)]
    pub no_stream: bool,

    /// Ask the assistant for encouraging replies
    #[arg(long = "encourage", action = ArgAction::SetTrue, global = true)]
    pub encourage: bool,

    /// Disable coloured terminal output
    #[arg(long = "no-color", action = ArgAction::SetTrue, global = true)]
    pub no_color: bool,

    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue, global = true)]
    pub verbose: bool,
}

impl CommonArgs {
    /// Flags win over the config file and environment.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.api_token = Some(token.clone());
        }
        if self.no_stream {
            config.streaming = false;
        }
        if self.encourage {
            config.encouragement_mode = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,
    }

    #[test]
    fn flags_override_config() {
        let cli = TestCli::parse_from([
            "hirestream",
            "--api-url",
            "https://ats.example.com/api",
            "--no-stream",
            "--encourage",
        ]);
        let mut config = Config::default();
        cli.common.apply_overrides(&mut config);

        assert_eq!(config.api_url, "https://ats.example.com/api");
        assert!(!config.streaming);
        assert!(config.encouragement_mode);
        assert!(config.api_token.is_none());
    }

    #[test]
    fn no_flags_leave_config_alone() {
        let cli = TestCli::parse_from(["hirestream"]);
        let mut config = Config::default();
        cli.common.apply_overrides(&mut config);
        assert!(config.streaming);
        assert_eq!(config.api_url, Config::default().api_url);
    }
}
