use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "toggl-rofi")]
#[command(about = "Start, stop and continue Toggl Track entries from rofi")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run against Toggl Track (the default)
    Run,
    /// Run in dev mode with local in-memory data
    Dev,
    /// Print config path and create default file if missing
    ConfigPath,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_is_the_default() {
        let cli = Cli::try_parse_from(["toggl-rofi"]).unwrap();
        assert_eq!(cli.command(), Commands::Run);
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["toggl-rofi", "dev"]).unwrap();
        assert_eq!(cli.command(), Commands::Dev);
        let cli = Cli::try_parse_from(["toggl-rofi", "config-path"]).unwrap();
        assert_eq!(cli.command(), Commands::ConfigPath);
        assert!(Cli::try_parse_from(["toggl-rofi", "login"]).is_err());
    }
}
