use clap::Parser;

/// Define the application arguments
#[derive(Parser, Debug)]
#[command(version, about = "MCP server exposing external SaaS APIs as tools", long_about = None)]
pub struct Args {
    /// Comma-separated list of modules to enable (e.g. 'github,slack').
    /// Mutually exclusive with --exclude; takes precedence over
    /// TOOLBRIDGE_INCLUDE / TOOLBRIDGE_EXCLUDE.
    #[arg(long, value_name = "MODULES")]
    pub include: Option<String>,

    /// Comma-separated list of modules to disable (e.g. 'pocketbase').
    /// Mutually exclusive with --include.
    #[arg(long, value_name = "MODULES")]
    pub exclude: Option<String>,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn parse() -> Self {
        <Args as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_args_parsing() {
        let args = Args::try_parse_from(["toolbridge"]).expect("Failed to parse default args");
        assert!(args.include.is_none());
        assert!(args.exclude.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_include_flag() {
        let args = Args::try_parse_from(["toolbridge", "--include", "github,slack"])
            .expect("Failed to parse include args");
        assert_eq!(args.include.as_deref(), Some("github,slack"));
    }

    #[test]
    fn test_verbose_flag_counting() {
        let args = Args::try_parse_from(["toolbridge", "-vv"]).expect("Failed to parse verbose");
        assert_eq!(args.verbose, 2);
    }
}
