use anyhow::{bail, Result};

/// Environment variables for module filtering, consulted when the command
/// line passes neither `--include` nor `--exclude`.
pub const INCLUDE_ENV: &str = "TOOLBRIDGE_INCLUDE";
pub const EXCLUDE_ENV: &str = "TOOLBRIDGE_EXCLUDE";

/// Which tool modules the server activates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleFilter {
    /// Every module in the catalog.
    All,
    /// Only the listed modules.
    Include(Vec<String>),
    /// Every module except the listed ones.
    Exclude(Vec<String>),
}

/// One place a filter can come from. Sources are evaluated in a fixed
/// priority order; within a source, include and exclude are mutually
/// exclusive.
pub struct FilterSource {
    /// Display names for this source's include/exclude knobs, used in the
    /// mutual-exclusivity error.
    pub include_name: &'static str,
    pub exclude_name: &'static str,
    pub include: Option<String>,
    pub exclude: Option<String>,
}

impl ModuleFilter {
    /// Resolve the filter from the command line and the environment, command
    /// line first.
    pub fn from_cli_and_env(include: Option<&str>, exclude: Option<&str>) -> Result<Self> {
        let sources = [
            FilterSource {
                include_name: "--include",
                exclude_name: "--exclude",
                include: include.map(str::to_string),
                exclude: exclude.map(str::to_string),
            },
            FilterSource {
                include_name: INCLUDE_ENV,
                exclude_name: EXCLUDE_ENV,
                include: std::env::var(INCLUDE_ENV).ok(),
                exclude: std::env::var(EXCLUDE_ENV).ok(),
            },
        ];
        Self::resolve(&sources)
    }

    /// Walk the sources in priority order; the first one carrying any value
    /// decides the filter and short-circuits the rest. A source is validated
    /// for internal mutual exclusivity at the moment it is consulted, so a
    /// contradictory environment only errors when no command-line flag
    /// shadows it.
    pub fn resolve(sources: &[FilterSource]) -> Result<Self> {
        for source in sources {
            let include = source.include.as_deref().filter(|s| !s.trim().is_empty());
            let exclude = source.exclude.as_deref().filter(|s| !s.trim().is_empty());

            match (include, exclude) {
                (Some(_), Some(_)) => bail!(
                    "{} and {} are mutually exclusive. Use one or the other.",
                    source.include_name,
                    source.exclude_name
                ),
                (Some(list), None) => return Ok(ModuleFilter::Include(parse_module_list(list))),
                (None, Some(list)) => return Ok(ModuleFilter::Exclude(parse_module_list(list))),
                (None, None) => continue,
            }
        }
        Ok(ModuleFilter::All)
    }

    /// Whether a module's tools should be registered.
    ///
    /// Unknown module names in the lists are accepted without complaint:
    /// an include list naming a nonexistent module simply enables nothing
    /// extra, and an exclude entry for one excludes nothing.
    pub fn is_enabled(&self, module: &str) -> bool {
        match self {
            ModuleFilter::All => true,
            ModuleFilter::Include(list) => list.iter().any(|m| m == module),
            ModuleFilter::Exclude(list) => !list.iter().any(|m| m == module),
        }
    }
}

fn parse_module_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(
        include: Option<&str>,
        exclude: Option<&str>,
        names: (&'static str, &'static str),
    ) -> FilterSource {
        FilterSource {
            include_name: names.0,
            exclude_name: names.1,
            include: include.map(str::to_string),
            exclude: exclude.map(str::to_string),
        }
    }

    #[test]
    fn test_no_sources_means_all_enabled() {
        let filter = ModuleFilter::resolve(&[]).unwrap();
        assert_eq!(filter, ModuleFilter::All);
        assert!(filter.is_enabled("github"));
        assert!(filter.is_enabled("anything"));
    }

    #[test]
    fn test_include_list_parsing() {
        let sources = [source(
            Some(" GitHub , slack ,, "),
            None,
            ("--include", "--exclude"),
        )];
        let filter = ModuleFilter::resolve(&sources).unwrap();
        assert_eq!(
            filter,
            ModuleFilter::Include(vec!["github".to_string(), "slack".to_string()])
        );
        assert!(filter.is_enabled("github"));
        assert!(!filter.is_enabled("jira"));
    }

    #[test]
    fn test_exclude_list() {
        let sources = [source(None, Some("telegram"), ("--include", "--exclude"))];
        let filter = ModuleFilter::resolve(&sources).unwrap();
        assert!(!filter.is_enabled("telegram"));
        assert!(filter.is_enabled("slack"));
    }

    #[test]
    fn test_source_internal_mutual_exclusivity() {
        let sources = [source(
            Some("github"),
            Some("slack"),
            ("--include", "--exclude"),
        )];
        let err = ModuleFilter::resolve(&sources).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("--include"));
        assert!(message.contains("--exclude"));
        assert!(message.contains("mutually exclusive"));
    }

    #[test]
    fn test_first_source_wins() {
        let sources = [
            source(Some("github"), None, ("--include", "--exclude")),
            source(None, Some("github"), (INCLUDE_ENV, EXCLUDE_ENV)),
        ];
        let filter = ModuleFilter::resolve(&sources).unwrap();
        assert_eq!(filter, ModuleFilter::Include(vec!["github".to_string()]));
    }

    #[test]
    fn test_empty_source_falls_through() {
        let sources = [
            source(None, None, ("--include", "--exclude")),
            source(Some("jira"), None, (INCLUDE_ENV, EXCLUDE_ENV)),
        ];
        let filter = ModuleFilter::resolve(&sources).unwrap();
        assert_eq!(filter, ModuleFilter::Include(vec!["jira".to_string()]));
    }

    #[test]
    fn test_unknown_module_names_are_accepted() {
        let sources = [source(
            Some("github,not-a-module"),
            None,
            ("--include", "--exclude"),
        )];
        let filter = ModuleFilter::resolve(&sources).unwrap();
        assert!(filter.is_enabled("github"));
        assert!(filter.is_enabled("not-a-module"));
        assert!(!filter.is_enabled("slack"));
    }
}
