pub mod core;

pub mod github;
pub mod jira;
pub mod n8n;
pub mod pocketbase;
pub mod quip;
pub mod replicate;
pub mod slack;
pub mod telegram;

use crate::tools::core::DynTool;

/// The full tool catalog, module by module. The registry filters this
/// through the configured module filter at startup.
pub fn catalog() -> Vec<(&'static str, Vec<Box<dyn DynTool>>)> {
    vec![
        ("github", github::tools()),
        ("jira", jira::tools()),
        ("quip", quip::tools()),
        ("n8n", n8n::tools()),
        ("pocketbase", pocketbase::tools()),
        ("replicate", replicate::tools()),
        ("slack", slack::tools()),
        ("telegram", telegram::tools()),
    ]
}
