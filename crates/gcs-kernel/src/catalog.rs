//! The built-in local-tool catalog: the fixed set of tool names a
//! configuration manifest's `tools` list may reference.

use gcs_core::ToolDefinition;
use gcs_demo_tools::{DnsLookupTool, WebsiteCheckTool};
use gcs_execution::LocalToolHandler;
use std::sync::Arc;

/// Resolve a manifest tool name to its definition and handler, or `None` if
/// the name is not in the built-in catalog.
#[must_use]
pub(crate) fn builtin_tool(name: &str) -> Option<(ToolDefinition, Arc<dyn LocalToolHandler>)> {
    match name {
        "website_check" => Some((WebsiteCheckTool::definition(), Arc::new(WebsiteCheckTool::new()))),
        "dns_lookup" => Some((DnsLookupTool::definition(), Arc::new(DnsLookupTool))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_names_resolve() {
        assert!(builtin_tool("website_check").is_some());
        assert!(builtin_tool("dns_lookup").is_some());
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(builtin_tool("does_not_exist").is_none());
    }
}
