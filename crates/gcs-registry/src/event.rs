//! Registry change notifications.

/// A change to the Tool Registry's contents.
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    /// A tool was registered for the first time.
    ToolAdded {
        /// The tool's name.
        name: String,
    },
    /// An already-registered tool's definition was replaced.
    ToolUpdated {
        /// The tool's name.
        name: String,
    },
    /// A tool was removed from the registry.
    ToolRemoved {
        /// The tool's name.
        name: String,
    },
}

impl RegistryEvent {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToolAdded { .. } => "tool_added",
            Self::ToolUpdated { .. } => "tool_updated",
            Self::ToolRemoved { .. } => "tool_removed",
        }
    }
}
