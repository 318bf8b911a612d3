//! Exposes the settings used to configure a [`Framegraph`](crate::Framegraph).

/// Settings that control how a framegraph compiles and executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramegraphSettings {
    /// Name of the graph. Used in log output.
    pub name: String,
    /// Remove tasks and resources that do not contribute to any observable output. When disabled,
    /// every registered task is scheduled.
    pub culling: bool,
    /// Only allow task executors to access resources they declared during setup.
    pub check_access: bool,
}

impl Default for FramegraphSettings {
    fn default() -> Self {
        SettingsBuilder::new().build()
    }
}

/// The settings builder is a convenience struct to easily create [`FramegraphSettings`].
///
/// For information about each of the fields, see [`FramegraphSettings`].
/// # Example
/// ```
/// # use framegraph::*;
/// let settings = SettingsBuilder::new()
///     .name("main")
///     .culling(false)
///     .build();
/// assert!(!settings.culling);
/// ```
#[derive(Debug)]
pub struct SettingsBuilder {
    inner: FramegraphSettings,
}

impl SettingsBuilder {
    /// Create a new settings builder with default settings.
    pub fn new() -> Self {
        SettingsBuilder {
            inner: FramegraphSettings {
                name: String::from("framegraph"),
                culling: true,
                check_access: true,
            },
        }
    }

    /// Sets the graph name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    /// Enable or disable dead task elimination.
    pub fn culling(mut self, enabled: bool) -> Self {
        self.inner.culling = enabled;
        self
    }

    /// Enable or disable access checks on physical resources inside task executors.
    pub fn check_access(mut self, enabled: bool) -> Self {
        self.inner.check_access = enabled;
        self
    }

    /// Build the resulting settings.
    pub fn build(self) -> FramegraphSettings {
        self.inner
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
