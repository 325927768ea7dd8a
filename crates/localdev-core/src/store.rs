use anyhow::Result;

use crate::OverrideState;

/// Persisted state the toggle engine reads and rewrites.
///
/// Implementations must make each write atomic on its own; the engine
/// restores the previous override record when the active-set write that
/// follows it fails.
pub trait SwitchStateStore {
    /// Structurally complete record even when nothing was persisted yet.
    fn read_overrides(&self) -> Result<OverrideState>;

    fn write_overrides(&self, state: &OverrideState) -> Result<()>;

    fn read_active_plugins(&self) -> Result<Vec<String>>;

    fn write_active_plugins(&self, plugins: &[String]) -> Result<()>;

    fn read_active_theme(&self) -> Result<Option<String>>;

    fn set_active_theme(&self, theme: &str) -> Result<()>;

    /// Runs one read-modify-write of overrides and active state. Stores shared
    /// between processes claim an exclusive marker here.
    fn with_exclusive<T, F>(&self, _operation: &str, run: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        run()
    }
}
