use crate::error::Result;

/// Calls into the native instrumentation layer.
///
/// Every call is fallible and independent: a bridge must be able to attempt
/// `init` or `update_targets` even when `load_library` failed, letting the
/// call itself report whatever is missing.
pub trait NativeBridge {
    /// Load the instrumentation library by name.
    fn load_library(&mut self, name: &str) -> Result<()>;

    /// One-time native initialization.
    fn init(&mut self) -> Result<()>;

    /// Replace the native target table with `targets`.
    fn update_targets(&mut self, targets: &[u64]) -> Result<()>;

    /// Switch between dump-only and live interception.
    ///
    /// Bridges whose native layer has no mode switch accept and ignore it.
    fn set_dump_mode(&mut self, enabled: bool) -> Result<()> {
        let _ = enabled;
        Ok(())
    }
}

impl<B: NativeBridge + ?Sized> NativeBridge for &mut B {
    fn load_library(&mut self, name: &str) -> Result<()> {
        (**self).load_library(name)
    }

    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn update_targets(&mut self, targets: &[u64]) -> Result<()> {
        (**self).update_targets(targets)
    }

    fn set_dump_mode(&mut self, enabled: bool) -> Result<()> {
        (**self).set_dump_mode(enabled)
    }
}
