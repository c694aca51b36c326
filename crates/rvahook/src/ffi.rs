//! C-compatible entry point called by the host when a process attaches.

use std::ffi::{CStr, c_char, c_int};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::attach::{AttachOutcome, AttachSequencer, DylibBridge};
use crate::config::{DEFAULT_SETTINGS_FILE, Settings};

/// Every step succeeded
pub const ATTACH_OK: c_int = 0;
/// The process is the configuring application
pub const ATTACH_SELF_EXCLUDED: c_int = 1;
/// The sequence already ran in this process
pub const ATTACH_ALREADY_DONE: c_int = 2;
/// The sequence ran, at least one step failed
pub const ATTACH_PARTIAL: c_int = 3;
/// Invalid arguments or an internal fault
pub const ATTACH_ERROR: c_int = -1;

static SEQUENCER: OnceLock<AttachSequencer> = OnceLock::new();

/// Run the attach sequence for `package`.
///
/// Settings are read from `settings_path`, or from `rvahook.toml` in the
/// working directory when it is null.
///
/// # Safety
/// - `package` must be a valid NUL-terminated string
/// - `settings_path` must be a valid NUL-terminated string or null
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rvahook_on_attach(
    package: *const c_char,
    settings_path: *const c_char,
) -> c_int {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rvahook=info")),
        )
        .try_init();

    if package.is_null() {
        error!("rvahook_on_attach called without a package name");
        return ATTACH_ERROR;
    }

    // SAFETY: checked for null, caller guarantees NUL termination
    let package = unsafe { CStr::from_ptr(package) }
        .to_string_lossy()
        .into_owned();
    let settings_path = if settings_path.is_null() {
        PathBuf::from(DEFAULT_SETTINGS_FILE)
    } else {
        // SAFETY: checked for null, caller guarantees NUL termination
        PathBuf::from(unsafe { CStr::from_ptr(settings_path) }.to_string_lossy().as_ref())
    };

    match catch_unwind(AssertUnwindSafe(|| attach(&package, &settings_path))) {
        Ok(code) => code,
        Err(_) => {
            error!("Panic while attaching to {}", package);
            ATTACH_ERROR
        }
    }
}

fn attach(package: &str, settings_path: &Path) -> c_int {
    let sequencer = SEQUENCER
        .get_or_init(|| AttachSequencer::from_settings(&Settings::load_or_default(settings_path)));
    outcome_code(&sequencer.run(package, DylibBridge::new()))
}

fn outcome_code(outcome: &AttachOutcome) -> c_int {
    match outcome {
        AttachOutcome::SelfExcluded => ATTACH_SELF_EXCLUDED,
        AttachOutcome::AlreadyAttached => ATTACH_ALREADY_DONE,
        AttachOutcome::Attached(report) if report.is_complete() => ATTACH_OK,
        AttachOutcome::Attached(_) => ATTACH_PARTIAL,
    }
}
