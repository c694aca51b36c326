use std::collections::BTreeSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use strum::Display;
use tracing::{info, warn};

use super::bridge::NativeBridge;
use super::ledger::PackageLedger;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::offset::format_offsets;
use crate::store::{ConfigStore, HookConfig};

/// Progress of one attach sequence.
///
/// A failed step records its failure state and the sequence moves on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AttachState {
    Idle,
    LibraryLoaded,
    LibraryLoadFailed,
    NativeInitialized,
    InitFailed,
    TargetsPushed,
    PushFailed,
}

/// Steps in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AttachStep {
    #[strum(serialize = "load library")]
    LoadLibrary,
    #[strum(serialize = "native init")]
    Init,
    #[strum(serialize = "push targets")]
    PushTargets,
    #[strum(serialize = "push dump mode")]
    PushDumpMode,
}

/// Outcome of every step of a completed attach sequence.
#[derive(Debug)]
pub struct AttachReport {
    pub package: String,
    pub library: Result<()>,
    pub init: Result<()>,
    pub targets: Result<()>,
    pub dump_mode: Result<()>,
    /// Configuration read for this attach event, if the read succeeded
    pub config: Option<HookConfig>,
    /// Packages known to have attached, this one included
    pub enabled_packages: BTreeSet<String>,
    /// States entered, starting with `Idle`
    pub trace: Vec<AttachState>,
}

impl AttachReport {
    /// Last state reached.
    pub fn state(&self) -> AttachState {
        self.trace.last().copied().unwrap_or(AttachState::Idle)
    }

    /// Each step with its outcome, in execution order.
    pub fn steps(&self) -> [(AttachStep, &Result<()>); 4] {
        [
            (AttachStep::LoadLibrary, &self.library),
            (AttachStep::Init, &self.init),
            (AttachStep::PushTargets, &self.targets),
            (AttachStep::PushDumpMode, &self.dump_mode),
        ]
    }

    pub fn is_complete(&self) -> bool {
        self.steps().iter().all(|(_, outcome)| outcome.is_ok())
    }
}

#[derive(Debug)]
pub enum AttachOutcome {
    /// The package is the configuring application itself.
    SelfExcluded,
    /// This sequencer already ran in this process.
    AlreadyAttached,
    Attached(AttachReport),
}

/// Runs the attach sequence at most once per process.
///
/// 1. load the native library
/// 2. native init
/// 3. read the configuration and push the complete target list
/// 4. push the dump mode flag from the same read
///
/// No step short-circuits the next one and nothing is retried.
#[derive(Debug)]
pub struct AttachSequencer {
    self_package: String,
    library_name: String,
    store: ConfigStore,
    ledger: PackageLedger,
    attached: AtomicBool,
}

impl AttachSequencer {
    pub fn new<S, L>(self_package: S, library_name: L, store: ConfigStore) -> Self
    where
        S: Into<String>,
        L: Into<String>,
    {
        Self {
            self_package: self_package.into(),
            library_name: library_name.into(),
            store,
            ledger: PackageLedger::in_memory(),
            attached: AtomicBool::new(false),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.self_package.clone(),
            settings.native_library.clone(),
            settings.config_store(),
        )
        .with_ledger(settings.ledger())
    }

    pub fn with_ledger(mut self, ledger: PackageLedger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Handle the attach event for `package`.
    pub fn run<B: NativeBridge>(&self, package: &str, mut bridge: B) -> AttachOutcome {
        if package == self.self_package {
            return AttachOutcome::SelfExcluded;
        }
        if self.attached.swap(true, Ordering::SeqCst) {
            return AttachOutcome::AlreadyAttached;
        }

        info!("Attaching to {}", package);

        let enabled_packages = self.ledger.mark(package);
        if enabled_packages.len() > 1 {
            warn!(
                "Several packages are selected for hooking ({}); only {} is hooked in this process",
                enabled_packages.iter().cloned().collect::<Vec<_>>().join(", "),
                package
            );
        }

        let mut trace = vec![AttachState::Idle];

        let library = guarded(AttachStep::LoadLibrary, || {
            bridge.load_library(&self.library_name)
        });
        trace.push(if library.is_ok() {
            AttachState::LibraryLoaded
        } else {
            AttachState::LibraryLoadFailed
        });

        let init = guarded(AttachStep::Init, || bridge.init());
        trace.push(if init.is_ok() {
            AttachState::NativeInitialized
        } else {
            AttachState::InitFailed
        });

        // fresh read for every attach event
        let snapshot = self.store.try_load_config();

        let targets = match &snapshot {
            Ok(config) => guarded(AttachStep::PushTargets, || {
                bridge.update_targets(&config.targets)
            }),
            Err(e) => Err(Error::RelayUnavailable(e.to_string())),
        };
        trace.push(if targets.is_ok() {
            AttachState::TargetsPushed
        } else {
            AttachState::PushFailed
        });

        let dump_mode = match &snapshot {
            Ok(config) => guarded(AttachStep::PushDumpMode, || {
                bridge.set_dump_mode(config.dump_mode)
            }),
            Err(e) => Err(Error::RelayUnavailable(e.to_string())),
        };

        let report = AttachReport {
            package: package.to_string(),
            library,
            init,
            targets,
            dump_mode,
            config: snapshot.ok(),
            enabled_packages,
            trace,
        };
        log_report(&report, &self.library_name);
        AttachOutcome::Attached(report)
    }
}

/// Run one step, turning a panic in the bridge into a step failure.
fn guarded<F>(step: AttachStep, call: F) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|_| {
        Err(Error::NativeCallPanicked(match step {
            AttachStep::LoadLibrary => "load_library",
            AttachStep::Init => "init",
            AttachStep::PushTargets => "update_targets",
            AttachStep::PushDumpMode => "set_dump_mode",
        }))
    })
}

fn log_report(report: &AttachReport, library_name: &str) {
    for (step, outcome) in report.steps() {
        match outcome {
            Ok(()) => match step {
                AttachStep::LoadLibrary => info!("{} loaded", library_name),
                AttachStep::PushTargets => info!(
                    "Pushed targets -> [{}]",
                    report
                        .config
                        .as_ref()
                        .map(|c| format_offsets(&c.targets).join(", "))
                        .unwrap_or_default()
                ),
                _ => info!("{} done", step),
            },
            Err(e) => warn!("{} failed: {}", step, e),
        }
    }
}
