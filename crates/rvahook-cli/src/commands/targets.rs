//! Targets command implementation.

use anyhow::{Context, Result, bail};
use rvahook::{Settings, TargetList, format_offset, parse_offset};

use crate::cli::TargetsAction;

/// Apply an edit to the stored target list and print the result
pub fn run(settings: &Settings, action: TargetsAction) -> Result<()> {
    let store = settings.config_store();
    let config = store
        .try_load_config()
        .with_context(|| format!("Failed to read {}", settings.relay.path.display()))?;
    let mut targets: TargetList = config.targets.into_iter().collect();

    if apply(&mut targets, &action, settings.default_target())? {
        store
            .save_targets(targets.as_slice())
            .context("Failed to save targets")?;
    }

    print_targets(&targets);
    Ok(())
}

/// Returns whether the list changed
fn apply(targets: &mut TargetList, action: &TargetsAction, default_target: u64) -> Result<bool> {
    match action {
        TargetsAction::List => Ok(false),
        TargetsAction::Add { inputs } => {
            let mut changed = false;
            for input in inputs {
                match targets.add_text(input) {
                    Some(true) => changed = true,
                    Some(false) => eprintln!("{} is already a target", input),
                    None => bail!("Invalid offset: {}", input),
                }
            }
            Ok(changed)
        }
        TargetsAction::Remove { inputs } => {
            let offsets = inputs
                .iter()
                .map(|input| parse_offset(input).with_context(|| format!("Invalid offset: {}", input)))
                .collect::<Result<Vec<_>>>()?;

            let remaining = targets.iter().filter(|o| !offsets.contains(o)).count();
            if remaining == 0 && !targets.is_empty() {
                bail!("Refusing to remove every target, use `targets clear` instead");
            }

            let mut changed = false;
            for offset in offsets {
                if targets.remove(offset) {
                    changed = true;
                } else {
                    eprintln!("{} is not a target", format_offset(offset));
                }
            }
            Ok(changed)
        }
        TargetsAction::Edit { position, value } => {
            let Some(index) = position.checked_sub(1).filter(|&i| i < targets.len()) else {
                bail!("No target at position {} ({} stored)", position, targets.len());
            };
            if !targets.edit(index, value) {
                bail!("Cannot set position {} to {}", position, value);
            }
            Ok(true)
        }
        TargetsAction::Clear => {
            let changed = !targets.is_empty();
            targets.clear();
            Ok(changed)
        }
        TargetsAction::Reset => {
            *targets = TargetList::seeded(default_target);
            Ok(true)
        }
    }
}

fn print_targets(targets: &TargetList) {
    if targets.is_empty() {
        println!("No targets stored");
        return;
    }
    for (i, text) in targets.formatted().iter().enumerate() {
        println!("#{:<3} {}", i + 1, text);
    }
}
