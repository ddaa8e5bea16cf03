//! One-shot `build` command.

use anyhow::{Result, bail};

use crate::compiler::{Builder, Toolchain};
use crate::config::{TargetConfig, WatchConfig};
use crate::log;

/// Build every configured target once.
///
/// A target that cannot start or has a failing entry makes the whole run
/// fail, after every target had its turn.
pub fn build_targets(config: &WatchConfig) -> Result<()> {
    if config.targets.is_empty() {
        bail!("no targets configured in {}", config.config_path.display());
    }

    let mut failed = 0;
    for target in &config.targets {
        failed += build_target(target);
    }

    if failed > 0 {
        bail!("{} entr{} failed to build", failed, if failed == 1 { "y" } else { "ies" });
    }
    Ok(())
}

/// Returns the number of failures.
fn build_target(target: &TargetConfig) -> usize {
    let toolchain = match Toolchain::from_options(&target.options) {
        Ok(toolchain) => toolchain,
        Err(e) => {
            log!("target"; "skipping {}: {}", target.key, e);
            return 1;
        }
    };

    let builder = Builder::new(target.src(), target.out(), toolchain);
    let report = builder.rescan();
    for (entry, result) in &report.results {
        builder.report(entry, result);
    }

    if report.results.is_empty() {
        crate::logger::status_warning(&format!(
            "no entries under {}",
            builder.source_root().display()
        ));
    }
    log!("build"; "{}: {} built, {} failed", target.key, report.built(), report.failed());
    report.failed()
}
