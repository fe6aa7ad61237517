use anyhow::{Context, Result, bail};
use fixture_pics::{
    FailureCause, LocalDirStore, ProvisionOutcome, ProvisionRequest, Provisioner,
};
use fixture_pics_http::PravatarClient;
use tokio_util::sync::CancellationToken;

use super::progress::ConsoleProgress;
use crate::config::AppConfig;

/// Print the run summary to stdout and any failures or warnings to stderr.
pub fn print_outcome(outcome: &ProvisionOutcome) {
    if !outcome.removed.is_empty() {
        println!("Removed {} previous picture(s).", outcome.removed.len());
    }

    for warning in &outcome.cleanup_warnings {
        eprintln!("warning: {warning}");
    }

    println!("{}", outcome.summary());

    if !outcome.failures.is_empty() {
        eprintln!("Failed downloads:");
        for failure in &outcome.failures {
            eprintln!("  {failure}");
        }
    }
}

/// Replace the pictures of `request`'s folder with freshly downloaded avatars.
///
/// Per-picture failures are reported but do not make the command fail. An
/// interrupted run still prints its summary, then returns an error so the
/// process exits non-zero.
pub async fn run(
    config: &AppConfig,
    request: &ProvisionRequest,
    cancel: &CancellationToken,
) -> Result<()> {
    let dir = config.layout().destination(request);
    let fetcher = PravatarClient::new(config.pravatar_config())
        .context("failed to set up avatar client")?;

    let provisioner = Provisioner::new(LocalDirStore::new(&dir), fetcher)
        .with_preserved(config.preserved())
        .with_options(config.provision_options());

    println!("Removing current pictures : in progress");

    let outcome = provisioner
        .provision(request.desired_count(), &ConsoleProgress::new(), cancel)
        .await?;

    print_outcome(&outcome);

    if cancel.is_cancelled() {
        let skipped = outcome
            .failures
            .iter()
            .filter(|f| f.cause == FailureCause::Cancelled)
            .count();
        bail!("interrupted; {skipped} picture(s) skipped");
    }

    Ok(())
}
