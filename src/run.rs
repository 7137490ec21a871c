use std::path::PathBuf;

use anyhow::Context as _;

use crate::config::Config;
use crate::download::{Mode, Saved};
use crate::extract::{Extraction, LinkExtractor};
use crate::formats::IssueDescriptor;
use crate::notify::{Attachment, Notifier};
use crate::tracker::{FileStateStore, IssueTracker};

/// Fetches the download page and decodes the issues on it.
pub fn discover(client: &reqwest::blocking::Client, config: &Config) -> anyhow::Result<Extraction> {
    let page = crate::fetch::fetch_page(client, &config.download_page_url())
        .context("fetch download page")?;

    let extraction = LinkExtractor::new(config.link_prefix.as_str()).extract(&page);
    for (href, err) in &extraction.failures {
        tracing::warn!(%href, %err, "skipping malformed download link");
    }
    tracing::info!(
        issues = extraction.issues.len(),
        malformed = extraction.failures.len(),
        "parsed download page"
    );

    if let (Some(first), Some(latest)) = (extraction.issues.first(), extraction.latest())
        && first.issue_number != latest
    {
        tracing::debug!(
            first = first.issue_number.get(),
            latest = latest.get(),
            "page does not list the latest issue first"
        );
    }

    Ok(extraction)
}

pub fn list(config: &Config) -> anyhow::Result<Vec<IssueDescriptor>> {
    let client = crate::fetch::http_client(config.timeout)?;
    Ok(discover(&client, config)?.issues)
}

/// One pass: discover, record the latest issue, download per `mode`.
/// Returns the paths of the issues now present locally.
pub fn run(config: &Config, mode: Mode, notifier: &dyn Notifier) -> anyhow::Result<Vec<PathBuf>> {
    let client = crate::fetch::http_client(config.timeout)?;
    let extraction = discover(&client, config)?;
    let Some(latest) = extraction.latest() else {
        tracing::warn!("no downloadable issues found on the download page");
        return Ok(Vec::new());
    };

    if mode == Mode::New {
        let selected = crate::download::select(mode, &extraction.issues, config.format)?;
        let fetched = IssueTracker::new(FileStateStore::new(&config.fetched_state_file));
        return run_new(&client, config, &fetched, selected, notifier);
    }

    let tracker = IssueTracker::new(FileStateStore::new(&config.state_file));

    // Informational only; downloads go ahead whatever the verdict.
    let tracker_outcome = tracker.try_update(latest);
    match &tracker_outcome {
        Ok(true) => tracing::info!(issue = latest.get(), "new issue available"),
        Ok(false) => tracing::info!(issue = latest.get(), "no new issue"),
        Err(err) => tracing::error!(%err, "could not update last-seen issue"),
    }

    let selected = crate::download::select(mode, &extraction.issues, config.format)?;

    let mut paths = Vec::with_capacity(selected.len());
    for issue in &selected {
        let saved = crate::download::save_issue(&client, config, issue)?;
        // Files already on disk were mailed by the pass that fetched them.
        if mode.mails_downloads() && matches!(saved, Saved::Downloaded { .. }) {
            mail(config, notifier, issue, saved.path())?;
        }
        paths.push(saved.path().clone());
    }

    tracker_outcome.context("update last-seen issue")?;
    Ok(paths)
}

/// `fetched` records what this mode delivered, per format, so reporting
/// passes never mask an issue `new` has not fetched yet.
fn run_new(
    client: &reqwest::blocking::Client,
    config: &Config,
    fetched: &IssueTracker<FileStateStore>,
    selected: Vec<IssueDescriptor>,
    notifier: &dyn Notifier,
) -> anyhow::Result<Vec<PathBuf>> {
    let Some(issue) = selected.into_iter().next() else {
        tracing::warn!(format = %config.format, "no issue offered in the requested format");
        return Ok(Vec::new());
    };

    let is_new = fetched
        .is_new(issue.issue_number)
        .context("check last-seen issue")?;
    if !is_new {
        tracing::info!(issue = issue.issue_number.get(), "no new issue");
        return Ok(Vec::new());
    }

    let saved = crate::download::save_issue(client, config, &issue)?;
    mail(config, notifier, &issue, saved.path())?;

    // Recorded last so a failed download or mail is retried next pass.
    fetched
        .try_update(issue.issue_number)
        .context("update last-seen issue")?;
    tracing::info!(issue = issue.issue_number.get(), "new issue recorded");

    Ok(vec![saved.path().clone()])
}

fn mail(
    config: &Config,
    notifier: &dyn Notifier,
    issue: &IssueDescriptor,
    path: &std::path::Path,
) -> anyhow::Result<()> {
    let Some(recipient) = config.mail_to.as_deref() else {
        return Ok(());
    };
    let attachment = Attachment::from_path(path, issue.file_format.mime_type())?;
    notifier
        .send(recipient, &attachment)
        .with_context(|| format!("mail issue {} to {recipient}", issue.issue_number))
}
