use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context as _;
use reqwest::blocking::Client;

use crate::config::Config;
use crate::formats::{FileFormat, IssueDescriptor, IssueNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    All,
    Issue(IssueNumber),
    Latest,
    /// Latest, but only when the tracker has not seen it yet.
    New,
}

impl Mode {
    pub fn mails_downloads(self) -> bool {
        !matches!(self, Self::All)
    }
}

/// Picks the issues a mode downloads, restricted to `format`.
pub fn select(
    mode: Mode,
    issues: &[IssueDescriptor],
    format: FileFormat,
) -> anyhow::Result<Vec<IssueDescriptor>> {
    let mut seen = HashSet::new();
    let offered = issues
        .iter()
        .filter(|issue| issue.file_format == format)
        .filter(|issue| seen.insert(issue.issue_number))
        .cloned()
        .collect::<Vec<_>>();

    match mode {
        Mode::All => Ok(offered),
        Mode::Issue(number) => {
            let issue = offered
                .into_iter()
                .find(|issue| issue.issue_number == number)
                .ok_or_else(|| anyhow::anyhow!("issue {number} is not offered as {format}"))?;
            Ok(vec![issue])
        }
        Mode::Latest | Mode::New => Ok(offered
            .into_iter()
            .max_by_key(|issue| issue.issue_number)
            .into_iter()
            .collect()),
    }
}

pub fn destination(config: &Config, issue: &IssueDescriptor) -> PathBuf {
    config.directory.join(issue.file_name(&config.base_filename))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Saved {
    Downloaded { path: PathBuf, bytes: u64 },
    AlreadyPresent { path: PathBuf },
}

impl Saved {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Downloaded { path, .. } | Self::AlreadyPresent { path } => path,
        }
    }
}

pub fn save_issue(
    client: &Client,
    config: &Config,
    issue: &IssueDescriptor,
) -> anyhow::Result<Saved> {
    let path = destination(config, issue);
    if path.exists() && !config.force {
        tracing::info!(path = %path.display(), "issue already downloaded; skipping");
        return Ok(Saved::AlreadyPresent { path });
    }

    tracing::info!(
        issue = issue.issue_number.get(),
        format = %issue.file_format,
        path = %path.display(),
        "downloading issue"
    );
    let bytes = crate::fetch::download_to(client, &issue.download_link, &path)
        .with_context(|| format!("download issue {}", issue.issue_number))?;
    tracing::info!(bytes, path = %path.display(), "issue downloaded");
    Ok(Saved::Downloaded { path, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(number: u32, format: FileFormat) -> IssueDescriptor {
        IssueDescriptor {
            issue_number: IssueNumber::new(number),
            file_format: format,
            download_link: format!("http://dl.example/?tcode={format}-{number}&action=spit"),
        }
    }

    fn numbers(selected: &[IssueDescriptor]) -> Vec<u32> {
        selected.iter().map(|i| i.issue_number.get()).collect()
    }

    fn page() -> Vec<IssueDescriptor> {
        vec![
            issue(9, FileFormat::Pdf),
            issue(10, FileFormat::Epub),
            issue(10, FileFormat::Pdf),
            issue(8, FileFormat::Pdf),
            issue(8, FileFormat::Pdf),
        ]
    }

    #[test]
    fn all_keeps_page_order_for_selected_format_without_duplicates() {
        let selected = select(Mode::All, &page(), FileFormat::Pdf).unwrap();
        assert_eq!(numbers(&selected), vec![9, 10, 8]);
    }

    #[test]
    fn latest_is_numeric_maximum() {
        let selected = select(Mode::Latest, &page(), FileFormat::Pdf).unwrap();
        assert_eq!(numbers(&selected), vec![10]);
        assert_eq!(selected[0].file_format, FileFormat::Pdf);
    }

    #[test]
    fn latest_of_unoffered_format_is_empty() {
        let selected = select(Mode::New, &page(), FileFormat::Mobi).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn specific_issue_must_be_offered() {
        let selected = select(Mode::Issue(IssueNumber::new(8)), &page(), FileFormat::Pdf).unwrap();
        assert_eq!(numbers(&selected), vec![8]);

        let err = select(Mode::Issue(IssueNumber::new(9)), &page(), FileFormat::Epub).unwrap_err();
        assert_eq!(err.to_string(), "issue 9 is not offered as epub");
    }

    #[test]
    fn only_download_all_skips_mail() {
        assert!(!Mode::All.mails_downloads());
        assert!(Mode::Latest.mails_downloads());
        assert!(Mode::New.mails_downloads());
        assert!(Mode::Issue(IssueNumber::new(1)).mails_downloads());
    }
}
