use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::FetchArgs;
use crate::formats::FileFormat;

/// Everything one pass needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct Config {
    pub account_number: String,
    pub mail_to: Option<String>,
    pub base_filename: String,
    pub format: FileFormat,
    pub directory: PathBuf,
    /// Last-seen issue reported by every downloading mode.
    pub state_file: PathBuf,
    /// Last issue `new` fetched in `format`; kept apart from `state_file`.
    pub fetched_state_file: PathBuf,
    pub force: bool,
    pub page_url: String,
    pub link_prefix: String,
    pub sendmail: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_args(args: FetchArgs) -> anyhow::Result<Self> {
        let account_number = args.account_number.trim().to_owned();
        if account_number.is_empty() {
            anyhow::bail!("--account-number must not be empty");
        }
        if args.base_filename.trim().is_empty() {
            anyhow::bail!("--base-filename must not be empty");
        }
        if args.base_filename.contains(['/', '\\']) {
            anyhow::bail!(
                "--base-filename must not contain path separators: {}",
                args.base_filename
            );
        }
        let mail_to = args
            .mail_to
            .map(|addr| addr.trim().to_owned())
            .filter(|addr| !addr.is_empty());

        let state_file = args
            .state_file
            .unwrap_or_else(|| args.directory.join("latest"));
        let fetched_state_file = per_format_path(&state_file, args.format);

        Ok(Self {
            account_number,
            mail_to,
            base_filename: args.base_filename,
            format: args.format,
            directory: args.directory,
            state_file,
            fetched_state_file,
            force: args.force,
            page_url: args.page_url,
            link_prefix: args.link_prefix,
            sendmail: args.sendmail,
            timeout: Duration::from_secs(args.timeout_secs.max(1)),
        })
    }

    pub fn download_page_url(&self) -> String {
        format!("{}{}", self.page_url, self.account_number)
    }
}

/// `latest` becomes `latest.pdf`.
fn per_format_path(state_file: &Path, format: FileFormat) -> PathBuf {
    let mut name = state_file
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("latest"));
    name.push(".");
    name.push(format.as_str());
    state_file.with_file_name(name)
}
