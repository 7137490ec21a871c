use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::extract::DEFAULT_LINK_PREFIX;
use crate::fetch::DEFAULT_PAGE_URL;
use crate::formats::FileFormat;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every issue offered on the download page as JSON lines.
    List(FetchArgs),
    /// Download every offered issue.
    All(FetchArgs),
    /// Download one specific issue.
    Issue(IssueArgs),
    /// Download the latest offered issue.
    Latest(FetchArgs),
    /// Download the latest issue only if it has not been seen before.
    New(FetchArgs),
}

#[derive(Debug, Args)]
pub struct IssueArgs {
    /// Issue number to download.
    pub number: u32,

    #[command(flatten)]
    pub fetch: FetchArgs,
}

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// Subscription account number.
    #[arg(short = 'a', long, env = "AN")]
    pub account_number: String,

    /// Mail downloaded issues to this address.
    #[arg(long, env = "MAIL_TO")]
    pub mail_to: Option<String>,

    /// Base filename; issue number and format are appended.
    #[arg(long, default_value = "LJ")]
    pub base_filename: String,

    /// File format to download.
    #[arg(long, value_enum, default_value_t = FileFormat::Pdf)]
    pub format: FileFormat,

    /// Download directory.
    #[arg(long, default_value = ".")]
    pub directory: PathBuf,

    /// Last-seen issue file (default: `<directory>/latest`).
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Overwrite issues that already exist in the download directory.
    #[arg(long)]
    pub force: bool,

    /// Download page URL; the account number is appended.
    #[arg(long, default_value = DEFAULT_PAGE_URL, hide = true)]
    pub page_url: String,

    /// Prefix identifying download links on the page.
    #[arg(long, default_value = DEFAULT_LINK_PREFIX, hide = true)]
    pub link_prefix: String,

    /// sendmail-compatible binary used for mailing.
    #[arg(long, env = "LJFETCH_SENDMAIL", default_value = "sendmail")]
    pub sendmail: String,

    /// HTTP request timeout.
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
}
