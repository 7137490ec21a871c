use std::io::Write as _;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};

pub const DEFAULT_PAGE_URL: &str =
    "https://secure2.linuxjournal.com/pdf/dljdownload.php?ucLJFooter_accountnumber=";

const USER_AGENT_VALUE: &str = concat!("ljfetch/", env!("CARGO_PKG_VERSION"));

pub fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .context("build http client")
}

pub fn fetch_page(client: &Client, url: &str) -> anyhow::Result<String> {
    let response = client
        .get(url)
        .header(USER_AGENT, USER_AGENT_VALUE)
        .header(ACCEPT, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .send()
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("download page returned {status}");
    }
    response.text().context("read download page body")
}

/// Streams `url` into `dest`. Nothing is left at `dest` if the transfer fails.
pub fn download_to(client: &Client, url: &str, dest: &Path) -> anyhow::Result<u64> {
    let mut response = client
        .get(url)
        .header(USER_AGENT, USER_AGENT_VALUE)
        .send()
        .with_context(|| format!("GET {url}"))?;

    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("download returned {status}: {url}");
    }

    let parent = dest
        .parent()
        .ok_or_else(|| anyhow::anyhow!("download path must have parent: {}", dest.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create download dir: {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in: {}", parent.display()))?;
    let bytes = response
        .copy_to(&mut tmp)
        .with_context(|| format!("read response body: {url}"))?;
    tmp.flush().context("flush download")?;
    tmp.persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("persist download: {}", dest.display()))?;

    Ok(bytes)
}
