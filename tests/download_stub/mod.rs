use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

pub const ACCOUNT: &str = "12345";
/// Account whose download links all answer 500.
#[allow(dead_code)]
pub const FAILING_ACCOUNT: &str = "55555";

pub struct DownloadStub {
    pub base_url: String,
    shutdown_tx: mpsc::Sender<()>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Drop for DownloadStub {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn download_page(base_url: &str, code_prefix: &str) -> String {
    // Issue 9 is listed first on purpose; the latest must be picked numerically.
    format!(
        r#"<!doctype html>
<html>
  <head><title>Digital downloads</title></head>
  <body>
    <a name="top"></a>
    <a href="/account">Account</a>
    <table>
      <tr><td><a class="dl" href="{base_url}/get-doc.php?code={code_prefix}9&amp;tcode=pdf-9">Issue 9 PDF</a></td></tr>
      <tr><td><a href="{base_url}/get-doc.php?code={code_prefix}10&amp;tcode=pdf-10">Issue 10 PDF</a></td></tr>
      <tr><td><a href="{base_url}/get-doc.php?code=e{code_prefix}10&amp;tcode=epub-10">Issue 10 EPUB</a></td></tr>
      <tr><td><a href="{base_url}/get-doc.php?code=broken">Broken</a></td></tr>
    </table>
    <a href="http://example.com">Elsewhere</a>
  </body>
</html>
"#
    )
}

impl DownloadStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start download stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");
        let page = download_page(&base_url, "c");
        let failing_page = download_page(&base_url, "fail");

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));

                let (status, body) = match path {
                    "/dljdownload.php" if query == format!("account={ACCOUNT}") => {
                        (200, page.clone())
                    }
                    "/dljdownload.php" if query == format!("account={FAILING_ACCOUNT}") => {
                        (200, failing_page.clone())
                    }
                    "/dljdownload.php" => (403, "unknown account".to_owned()),
                    "/get-doc.php" if query.contains("fail") => {
                        (500, "download backend unavailable".to_owned())
                    }
                    "/get-doc.php" if query.ends_with("&action=spit") => {
                        let tcode = query
                            .split('&')
                            .find_map(|pair| pair.strip_prefix("tcode="))
                            .unwrap_or_default();
                        (200, format!("contents of {tcode}"))
                    }
                    "/get-doc.php" => (400, "missing action".to_owned()),
                    _ => (404, "not found".to_owned()),
                };

                let _ = request
                    .respond(tiny_http::Response::from_string(body).with_status_code(status));
            }
        });

        Self {
            base_url,
            shutdown_tx,
            handle: Some(handle),
        }
    }

    pub fn ljfetch(&self, dir: &Path, args: &[&str]) -> assert_cmd::Command {
        self.ljfetch_as(dir, ACCOUNT, args)
    }

    pub fn ljfetch_as(&self, dir: &Path, account: &str, args: &[&str]) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("ljfetch");
        cmd.env_remove("AN")
            .env_remove("MAIL_TO")
            .env_remove("LJFETCH_SENDMAIL")
            .env_remove("RUST_LOG")
            .args(args)
            .args(["--account-number", account])
            .args(["--page-url", &format!("{}/dljdownload.php?account=", self.base_url)])
            .args(["--link-prefix", &format!("{}/get-doc.php?code=", self.base_url)])
            .arg("--directory")
            .arg(dir);
        cmd
    }
}

/// Last-seen issue recorded by the reporting modes.
#[allow(dead_code)]
pub fn read_state(dir: &Path) -> String {
    std::fs::read_to_string(dir.join("latest")).expect("read state file")
}

/// Last issue fetched by `new` in `format`.
#[allow(dead_code)]
pub fn read_fetched_state(dir: &Path, format: &str) -> Option<String> {
    std::fs::read_to_string(dir.join(format!("latest.{format}"))).ok()
}
