use std::io::Write as _;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context as _;
use base64::Engine as _;

/// Delivers a downloaded file to a recipient.
pub trait Notifier {
    fn send(&self, recipient: &str, attachment: &Attachment) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn from_path(path: &Path, content_type: &str) -> anyhow::Result<Self> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("attachment must have a file name: {}", path.display()))?
            .to_owned();
        let data =
            std::fs::read(path).with_context(|| format!("read attachment: {}", path.display()))?;
        Ok(Self {
            file_name,
            content_type: content_type.to_owned(),
            data,
        })
    }
}

/// Pipes a MIME message to a sendmail-compatible binary (`<bin> -t -i` by default).
#[derive(Debug, Clone)]
pub struct SendmailNotifier {
    pub bin: String,
    pub args: Vec<String>,
}

impl SendmailNotifier {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            args: vec!["-t".to_owned(), "-i".to_owned()],
        }
    }
}

impl Notifier for SendmailNotifier {
    fn send(&self, recipient: &str, attachment: &Attachment) -> anyhow::Result<()> {
        let message = build_message(recipient, attachment, &chrono::Utc::now().to_rfc2822());

        tracing::info!(bin = %self.bin, %recipient, file = %attachment.file_name, "sendmail");

        let mut child = Command::new(&self.bin)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("spawn {}", self.bin))?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow::anyhow!("failed to open sendmail stdin"))?;
            stdin
                .write_all(message.as_bytes())
                .context("write message to sendmail stdin")?;
        }

        let status = child.wait().context("wait for sendmail")?;
        if !status.success() {
            anyhow::bail!("{} exited with {status}", self.bin);
        }
        Ok(())
    }
}

const BOUNDARY: &str = "ljfetch-attachment-boundary";

pub fn build_message(recipient: &str, attachment: &Attachment, date: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(&attachment.data);
    let name = &attachment.file_name;

    let mut message = String::with_capacity(encoded.len() + 1024);
    message.push_str(&format!("To: {recipient}\r\n"));
    message.push_str(&format!("Subject: {name}\r\n"));
    message.push_str(&format!("Date: {date}\r\n"));
    message.push_str("MIME-Version: 1.0\r\n");
    message.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{BOUNDARY}\"\r\n\r\n"
    ));

    message.push_str(&format!("--{BOUNDARY}\r\n"));
    message.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
    message.push_str(&format!("{name} is attached.\r\n\r\n"));

    message.push_str(&format!("--{BOUNDARY}\r\n"));
    message.push_str(&format!(
        "Content-Type: {}; name=\"{name}\"\r\n",
        attachment.content_type
    ));
    message.push_str("Content-Transfer-Encoding: base64\r\n");
    message.push_str(&format!(
        "Content-Disposition: attachment; filename=\"{name}\"\r\n\r\n"
    ));
    // RFC 2045 caps encoded lines at 76 characters.
    for chunk in encoded.as_bytes().chunks(76) {
        message.push_str(&String::from_utf8_lossy(chunk));
        message.push_str("\r\n");
    }
    message.push_str(&format!("--{BOUNDARY}--\r\n"));

    message
}
