use scraper::{ElementRef, Html};
use url::Url;

use crate::formats::{
    FileFormat, InvalidIssueNumberError, IssueDescriptor, IssueNumber, UnknownFormatError,
};

pub const DEFAULT_LINK_PREFIX: &str = "http://download.linuxjournal.com/pdf/get-doc.php?code=";

/// The download endpoint streams the file only when this is present.
const DOWNLOAD_ACTION_SUFFIX: &str = "&action=spit";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedLinkError {
    #[error("download link is not a valid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("download link has no `tcode` query parameter")]
    MissingTcode,
    #[error("`tcode` must be `<format>-<issue>`, got {tcode:?}")]
    InvalidTcode { tcode: String },
    #[error(transparent)]
    UnknownFormat(#[from] UnknownFormatError),
    #[error(transparent)]
    InvalidIssueNumber(#[from] InvalidIssueNumberError),
}

#[derive(Debug, Default)]
pub struct Extraction {
    /// Decoded issues in document order.
    pub issues: Vec<IssueDescriptor>,
    /// Links that matched the prefix but could not be decoded.
    pub failures: Vec<(String, MalformedLinkError)>,
}

impl Extraction {
    /// The numerically greatest issue on the page, whatever its position.
    pub fn latest(&self) -> Option<IssueNumber> {
        self.issues.iter().map(|issue| issue.issue_number).max()
    }
}

#[derive(Debug, Clone)]
pub struct LinkExtractor {
    prefix: String,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_PREFIX)
    }
}

impl LinkExtractor {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn extract(&self, html: &str) -> Extraction {
        let document = Html::parse_document(html);
        let mut extraction = Extraction::default();

        for href in anchor_hrefs(&document) {
            if !href.starts_with(&self.prefix) {
                continue;
            }
            match parse_download_link(href) {
                Ok(issue) => extraction.issues.push(issue),
                Err(err) => extraction.failures.push((href.to_owned(), err)),
            }
        }

        extraction
    }
}

fn anchor_hrefs(document: &Html) -> impl Iterator<Item = &str> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "a")
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
}

pub fn parse_download_link(href: &str) -> Result<IssueDescriptor, MalformedLinkError> {
    let url = Url::parse(href)?;
    let tcode = url
        .query_pairs()
        .find(|(key, _)| key == "tcode")
        .map(|(_, value)| value.into_owned())
        .ok_or(MalformedLinkError::MissingTcode)?;

    let parts = tcode.split('-').collect::<Vec<_>>();
    let [format, number] = parts.as_slice() else {
        return Err(MalformedLinkError::InvalidTcode { tcode });
    };

    let file_format = format.parse::<FileFormat>()?;
    let issue_number = number.parse::<IssueNumber>()?;

    Ok(IssueDescriptor {
        issue_number,
        file_format,
        download_link: format!("{href}{DOWNLOAD_ACTION_SUFFIX}"),
    })
}
