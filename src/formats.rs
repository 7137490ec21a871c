use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Sequence number of a published issue. Compared numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IssueNumber(u32);

impl IssueNumber {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("issue number is not numeric: {value:?}")]
pub struct InvalidIssueNumberError {
    pub value: String,
}

impl FromStr for IssueNumber {
    type Err = InvalidIssueNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // `u32::from_str` accepts a leading '+', the page never does.
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidIssueNumberError {
                value: s.to_owned(),
            });
        }
        trimmed
            .parse::<u32>()
            .map(Self)
            .map_err(|_| InvalidIssueNumberError {
                value: s.to_owned(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Pdf,
    Epub,
    Mobi,
}

impl FileFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Epub => "epub",
            Self::Mobi => "mobi",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Epub => "application/epub+zip",
            Self::Mobi => "application/x-mobipocket-ebook",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown file format: {value:?}")]
pub struct UnknownFormatError {
    pub value: String,
}

impl FromStr for FileFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "epub" => Ok(Self::Epub),
            "mobi" => Ok(Self::Mobi),
            _ => Err(UnknownFormatError {
                value: s.to_owned(),
            }),
        }
    }
}

/// One downloadable issue found on the download page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueDescriptor {
    pub issue_number: IssueNumber,
    pub file_format: FileFormat,
    /// Ready-to-fetch URL, including the `action=spit` suffix.
    pub download_link: String,
}

impl IssueDescriptor {
    /// `<base>-<issue_number>.<file_format>`, e.g. `LJ-37.pdf`.
    pub fn file_name(&self, base: &str) -> String {
        format!("{base}-{}.{}", self.issue_number, self.file_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_numbers_compare_numerically() {
        let nine: IssueNumber = "9".parse().unwrap();
        let ten: IssueNumber = "10".parse().unwrap();
        assert!(ten > nine);
    }

    #[test]
    fn issue_number_rejects_non_digits() {
        for value in ["", "  ", "abc", "12a", "-3", "+4", "1.5"] {
            let err = value.parse::<IssueNumber>().unwrap_err();
            assert_eq!(err.value, value);
        }
    }

    #[test]
    fn issue_number_tolerates_surrounding_whitespace() {
        assert_eq!(" 241\n".parse::<IssueNumber>().unwrap(), IssueNumber::new(241));
    }

    #[test]
    fn file_format_parses_case_insensitively() {
        assert_eq!("PDF".parse::<FileFormat>().unwrap(), FileFormat::Pdf);
        assert_eq!("epub".parse::<FileFormat>().unwrap(), FileFormat::Epub);
        assert!("docx".parse::<FileFormat>().is_err());
    }

    #[test]
    fn descriptor_serializes_lowercase_format_and_plain_number() {
        let issue = IssueDescriptor {
            issue_number: IssueNumber::new(37),
            file_format: FileFormat::Mobi,
            download_link: "http://example.com/x&action=spit".to_owned(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["issue_number"], 37);
        assert_eq!(json["file_format"], "mobi");
        assert_eq!(issue.file_name("LJ"), "LJ-37.mobi");
    }
}
