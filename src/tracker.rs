use std::cell::RefCell;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::formats::{InvalidIssueNumberError, IssueNumber};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("stored last-seen issue is invalid: {0}")]
    InvalidIssueNumber(#[from] InvalidIssueNumberError),
    #[error("access last-seen issue state: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistence for the single last-seen issue value.
pub trait StateStore {
    /// `Ok(None)` when nothing has been recorded yet.
    fn load(&self) -> std::io::Result<Option<String>>;
    fn save(&self, value: &str) -> std::io::Result<()>;
}

/// One line of text in a file. A missing or blank file reads as empty state.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> std::io::Result<Option<String>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        let line = contents.lines().next().unwrap_or_default().trim();
        if line.is_empty() {
            return Ok(None);
        }
        Ok(Some(line.to_owned()))
    }

    fn save(&self, value: &str) -> std::io::Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        writeln!(tmp, "{value}")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    value: RefCell<Option<String>>,
}

impl MemoryStateStore {
    pub fn new(value: Option<&str>) -> Self {
        Self {
            value: RefCell::new(value.map(str::to_owned)),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> std::io::Result<Option<String>> {
        Ok(self.get())
    }

    fn save(&self, value: &str) -> std::io::Result<()> {
        *self.value.borrow_mut() = Some(value.to_owned());
        Ok(())
    }
}

#[derive(Debug)]
pub struct IssueTracker<S> {
    store: S,
}

impl<S: StateStore> IssueTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn last_known(&self) -> Result<Option<IssueNumber>, TrackerError> {
        let Some(stored) = self.store.load()? else {
            return Ok(None);
        };
        Ok(Some(stored.parse::<IssueNumber>()?))
    }

    /// True when nothing is recorded or `candidate` is strictly greater.
    pub fn is_new(&self, candidate: IssueNumber) -> Result<bool, TrackerError> {
        Ok(match self.last_known()? {
            Some(last) => candidate > last,
            None => true,
        })
    }

    /// Records `candidate` if it is new. The store is left untouched otherwise.
    pub fn try_update(&self, candidate: IssueNumber) -> Result<bool, TrackerError> {
        let last = self.last_known()?;
        tracing::info!(
            last = ?last.map(IssueNumber::get),
            candidate = candidate.get(),
            "checking last-seen issue"
        );

        let is_new = last.is_none_or(|last| candidate > last);
        if is_new {
            self.store.save(&candidate.to_string())?;
        }
        Ok(is_new)
    }
}
