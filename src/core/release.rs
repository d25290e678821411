//! Release identifiers and the remote directory layout

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// Timestamp format of release identifiers (fixed width, sortable)
pub const RELEASE_ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Timestamp format appended to rollback archives
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Name of the pointer to the live release
pub const CURRENT_LINK: &str = "current";

/// Directory holding files and directories shared across releases
pub const SHARED_DIR: &str = "shared";

/// Advisory lock directory held during deploy and rollback
pub const LOCK_DIR: &str = ".deploy.lock";

const ARCHIVE_MARKER: &str = "_rollback_";

fn release_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{14}$").expect("valid release id pattern"))
}

/// Identifier of a single release
///
/// Always exactly fourteen digits (`YYYYMMDDHHMMSS`) in UTC, so
/// lexicographic ordering is chronological ordering even across DST changes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseId(String);

impl ReleaseId {
    /// Parse a directory entry; anything that is not a plain release
    /// identifier (archives, `current`, stray files) yields `None`
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if release_id_pattern().is_match(name)
            && NaiveDateTime::parse_from_str(name, RELEASE_ID_FORMAT).is_ok()
        {
            Some(ReleaseId(name.to_string()))
        } else {
            None
        }
    }

    /// Identifier for a release created now
    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    /// Identifier for a release created at the given instant
    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        ReleaseId(at.with_timezone(&Utc).format(RELEASE_ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory name this release gets when displaced by a rollback
    pub fn archive_name<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> String {
        format!(
            "{}{}{}",
            self.0,
            ARCHIVE_MARKER,
            at.with_timezone(&Utc).format(ARCHIVE_TIMESTAMP_FORMAT)
        )
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ReleaseId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Paths of the release tree under one root on the remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLayout {
    root: String,
}

impl ReleaseLayout {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        let trimmed = root.trim_end_matches('/');
        let root = if trimmed.is_empty() { root } else { trimmed.to_string() };
        Self { root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn release_dir(&self, release: &ReleaseId) -> String {
        self.join(release.as_str())
    }

    pub fn current_link(&self) -> String {
        self.join(CURRENT_LINK)
    }

    pub fn shared_dir(&self) -> String {
        self.join(SHARED_DIR)
    }

    pub fn shared_path(&self, relative: &str) -> String {
        format!("{}/{}", self.shared_dir(), relative.trim_matches('/'))
    }

    pub fn lock_dir(&self) -> String {
        self.join(LOCK_DIR)
    }

    pub fn join(&self, name: &str) -> String {
        if self.root.ends_with('/') {
            format!("{}{}", self.root, name)
        } else {
            format!("{}/{}", self.root, name)
        }
    }
}
