//! Permission path syntax
//!
//! Permission paths are dotted strings:
//! - Segments separated by `.`
//! - Each segment: `*` or `[A-Za-z0-9_-]+`
//! - Max 255 characters total
//! - Case-sensitive as stored
//!
//! The resolver never validates; it tolerates whatever it is given. Validation
//! is for administrative surfaces that persist new grants.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use super::node::ASTERISK;

/// Maximum length of a stored permission path
pub const MAX_PATH_LEN: usize = 255;

/// Syntax errors for permission paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSyntaxError {
    /// Path is empty or whitespace
    Empty,
    /// Path is too long (> 255 chars)
    TooLong,
    /// Path contains an empty segment (leading, trailing or consecutive dots)
    EmptySegment,
    /// Segment contains characters outside the allowed set
    InvalidSegment(String),
}

impl fmt::Display for PathSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSyntaxError::Empty => write!(f, "Permission path cannot be empty"),
            PathSyntaxError::TooLong => {
                write!(f, "Permission path must be {} characters or less", MAX_PATH_LEN)
            }
            PathSyntaxError::EmptySegment => {
                write!(f, "Permission path cannot contain empty segments")
            }
            PathSyntaxError::InvalidSegment(seg) => {
                write!(
                    f,
                    "Segment '{}' contains invalid characters (allowed: letters, digits, '_', '-', or a lone '*')",
                    seg
                )
            }
        }
    }
}

impl std::error::Error for PathSyntaxError {}

static SEGMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("segment regex is valid"));

/// Validate a permission path before it is granted.
///
/// # Examples
/// ```
/// use permtree::permissions::validate_permission_path;
///
/// assert!(validate_permission_path("canary.command.super.groupmod.add").is_ok());
/// assert!(validate_permission_path("canary.*").is_ok());
/// assert!(validate_permission_path("*").is_ok());
///
/// assert!(validate_permission_path("").is_err());
/// assert!(validate_permission_path("canary..command").is_err());
/// assert!(validate_permission_path("canary.com*mand").is_err());
/// ```
pub fn validate_permission_path(path: &str) -> Result<&str, PathSyntaxError> {
    if path.trim().is_empty() {
        return Err(PathSyntaxError::Empty);
    }

    if path.len() > MAX_PATH_LEN {
        return Err(PathSyntaxError::TooLong);
    }

    for segment in path.split('.') {
        if segment.is_empty() {
            return Err(PathSyntaxError::EmptySegment);
        }
        if segment != ASTERISK && !SEGMENT_REGEX.is_match(segment) {
            return Err(PathSyntaxError::InvalidSegment(segment.to_string()));
        }
    }

    Ok(path)
}

/// Split a dotted path into segments.
///
/// Trailing empty segments are dropped, and the result always holds at least
/// one segment, so an empty or dotless path becomes a single root segment.
///
/// # Examples
/// ```
/// use permtree::permissions::split_segments;
///
/// assert_eq!(split_segments("canary.command.help"), vec!["canary", "command", "help"]);
/// assert_eq!(split_segments("canary"), vec!["canary"]);
/// assert_eq!(split_segments("canary."), vec!["canary"]);
/// assert_eq!(split_segments(""), vec![""]);
/// ```
pub fn split_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('.').collect();
    while segments.len() > 1 && segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    if segments.iter().all(|s| s.is_empty()) {
        return vec![path];
    }
    segments
}
