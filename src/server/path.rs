//! Request path normalization
//!
//! Rules must see the path the backend will route on, not the bytes the
//! client sent. Before evaluation a path is rewritten segment by segment:
//!
//! 1. `;params` are dropped (`/admin;jsessionid=1/x` is `/admin/x`)
//! 2. each segment is percent-decoded (`/%61dmin` is `/admin`)
//! 3. `.` segments vanish and `..` removes the previous segment
//! 4. empty segments (`//`) collapse
//!
//! A trailing slash survives, as does one left by a final `.` or `..`.
//! Paths that climb above `/`, decode a separator inside a segment, or are
//! not valid UTF-8 once decoded are rejected instead of evaluated.

use crate::error::PathError;
use std::borrow::Cow;

/// Normalize an absolute request path (without query string)
pub fn normalize_path(raw: &str) -> Result<String, PathError> {
    let Some(rest) = raw.strip_prefix('/') else {
        return Err(PathError::NotAbsolute);
    };

    let mut segments: Vec<Cow<'_, str>> = Vec::new();
    let mut trailing_slash = false;

    for segment in rest.split('/') {
        let segment = segment.split_once(';').map_or(segment, |(name, _)| name);
        let decoded = urlencoding::decode(segment).map_err(|_| PathError::InvalidEncoding)?;
        if decoded.contains(['/', '\\']) {
            return Err(PathError::EncodedSeparator);
        }

        trailing_slash = true;
        match decoded.as_ref() {
            "" | "." => {}
            ".." => {
                segments.pop().ok_or(PathError::EscapesRoot)?;
            }
            _ => {
                segments.push(decoded);
                trailing_slash = false;
            }
        }
    }

    let mut normalized = String::with_capacity(raw.len());
    for segment in &segments {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() || trailing_slash {
        normalized.push('/');
    }
    Ok(normalized)
}
