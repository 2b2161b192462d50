//! Output filenames derived from image URLs.

use std::path::{Component, Path};

use url::Url;

/// Returns the decoded final path segment of `url`, sanitized for the local filesystem.
///
/// `None` when the path ends in `/` or has no segments at all.
#[must_use]
pub fn filename_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    Some(sanitize_filename(&decoded))
}

/// Keeps only `basename.extension`, dropping every dot-segment in between.
///
/// `photo.md.jpg` becomes `photo.jpg`; names with zero or one dot are returned as-is.
#[must_use]
pub fn collapse_compound_extension(name: &str) -> String {
    match (name.split_once('.'), name.rsplit_once('.')) {
        (Some((base, _)), Some((_, ext))) => format!("{base}.{ext}"),
        _ => name.to_string(),
    }
}

/// Rewrites a thumbnail URL to its full-resolution sibling by collapsing the
/// compound extension of its final path segment. Query and fragment are kept.
#[must_use]
pub fn full_resolution_url(url: &Url) -> Url {
    let mut rewritten = url.clone();
    let Some(last) = url.path_segments().and_then(|mut segments| segments.next_back()) else {
        return rewritten;
    };
    if last.is_empty() {
        return rewritten;
    }

    let path = url.path();
    let prefix = &path[..path.len() - last.len()];
    rewritten.set_path(&format!("{prefix}{}", collapse_compound_extension(last)));
    rewritten
}

/// Sanitizes a filename by replacing invalid characters.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
