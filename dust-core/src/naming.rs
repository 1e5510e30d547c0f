use crate::coordinator::ReplicationCoordinator;
use crate::error::{Result, StorageError};

/// Cleans every path segment of `name`: whitespace is trimmed, inner spaces
/// become underscores, anything but alphanumerics, `-`, `_` and `.` is
/// dropped, and empty, `.` and `..` segments are removed.
pub fn valid_name(name: &str) -> Result<String> {
    let segments: Vec<String> = name
        .split('/')
        .map(|segment| {
            segment
                .trim()
                .chars()
                .map(|c| if c == ' ' { '_' } else { c })
                .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
                .collect::<String>()
        })
        .filter(|segment| !segment.is_empty() && segment != "." && segment != "..")
        .collect();

    if segments.is_empty() {
        return Err(StorageError::InvalidName(format!(
            "'{}' has no usable path component",
            name
        )));
    }

    Ok(segments.join("/"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameParts<'a> {
    pub dir: &'a str,
    pub root: &'a str,
    pub counter: u64,
    pub ext: &'a str,
}

impl NameParts<'_> {
    pub fn with_counter(&self, counter: u64) -> String {
        format!("{}{}_{}{}", self.dir, self.root, counter, self.ext)
    }
}

/// Splits `dir/root_N.ext` into its parts. `dir` keeps its trailing slash,
/// `ext` its leading dot. A file name starting with a dot has no extension.
pub fn split_name(name: &str) -> NameParts<'_> {
    let (dir, file_name) = match name.rfind('/') {
        Some(index) => name.split_at(index + 1),
        None => ("", name),
    };

    let (stem, ext) = match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    };

    let (root, counter) = match stem.rsplit_once('_') {
        Some((root, digits))
            if !root.is_empty()
                && !digits.is_empty()
                && digits.chars().all(|c| c.is_ascii_digit()) =>
        {
            match digits.parse() {
                Ok(counter) => (root, counter),
                Err(_) => (stem, 0),
            }
        }
        _ => (stem, 0),
    };

    NameParts {
        dir,
        root,
        counter,
        ext,
    }
}

/// Returns `name` if no host has it, otherwise the first free
/// `root_N.ext` after the counter already in `name`.
///
/// This is check-then-act: another writer can take the name between the
/// probe and the write. The write path logs that case as a PUT on an
/// existing file.
pub async fn available_name(coordinator: &ReplicationCoordinator, name: &str) -> Result<String> {
    if !coordinator.exists(name).await? {
        return Ok(name.to_string());
    }

    let parts = split_name(name);
    let mut counter = parts.counter;
    loop {
        counter = counter.checked_add(1).ok_or_else(|| {
            StorageError::InvalidName(format!("no free name left after {}", name))
        })?;
        let candidate = parts.with_counter(counter);
        if !coordinator.exists(&candidate).await? {
            tracing::debug!("{} is taken, using {}", name, candidate);
            return Ok(candidate);
        }
    }
}
