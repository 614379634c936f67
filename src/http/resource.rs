//! Mapping request paths onto the document root.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tokio::fs::{self, File};

/// What a request path names on disk.
#[derive(Debug)]
pub enum Resource {
    /// A regular file, already opened for reading
    File { file: File, len: u64, name: String },
    Directory,
    Absent,
    /// Exists but cannot be opened for reading
    Unreadable,
}

/// Joins the document root and the request path by plain concatenation.
///
/// `"."` and `"/index.html"` give `"./index.html"`. Nothing is decoded or
/// normalized, so `..` segments are kept.
pub fn resource_path(root: &Path, request_path: &str) -> PathBuf {
    let mut joined = OsString::from(root.as_os_str());
    joined.push(request_path);
    PathBuf::from(joined)
}

/// Resolves `request_path` under `root` and classifies it.
///
/// With `confine` set, paths containing `..` or resolving outside the root
/// are reported as `Absent`.
pub async fn classify(root: &Path, request_path: &str, confine: bool) -> Resource {
    let path = resource_path(root, request_path);

    if confine && !is_confined(root, &path).await {
        tracing::debug!(path = %path.display(), "Path escapes document root");
        return Resource::Absent;
    }

    // A path that cannot be stat'ed, for any reason, does not exist as far
    // as the client is concerned
    let Ok(meta) = fs::metadata(&path).await else {
        return Resource::Absent;
    };

    if meta.is_dir() {
        return Resource::Directory;
    }
    if !meta.is_file() {
        // sockets, fifos, devices
        return Resource::Unreadable;
    }

    match File::open(&path).await {
        Ok(file) => {
            // Length of the handle we will actually stream from
            let len = match file.metadata().await {
                Ok(m) => m.len(),
                Err(_) => meta.len(),
            };
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Resource::File { file, len, name }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Resource::Absent,
        Err(_) => Resource::Unreadable,
    }
}

async fn is_confined(root: &Path, path: &Path) -> bool {
    if path
        .strip_prefix(root)
        .map(|rest| rest.components().any(|c| c == Component::ParentDir))
        .unwrap_or(true)
    {
        return false;
    }

    let (Ok(root), Ok(target)) = (fs::canonicalize(root).await, fs::canonicalize(path).await)
    else {
        // Nonexistent targets are classified as absent anyway
        return true;
    };
    target.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_path_concatenates() {
        assert_eq!(
            resource_path(Path::new("."), "/index.html"),
            PathBuf::from("./index.html")
        );
        assert_eq!(
            resource_path(Path::new("/srv/www"), "/../etc/passwd"),
            PathBuf::from("/srv/www/../etc/passwd")
        );
    }
}
