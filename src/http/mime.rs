//! Content-type lookup by file extension.

/// Returned for names with no extension or an unrecognized one. It is not a
/// registered type; browsers treat it as something to download.
pub const UNKNOWN: &str = "x-application/x-unknown";

const TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "text/javascript"),
    ("java", "text/x-java"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("class", "application/java-vm"),
    ("jar", "application/java-archive"),
    ("zip", "application/zip"),
    ("xml", "application/xml"),
    ("xhtml", "application/xhtml+xml"),
];

/// Resolves the content type for a file name.
///
/// The extension is whatever follows the last `.`, compared case-insensitively.
///
/// # Example
///
/// ```
/// # use docroot::http::mime::resolve;
/// assert_eq!(resolve("logo.PNG"), "image/png");
/// assert_eq!(resolve("README"), "x-application/x-unknown");
/// ```
pub fn resolve(file_name: &str) -> &'static str {
    let Some((_, ext)) = file_name.rsplit_once('.') else {
        return UNKNOWN;
    };

    TYPES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, mime)| *mime)
        .unwrap_or(UNKNOWN)
}
