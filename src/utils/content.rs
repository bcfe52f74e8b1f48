use std::path::Path;

use thiserror::Error;

/// Errors produced while resolving an inline-or-file content parameter.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Both '{field}' and '{field}File' were provided. Provide exactly one of them.")]
    Conflicting { field: String },

    #[error("Neither '{field}' nor '{field}File' was provided. Provide exactly one of them.")]
    Missing { field: String },

    #[error("File not found: {path}. Make sure the path is absolute.")]
    FileNotFound { path: String },

    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },
}

/// Resolve a content parameter that may be supplied inline or as an absolute
/// path to a file holding the content.
///
/// Exactly one of `inline` and `file` must be a non-empty string. Empty
/// strings are treated the same as absent values, so an agent passing
/// `"body": ""` alongside `"bodyFile": "/tmp/body.md"` still resolves cleanly.
///
/// `field` is the logical parameter name used in error messages; the file
/// variant is reported as `{field}File`.
pub fn resolve_content(
    inline: Option<&str>,
    file: Option<&str>,
    field: &str,
) -> Result<String, ContentError> {
    let inline = inline.filter(|s| !s.is_empty());
    let file = file.filter(|s| !s.is_empty());

    match (inline, file) {
        (Some(_), Some(_)) => Err(ContentError::Conflicting {
            field: field.to_string(),
        }),
        (None, None) => Err(ContentError::Missing {
            field: field.to_string(),
        }),
        (Some(value), None) => Ok(value.to_string()),
        (None, Some(path)) => {
            if !Path::new(path).exists() {
                return Err(ContentError::FileNotFound {
                    path: path.to_string(),
                });
            }
            std::fs::read_to_string(path).map_err(|source| ContentError::Unreadable {
                path: path.to_string(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_value_returned_verbatim() {
        let resolved = resolve_content(Some("hello"), None, "body").unwrap();
        assert_eq!(resolved, "hello");
    }

    #[test]
    fn test_both_provided_is_conflict() {
        let err = resolve_content(Some("x"), Some("/tmp/x.txt"), "body").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'body'"));
        assert!(message.contains("'bodyFile'"));
    }

    #[test]
    fn test_neither_provided_is_missing() {
        let err = resolve_content(None, None, "content").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'content'"));
        assert!(message.contains("'contentFile'"));
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let err = resolve_content(Some(""), Some(""), "text").unwrap_err();
        assert!(matches!(err, ContentError::Missing { .. }));

        let resolved = resolve_content(Some("hi"), Some(""), "text").unwrap();
        assert_eq!(resolved, "hi");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = resolve_content(None, Some("/tmp/missing.txt"), "body").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("File not found"));
        assert!(message.contains("/tmp/missing.txt"));
    }

    #[test]
    fn test_file_content_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.md");
        std::fs::write(&path, "# Title\n\nSome body text.\n").unwrap();

        let resolved = resolve_content(None, Some(path.to_str().unwrap()), "body").unwrap();
        assert_eq!(resolved, "# Title\n\nSome body text.\n");
    }
}
