use std::io;
use std::path::PathBuf;

use uuid::Uuid;

/// The directory where spooled tool outputs (and agent-staged input files)
/// live.
fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Write a tool's output payload to a uniquely named file in the system temp
/// directory and return the absolute path.
///
/// The file name combines the module, the tool, and a fresh UUID, so
/// concurrent invocations of the same tool never collide. Files are not
/// cleaned up here; the temp directory's own hygiene owns them.
pub fn write_temporary_text_output(
    module_ref: &str,
    tool_ref: &str,
    payload: &str,
) -> io::Result<PathBuf> {
    let file_name = format!("{}-{}-{}.txt", module_ref, tool_ref, Uuid::new_v4());
    let path = temp_dir().join(file_name);
    std::fs::write(&path, payload)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_written_and_path_returned() {
        let path = write_temporary_text_output("x", "y", "{\"a\":1}").unwrap();
        assert!(path.is_absolute());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_repeated_spooling_yields_distinct_paths() {
        let first = write_temporary_text_output("x", "y", "{\"a\":1}").unwrap();
        let second = write_temporary_text_output("x", "y", "{\"a\":1}").unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "{\"a\":1}");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_file_name_carries_module_and_tool() {
        let path = write_temporary_text_output("github", "get-pr-diff", "diff").unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("github-get-pr-diff-"));
        assert!(name.ends_with(".txt"));
    }
}
