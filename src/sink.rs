/// Whole-file replacement of the wxnow.txt destination
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Result;

/// Replace the contents of `path` with `contents`.
///
/// The text goes to a temporary file in the destination's directory which is
/// then renamed over `path`, so readers see either the old or the new file.
/// On failure the previous file is left as it was.
pub fn write(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    // Temporary files are created 0600; display software reads as another user
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn replaces_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wxnow.txt");
        fs::write(&path, "a much longer previous status that must disappear\n").unwrap();

        write(&path, "Nov 14 2023 22:13\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Nov 14 2023 22:13\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope").join("wxnow.txt");
        let err = write(&path, "x").unwrap_err();
        assert!(matches!(err, crate::error::WxNowError::Io(_)));
        assert!(!path.exists());
    }
}
