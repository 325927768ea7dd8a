use std::fs;
use std::io::{self, Write};
use std::path::Path;

pub fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Writes `contents` to a sibling temp file and renames it over `path`, so a
/// reader sees either the old or the new contents.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return fs::write(path, contents);
    };
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("state");
    let tmp_path = parent.join(format!(".{file_name}.tmp-{}", std::process::id()));

    let result = (|| -> io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = remove_file_if_exists(&tmp_path);
    }
    result
}
