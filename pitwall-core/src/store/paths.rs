//! Filesystem preparation for on-disk databases.

use std::{io, path::Component};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};

use super::StoreError;

/// Create the directory that will hold `path` if it does not exist yet.
pub(crate) fn ensure_parent_dir(path: &Utf8Path) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let to_error = |source| StoreError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    };
    let (base, relative) = split_base(parent).map_err(to_error)?;
    if relative.as_os_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())
        .and_then(|dir| dir.create_dir_all(&relative))
        .map_err(to_error)
}

// cap-std refuses absolute paths below a directory handle, so absolute
// parents are split into their root and a relative remainder.
fn split_base(parent: &Utf8Path) -> io::Result<(Utf8PathBuf, Utf8PathBuf)> {
    let mut components = parent.as_std_path().components();
    match components.next() {
        Some(Component::Prefix(prefix)) => {
            let prefix = prefix
                .as_os_str()
                .to_str()
                .ok_or_else(|| io::Error::other("non-UTF-8 path prefix"))?;
            let base = Utf8PathBuf::from(prefix).join(std::path::MAIN_SEPARATOR_STR);
            let relative = parent
                .strip_prefix(&base)
                .or_else(|_| parent.strip_prefix(prefix))
                .map_err(|_| io::Error::other("failed to strip prefix from parent path"))?;
            Ok((base, relative.to_path_buf()))
        }
        Some(Component::RootDir) => {
            let base = Utf8PathBuf::from(std::path::MAIN_SEPARATOR_STR);
            let relative = parent
                .strip_prefix(&base)
                .map_err(|_| io::Error::other("failed to strip root from absolute path"))?;
            Ok((base, relative.to_path_buf()))
        }
        _ => Ok((Utf8PathBuf::from("."), parent.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn creates_nested_parents() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf-8 temp dir");
        let target = root.join("a/b/telemetry.db");

        ensure_parent_dir(&target).expect("create parents");

        assert!(root.join("a/b").is_dir());
    }

    #[rstest]
    #[case("telemetry.db")]
    #[case("/telemetry.db")]
    fn bare_file_names_need_no_directories(#[case] path: &str) {
        ensure_parent_dir(Utf8Path::new(path)).expect("nothing to create");
    }

    #[cfg(unix)]
    #[rstest]
    fn splits_absolute_parents() {
        let (base, relative) = split_base(Utf8Path::new("/var/lib/pitwall")).expect("split");
        assert_eq!(base, Utf8PathBuf::from("/"));
        assert_eq!(relative, Utf8PathBuf::from("var/lib/pitwall"));
    }
}
