use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Object module extension.
pub const OBJECT_EXTENSION: &str = "obj";

/// Executable image extension.
pub const IMAGE_EXTENSION: &str = "e";

/// Appends `.extension` to `stem` without replacing any existing extension,
/// so `dir/a.b` becomes `dir/a.b.obj`.
#[must_use]
pub fn with_appended_extension(stem: &Path, extension: &str) -> PathBuf {
    let mut path = OsString::from(stem.as_os_str());
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

/// `<stem>.obj`.
#[must_use]
pub fn object_path(stem: &Path) -> PathBuf {
    with_appended_extension(stem, OBJECT_EXTENSION)
}

/// `<stem>.e`.
#[must_use]
pub fn image_path(stem: &Path) -> PathBuf {
    with_appended_extension(stem, IMAGE_EXTENSION)
}

/// Module name for a stem: its last path component.
#[must_use]
pub fn module_name(stem: &Path) -> String {
    stem.file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
}
