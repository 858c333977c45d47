//! JSON Pointer and `$ref` parsing for schema files.

use std::path::{Component, Path, PathBuf};

use crate::error::SchemaError;

/// Normalize `#/a/b`, `/a/b`, `#`, or `""` to a serde_json pointer (`/a/b` or `""`).
pub fn normalize_pointer(pointer: &str) -> Result<String, SchemaError> {
    let trimmed = pointer.strip_prefix('#').unwrap_or(pointer);
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return Ok(trimmed.to_string());
    }
    Err(SchemaError::InvalidPointer {
        pointer: pointer.to_string(),
    })
}

/// Render a normalized pointer back to fragment form for messages.
pub fn display_pointer(pointer: &str) -> String {
    format!("#{pointer}")
}

/// Split a `$ref` into `(file, pointer)`, resolving the file part relative to
/// the directory of `current_file`.
///
/// `#/definitions/x` stays in `current_file`; `other.json#/x` and `other.json`
/// name another file under the same base directory.
pub fn split_ref(reference: &str, current_file: &str) -> Result<(String, String), SchemaError> {
    let (file_part, fragment) = match reference.split_once('#') {
        Some((file, fragment)) => (file, fragment),
        None => (reference, ""),
    };
    let pointer = normalize_pointer(fragment)?;
    if file_part.is_empty() {
        return Ok((current_file.to_string(), pointer));
    }
    let dir = Path::new(current_file).parent().unwrap_or(Path::new(""));
    let file = relative_file(&dir.join(file_part)).ok_or_else(|| SchemaError::OutsideBaseDir {
        file: file_part.to_string(),
    })?;
    Ok((file, pointer))
}

/// Normalize a base-relative path, rejecting absolute paths and any `..` that
/// climbs above the base directory.
pub fn relative_file(path: &Path) -> Option<String> {
    let mut parts = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !parts.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.as_os_str().is_empty() {
        return None;
    }
    Some(parts.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_accepts_fragment_and_bare_pointers() {
        assert_eq!(normalize_pointer("#/definitions/a").expect("ok"), "/definitions/a");
        assert_eq!(normalize_pointer("/definitions/a").expect("ok"), "/definitions/a");
        assert_eq!(normalize_pointer("#").expect("ok"), "");
        assert_eq!(normalize_pointer("").expect("ok"), "");
    }

    #[test]
    fn normalize_rejects_names_without_slash() {
        let err = normalize_pointer("#definitions/a").expect_err("invalid");
        assert!(matches!(err, SchemaError::InvalidPointer { .. }));
        assert!(normalize_pointer("initial.issue").is_err());
    }

    #[test]
    fn split_internal_ref_stays_in_current_file() {
        let (file, pointer) = split_ref("#/definitions/next_action", "issue.schema.json").expect("split");
        assert_eq!(file, "issue.schema.json");
        assert_eq!(pointer, "/definitions/next_action");
    }

    #[test]
    fn split_cross_file_ref_is_relative_to_current_dir() {
        let (file, pointer) =
            split_ref("common.schema.json#/$defs/action", "steps/issue.schema.json").expect("split");
        assert_eq!(file, "steps/common.schema.json");
        assert_eq!(pointer, "/$defs/action");

        let (file, pointer) = split_ref("../shared.json", "steps/issue.schema.json").expect("split");
        assert_eq!(file, "shared.json");
        assert_eq!(pointer, "");
    }

    #[test]
    fn split_rejects_escape_from_base_dir() {
        let err = split_ref("../../etc/passwd", "issue.schema.json").expect_err("escape");
        assert!(matches!(err, SchemaError::OutsideBaseDir { .. }));
    }

    #[test]
    fn relative_file_rejects_absolute_paths() {
        assert_eq!(relative_file(Path::new("/abs/file.json")), None);
        assert_eq!(relative_file(Path::new("./a/./b.json")), Some("a/b.json".to_string()));
    }
}
