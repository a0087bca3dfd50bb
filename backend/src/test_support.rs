//! Test utilities for the crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

pub mod health;
pub mod retry;

pub mod uploads {
    //! Scratch upload directories backed by a temporary root.

    use tempfile::TempDir;

    use crate::domain::upload::MAX_FILE_SIZE_BYTES;
    use crate::settings::UploadSettings;

    /// Upload settings pointing at not-yet-created directories under a fresh
    /// temporary root.
    ///
    /// Keep the returned [`TempDir`] alive for as long as the paths are used.
    ///
    /// # Panics
    ///
    /// Panics when the temporary root cannot be created.
    pub fn scratch_upload_settings() -> (TempDir, UploadSettings) {
        let root = match tempfile::tempdir() {
            Ok(root) => root,
            Err(e) => panic!("create temporary upload root: {e}"),
        };
        let settings = UploadSettings {
            max_upload_size_bytes: MAX_FILE_SIZE_BYTES,
            upload_dir: root.path().join("uploads"),
            temp_dir: root.path().join("scratch").join("nested"),
        };
        (root, settings)
    }
}

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.
    //!
    //! The crate avoids direct `std::fs` calls. These helpers answer existence
    //! questions through `cap_std::fs::Dir` so test suites share the same
    //! policy-compliant file access.

    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Return true when `path` names an existing directory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ebook_summary::test_support::cap_fs::is_directory;
    ///
    /// assert!(is_directory(&std::env::temp_dir()));
    /// assert!(!is_directory(&std::env::temp_dir().join("no-such-dir-here")));
    /// ```
    pub fn is_directory(path: &Path) -> bool {
        Dir::open_ambient_dir(path, ambient_authority()).is_ok()
    }
}

pub mod openapi {
    //! OpenAPI schema traversal helpers.
    //!
    //! Resolves `RefOr<Schema>` wrappers to concrete `Object` schemas with
    //! diagnostic panics on type mismatches.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Extract an `Object` schema, panicking with a diagnostic if not an Object.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => {
                panic!(
                    "schema '{name}' is a $ref to '{}'; resolve the reference first",
                    reference.ref_location
                );
            }
            _ => panic!("schema '{name}' is not an Object"),
        }
    }

    /// Names of the properties declared by an Object schema.
    pub fn property_names(obj: &Object) -> Vec<&str> {
        obj.properties.keys().map(String::as_str).collect()
    }
}
