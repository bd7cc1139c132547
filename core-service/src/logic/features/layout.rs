//! Input schema of the classifier
//!
//! Requests carry the four Iris measurements, in centimetres, in the order
//! of `FEATURE_LAYOUT`. Saved model artifacts are stamped with
//! `FEATURE_VERSION` and `layout_hash()`; an artifact stamped with anything
//! else is refused at load. Any change to the names or their order must
//! bump `FEATURE_VERSION`.

use crc32fast::Hasher;

/// Schema version written into every artifact
pub const FEATURE_VERSION: u8 = 1;

pub const FEATURE_COUNT: usize = 4;

/// Machine names, in request order
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "sepal_length",
    "sepal_width",
    "petal_length",
    "petal_width",
];

/// Names reported by the model info endpoint
pub const FEATURE_DISPLAY_NAMES: [&str; FEATURE_COUNT] = [
    "Sepal Length",
    "Sepal Width",
    "Petal Length",
    "Petal Width",
];

/// CRC32 over the version byte and the NUL-terminated feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);
    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]);
    }
    hasher.finalize()
}

/// Artifact schema stamp differs from this build
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "artifact schema v{found_version} ({found_hash:08x}) does not match \
     v{} ({current_hash:08x})",
    FEATURE_VERSION
)]
pub struct LayoutMismatchError {
    pub found_version: u8,
    pub found_hash: u32,
    pub current_hash: u32,
}

pub fn validate_layout(version: u8, hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();
    if version == FEATURE_VERSION && hash == current_hash {
        Ok(())
    } else {
        Err(LayoutMismatchError {
            found_version: version,
            found_hash: hash,
            current_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_depends_on_names() {
        assert_eq!(layout_hash(), layout_hash());

        let mut hasher = Hasher::new();
        hasher.update(&[FEATURE_VERSION]);
        for name in ["sepal_width", "sepal_length", "petal_length", "petal_width"] {
            hasher.update(name.as_bytes());
            hasher.update(&[0]);
        }
        assert_ne!(hasher.finalize(), layout_hash());
    }

    #[test]
    fn test_validate_layout() {
        assert!(validate_layout(FEATURE_VERSION, layout_hash()).is_ok());

        let err = validate_layout(FEATURE_VERSION + 1, layout_hash()).unwrap_err();
        assert_eq!(err.found_version, FEATURE_VERSION + 1);
        assert_eq!(err.current_hash, layout_hash());

        assert!(validate_layout(FEATURE_VERSION, !layout_hash()).is_err());
    }
}
