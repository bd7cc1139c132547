//! Features Module - Model input schema
//!
//! - `layout` - feature names, order and layout hash
//! - `vector` - validated `FeatureVector`
//! - `validate` - request payload validation

pub mod layout;
pub mod vector;
pub mod validate;


// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_DISPLAY_NAMES, FEATURE_VERSION, layout_hash};
pub use vector::{FeatureVector, FeatureVectorError};
pub use validate::{validate, ValidationError};
