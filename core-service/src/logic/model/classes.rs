//! Class labels and their fixed index mapping

use serde::{Deserialize, Serialize};

/// Number of output classes
pub const CLASS_COUNT: usize = 3;

/// Iris species, ordered by model class index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassLabel {
    Setosa,
    Versicolor,
    Virginica,
}

impl ClassLabel {
    /// All labels in class-index order
    pub const ALL: [ClassLabel; CLASS_COUNT] = [
        ClassLabel::Setosa,
        ClassLabel::Versicolor,
        ClassLabel::Virginica,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClassLabel::Setosa => "Setosa",
            ClassLabel::Versicolor => "Versicolor",
            ClassLabel::Virginica => "Virginica",
        }
    }

    /// Label names in class-index order
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
