//! Closed category set and form revisions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which bucket an entry belongs to.
///
/// Exactly two variants. Searches always target the other one, see
/// [`Category::complement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// A project looking for engineers
    Project,
    /// An engineer looking for projects
    #[default]
    Engineer,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Project, Category::Engineer];

    /// The bucket a search from this category looks into.
    pub fn complement(self) -> Self {
        match self {
            Category::Project => Category::Engineer,
            Category::Engineer => Category::Project,
        }
    }

    /// Wire value stored in record metadata
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Project => "project",
            Category::Engineer => "engineer",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "project" => Ok(Category::Project),
            "engineer" => Ok(Category::Engineer),
            other => Err(format!(
                "unknown category '{}' (expected 'project' or 'engineer')",
                other
            )),
        }
    }
}

/// Form revision: which fields the form has and where vectors come from.
///
/// - `Mock`: content only, random vectors, searches are unfiltered
/// - `Embedded`: real embeddings plus an optional ID exact-match filter
/// - `Categorized`: `Embedded` plus the two-category complement filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revision {
    Mock,
    Embedded,
    #[default]
    Categorized,
}

impl Revision {
    pub fn has_id_field(self) -> bool {
        !matches!(self, Revision::Mock)
    }

    pub fn has_categories(self) -> bool {
        matches!(self, Revision::Categorized)
    }

    pub fn uses_random_vectors(self) -> bool {
        matches!(self, Revision::Mock)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Revision::Mock => "mock",
            Revision::Embedded => "embedded",
            Revision::Categorized => "categorized",
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Revision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mock" => Ok(Revision::Mock),
            "embedded" => Ok(Revision::Embedded),
            "categorized" => Ok(Revision::Categorized),
            other => Err(format!(
                "unknown revision '{}' (expected mock, embedded or categorized)",
                other
            )),
        }
    }
}
