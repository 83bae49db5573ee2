use serde::{Deserialize, Serialize};

use super::ids::LibraryUid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub library_uid: LibraryUid,
    pub name: String,
    pub address: String,
    pub city: String,
}

/// Library as served by the library service: the public card plus the
/// internal row id availability adjustments are keyed on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryInfo {
    pub id: i64,
    #[serde(flatten)]
    pub library: Library,
}
