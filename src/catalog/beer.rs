use serde::{Deserialize, Serialize};

pub type BeerId = u64;

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beer {
    pub id: BeerId,
    pub name: String,
    pub description: String,
    #[serde(rename = "image_url", default)]
    pub image_url: Option<String>,
}
