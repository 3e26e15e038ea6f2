use serde::{Deserialize, Serialize};

/// A single headline as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
}
