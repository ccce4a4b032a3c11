use serde::{Deserialize, Serialize};

/// ULID document identifier, assigned at extraction time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct DocId(String);

impl DocId {
    #[inline]
    pub fn new() -> DocId {
        DocId(rusty_ulid::generate_ulid_string())
    }
}

impl Default for DocId {
    fn default() -> Self {
        Self::new()
    }
}

/// A text snippet extracted from a crawled page, paired with the absolute
/// URL it links to. The embedding is absent until the embedding pipeline
/// assigns one; it is never reassigned afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    pub source: String,
    #[serde(skip_serializing, default)]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: DocId::new(),
            text: text.into(),
            source: source.into(),
            embedding: None,
        }
    }
}
