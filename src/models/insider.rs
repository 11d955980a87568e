use serde::Serialize;

/// A stock insider, unique by name. The slug is derived from the name when
/// the row is created and is never recomputed afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Insider {
    pub id: i64,
    pub name: String,
    pub slug: String,
}
