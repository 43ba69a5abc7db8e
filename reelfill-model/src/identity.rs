/// Best-effort identity of a film, resolved from a single review-site URL.
///
/// Every field is optional; an all-empty identity is a valid result and
/// callers must tolerate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieIdentity {
    pub title: Option<String>,
    pub year: Option<i32>,
    /// IMDb title identifier (`tt` followed by digits).
    pub imdb_id: Option<String>,
    /// TMDb movie identifier.
    pub tmdb_id: Option<String>,
}

impl MovieIdentity {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.year.is_none()
            && self.imdb_id.is_none()
            && self.tmdb_id.is_none()
    }
}
