/// A row of the `domains` table
///
/// The counter tracks how many distinct child links have been queued under
/// this domain. It only ever grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRecord {
    /// Stable identifier assigned by the store
    pub id: i64,

    /// Lowercase host name
    pub name: String,

    /// Number of child links queued for this domain
    pub processed_links: u64,
}

impl DomainRecord {
    /// Creates a record for a freshly registered domain
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            processed_links: 0,
        }
    }

    /// Checks if this domain has reached the link limit
    ///
    /// A limit of 0 means unlimited.
    pub fn has_reached_limit(&self, limit: u64) -> bool {
        limit > 0 && self.processed_links >= limit
    }
}
