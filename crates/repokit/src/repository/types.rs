/// How a bulk delete learns which rows it removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SynchronizeSession {
    /// Select the matching rows, then delete by the same predicates.
    #[default]
    False,
    /// Let the database report the deleted rows (`DELETE ... RETURNING *`).
    Fetch,
    /// Select the matching rows, then delete exactly those primary keys.
    Evaluate,
}
