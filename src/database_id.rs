//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of a stored transaction.
pub type TransactionId = DatabaseId;

/// The identifier a record carried in the upstream source it was loaded from.
pub type SourceId = i64;
