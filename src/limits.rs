//! Input bounds enforced at the command surface.

/// Longest accepted text field (names, contact fields, locations).
pub const MAX_TEXT_FIELD_LEN: usize = 256;

/// Cap per entity collection; keeps the snapshot files bounded.
pub const MAX_RECORDS_PER_KIND: usize = 100_000;
