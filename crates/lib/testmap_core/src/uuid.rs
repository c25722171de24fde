// Test vector rows are keyed by UUIDv7 so that primary-key order follows
// insertion order; identity is still the (module, app, test_name) triple.
// Workflow task ids use the same generator.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
