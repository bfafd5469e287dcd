//! Canonical schema constants for structured logging
//!
//! Every runner log line uses these keys so operators can filter a JSON
//! log stream by operation and migration.

pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_MIGRATION: &str = "migration";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Operation names
pub const OP_UP: &str = "migrate_up";
pub const OP_DOWN: &str = "migrate_down";
pub const OP_STATUS: &str = "migrate_status";
pub const OP_CREATE: &str = "migrate_create";
