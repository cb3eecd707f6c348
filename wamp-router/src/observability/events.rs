//! Canonical structured event names used across `wamp-router`.

// Broker topic lifecycle events.
pub const TOPIC_CREATE: &str = "topic_create";
pub const TOPIC_REUSE: &str = "topic_reuse";
pub const TOPIC_DISPOSE: &str = "topic_dispose";
pub const TOPIC_DISPOSE_ABORTED: &str = "topic_dispose_aborted";
pub const TOPIC_DISPOSE_STALE: &str = "topic_dispose_stale";
pub const SUBSCRIBE_ENGINE_FAILED: &str = "subscribe_engine_failed";
pub const UNSUBSCRIBE_OK: &str = "unsubscribe_ok";
pub const UNSUBSCRIBE_UNKNOWN: &str = "unsubscribe_unknown";
pub const SESSION_SWEEP: &str = "session_sweep";

// Publication and event fan-out events.
pub const PUBLISH_FORWARD: &str = "publish_forward";
pub const PUBLISH_REJECTED: &str = "publish_rejected";
pub const EVENT_FANOUT: &str = "event_fanout";

// Dealer operation lifecycle events.
pub const OPERATION_OPEN: &str = "operation_open";
pub const OPERATION_REOPEN_IGNORED: &str = "operation_reopen_ignored";
pub const OPERATION_OPEN_AFTER_DISCONNECT: &str = "operation_open_after_disconnect";
pub const OPERATION_DISCONNECT: &str = "operation_disconnect";
pub const OPERATION_DISPOSE: &str = "operation_dispose";

// Invocation forwarding events.
pub const INVOCATION_FORWARD: &str = "invocation_forward";
pub const INVOCATION_CALLEE_GONE: &str = "invocation_callee_gone";
pub const INVOCATION_DISCLOSURE_REJECTED: &str = "invocation_disclosure_rejected";
