//! Observability contract of the router core.
//!
//! Every `tracing` record carries a canonical `event` name from [`events`]
//! and the field keys defined in [`fields`], so log pipelines can match on
//! stable strings instead of message text.

pub mod events;
pub mod fields;
