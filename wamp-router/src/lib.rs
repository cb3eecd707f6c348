/********************************************************************************
 * Copyright (c) 2026 Contributors to the wamp-router project
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! # wamp-router
//!
//! `wamp-router` implements the realm-routing core of a WAMP router: the
//! broker's topic subscription registry and the dealer's per-registration
//! callee invocation lifecycle.
//!
//! Typical usage is API-first and remains centered on [`TopicRegistry`] and
//! [`CalleeOperation`]. Internal modules are organized by domain layer to keep
//! behavior ownership explicit; publication matching, wire encoding and
//! connection management stay behind the boundary traits.
//!
//! ## Broker quick start
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use wamp_router::{
//!     DeliveryEngine, DeliveryHandle, Event, EventSink, IdAllocator, Payload, PublishOptions,
//!     RouterError, SubscribeOptions, SubscriberSession, TopicRegistry,
//! };
//!
//! # struct LoopbackEngine {
//! #     sinks: std::sync::Mutex<Vec<Arc<dyn EventSink>>>,
//! #     next_publication: std::sync::atomic::AtomicI64,
//! # }
//! #
//! # impl Default for LoopbackEngine {
//! #     fn default() -> Self {
//! #         Self {
//! #             sinks: std::sync::Mutex::new(Vec::new()),
//! #             next_publication: std::sync::atomic::AtomicI64::new(1),
//! #         }
//! #     }
//! # }
//! #
//! # #[async_trait]
//! # impl DeliveryEngine for LoopbackEngine {
//! #     async fn subscribe(
//! #         &self,
//! #         sink: Arc<dyn EventSink>,
//! #         _options: &SubscribeOptions,
//! #         _topic_uri: &str,
//! #     ) -> Result<Box<dyn DeliveryHandle>, RouterError> {
//! #         self.sinks.lock().unwrap().push(sink);
//! #         Ok(Box::new(NoopHandle))
//! #     }
//! #
//! #     async fn publish(
//! #         &self,
//! #         options: &PublishOptions,
//! #         topic_uri: &str,
//! #         payload: Payload,
//! #     ) -> Result<i64, RouterError> {
//! #         let publication_id = self
//! #             .next_publication
//! #             .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//! #         let sinks: Vec<_> = self.sinks.lock().unwrap().clone();
//! #         for sink in sinks {
//! #             sink.on_event(Event {
//! #                 publication_id,
//! #                 topic_uri: topic_uri.to_owned(),
//! #                 publisher: options.publisher,
//! #                 options: options.clone(),
//! #                 payload: payload.clone(),
//! #             })
//! #             .await;
//! #         }
//! #         Ok(publication_id)
//! #     }
//! # }
//! #
//! # struct NoopHandle;
//! #
//! # #[async_trait]
//! # impl DeliveryHandle for NoopHandle {
//! #     async fn dispose(&self) {}
//! # }
//! #
//! # struct CountingSession {
//! #     session: i64,
//! #     received: std::sync::atomic::AtomicUsize,
//! # }
//! #
//! # impl CountingSession {
//! #     fn new(session: i64) -> Self {
//! #         Self {
//! #             session,
//! #             received: std::sync::atomic::AtomicUsize::new(0),
//! #         }
//! #     }
//! #
//! #     fn received(&self) -> usize {
//! #         self.received.load(std::sync::atomic::Ordering::SeqCst)
//! #     }
//! # }
//! #
//! # #[async_trait]
//! # impl SubscriberSession for CountingSession {
//! #     fn session_id(&self) -> i64 {
//! #         self.session
//! #     }
//! #
//! #     async fn event(&self, _subscription_id: i64, _event: &Event) {
//! #         self.received.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
//! #     }
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = TopicRegistry::new(
//!     Arc::new(LoopbackEngine::default()),
//!     Arc::new(IdAllocator::new()),
//! );
//!
//! let subscriber = Arc::new(CountingSession::new(7));
//! let subscription_id = registry
//!     .subscribe(subscriber.clone(), SubscribeOptions::default(), "com.myapp.heartbeat")
//!     .await
//!     .unwrap();
//! assert_eq!(registry.lookup("com.myapp.heartbeat").await, Some(subscription_id));
//!
//! let publication_id = registry
//!     .publish(
//!         &PublishOptions {
//!             publisher: Some(9),
//!             ..Default::default()
//!         },
//!         "com.myapp.heartbeat",
//!         Payload::Args(vec![serde_json::json!(42)]),
//!     )
//!     .await
//!     .unwrap();
//! assert!(publication_id > 0);
//! assert_eq!(subscriber.received(), 1);
//! # });
//! ```
//!
//! ## Internal architecture map
//!
//! - Broker: topic subscription registry, per-topic subscriber books, event
//!   fan-out with receiver selection
//! - Dealer: callee operations with the pending/open/disconnected lifecycle
//!   and the caller-disclosure policy
//! - Boundaries: delivery engine, subscriber and callee sessions, caller
//!   error channel, invocation handler, registration catalog
//! - Shared: id allocation, URI validation, call payloads, protocol errors
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events/spans and does not unconditionally initialize a global
//! subscriber. Binaries/tests are responsible for one-time
//! `tracing_subscriber` initialization at process boundaries.

mod broker;
pub use broker::delivery::{
    DeliveryEngine, DeliveryHandle, Event, EventSink, PublishOptions, SubscribeOptions,
    SubscriberSession,
};
pub use broker::registry::TopicRegistry;

mod dealer;
pub use dealer::details::{
    CallDetails, CallOptions, CallerInfo, ExtendedCallDetails, InvocationDetails, RegisterOptions,
};
pub use dealer::operation::{CalleeOperation, OperationState};
pub use dealer::session::{
    CalleeSession, CallerChannel, ConnectionMonitor, DisconnectListener, InvocationHandler,
    OperationCatalog,
};

mod errors;
pub use errors::{
    RouterError, CALLEE_DISCONNECTED, DISCLOSE_ME_DISALLOWED, INVALID_URI, NETWORK_FAILURE,
    NO_SUCH_SUBSCRIPTION,
};

mod ids;
pub use ids::{IdAllocator, PublicationId, RegistrationId, RequestId, SessionId, SubscriptionId};

mod payload;
pub use payload::{ArgDict, ArgList, Payload};

mod uri;
pub use uri::{validate_uri, MatchPattern};

#[doc(hidden)]
pub mod benchmark_support;
#[doc(hidden)]
pub mod observability;
