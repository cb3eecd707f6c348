//! Broker side of the router.
//!
//! Owns the topic subscription registry and the per-topic subscriber books.
//! This layer decides when topics come to life and when they are torn down;
//! publication matching and the per-subscriber connection writes stay behind
//! the delivery-engine boundary.
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use wamp_router::{
//!     DeliveryEngine, DeliveryHandle, Event, EventSink, IdAllocator, Payload, PublishOptions,
//!     RouterError, SubscribeOptions, SubscriberSession, TopicRegistry,
//! };
//!
//! # struct MockEngine;
//! #
//! # #[async_trait]
//! # impl DeliveryEngine for MockEngine {
//! #     async fn subscribe(
//! #         &self,
//! #         _sink: Arc<dyn EventSink>,
//! #         _options: &SubscribeOptions,
//! #         _topic_uri: &str,
//! #     ) -> Result<Box<dyn DeliveryHandle>, RouterError> {
//! #         Ok(Box::new(MockHandle))
//! #     }
//! #
//! #     async fn publish(
//! #         &self,
//! #         _options: &PublishOptions,
//! #         _topic_uri: &str,
//! #         _payload: Payload,
//! #     ) -> Result<i64, RouterError> {
//! #         Ok(1)
//! #     }
//! # }
//! #
//! # struct MockHandle;
//! #
//! # #[async_trait]
//! # impl DeliveryHandle for MockHandle {
//! #     async fn dispose(&self) {}
//! # }
//! #
//! # struct MockSession(i64);
//! #
//! # #[async_trait]
//! # impl SubscriberSession for MockSession {
//! #     fn session_id(&self) -> i64 {
//! #         self.0
//! #     }
//! #
//! #     async fn event(&self, _subscription_id: i64, _event: &Event) {}
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = TopicRegistry::new(Arc::new(MockEngine), Arc::new(IdAllocator::new()));
//!
//! // The first subscriber creates the topic; the second shares its id.
//! let first = registry
//!     .subscribe(Arc::new(MockSession(1)), SubscribeOptions::default(), "com.myapp.topic1")
//!     .await
//!     .unwrap();
//! let second = registry
//!     .subscribe(Arc::new(MockSession(2)), SubscribeOptions::default(), "com.myapp.topic1")
//!     .await
//!     .unwrap();
//! assert_eq!(first, second);
//!
//! // The last leaver triggers teardown.
//! registry.unsubscribe(1, first).await.unwrap();
//! registry.unsubscribe(2, first).await.unwrap();
//! assert_eq!(registry.lookup("com.myapp.topic1").await, None);
//! # });
//! ```

pub(crate) mod delivery;
pub(crate) mod registry;
pub(crate) mod topic;
