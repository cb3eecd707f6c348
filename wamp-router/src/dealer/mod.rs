//! Dealer side of the router.
//!
//! Owns the per-registration callee operations: the pending/open/disconnected
//! lifecycle, the wait that holds early invocations until the registration is
//! acknowledged, and the caller-disclosure policy. Request-id bookkeeping and
//! the wire writes stay behind the session and handler boundaries.
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use wamp_router::{
//!     CalleeOperation, CalleeSession, CallerChannel, ConnectionMonitor, DisconnectListener,
//!     InvocationDetails, InvocationHandler, OperationCatalog, OperationState, Payload,
//!     RegisterOptions,
//! };
//!
//! # struct MockCallee;
//! #
//! # #[async_trait]
//! # impl ConnectionMonitor for MockCallee {
//! #     async fn register_disconnect_listener(&self, _listener: Arc<dyn DisconnectListener>) {}
//! #     async fn unregister_disconnect_listener(&self, _listener: Arc<dyn DisconnectListener>) {}
//! # }
//! #
//! # #[async_trait]
//! # impl CalleeSession for MockCallee {
//! #     async fn invocation(
//! #         &self,
//! #         _request_id: i64,
//! #         _registration_id: i64,
//! #         _details: &InvocationDetails,
//! #         _payload: &Payload,
//! #     ) {
//! #     }
//! # }
//! #
//! # struct MockHandler;
//! #
//! # #[async_trait]
//! # impl InvocationHandler for MockHandler {
//! #     async fn register_invocation(
//! #         &self,
//! #         _operation: &CalleeOperation,
//! #         _caller: &Arc<dyn CallerChannel>,
//! #         _details: &InvocationDetails,
//! #         _payload: &Payload,
//! #     ) -> i64 {
//! #         1
//! #     }
//! #
//! #     async fn unregistered(&self, _operation: &CalleeOperation) {}
//! # }
//! #
//! # struct MockCatalog;
//! #
//! # #[async_trait]
//! # impl OperationCatalog for MockCatalog {
//! #     async fn unregister(&self, _callee: &Arc<dyn CalleeSession>, _registration_id: i64) {}
//! # }
//! #
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let operation = CalleeOperation::new(
//!     "com.myapp.date",
//!     7,
//!     RegisterOptions::default(),
//!     Arc::new(MockCallee),
//!     Arc::new(MockHandler),
//!     Arc::new(MockCatalog),
//! );
//!
//! // Registrations start pending; invocations wait until open releases them.
//! assert_eq!(operation.state(), OperationState::Pending);
//! operation.open().await;
//! assert_eq!(operation.state(), OperationState::Open);
//!
//! // Disconnects are terminal, and every report after the first is a no-op.
//! operation.on_disconnect().await;
//! operation.on_disconnect().await;
//! assert_eq!(operation.state(), OperationState::Disconnected);
//! # });
//! ```

pub(crate) mod details;
pub(crate) mod operation;
pub(crate) mod session;
