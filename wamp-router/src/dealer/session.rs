//! Boundary contracts between the dealer core and its surroundings: callee
//! sessions with their connection monitors, the caller's error channel, the
//! registration catalog and the in-flight invocation handler.

use crate::dealer::details::InvocationDetails;
use crate::dealer::operation::CalleeOperation;
use crate::ids::{RegistrationId, RequestId};
use crate::payload::{ArgDict, Payload};
use async_trait::async_trait;
use std::sync::Arc;

/// Observer of one connection's death.
#[async_trait]
pub trait DisconnectListener: Send + Sync {
    async fn on_disconnect(&self);
}

/// Disconnect signaling of one peer connection.
///
/// Listener identity is the `Arc` pointer: unregistering passes the same
/// `Arc` that was registered, and unregistering a listener that is not
/// currently registered is a no-op.
#[async_trait]
pub trait ConnectionMonitor: Send + Sync {
    async fn register_disconnect_listener(&self, listener: Arc<dyn DisconnectListener>);
    async fn unregister_disconnect_listener(&self, listener: Arc<dyn DisconnectListener>);
}

/// A callee's session: its connection monitor plus the invocation write.
#[async_trait]
pub trait CalleeSession: ConnectionMonitor {
    /// Writes one invocation to the callee. Write failures surface as
    /// disconnects through the monitor, never here.
    async fn invocation(
        &self,
        request_id: RequestId,
        registration_id: RegistrationId,
        details: &InvocationDetails,
        payload: &Payload,
    );
}

/// Error channel back to one caller.
#[async_trait]
pub trait CallerChannel: Send + Sync {
    async fn error(&self, details: ArgDict, error_uri: &str);
}

/// Tracks in-flight invocations: mints request ids, pairs results and errors
/// back to their callers, routes cancellation. Owned by the dealer frontend;
/// an operation only ever needs these two calls.
#[async_trait]
pub trait InvocationHandler: Send + Sync {
    /// Records one outgoing invocation and returns the request id the callee
    /// must echo in its result.
    async fn register_invocation(
        &self,
        operation: &CalleeOperation,
        caller: &Arc<dyn CallerChannel>,
        details: &InvocationDetails,
        payload: &Payload,
    ) -> RequestId;

    /// The operation is gone; its in-flight invocations will never complete.
    async fn unregistered(&self, operation: &CalleeOperation);
}

/// The realm's procedure registrations.
#[async_trait]
pub trait OperationCatalog: Send + Sync {
    /// Removes one of the callee's registrations during disconnect teardown.
    async fn unregister(&self, callee: &Arc<dyn CalleeSession>, registration_id: RegistrationId);
}
