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

//! One callee registration as the dealer routes to it: invocations gate on
//! registration readiness, the caller-disclosure policy is applied per call,
//! and the callee's disconnect signal drives exactly-once teardown.

use crate::dealer::details::{CallDetails, InvocationDetails, RegisterOptions};
use crate::dealer::session::{
    CalleeSession, CallerChannel, DisconnectListener, InvocationHandler, OperationCatalog,
};
use crate::errors::{RouterError, CALLEE_DISCONNECTED};
use crate::ids::RegistrationId;
use crate::observability::{events, fields};
use crate::payload::{ArgDict, Payload};
use crate::uri::MatchPattern;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tracing::{debug, warn};

const COMPONENT: &str = "callee_operation";

/// Lifecycle of a callee operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationState {
    /// Registered but not yet acknowledged to the callee; invocations wait.
    Pending,
    /// Acknowledged; invocations flow.
    Open,
    /// The callee's connection is gone. Terminal.
    Disconnected,
}

/// One callee's registered procedure.
///
/// Created `Pending` when the callee registers. [`CalleeOperation::open`]
/// acknowledges the registration and releases invocations that arrived
/// early; a disconnect, reported from any number of paths concurrently,
/// tears the operation down exactly once. The single watch cell is both the
/// state and the wakeup for waiters, so a waiter can never miss the
/// transition that should release it.
pub struct CalleeOperation {
    procedure_uri: String,
    registration_id: RegistrationId,
    options: RegisterOptions,
    callee: Arc<dyn CalleeSession>,
    handler: Arc<dyn InvocationHandler>,
    catalog: Arc<dyn OperationCatalog>,
    state: watch::Sender<OperationState>,
    opened: AtomicBool,
    disconnect_relay: Arc<DisconnectRelay>,
}

/// What actually sits in the callee's connection monitor. A separate type so
/// the monitor owns the relay rather than the operation; the weak link
/// breaks the cycle the pair would otherwise form.
struct DisconnectRelay {
    operation: Weak<CalleeOperation>,
}

#[async_trait]
impl DisconnectListener for DisconnectRelay {
    async fn on_disconnect(&self) {
        if let Some(operation) = self.operation.upgrade() {
            operation.on_disconnect().await;
        }
    }
}

impl CalleeOperation {
    /// Creates the operation in `Pending`. Invocations arriving before
    /// `open` suspend until the registration is acknowledged.
    pub fn new(
        procedure_uri: impl Into<String>,
        registration_id: RegistrationId,
        options: RegisterOptions,
        callee: Arc<dyn CalleeSession>,
        handler: Arc<dyn InvocationHandler>,
        catalog: Arc<dyn OperationCatalog>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(OperationState::Pending);
        Arc::new_cyclic(|weak: &Weak<Self>| Self {
            procedure_uri: procedure_uri.into(),
            registration_id,
            options,
            callee,
            handler,
            catalog,
            state,
            opened: AtomicBool::new(false),
            disconnect_relay: Arc::new(DisconnectRelay {
                operation: weak.clone(),
            }),
        })
    }

    pub fn procedure_uri(&self) -> &str {
        &self.procedure_uri
    }

    pub fn registration_id(&self) -> RegistrationId {
        self.registration_id
    }

    pub fn register_options(&self) -> &RegisterOptions {
        &self.options
    }

    /// The session serving this registration. Handlers route results and
    /// cancellation through it.
    pub fn callee(&self) -> &Arc<dyn CalleeSession> {
        &self.callee
    }

    /// Point-in-time observation of the lifecycle state.
    pub fn state(&self) -> OperationState {
        *self.state.borrow()
    }

    /// Acknowledges the registration and releases every waiting invocation.
    ///
    /// The disconnect relay goes into the callee's monitor before the state
    /// flips, so an invocation released here cannot outrun the disconnect
    /// signal it relies on. A second `open` is a logged no-op and never
    /// registers the relay again.
    pub async fn open(&self) {
        if self.opened.swap(true, Ordering::SeqCst) {
            warn!(
                event = events::OPERATION_REOPEN_IGNORED,
                component = COMPONENT,
                procedure_uri = %self.procedure_uri,
                registration_id = self.registration_id,
                "open called on an operation that already opened"
            );
            return;
        }

        self.callee
            .register_disconnect_listener(self.disconnect_relay.clone())
            .await;

        let transitioned = self.state.send_if_modified(|state| {
            if *state == OperationState::Pending {
                *state = OperationState::Open;
                true
            } else {
                false
            }
        });

        if transitioned {
            debug!(
                event = events::OPERATION_OPEN,
                component = COMPONENT,
                procedure_uri = %self.procedure_uri,
                registration_id = self.registration_id,
                "registration acknowledged; invocations may flow"
            );
        } else {
            // The disconnect already won; take the freshly registered relay
            // back out of the dead connection's monitor.
            self.callee
                .unregister_disconnect_listener(self.disconnect_relay.clone())
                .await;
            debug!(
                event = events::OPERATION_OPEN_AFTER_DISCONNECT,
                component = COMPONENT,
                procedure_uri = %self.procedure_uri,
                registration_id = self.registration_id,
                "open arrived after the callee disconnected"
            );
        }
    }

    /// Handles loss of the callee's connection.
    ///
    /// Any path may report it, any number of times; the state cell's
    /// check-and-set picks exactly one winner to run teardown. Flipping to
    /// `Disconnected` also releases invocations still waiting on `Pending`,
    /// which then take the callee-gone error path.
    pub async fn on_disconnect(&self) {
        let first = self.state.send_if_modified(|state| {
            if *state == OperationState::Disconnected {
                false
            } else {
                *state = OperationState::Disconnected;
                true
            }
        });
        if !first {
            return;
        }

        debug!(
            event = events::OPERATION_DISCONNECT,
            component = COMPONENT,
            procedure_uri = %self.procedure_uri,
            registration_id = self.registration_id,
            "callee gone; unregistering operation"
        );

        self.callee
            .unregister_disconnect_listener(self.disconnect_relay.clone())
            .await;
        self.catalog
            .unregister(&self.callee, self.registration_id)
            .await;
        self.handler.unregistered(self).await;
    }

    /// Routes one call to the callee.
    ///
    /// Suspends while the operation is `Pending`; there is no timeout, only
    /// `open` or a disconnect releases the wait. Protocol failures are
    /// reported on the caller's error channel, exactly one per call, and
    /// never reach the callee.
    pub async fn invoke(
        &self,
        caller: &Arc<dyn CallerChannel>,
        details: CallDetails,
        payload: Payload,
    ) {
        let mut ready = self.state.subscribe();
        let state = match ready
            .wait_for(|state| *state != OperationState::Pending)
            .await
        {
            Ok(state) => *state,
            // The cell only closes when the operation is dropped; a caller
            // still holding it treats that as the connection being gone.
            Err(_) => OperationState::Disconnected,
        };

        if state == OperationState::Disconnected {
            warn!(
                event = events::INVOCATION_CALLEE_GONE,
                component = COMPONENT,
                procedure_uri = %self.procedure_uri,
                registration_id = self.registration_id,
                "dropping call for disconnected callee"
            );
            caller.error(ArgDict::new(), CALLEE_DISCONNECTED).await;
            return;
        }

        let details = match self.invocation_details(details) {
            Ok(details) => details,
            Err(err) => {
                warn!(
                    event = events::INVOCATION_DISCLOSURE_REJECTED,
                    component = COMPONENT,
                    procedure_uri = %self.procedure_uri,
                    registration_id = self.registration_id,
                    err = %err,
                    "call violates the registration's disclosure policy"
                );
                caller.error(ArgDict::new(), err.uri()).await;
                return;
            }
        };

        let request_id = self
            .handler
            .register_invocation(self, caller, &details, &payload)
            .await;
        self.callee
            .invocation(request_id, self.registration_id, &details, &payload)
            .await;

        debug!(
            event = events::INVOCATION_FORWARD,
            component = COMPONENT,
            procedure_uri = %self.procedure_uri,
            registration_id = self.registration_id,
            request_id,
            caller = %fields::format_optional_session(details.caller),
            payload = %fields::format_payload(&payload),
            "invocation forwarded to callee"
        );
    }

    /// Applies the disclosure policy to one call's details.
    ///
    /// Minimal details pass through untouched. Extended details start from a
    /// copy of their base, so fields the policy does not own survive as the
    /// session layer set them.
    fn invocation_details(&self, details: CallDetails) -> Result<InvocationDetails, RouterError> {
        let extended = match details {
            CallDetails::Minimal(details) => return Ok(details),
            CallDetails::WithCaller(extended) => extended,
        };

        let mut result = extended.base;

        let required = self.options.requires_disclosure();
        if required && extended.options.disclose_me == Some(false) {
            return Err(RouterError::DiscloseMeDisallowed);
        }

        if required || extended.options.disclose_me == Some(true) {
            result.caller = Some(extended.caller.session);
            result.auth_id = extended.caller.auth_id;
            result.auth_method = extended.caller.auth_method;
            result.auth_role = extended.caller.auth_role;
        }

        if extended.options.receive_progress == Some(true) {
            result.receive_progress = true;
        }

        if self.options.pattern() != MatchPattern::Exact {
            result.procedure = Some(extended.procedure_uri);
        }

        Ok(result)
    }

    /// Orderly-teardown hook: detaches the disconnect relay and nothing
    /// else. State, catalog and handler bookkeeping belong to the
    /// unregistration flow that called this.
    pub async fn dispose(&self) {
        self.callee
            .unregister_disconnect_listener(self.disconnect_relay.clone())
            .await;
        debug!(
            event = events::OPERATION_DISPOSE,
            component = COMPONENT,
            procedure_uri = %self.procedure_uri,
            registration_id = self.registration_id,
            "operation disposed"
        );
    }
}
