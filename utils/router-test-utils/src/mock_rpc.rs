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

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;
use wamp_router::{
    ArgDict, CalleeOperation, CalleeSession, CallerChannel, ConnectionMonitor, DisconnectListener,
    InvocationDetails, InvocationHandler, OperationCatalog, Payload, RegistrationId, RequestId,
};

/// One invocation as a [`RecordingCalleeSession`] saw it.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedInvocation {
    pub request_id: RequestId,
    pub registration_id: RegistrationId,
    pub details: InvocationDetails,
    pub payload: Payload,
}

/// Callee session that stores invocations and plays connection monitor.
///
/// `fire_disconnect` behaves like the real thing: it snapshots the listener
/// list and notifies every listener, so tests can kill the "connection" at
/// any point and watch the teardown that follows.
#[derive(Default)]
pub struct RecordingCalleeSession {
    invocations: Mutex<Vec<RecordedInvocation>>,
    listeners: Mutex<Vec<Arc<dyn DisconnectListener>>>,
}

impl RecordingCalleeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> Vec<RecordedInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Simulates the connection dying, notifying every registered listener.
    pub async fn fire_disconnect(&self) {
        let listeners: Vec<_> = self.listeners.lock().unwrap().clone();
        debug!(
            listeners = listeners.len(),
            "recording callee firing disconnect"
        );
        for listener in listeners {
            listener.on_disconnect().await;
        }
    }
}

#[async_trait]
impl ConnectionMonitor for RecordingCalleeSession {
    async fn register_disconnect_listener(&self, listener: Arc<dyn DisconnectListener>) {
        self.listeners.lock().unwrap().push(listener);
    }

    async fn unregister_disconnect_listener(&self, listener: Arc<dyn DisconnectListener>) {
        self.listeners
            .lock()
            .unwrap()
            .retain(|registered| !Arc::ptr_eq(registered, &listener));
    }
}

#[async_trait]
impl CalleeSession for RecordingCalleeSession {
    async fn invocation(
        &self,
        request_id: RequestId,
        registration_id: RegistrationId,
        details: &InvocationDetails,
        payload: &Payload,
    ) {
        self.invocations.lock().unwrap().push(RecordedInvocation {
            request_id,
            registration_id,
            details: details.clone(),
            payload: payload.clone(),
        });
        debug!(
            request_id,
            registration_id, "recording callee received invocation"
        );
    }
}

/// Caller channel that stores the errors reported to it.
#[derive(Default)]
pub struct RecordingCallerChannel {
    errors: Mutex<Vec<(ArgDict, String)>>,
}

impl RecordingCallerChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<(ArgDict, String)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn error_uris(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .map(|(_, uri)| uri.clone())
            .collect()
    }
}

#[async_trait]
impl CallerChannel for RecordingCallerChannel {
    async fn error(&self, details: ArgDict, error_uri: &str) {
        debug!(error_uri, "recording caller received error");
        self.errors
            .lock()
            .unwrap()
            .push((details, error_uri.to_owned()));
    }
}

/// Invocation handler that mints sequential request ids and keeps the
/// registration and unregistration traffic it saw.
pub struct CountingInvocationHandler {
    next_request: AtomicI64,
    registered: Mutex<Vec<(RegistrationId, InvocationDetails)>>,
    unregistered: AtomicUsize,
}

impl CountingInvocationHandler {
    pub fn new() -> Self {
        Self {
            next_request: AtomicI64::new(500),
            registered: Mutex::new(Vec::new()),
            unregistered: AtomicUsize::new(0),
        }
    }

    pub fn registered(&self) -> Vec<(RegistrationId, InvocationDetails)> {
        self.registered.lock().unwrap().clone()
    }

    pub fn unregistered_count(&self) -> usize {
        self.unregistered.load(Ordering::SeqCst)
    }
}

impl Default for CountingInvocationHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InvocationHandler for CountingInvocationHandler {
    async fn register_invocation(
        &self,
        operation: &CalleeOperation,
        _caller: &Arc<dyn CallerChannel>,
        details: &InvocationDetails,
        _payload: &Payload,
    ) -> RequestId {
        self.registered
            .lock()
            .unwrap()
            .push((operation.registration_id(), details.clone()));
        self.next_request.fetch_add(1, Ordering::Relaxed)
    }

    async fn unregistered(&self, operation: &CalleeOperation) {
        debug!(
            registration_id = operation.registration_id(),
            "counting handler saw unregistration"
        );
        self.unregistered.fetch_add(1, Ordering::SeqCst);
    }
}

/// Operation catalog that stores every unregistration it is asked for.
#[derive(Default)]
pub struct RecordingOperationCatalog {
    unregistered: Mutex<Vec<RegistrationId>>,
}

impl RecordingOperationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unregistered(&self) -> Vec<RegistrationId> {
        self.unregistered.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperationCatalog for RecordingOperationCatalog {
    async fn unregister(&self, _callee: &Arc<dyn CalleeSession>, registration_id: RegistrationId) {
        debug!(registration_id, "recording catalog unregistered operation");
        self.unregistered.lock().unwrap().push(registration_id);
    }
}
