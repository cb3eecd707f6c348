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

//! Boundary contracts between the broker core and its surroundings: the
//! generic delivery engine that performs publication matching, and the
//! per-subscriber session connections events are written to.

use crate::errors::RouterError;
use crate::ids::{PublicationId, SessionId, SubscriptionId};
use crate::payload::Payload;
use crate::uri::MatchPattern;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Options a subscriber attaches to its subscription.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct SubscribeOptions {
    /// Match policy of the subscribed URI; absent means exact.
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<MatchPattern>,
}

impl SubscribeOptions {
    pub fn pattern(&self) -> MatchPattern {
        self.match_pattern.unwrap_or_default()
    }
}

/// Receiver-selection and disclosure options attached to a publication.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PublishOptions {
    /// Sessions that must not receive the event.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<SessionId>,
    /// When present, the only sessions allowed to receive the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eligible: Option<Vec<SessionId>>,
    /// Whether the publisher receives its own event; absent means it does not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_me: Option<bool>,
    /// Whether the publisher identity travels with the event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclose_me: Option<bool>,
    /// Publishing session, attached by the session layer. Router-internal;
    /// never serialized to peers.
    #[serde(skip)]
    pub publisher: Option<SessionId>,
}

impl PublishOptions {
    /// The protocol default keeps the publisher out of its own audience.
    pub fn excludes_publisher(&self) -> bool {
        self.exclude_me.unwrap_or(true)
    }
}

/// One matched publication, as the delivery engine hands it to a topic.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub publication_id: PublicationId,
    /// The concrete URI the event was published to.
    pub topic_uri: String,
    /// The publishing session, when the publication came from one.
    pub publisher: Option<SessionId>,
    /// The publication's receiver-selection and disclosure options.
    pub options: PublishOptions,
    pub payload: Payload,
}

/// Matches publications against live registrations and feeds each matched
/// topic's sink. The broker core consumes this engine, it never implements
/// one; anything from an in-process trie to a federated mesh fits behind it.
#[async_trait]
pub trait DeliveryEngine: Send + Sync {
    /// Registers `sink` for publications matching `topic_uri` under the given
    /// options. The returned handle undoes exactly this registration.
    async fn subscribe(
        &self,
        sink: Arc<dyn EventSink>,
        options: &SubscribeOptions,
        topic_uri: &str,
    ) -> Result<Box<dyn DeliveryHandle>, RouterError>;

    /// Hands a publication to matching, returning the id assigned to it.
    async fn publish(
        &self,
        options: &PublishOptions,
        topic_uri: &str,
        payload: Payload,
    ) -> Result<PublicationId, RouterError>;
}

/// Undo token for one delivery-engine registration. The broker calls
/// [`DeliveryHandle::dispose`] at most once per registration.
#[async_trait]
pub trait DeliveryHandle: Send + Sync {
    async fn dispose(&self);
}

/// Receives matched publications from the delivery engine.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn on_event(&self, event: Event);
}

/// One subscriber's outbound connection. The event write is the fan-out
/// primitive; delivery guarantees past this point live with the session
/// layer, not the broker.
#[async_trait]
pub trait SubscriberSession: Send + Sync {
    fn session_id(&self) -> SessionId;
    async fn event(&self, subscription_id: SubscriptionId, event: &Event);
}
