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

//! Canonical structured field keys and value-format helpers.

use crate::ids::SessionId;
use crate::payload::Payload;

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";

pub const TOPIC_URI: &str = "topic_uri";
pub const PROCEDURE_URI: &str = "procedure_uri";
pub const SESSION: &str = "session";
pub const SUBSCRIPTION_ID: &str = "subscription_id";
pub const REGISTRATION_ID: &str = "registration_id";
pub const REQUEST_ID: &str = "request_id";
pub const PUBLICATION_ID: &str = "publication_id";
pub const SUBSCRIBER_COUNT: &str = "subscriber_count";
pub const PAYLOAD: &str = "payload";
pub const ERR: &str = "err";
pub const REASON: &str = "reason";

pub const NONE: &str = "none";
pub const REASON_TOPIC_REVIVED: &str = "topic_revived";
pub const REASON_TOPIC_REPLACED: &str = "topic_replaced";

/// Payload shape for log records; arity and sizes only, never contents.
pub fn format_payload(payload: &Payload) -> String {
    match payload {
        Payload::Empty => NONE.to_string(),
        Payload::Args(args) => format!("args[{}]", args.len()),
        Payload::ArgsKwargs(args, kwargs) => {
            format!("args[{}]+kwargs[{}]", args.len(), kwargs.len())
        }
    }
}

pub fn format_optional_session(session: Option<SessionId>) -> String {
    session
        .map(|session| session.to_string())
        .unwrap_or_else(|| NONE.to_string())
}
