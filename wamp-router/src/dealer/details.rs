//! Call and invocation detail records: what a caller attaches to a call,
//! what a callee attached to its registration, and what the router lets the
//! callee see once the disclosure policy has been applied.

use crate::ids::SessionId;
use crate::uri::MatchPattern;
use serde::{Deserialize, Serialize};

/// Options a callee attached when registering its procedure.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RegisterOptions {
    /// How the registered URI matches dialed procedures; absent means exact.
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<MatchPattern>,
    /// Disclosure demand. `Some(true)` requires caller identity on every
    /// invocation; `Some(false)` and `None` leave it to the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclose_caller: Option<bool>,
}

impl RegisterOptions {
    pub fn pattern(&self) -> MatchPattern {
        self.match_pattern.unwrap_or_default()
    }

    pub fn requires_disclosure(&self) -> bool {
        self.disclose_caller == Some(true)
    }
}

/// Options the caller attached to its call.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct CallOptions {
    /// `Some(false)` is an explicit refusal to be disclosed, which collides
    /// with registrations that demand disclosure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclose_me: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_progress: Option<bool>,
}

/// Caller identity as established by the session layer at hello/auth time.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct CallerInfo {
    pub session: SessionId,
    pub auth_id: Option<String>,
    pub auth_method: Option<String>,
    pub auth_role: Option<String>,
}

/// What the callee learns about one invocation. Serialized into the
/// invocation's details dict; absent fields stay off the wire.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct InvocationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<SessionId>,
    #[serde(rename = "caller_authid", skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    #[serde(rename = "caller_authmethod", skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,
    #[serde(rename = "caller_authrole", skip_serializing_if = "Option::is_none")]
    pub auth_role: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub receive_progress: bool,
    /// The concrete procedure dialed, set for pattern-based registrations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
}

/// Per-call context in its two shapes.
///
/// `Minimal` details pass through to the callee untouched. `WithCaller` is
/// the richer record session layers build for authenticated peers; it is the
/// only shape the disclosure policy can act on.
#[derive(Clone, Debug, PartialEq)]
pub enum CallDetails {
    Minimal(InvocationDetails),
    WithCaller(ExtendedCallDetails),
}

/// The richer call record: pass-through base details plus caller identity,
/// caller options and the concrete procedure URI that was dialed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExtendedCallDetails {
    pub base: InvocationDetails,
    pub procedure_uri: String,
    pub caller: CallerInfo,
    pub options: CallOptions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn details_serialize_under_protocol_keys_and_omit_absent_fields() {
        let details = InvocationDetails {
            caller: Some(81),
            auth_id: Some("peter".to_owned()),
            auth_role: Some("frontend".to_owned()),
            receive_progress: true,
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&details).unwrap(),
            json!({
                "caller": 81,
                "caller_authid": "peter",
                "caller_authrole": "frontend",
                "receive_progress": true,
            })
        );

        assert_eq!(
            serde_json::to_value(InvocationDetails::default()).unwrap(),
            json!({}),
            "undisclosed invocations carry an empty details dict"
        );
    }

    #[test]
    fn register_options_read_their_policy() {
        assert!(!RegisterOptions::default().requires_disclosure());
        assert_eq!(RegisterOptions::default().pattern(), MatchPattern::Exact);

        let strict = RegisterOptions {
            match_pattern: Some(MatchPattern::Wildcard),
            disclose_caller: Some(true),
        };
        assert!(strict.requires_disclosure());
        assert_eq!(strict.pattern(), MatchPattern::Wildcard);

        let opted_out = RegisterOptions {
            disclose_caller: Some(false),
            ..Default::default()
        };
        assert!(!opted_out.requires_disclosure());
    }
}
