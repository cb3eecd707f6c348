//! Router failures and the stable protocol error URIs peers see.

use crate::ids::SubscriptionId;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Peer addressed a subscription it does not hold.
pub const NO_SUCH_SUBSCRIPTION: &str = "wamp.error.no_such_subscription";
/// The callee serving the call went away before the invocation was delivered.
pub const CALLEE_DISCONNECTED: &str = "wamp.error.callee_disconnected";
/// The registration demands caller disclosure and the caller refused it.
pub const DISCLOSE_ME_DISALLOWED: &str = "wamp.error.disclose_me.not_allowed";
/// Topic or procedure URI failed validation.
pub const INVALID_URI: &str = "wamp.error.invalid_uri";
/// The delivery engine refused a registration.
pub const NETWORK_FAILURE: &str = "wamp.error.network_failure";

/// Failures of the routing core.
///
/// Every variant maps onto a stable error URI via [`RouterError::uri`]. The
/// message text may change between releases; the URI never does, since peers
/// key their handling on it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RouterError {
    NoSuchSubscription(SubscriptionId),
    CalleeDisconnected,
    DiscloseMeDisallowed,
    InvalidUri(String),
    NetworkFailure(String),
}

impl RouterError {
    /// The stable protocol URI identifying this failure to peers.
    pub fn uri(&self) -> &'static str {
        match self {
            RouterError::NoSuchSubscription(_) => NO_SUCH_SUBSCRIPTION,
            RouterError::CalleeDisconnected => CALLEE_DISCONNECTED,
            RouterError::DiscloseMeDisallowed => DISCLOSE_ME_DISALLOWED,
            RouterError::InvalidUri(_) => INVALID_URI,
            RouterError::NetworkFailure(_) => NETWORK_FAILURE,
        }
    }
}

impl Display for RouterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RouterError::NoSuchSubscription(subscription_id) => {
                write!(f, "no subscription with id {subscription_id}")
            }
            RouterError::CalleeDisconnected => {
                write!(f, "callee disconnected before the invocation was delivered")
            }
            RouterError::DiscloseMeDisallowed => {
                write!(f, "registration requires caller disclosure and the caller refused it")
            }
            RouterError::InvalidUri(uri) => write!(f, "malformed URI: {uri:?}"),
            RouterError::NetworkFailure(detail) => write!(f, "delivery engine failure: {detail}"),
        }
    }
}

impl Error for RouterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_its_wire_uri() {
        assert_eq!(RouterError::NoSuchSubscription(7).uri(), NO_SUCH_SUBSCRIPTION);
        assert_eq!(RouterError::CalleeDisconnected.uri(), CALLEE_DISCONNECTED);
        assert_eq!(RouterError::DiscloseMeDisallowed.uri(), DISCLOSE_ME_DISALLOWED);
        assert_eq!(RouterError::InvalidUri("a b".into()).uri(), INVALID_URI);
        assert_eq!(RouterError::NetworkFailure("down".into()).uri(), NETWORK_FAILURE);
    }
}
