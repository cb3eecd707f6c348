//! Topic and procedure URI handling: the match policies a registration or
//! subscription can carry, and the loose well-formedness rule applied before
//! any URI reaches router state.

use crate::errors::RouterError;
use serde::{Deserialize, Serialize};

/// How a registered or subscribed URI is matched against concrete URIs.
///
/// Anything other than [`MatchPattern::Exact`] means one registration can
/// serve many concrete URIs, in which case invocations disclose the concrete
/// procedure that was dialed.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPattern {
    #[default]
    Exact,
    Prefix,
    Wildcard,
}

/// Checks `uri` against the loose URI rule: non-empty, no whitespace, no `#`,
/// and no empty components. Wildcard URIs are the one exception, since an
/// empty component is exactly how they express "match anything here".
pub fn validate_uri(uri: &str, pattern: MatchPattern) -> Result<(), RouterError> {
    let components_ok = pattern == MatchPattern::Wildcard
        || uri.split('.').all(|component| !component.is_empty());
    let well_formed =
        !uri.is_empty() && !uri.chars().any(|c| c.is_whitespace() || c == '#') && components_ok;

    if well_formed {
        Ok(())
    } else {
        Err(RouterError::InvalidUri(uri.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_uris_pass() {
        assert!(validate_uri("com.myapp.topic1", MatchPattern::Exact).is_ok());
        assert!(validate_uri("single", MatchPattern::Exact).is_ok());
        assert!(validate_uri("com.myapp", MatchPattern::Prefix).is_ok());
    }

    #[test]
    fn malformed_uris_are_rejected() {
        for uri in ["", "com.my app.topic", "com.#fragment", "com..topic", ".leading", "trailing."] {
            assert_eq!(
                validate_uri(uri, MatchPattern::Exact),
                Err(RouterError::InvalidUri(uri.to_owned())),
                "expected {uri:?} to be rejected"
            );
        }
    }

    #[test]
    fn wildcard_uris_may_hold_empty_components() {
        assert!(validate_uri("com..topic1", MatchPattern::Wildcard).is_ok());
        assert!(validate_uri(".topic1", MatchPattern::Wildcard).is_ok());
        assert!(validate_uri("com.my app.", MatchPattern::Wildcard).is_err());
    }
}
