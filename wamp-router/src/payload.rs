//! Publication and call payloads. Peers may send no payload, positional
//! arguments, or positional plus keyword arguments; one tagged enum carries
//! whichever arity was sent through the router untouched.

use serde_json::{Map, Value};

/// Positional arguments of a publication, call or invocation.
pub type ArgList = Vec<Value>;
/// Keyword arguments of a publication, call or invocation.
pub type ArgDict = Map<String, Value>;

/// An application payload. The router never looks inside; it only forwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Payload {
    #[default]
    Empty,
    Args(ArgList),
    ArgsKwargs(ArgList, ArgDict),
}

impl Payload {
    /// Positional arguments, when the payload carries any.
    pub fn args(&self) -> Option<&ArgList> {
        match self {
            Payload::Empty => None,
            Payload::Args(args) | Payload::ArgsKwargs(args, _) => Some(args),
        }
    }

    /// Keyword arguments, when the payload carries any.
    pub fn kwargs(&self) -> Option<&ArgDict> {
        match self {
            Payload::ArgsKwargs(_, kwargs) => Some(kwargs),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }
}
