//! The wire-format unit of change: `{type, payload?, meta?}`.

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::id::CorrelationId;

/// Delivery scope tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Already applied on this side of a process boundary; never forward.
    Local,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Envelope metadata. Absent fields serialize away entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub request: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub response: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CorrelationId>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub error: bool,
}

impl EnvelopeMeta {
    pub fn is_empty(&self) -> bool {
        self.scope.is_none()
            && !self.request
            && !self.response
            && self.id.is_none()
            && !self.error
    }
}

/// One dispatchable unit: an action plus its delivery metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default, skip_serializing_if = "EnvelopeMeta::is_empty")]
    pub meta: EnvelopeMeta,
}

impl Envelope {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            meta: EnvelopeMeta::default(),
        }
    }

    /// An envelope that is applied on this side only and never forwarded.
    pub fn local(action: Action) -> Self {
        Self {
            action,
            meta: EnvelopeMeta {
                scope: Some(Scope::Local),
                ..Default::default()
            },
        }
    }

    /// A success response answering the request with the given id.
    pub fn response_to(id: CorrelationId, action: Action) -> Self {
        Self {
            action,
            meta: EnvelopeMeta {
                response: true,
                id: Some(id),
                ..Default::default()
            },
        }
    }

    /// An error response; the payload is the failure, not a result.
    pub fn error_response_to(id: CorrelationId, message: impl Into<String>) -> Self {
        Self {
            action: Action::RequestFailed {
                message: message.into(),
            },
            meta: EnvelopeMeta {
                response: true,
                error: true,
                id: Some(id),
                ..Default::default()
            },
        }
    }

    pub fn is_local(&self) -> bool {
        self.meta.scope == Some(Scope::Local)
    }

    /// Stamp local scope. Idempotent; one-directional per hop.
    pub fn mark_local(&mut self) {
        self.meta.scope = Some(Scope::Local);
    }

    pub fn is_request(&self) -> bool {
        self.meta.request && self.meta.id.is_some()
    }

    pub fn is_response(&self) -> bool {
        self.meta.response && self.meta.id.is_some()
    }
}

impl From<Action> for Envelope {
    fn from(action: Action) -> Self {
        Self::new(action)
    }
}
