//! Effect - A single side effect the host will ask a Provider to perform

use crate::differ::Operation;
use crate::resource::{Resource, ResourceId, State};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Refresh a data source
    Read(Resource),
    Create(Resource),
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        operations: Vec<Operation>,
    },
    /// Delete then create, because an immutable attribute changed
    Replace { from: State, to: Resource },
    Delete {
        id: ResourceId,
        identifier: String,
    },
}

impl Effect {
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Delete { id, .. } => id,
            Effect::Replace { to, .. } => &to.id,
        }
    }
}
