//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the desired state declared in the configuration file with the
//! state recorded for it, and derives both the per-resource decision
//! (create, update, replace, nothing) and the ordered field-level operations
//! an update needs.

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::{AttributeSchema, AttributeType, ResourceSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Replace,
    Add,
    Remove,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Replace => "replace",
            OperationKind::Add => "add",
            OperationKind::Remove => "remove",
        }
    }
}

/// One field-level change instruction for an update
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OperationKind,
    pub attribute: String,
    /// Absent for a plain remove of a scalar
    pub value: Option<Value>,
}

impl Operation {
    pub fn replace(attribute: impl Into<String>, value: Value) -> Self {
        Self {
            kind: OperationKind::Replace,
            attribute: attribute.into(),
            value: Some(value),
        }
    }

    pub fn add(attribute: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            kind: OperationKind::Add,
            attribute: attribute.into(),
            value: Some(Value::List(values)),
        }
    }

    pub fn remove(attribute: impl Into<String>, values: Option<Vec<Value>>) -> Self {
        Self {
            kind: OperationKind::Remove,
            attribute: attribute.into(),
            value: values.map(Value::List),
        }
    }
}

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
        operations: Vec<Operation>,
    },
    /// An immutable attribute changed -> delete and create
    Replace {
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

/// Compare desired state with current state to compute a Diff
pub fn diff(schema: &ResourceSchema, desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let replaced = replacement_attributes(schema, &desired.attributes, &current.attributes);
    if !replaced.is_empty() {
        return Diff::Replace {
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: replaced,
        };
    }

    let operations = diff_operations(schema, &desired.attributes, &current.attributes);
    if operations.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let mut changed_attributes: Vec<String> = Vec::new();
    for op in &operations {
        if !changed_attributes.contains(&op.attribute) {
            changed_attributes.push(op.attribute.clone());
        }
    }

    Diff::Update {
        id: desired.id.clone(),
        from: current.clone(),
        to: desired.clone(),
        changed_attributes,
        operations,
    }
}

/// Field-level operations turning `current` into `desired`, in schema order
///
/// Read-only, requires-replace and unmapped attributes never produce
/// operations. An empty result means no update call is needed.
pub fn diff_operations(
    schema: &ResourceSchema,
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<Operation> {
    let mut operations = Vec::new();

    for attr in schema.attributes() {
        if attr.read_only || attr.requires_replace || attr.provider_name.is_none() {
            continue;
        }

        let planned = desired.get(&attr.name).filter(|v| !v.is_empty_string());
        let recorded = current.get(&attr.name).filter(|v| !v.is_empty_string());

        if let AttributeType::Set(inner) = &attr.attr_type {
            set_operations(attr, inner, planned, recorded, &mut operations);
            continue;
        }

        match (planned, recorded) {
            (Some(p), Some(r)) if attr.attr_type.semantically_equal(p, r) => {}
            (Some(p), _) => operations.push(Operation::replace(&attr.name, p.clone())),
            (None, Some(_)) if !attr.computed => {
                operations.push(Operation::remove(&attr.name, None))
            }
            (None, _) => {}
        }
    }

    operations
}

fn set_operations(
    attr: &AttributeSchema,
    inner: &AttributeType,
    planned: Option<&Value>,
    recorded: Option<&Value>,
    operations: &mut Vec<Operation>,
) {
    if planned.is_none() && attr.computed {
        return;
    }

    let planned = set_items(planned);
    let recorded = set_items(recorded);
    let contains = |items: &[Value], v: &Value| items.iter().any(|x| inner.semantically_equal(x, v));

    let added: Vec<Value> = planned
        .iter()
        .filter(|v| !contains(recorded, *v))
        .cloned()
        .collect();
    let removed: Vec<Value> = recorded
        .iter()
        .filter(|v| !contains(planned, *v))
        .cloned()
        .collect();

    if !added.is_empty() {
        operations.push(Operation::add(&attr.name, added));
    }
    if !removed.is_empty() {
        operations.push(Operation::remove(&attr.name, Some(removed)));
    }
}

fn set_items(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::List(items)) => items.as_slice(),
        Some(other) => std::slice::from_ref(other),
        None => &[],
    }
}

/// Requires-replace attributes whose planned value differs from the recorded one
fn replacement_attributes(
    schema: &ResourceSchema,
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    schema
        .attributes()
        .filter(|attr| attr.requires_replace)
        .filter(|attr| {
            match (
                desired.get(&attr.name).filter(|v| !v.is_empty_string()),
                current.get(&attr.name),
            ) {
                (Some(p), Some(r)) => !attr.attr_type.semantically_equal(p, r),
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
        .map(|attr| attr.name.clone())
        .collect()
}

/// Compute Diff for multiple resources and generate a Plan
///
/// Data sources always become reads. Recorded resources that are no longer
/// declared become deletes.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        if resource.is_data_source() {
            plan.add(Effect::Read(resource.clone()));
            continue;
        }

        let Some(schema) = schemas.get(&resource.id.resource_type) else {
            log::warn!("No schema for {}, skipping", resource.id);
            continue;
        };

        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        match diff(schema, resource, &current) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update {
                id,
                from,
                to,
                operations,
                ..
            } => plan.add(Effect::Update {
                id,
                from,
                to,
                operations,
            }),
            Diff::Replace { from, to, .. } => plan.add(Effect::Replace { from, to }),
            Diff::NoChange(_) => {}
        }
    }

    let declared: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    let mut orphans: Vec<&State> = current_states
        .values()
        .filter(|s| s.exists && !declared.contains(&s.id))
        .collect();
    orphans.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));

    for state in orphans {
        match &state.identifier {
            Some(identifier) => plan.add(Effect::Delete {
                id: state.id.clone(),
                identifier: identifier.clone(),
            }),
            None => log::warn!("{} has no identifier recorded, cannot delete", state.id),
        }
    }

    plan
}
