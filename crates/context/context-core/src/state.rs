//! # Dialogue states
//!
//! Declared states live in [`StatesGroup`]s that are appended to a [`StateRegistry`] once, when the
//! bot declares its dialogue. Stored state names are turned back into [`StateValue`]s with
//! [`StateRegistry::restore`]: an exact name match yields the declared [`State`], anything else a
//! detached state carrying only the name.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{ContextError, Result};

/// A dialogue state. Declared states belong to a group and are named `"{group}.{state}"`;
/// detached states only have a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct State {
    name: Arc<str>,
    group: Option<Arc<str>>,
}

impl State {
    fn declared(group: &Arc<str>, state: &str) -> Self {
        Self {
            name: format!("{}.{}", group, state).into(),
            group: Some(group.clone()),
        }
    }

    /// A state that is not bound to any declared group.
    pub fn detached(name: impl Into<String>) -> Self {
        Self {
            name: name.into().into(),
            group: None,
        }
    }

    /// Canonical name; this is what gets stored.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_declared(&self) -> bool {
        self.group.is_some()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Current state of a context: a [`State`] (declared or detached) or a free-form name.
/// "No state" is `Option::<StateValue>::None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateValue {
    State(State),
    Raw(String),
}

impl StateValue {
    /// Serialized form: the state's canonical name, or the raw string unchanged.
    pub fn name(&self) -> &str {
        match self {
            StateValue::State(state) => state.name(),
            StateValue::Raw(name) => name,
        }
    }

    pub fn as_state(&self) -> Option<&State> {
        match self {
            StateValue::State(state) => Some(state),
            StateValue::Raw(_) => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<State> for StateValue {
    fn from(state: State) -> Self {
        StateValue::State(state)
    }
}

impl From<&State> for StateValue {
    fn from(state: &State) -> Self {
        StateValue::State(state.clone())
    }
}

impl From<String> for StateValue {
    fn from(name: String) -> Self {
        StateValue::Raw(name)
    }
}

impl From<&str> for StateValue {
    fn from(name: &str) -> Self {
        StateValue::Raw(name.to_string())
    }
}

/// Named group of declared states, kept in declaration order.
#[derive(Debug, Clone)]
pub struct StatesGroup {
    name: Arc<str>,
    states: Vec<State>,
}

impl StatesGroup {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().into(),
            states: Vec::new(),
        }
    }

    /// Appends a member state; its canonical name becomes `"{group}.{state}"`.
    pub fn with_state(mut self, state: impl AsRef<str>) -> Self {
        self.states.push(State::declared(&self.name, state.as_ref()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member by short name (the part after the group prefix).
    pub fn state(&self, short_name: &str) -> Option<&State> {
        self.states
            .iter()
            .find(|s| short_name_of(&self.name, s) == Some(short_name))
    }

    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ContextError::InvalidState(
                "states group name must not be empty".to_string(),
            ));
        }
        let mut seen = Vec::with_capacity(self.states.len());
        for state in &self.states {
            let short = short_name_of(&self.name, state).unwrap_or_default();
            if short.is_empty() {
                return Err(ContextError::InvalidState(format!(
                    "empty state name in group {}",
                    self.name
                )));
            }
            if seen.contains(&short) {
                return Err(ContextError::InvalidState(format!(
                    "duplicate state {} in group {}",
                    short, self.name
                )));
            }
            seen.push(short);
        }
        Ok(())
    }
}

fn short_name_of<'a>(group: &str, state: &'a State) -> Option<&'a str> {
    state
        .name()
        .strip_prefix(group)
        .and_then(|rest| rest.strip_prefix('.'))
}

#[derive(Default)]
struct RegistryInner {
    groups: Vec<Arc<StatesGroup>>,
    /// First declared state per canonical name.
    index: HashMap<String, State>,
}

/// Append-only catalog of declared state groups.
#[derive(Default)]
pub struct StateRegistry {
    inner: RwLock<RegistryInner>,
}

static GLOBAL_REGISTRY: OnceLock<Arc<StateRegistry>> = OnceLock::new();

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by contexts unless another one is injected.
    pub fn global() -> Arc<StateRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(StateRegistry::new()))
            .clone()
    }

    /// Appends a group. Earlier registrations win when canonical names collide.
    pub fn register(&self, group: StatesGroup) -> Result<Arc<StatesGroup>> {
        group.validate()?;
        let group = Arc::new(group);

        let mut inner = self.inner.write();
        for state in group.states() {
            inner
                .index
                .entry(state.name().to_string())
                .or_insert_with(|| state.clone());
        }
        inner.groups.push(group.clone());
        info!(
            group = %group.name(),
            states = group.states.len(),
            total_groups = inner.groups.len(),
            "States group registered"
        );
        Ok(group)
    }

    /// Registered groups in registration order.
    pub fn groups(&self) -> Vec<Arc<StatesGroup>> {
        self.inner.read().groups.clone()
    }

    /// First declared state whose canonical name equals `name` exactly.
    pub fn resolve(&self, name: &str) -> Option<State> {
        self.inner.read().index.get(name).cloned()
    }

    /// Turns a stored name back into a state value: empty or absent is no state,
    /// a declared name yields the declared state, anything else a detached one.
    pub fn restore(&self, name: Option<&str>) -> Option<StateValue> {
        let name = name.filter(|n| !n.is_empty())?;
        let state = match self.resolve(name) {
            Some(declared) => declared,
            None => {
                debug!(state = %name, "step: state not declared, using detached state");
                State::detached(name)
            }
        };
        Some(StateValue::State(state))
    }
}
