//! State sources.
//!
//! A component's state is described once and instantiated many times: once
//! per server request and once per live element. Every instantiation yields
//! independent signals.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::reactive::State;

/// A state record: entry name to initial value.
pub type Record = Map<String, Value>;

type Factory = Arc<dyn Fn() -> Record + Send + Sync>;
type Snapshot = Arc<dyn Fn() -> serde_json::Result<Value> + Send + Sync>;

/// Where a component's initial state comes from.
#[derive(Clone, Default)]
pub enum StateSource {
    /// No state.
    #[default]
    Empty,

    /// A function invoked for every instantiation.
    Factory(Factory),

    /// A fixed value deep-cloned for every instantiation by serializing it.
    Static {
        /// Rust type of the value, reported when cloning fails.
        shape: &'static str,
        snapshot: Snapshot,
    },
}

impl StateSource {
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Record + Send + Sync + 'static,
    {
        StateSource::Factory(Arc::new(factory))
    }

    /// Use a fixed value. It must serialize to a map with string keys.
    pub fn from_static<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        StateSource::Static {
            shape: type_name::<T>(),
            snapshot: Arc::new(move || serde_json::to_value(&value)),
        }
    }

    /// Produce a fresh record for `component`.
    pub fn record(&self, component: &str) -> Result<Record> {
        match self {
            StateSource::Empty => Ok(Record::new()),
            StateSource::Factory(factory) => Ok(factory()),
            StateSource::Static { shape, snapshot } => {
                let clone_error = |reason: String| Error::StateClone {
                    component: component.to_string(),
                    shape: shape.to_string(),
                    reason,
                };
                match snapshot() {
                    Ok(Value::Object(record)) => Ok(record),
                    Ok(other) => Err(clone_error(format!(
                        "expected a record, found {}",
                        json_kind(&other)
                    ))),
                    Err(err) => Err(clone_error(err.to_string())),
                }
            }
        }
    }

    /// Produce fresh signals for `component`.
    pub fn instantiate(&self, component: &str) -> Result<State> {
        self.record(component).map(State::from_record)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl fmt::Debug for StateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateSource::Empty => f.write_str("Empty"),
            StateSource::Factory(_) => f.write_str("Factory"),
            StateSource::Static { shape, .. } => f.debug_struct("Static").field("shape", shape).finish(),
        }
    }
}

impl From<Record> for StateSource {
    fn from(record: Record) -> Self {
        StateSource::from_static(record)
    }
}
