//! Component state.
//!
//! A [`State`] is the signal map of one component scope: one
//! `Signal<serde_json::Value>` per entry of the state record, in record
//! order. Render functions read it, client code writes it.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::signal::{Signal, Watch};

/// A map of named signals. Cloning shares the signals.
#[derive(Clone, Default)]
pub struct State {
    signals: Rc<IndexMap<String, Signal<Value>>>,
}

impl State {
    /// Build fresh signals from a record.
    pub fn from_record(record: Map<String, Value>) -> Self {
        let signals = record
            .into_iter()
            .map(|(key, value)| (key, Signal::new(value)))
            .collect();
        Self {
            signals: Rc::new(signals),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.signals.get(key).map(Signal::get)
    }

    /// Read an entry and deserialize it. `None` if missing or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.signals
            .get(key)
            .and_then(|signal| signal.with(|value| T::deserialize(value).ok()))
    }

    pub fn signal(&self, key: &str) -> Option<&Signal<Value>> {
        self.signals.get(key)
    }

    /// Write an entry. Returns `false` if the key is not part of the state.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        match self.signals.get(key) {
            Some(signal) => {
                signal.set(value.into());
                true
            }
            None => false,
        }
    }

    pub fn update<F>(&self, key: &str, f: F) -> bool
    where
        F: FnOnce(&Value) -> Value,
    {
        match self.signals.get(key) {
            Some(signal) => {
                signal.update(f);
                true
            }
            None => false,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.signals.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Every signal, type-erased, in record order.
    pub fn watchers(&self) -> Vec<&dyn Watch> {
        self.signals.values().map(|signal| signal as &dyn Watch).collect()
    }

    /// Stop every signal of the scope.
    pub fn stop_all(&self) {
        for signal in self.signals.values() {
            signal.stop();
        }
    }

    /// Current values as a record.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.signals
            .iter()
            .map(|(key, signal)| (key.clone(), signal.get()))
            .collect()
    }

    /// Whether both handles share the same signals.
    pub fn ptr_eq(&self, other: &State) -> bool {
        Rc::ptr_eq(&self.signals, &other.signals)
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.signals.iter().map(|(key, signal)| (key, signal.get())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::run_microtasks;
    use serde_json::json;
    use std::cell::RefCell;

    fn counter() -> State {
        let Value::Object(record) = json!({ "count": 0, "label": "clicks" }) else {
            unreachable!()
        };
        State::from_record(record)
    }

    #[test]
    fn reads_and_writes_entries() {
        let state = counter();
        assert_eq!(state.get("count"), Some(json!(0)));
        assert_eq!(state.get_as::<String>("label").as_deref(), Some("clicks"));
        assert_eq!(state.get_as::<String>("count"), None);

        assert!(state.set("count", 4));
        assert!(!state.set("missing", 1));
        assert!(state.update("count", |v| json!(v.as_i64().unwrap_or(0) + 1)));
        assert_eq!(state.get_as::<i64>("count"), Some(5));
    }

    #[test]
    fn keys_keep_record_order() {
        let state = counter();
        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["count", "label"]);
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn separate_records_do_not_share_signals() {
        let a = counter();
        let b = counter();
        a.set("count", 1);

        assert_eq!(b.get("count"), Some(json!(0)));
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn stop_all_clears_every_signal() {
        let state = counter();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        state.signal("count").unwrap().effect(move |v| sink.borrow_mut().push(v.clone()));

        state.stop_all();
        run_microtasks();
        state.set("count", 3);
        run_microtasks();

        assert!(seen.borrow().is_empty());
        assert_eq!(state.snapshot().get("count"), Some(&json!(3)));
    }
}
