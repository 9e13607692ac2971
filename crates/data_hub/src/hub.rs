//! In-memory data hub
//!
//! 一个进程内的控制平面实现：保存资源、类型化推送处理器和最近发布的样本。
//! 管理员推送通过 [`DataHub::deliver`] 模拟。

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{
    ContractError, ControlPlane, ControlValue, DataType, HandlerToken, PushHandler, SampleValue,
    Timestamp,
};
use serde::Serialize;
use tracing::{debug, trace, warn};

/// Default number of publications kept for inspection
pub const DEFAULT_HISTORY: usize = 1024;

/// Which side feeds the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Fed by a sensor through `push`
    Input,
    /// Driven by the hub through `deliver`
    Output,
}

/// Snapshot of one resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceInfo {
    pub path: String,
    pub direction: Direction,
    pub data_type: DataType,
    pub units: String,
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_example: Option<String>,
    pub handlers: usize,
}

/// A sample accepted by the hub
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    pub path: String,
    pub timestamp: Timestamp,
    pub value: SampleValue,
}

/// Called for every accepted sample
pub type Observer = Arc<dyn Fn(&Publication) + Send + Sync>;

struct Resource {
    direction: Direction,
    data_type: DataType,
    units: String,
    optional: bool,
    json_example: Option<String>,
    last: Option<Publication>,
}

struct HandlerEntry {
    path: String,
    handler: Arc<PushHandler>,
}

#[derive(Default)]
struct HubState {
    resources: BTreeMap<String, Resource>,
    handlers: HashMap<HandlerToken, HandlerEntry>,
    observers: Vec<Observer>,
    history: VecDeque<Publication>,
    rejected: HashSet<String>,
}

/// In-memory [`ControlPlane`]
pub struct DataHub {
    state: Mutex<HubState>,
    next_token: AtomicU64,
    history_capacity: usize,
}

impl Default for DataHub {
    fn default() -> Self {
        Self::new()
    }
}

impl DataHub {
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY)
    }

    /// Keep at most `capacity` publications for [`DataHub::published`]
    pub fn with_history(capacity: usize) -> Self {
        Self {
            state: Mutex::new(HubState::default()),
            next_token: AtomicU64::new(1),
            history_capacity: capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        // Handlers run outside the lock, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every later request on `path` fail (failure injection)
    pub fn reject_path(&self, path: &str) {
        self.lock().rejected.insert(path.to_string());
    }

    /// Undo [`DataHub::reject_path`]
    pub fn accept_path(&self, path: &str) {
        self.lock().rejected.remove(path);
    }

    /// Push a control value into an output, as an administrator would.
    ///
    /// Returns the number of handlers invoked. Handlers run on the calling
    /// thread after the hub lock is released.
    pub fn deliver(
        &self,
        path: &str,
        timestamp: Timestamp,
        value: ControlValue,
    ) -> Result<usize, ContractError> {
        let timestamp = resolve_timestamp(timestamp);
        let handlers: Vec<Arc<PushHandler>> = {
            let state = self.lock();
            let resource = state
                .resources
                .get(path)
                .ok_or_else(|| not_found(path))?;
            if resource.direction != Direction::Output {
                return Err(ContractError::rejected(path, "not an output"));
            }
            if resource.data_type != value.data_type() {
                return Err(ContractError::TypeMismatch {
                    path: path.to_string(),
                    expected: resource.data_type,
                    actual: value.data_type(),
                });
            }
            state
                .handlers
                .values()
                .filter(|entry| entry.path == path)
                .map(|entry| Arc::clone(&entry.handler))
                .collect()
        };

        debug!(path, ?value, handlers = handlers.len(), "delivering control value");
        for handler in &handlers {
            match (handler.as_ref(), value) {
                (PushHandler::Boolean(f), ControlValue::Boolean(v)) => f(timestamp, v),
                (PushHandler::Numeric(f), ControlValue::Numeric(v)) => f(timestamp, v),
                (PushHandler::Trigger(f), ControlValue::Trigger) => f(timestamp),
                // Handler types are checked on registration
                (handler, value) => warn!(path, ?handler, ?value, "handler type mismatch"),
            }
        }
        Ok(handlers.len())
    }

    pub fn deliver_boolean(&self, path: &str, value: bool) -> Result<usize, ContractError> {
        self.deliver(path, Timestamp::NOW, ControlValue::Boolean(value))
    }

    pub fn deliver_numeric(&self, path: &str, value: f64) -> Result<usize, ContractError> {
        self.deliver(path, Timestamp::NOW, ControlValue::Numeric(value))
    }

    pub fn deliver_trigger(&self, path: &str) -> Result<usize, ContractError> {
        self.deliver(path, Timestamp::NOW, ControlValue::Trigger)
    }

    /// Call `observer` for every accepted sample
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&Publication) + Send + Sync + 'static,
    {
        self.lock().observers.push(Arc::new(observer));
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().resources.contains_key(path)
    }

    pub fn resource(&self, path: &str) -> Option<ResourceInfo> {
        let state = self.lock();
        state
            .resources
            .get(path)
            .map(|resource| info(&state, path, resource))
    }

    /// Every resource, sorted by path
    pub fn resources(&self) -> Vec<ResourceInfo> {
        let state = self.lock();
        state
            .resources
            .iter()
            .map(|(path, resource)| info(&state, path, resource))
            .collect()
    }

    /// Number of handlers attached to `path`
    pub fn handler_count(&self, path: &str) -> usize {
        self.lock()
            .handlers
            .values()
            .filter(|entry| entry.path == path)
            .count()
    }

    /// Total number of registered handlers
    pub fn total_handlers(&self) -> usize {
        self.lock().handlers.len()
    }

    /// Most recent sample on `path`
    pub fn last_value(&self, path: &str) -> Option<Publication> {
        self.lock()
            .resources
            .get(path)
            .and_then(|resource| resource.last.clone())
    }

    /// Retained samples on `path`, oldest first
    pub fn published(&self, path: &str) -> Vec<Publication> {
        self.lock()
            .history
            .iter()
            .filter(|p| p.path == path)
            .cloned()
            .collect()
    }

    /// Number of retained samples on `path`
    pub fn published_count(&self, path: &str) -> usize {
        self.lock().history.iter().filter(|p| p.path == path).count()
    }

    /// Drain every retained sample
    pub fn take_published(&self) -> Vec<Publication> {
        self.lock().history.drain(..).collect()
    }

    fn create(
        &self,
        path: &str,
        direction: Direction,
        data_type: DataType,
        units: &str,
    ) -> Result<(), ContractError> {
        let mut state = self.lock();
        if state.rejected.contains(path) {
            return Err(ContractError::rejected(path, "path rejected by hub"));
        }
        if state.resources.contains_key(path) {
            return Err(ContractError::ResourceExists {
                path: path.to_string(),
            });
        }
        state.resources.insert(
            path.to_string(),
            Resource {
                direction,
                data_type,
                units: units.to_string(),
                optional: false,
                json_example: None,
                last: None,
            },
        );
        debug!(path, ?direction, %data_type, units, "resource created");
        Ok(())
    }
}

impl ControlPlane for DataHub {
    fn create_input(
        &self,
        path: &str,
        data_type: DataType,
        units: &str,
    ) -> Result<(), ContractError> {
        self.create(path, Direction::Input, data_type, units)
    }

    fn create_output(
        &self,
        path: &str,
        data_type: DataType,
        units: &str,
    ) -> Result<(), ContractError> {
        self.create(path, Direction::Output, data_type, units)
    }

    fn delete_resource(&self, path: &str) {
        let mut state = self.lock();
        if state.resources.remove(path).is_none() {
            warn!(path, "delete of unknown resource ignored");
            return;
        }
        state.handlers.retain(|_, entry| entry.path != path);
        debug!(path, "resource deleted");
    }

    fn mark_optional(&self, path: &str) {
        match self.lock().resources.get_mut(path) {
            Some(resource) => resource.optional = true,
            None => warn!(path, "mark_optional on unknown resource"),
        }
    }

    fn set_json_example(&self, path: &str, example: &str) -> Result<(), ContractError> {
        serde_json::from_str::<serde_json::Value>(example).map_err(|e| {
            ContractError::InvalidJson {
                path: path.to_string(),
                message: e.to_string(),
            }
        })?;

        let mut state = self.lock();
        let resource = state
            .resources
            .get_mut(path)
            .ok_or_else(|| not_found(path))?;
        if resource.data_type != DataType::Json {
            return Err(ContractError::TypeMismatch {
                path: path.to_string(),
                expected: resource.data_type,
                actual: DataType::Json,
            });
        }
        resource.json_example = Some(example.to_string());
        Ok(())
    }

    fn add_push_handler(
        &self,
        path: &str,
        handler: PushHandler,
    ) -> Result<HandlerToken, ContractError> {
        let mut state = self.lock();
        if state.rejected.contains(path) {
            return Err(ContractError::rejected(path, "path rejected by hub"));
        }
        let resource = state.resources.get(path).ok_or_else(|| not_found(path))?;
        if resource.direction != Direction::Output {
            return Err(ContractError::rejected(path, "push handlers attach to outputs"));
        }
        if resource.data_type != handler.data_type() {
            return Err(ContractError::TypeMismatch {
                path: path.to_string(),
                expected: resource.data_type,
                actual: handler.data_type(),
            });
        }

        let token = HandlerToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        state.handlers.insert(
            token,
            HandlerEntry {
                path: path.to_string(),
                handler: Arc::new(handler),
            },
        );
        debug!(path, token = %token, "push handler added");
        Ok(token)
    }

    fn remove_push_handler(&self, token: HandlerToken) -> Result<(), ContractError> {
        match self.lock().handlers.remove(&token) {
            Some(_) => Ok(()),
            None => Err(ContractError::HandlerNotFound { token: token.0 }),
        }
    }

    fn push(
        &self,
        path: &str,
        timestamp: Timestamp,
        value: SampleValue,
    ) -> Result<(), ContractError> {
        if let SampleValue::Json(doc) = &value {
            serde_json::from_str::<serde_json::Value>(doc).map_err(|e| {
                ContractError::InvalidJson {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            })?;
        }

        let publication = Publication {
            path: path.to_string(),
            timestamp: resolve_timestamp(timestamp),
            value,
        };

        let observers = {
            let mut state = self.lock();
            let resource = state
                .resources
                .get_mut(path)
                .ok_or_else(|| not_found(path))?;
            if resource.direction != Direction::Input {
                return Err(ContractError::rejected(path, "not an input"));
            }
            if resource.data_type != publication.value.data_type() {
                return Err(ContractError::TypeMismatch {
                    path: path.to_string(),
                    expected: resource.data_type,
                    actual: publication.value.data_type(),
                });
            }
            resource.last = Some(publication.clone());

            if self.history_capacity > 0 {
                if state.history.len() == self.history_capacity {
                    state.history.pop_front();
                }
                state.history.push_back(publication.clone());
            }
            state.observers.clone()
        };

        trace!(path, value = %publication.value, "sample accepted");
        for observer in &observers {
            observer(&publication);
        }
        Ok(())
    }
}

fn info(state: &HubState, path: &str, resource: &Resource) -> ResourceInfo {
    ResourceInfo {
        path: path.to_string(),
        direction: resource.direction,
        data_type: resource.data_type,
        units: resource.units.clone(),
        optional: resource.optional,
        json_example: resource.json_example.clone(),
        handlers: state
            .handlers
            .values()
            .filter(|entry| entry.path == path)
            .count(),
    }
}

fn not_found(path: &str) -> ContractError {
    ContractError::ResourceNotFound {
        path: path.to_string(),
    }
}

/// Replace [`Timestamp::NOW`] with the wall clock
fn resolve_timestamp(timestamp: Timestamp) -> Timestamp {
    if timestamp.is_now() {
        Timestamp(chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0)
    } else {
        timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_create_and_list() {
        let hub = DataHub::new();
        hub.create_input("temp/value", DataType::Numeric, "degC").unwrap();
        hub.create_output("temp/period", DataType::Numeric, "s").unwrap();
        hub.mark_optional("temp/period");

        let resources = hub.resources();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].path, "temp/period");
        assert!(resources[0].optional);
        assert_eq!(resources[1].units, "degC");
        assert_eq!(resources[1].direction, Direction::Input);
    }

    #[test]
    fn test_duplicate_resource() {
        let hub = DataHub::new();
        hub.create_input("value", DataType::Boolean, "").unwrap();
        let err = hub.create_input("value", DataType::Boolean, "").unwrap_err();
        assert!(matches!(err, ContractError::ResourceExists { .. }));
    }

    #[test]
    fn test_deliver_invokes_handlers() {
        let hub = DataHub::new();
        hub.create_output("enable", DataType::Boolean, "").unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        hub.add_boolean_push_handler(
            "enable",
            Box::new(move |ts: Timestamp, v: bool| s.lock().unwrap().push((ts, v))),
        )
        .unwrap();

        assert_eq!(hub.deliver("enable", Timestamp(12.5), ControlValue::Boolean(true)).unwrap(), 1);
        assert_eq!(hub.deliver_boolean("enable", false).unwrap(), 1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0], (Timestamp(12.5), true));
        assert!(!seen[1].0.is_now(), "timestamp 0 resolved to wall clock");
        assert!(!seen[1].1);
    }

    #[test]
    fn test_deliver_type_checked() {
        let hub = DataHub::new();
        hub.create_output("period", DataType::Numeric, "s").unwrap();
        let err = hub.deliver_boolean("period", true).unwrap_err();
        assert!(matches!(err, ContractError::TypeMismatch { .. }));

        hub.create_input("value", DataType::Numeric, "").unwrap();
        assert!(hub.deliver_numeric("value", 1.0).is_err());
        assert!(hub.deliver_numeric("missing", 1.0).is_err());
    }

    #[test]
    fn test_handler_type_checked() {
        let hub = DataHub::new();
        hub.create_output("trigger", DataType::Trigger, "").unwrap();
        let err = hub
            .add_numeric_push_handler("trigger", Box::new(|_: Timestamp, _: f64| {}))
            .unwrap_err();
        assert!(matches!(err, ContractError::TypeMismatch { .. }));
    }

    #[test]
    fn test_remove_and_delete_handlers() {
        let hub = DataHub::new();
        hub.create_output("trigger", DataType::Trigger, "").unwrap();
        let (count, bump) = counter();
        let token = hub
            .add_trigger_push_handler("trigger", Box::new(move |_: Timestamp| bump()))
            .unwrap();
        hub.deliver_trigger("trigger").unwrap();

        hub.remove_push_handler(token).unwrap();
        assert_eq!(hub.deliver_trigger("trigger").unwrap(), 0);
        assert!(hub.remove_push_handler(token).is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        hub.add_trigger_push_handler("trigger", Box::new(|_: Timestamp| {}))
            .unwrap();
        hub.delete_resource("trigger");
        assert_eq!(hub.total_handlers(), 0);
        assert!(!hub.contains("trigger"));
    }

    #[test]
    fn test_push_records_and_notifies() {
        let hub = DataHub::new();
        hub.create_input("temp/value", DataType::Numeric, "degC").unwrap();
        let (count, bump) = counter();
        hub.subscribe(move |_| bump());

        hub.push_numeric("temp/value", Timestamp(3.0), 21.5).unwrap();
        hub.push_numeric("temp/value", Timestamp::NOW, 22.0).unwrap();

        let last = hub.last_value("temp/value").unwrap();
        assert_eq!(last.value, SampleValue::Numeric(22.0));
        assert!(last.timestamp.as_secs_f64() > 3.0);
        assert_eq!(hub.published_count("temp/value"), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_push_rejects_bad_values() {
        let hub = DataHub::new();
        hub.create_input("doc", DataType::Json, "").unwrap();
        hub.create_output("enable", DataType::Boolean, "").unwrap();

        assert!(matches!(
            hub.push_json("doc", Timestamp::NOW, "{not json"),
            Err(ContractError::InvalidJson { .. })
        ));
        assert!(hub.push_string("doc", Timestamp::NOW, "x").is_err());
        assert!(hub.push_boolean("enable", Timestamp::NOW, true).is_err());
        assert!(hub.push_json("doc", Timestamp::NOW, r#"{"x":1}"#).is_ok());
    }

    #[test]
    fn test_json_example() {
        let hub = DataHub::new();
        hub.create_input("doc", DataType::Json, "").unwrap();
        assert!(hub.set_json_example("doc", "{").is_err());
        hub.set_json_example("doc", r#"{"x":0}"#).unwrap();
        assert_eq!(
            hub.resource("doc").unwrap().json_example.as_deref(),
            Some(r#"{"x":0}"#)
        );
    }

    #[test]
    fn test_history_bounded() {
        let hub = DataHub::with_history(2);
        hub.create_input("n", DataType::Numeric, "").unwrap();
        for i in 0..5 {
            hub.push_numeric("n", Timestamp(1.0 + i as f64), i as f64).unwrap();
        }
        let kept: Vec<_> = hub.take_published().into_iter().map(|p| p.value).collect();
        assert_eq!(kept, vec![SampleValue::Numeric(3.0), SampleValue::Numeric(4.0)]);
        assert_eq!(hub.published_count("n"), 0);
    }

    #[test]
    fn test_rejected_path() {
        let hub = DataHub::new();
        hub.reject_path("bad/enable");
        assert!(hub.create_output("bad/enable", DataType::Boolean, "").is_err());
        hub.accept_path("bad/enable");
        assert!(hub.create_output("bad/enable", DataType::Boolean, "").is_ok());
    }
}
