//! PeriodicSensors - owner of every sensor and of the dispatch queue
//!
//! Push handlers and timer expiry handlers only enqueue [`SensorEvent`]s.
//! All state changes and sample callbacks happen here, one event at a time,
//! on whoever holds `&mut PeriodicSensors`.

use std::future::Future;
use std::sync::Arc;

use contracts::{
    ControlPlane, DataType, SampleValue, SensorEvent, SensorEventKind, SensorHandle, SensorName,
    Timer, TimerService, Timestamp,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::control::{ControlChannel, EventSender, ValueKind};
use crate::dispatch::SampleDispatch;
use crate::error::{Result, SensorError};
use crate::metrics::SensorMetrics;
use crate::registry::HandleRegistry;
use crate::sensor::{SampleCallback, SensorInstance, SensorStatus, TimerRun};

/// Periodic sensor scaffold
pub struct PeriodicSensors {
    registry: HandleRegistry<SensorInstance>,
    plane: Arc<dyn ControlPlane>,
    timers: Arc<dyn TimerService>,
    events_tx: EventSender,
    events_rx: mpsc::UnboundedReceiver<SensorEvent>,
    metrics: Arc<SensorMetrics>,
}

impl PeriodicSensors {
    pub fn new(plane: Arc<dyn ControlPlane>, timers: Arc<dyn TimerService>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            registry: HandleRegistry::new(),
            plane,
            timers,
            events_tx,
            events_rx,
            metrics: Arc::new(SensorMetrics::new()),
        }
    }

    /// Create a sensor publishing `data_type` values.
    ///
    /// The sensor starts disabled with no period. Its resources are
    /// `<name>/value`, `<name>/enable`, `<name>/period` (seconds) and
    /// `<name>/trigger`; an empty name puts them in the parent namespace.
    ///
    /// # Errors
    /// - [`SensorError::InvalidName`] for names breaking the naming contract
    /// - [`SensorError::UnsupportedType`] for [`DataType::Trigger`]
    /// - [`SensorError::Timer`] / [`SensorError::ResourceCreation`] if a
    ///   collaborator fails; nothing is left behind in that case
    pub fn create<F>(
        &mut self,
        name: &str,
        data_type: DataType,
        units: &str,
        callback: F,
    ) -> Result<SensorHandle>
    where
        F: FnMut(&mut SampleDispatch<'_>) + Send + 'static,
    {
        if data_type == DataType::Trigger {
            return Err(SensorError::UnsupportedType {
                name: name.to_string(),
                data_type,
            });
        }
        self.create_sensor(
            name,
            ValueKind::Typed { data_type, units },
            Box::new(callback),
        )
    }

    /// Create a sensor publishing JSON documents shaped like `example`
    pub fn create_json<F>(&mut self, name: &str, example: &str, callback: F) -> Result<SensorHandle>
    where
        F: FnMut(&mut SampleDispatch<'_>) + Send + 'static,
    {
        self.create_sensor(name, ValueKind::Json { example }, Box::new(callback))
    }

    #[instrument(
        name = "sensor_create",
        skip(self, value, callback),
        fields(data_type = %value.data_type())
    )]
    fn create_sensor(
        &mut self,
        name: &str,
        value: ValueKind<'_>,
        callback: SampleCallback,
    ) -> Result<SensorHandle> {
        let name = SensorName::new(name).map_err(SensorError::InvalidName)?;

        let Self {
            registry,
            plane,
            timers,
            events_tx,
            ..
        } = self;

        let handle = registry.insert_with(|handle| {
            let timer_run = TimerRun::default();
            let timer = create_timer(timers.as_ref(), &name, handle, &timer_run, events_tx)?;
            let channel = ControlChannel::open(plane.as_ref(), &name, value, handle, events_tx)?;
            Ok::<_, SensorError>(SensorInstance::new(
                name.clone(),
                value.data_type(),
                timer,
                timer_run,
                channel,
                callback,
            ))
        })?;

        observability::metrics::set_active_sensors(self.registry.len());
        info!(sensor = %name, handle = %handle, "sensor created");
        Ok(handle)
    }

    /// Destroy a sensor.
    ///
    /// The handle stops resolving before anything else is torn down, so
    /// events already queued for it are dropped as stale.
    #[instrument(name = "sensor_destroy", skip(self), fields(handle = %handle))]
    pub fn destroy(&mut self, handle: SensorHandle) -> Result<()> {
        let Some(instance) = self.registry.unregister(handle) else {
            warn!(handle = %handle, "destroy: unknown or stale sensor handle");
            self.metrics.inc_stale_events();
            return Err(SensorError::NotFound(handle));
        };

        let name = instance.name().clone();
        instance.teardown(self.plane.as_ref());

        observability::metrics::set_active_sensors(self.registry.len());
        info!(sensor = %name, "sensor destroyed");
        Ok(())
    }

    /// Destroy every remaining sensor
    pub fn destroy_all(&mut self) {
        for handle in self.registry.handles() {
            // Handles come straight from the registry
            let _ = self.destroy(handle);
        }
    }

    /// Dispatch one event
    pub fn handle_event(&mut self, event: SensorEvent) {
        let kind = event.kind;
        let instance = match self.registry.resolve_mut(event.handle) {
            Ok(instance) => instance,
            Err(_) => {
                warn!(
                    handle = %event.handle,
                    kind = kind.label(),
                    "event for unknown or destroyed sensor dropped"
                );
                self.metrics.inc_stale_events();
                observability::metrics::record_stale_event(kind.label());
                return;
            }
        };

        if !matches!(kind, SensorEventKind::TimerExpired { .. }) {
            self.metrics.inc_control_events();
            observability::metrics::record_control_event(kind.label());
        }
        instance.handle_event(event.handle, kind, self.plane.as_ref(), &self.metrics);
    }

    /// `<name>/enable` received `enable`
    pub fn set_enabled(&mut self, handle: SensorHandle, enable: bool) {
        self.handle_event(SensorEvent::new(
            handle,
            Timestamp::NOW,
            SensorEventKind::Enable(enable),
        ));
    }

    /// `<name>/period` received `period` seconds
    pub fn set_period(&mut self, handle: SensorHandle, period: f64) {
        self.handle_event(SensorEvent::new(
            handle,
            Timestamp::NOW,
            SensorEventKind::Period(period),
        ));
    }

    /// `<name>/trigger` fired
    pub fn trigger(&mut self, handle: SensorHandle) {
        self.handle_event(SensorEvent::new(
            handle,
            Timestamp::NOW,
            SensorEventKind::Trigger,
        ));
    }

    /// The sensor's timer expired, as seen by its current timer run
    pub fn timer_expired(&mut self, handle: SensorHandle) {
        let run = self
            .registry
            .resolve(handle)
            .map(SensorInstance::timer_run)
            .unwrap_or_default();
        self.handle_event(SensorEvent::timer_expired(handle, run));
    }

    /// Drain the dispatch queue without waiting.
    ///
    /// Returns the number of events handled. Events enqueued while draining
    /// (a callback pushing to another sensor's control) are handled too.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Dispatch events as they arrive until `shutdown` completes
    #[instrument(name = "sensor_dispatch_loop", skip_all, fields(sensors = self.registry.len()))]
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("dispatch loop started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                event = self.events_rx.recv() => match event {
                    Some(event) => self.handle_event(event),
                    // We hold a sender, so this only happens on shutdown paths
                    None => break,
                },
            }
        }

        info!(handled = self.metrics.control_events(), "dispatch loop stopped");
    }

    /// Sender for injecting events from other tasks
    pub fn event_sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub fn status(&self, handle: SensorHandle) -> Result<SensorStatus> {
        self.registry.resolve(handle).map(SensorInstance::status)
    }

    /// Status of every live sensor
    pub fn statuses(&self) -> Vec<(SensorHandle, SensorStatus)> {
        self.registry
            .iter()
            .map(|(handle, instance)| (handle, instance.status()))
            .collect()
    }

    /// Handle of the sensor named `name`
    pub fn find(&self, name: &str) -> Option<SensorHandle> {
        self.registry
            .iter()
            .find(|(_, instance)| instance.name() == name)
            .map(|(handle, _)| handle)
    }

    pub fn handles(&self) -> Vec<SensorHandle> {
        self.registry.handles()
    }

    pub fn contains(&self, handle: SensorHandle) -> bool {
        self.registry.contains(handle)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn metrics(&self) -> &Arc<SensorMetrics> {
        &self.metrics
    }

    pub fn plane(&self) -> &Arc<dyn ControlPlane> {
        &self.plane
    }

    pub fn push_boolean(&self, handle: SensorHandle, timestamp: Timestamp, value: bool) {
        self.push(handle, timestamp, SampleValue::Boolean(value));
    }

    pub fn push_numeric(&self, handle: SensorHandle, timestamp: Timestamp, value: f64) {
        self.push(handle, timestamp, SampleValue::Numeric(value));
    }

    pub fn push_string(&self, handle: SensorHandle, timestamp: Timestamp, value: &str) {
        self.push(handle, timestamp, SampleValue::String(value.to_string()));
    }

    pub fn push_json(&self, handle: SensorHandle, timestamp: Timestamp, value: &str) {
        self.push(handle, timestamp, SampleValue::Json(value.to_string()));
    }

    /// Publish a sample produced outside the sample callback.
    ///
    /// Stale handles are logged and skipped.
    pub fn push(&self, handle: SensorHandle, timestamp: Timestamp, value: SampleValue) {
        match self.registry.resolve(handle) {
            Ok(instance) => instance
                .dispatch(handle, self.plane.as_ref(), &self.metrics)
                .push(timestamp, value),
            Err(_) => {
                warn!(handle = %handle, "push for unknown or destroyed sensor dropped");
                self.metrics.inc_stale_events();
                observability::metrics::record_stale_event("push");
            }
        }
    }
}

impl Drop for PeriodicSensors {
    fn drop(&mut self) {
        if !self.registry.is_empty() {
            debug!(remaining = self.registry.len(), "destroying remaining sensors");
            self.destroy_all();
        }
    }
}

fn create_timer(
    timers: &dyn TimerService,
    name: &SensorName,
    handle: SensorHandle,
    timer_run: &TimerRun,
    events: &EventSender,
) -> Result<Box<dyn Timer>> {
    let mut timer = timers
        .create(name)
        .map_err(|e| SensorError::timer(name.as_str(), e))?;
    timer.set_repeat_infinite();

    let tx = events.clone();
    let run = timer_run.clone();
    timer.set_expiry_handler(Box::new(move || {
        if tx.send(SensorEvent::timer_expired(handle, run.current())).is_err() {
            debug!(handle = %handle, "dispatch queue closed, expiry dropped");
        }
    }));
    Ok(timer)
}
