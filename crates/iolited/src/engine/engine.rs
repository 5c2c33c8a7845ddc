use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::event::Event;
use super::integration::EntitySink;
use super::integration::FromIntegrationReceiver;
use super::integration::FromIntegrationSender;
use super::integration::Integration;
use super::integration::IntegrationContext;
use super::message::FromIntegrationMessage;
use super::state::SensorState;
use super::state::State;

/// iolited engine
///
/// This structure receives entities and state from integrations, maintains a
/// view of the world with State, and fans events out to exporters.
pub struct Engine {
    /// Centralized state snapshot (readers load the Arc, writer stores a new one)
    state: ArcSwap<State>,

    /// Receive messages from integrations
    message_rx: Mutex<FromIntegrationReceiver>,

    /// Sender for integrations to report entities and state back to the engine
    message_tx: FromIntegrationSender,

    /// Fan-out of applied events to exporters
    events: broadcast::Sender<Event>,

    /// Tells integration tasks to shut down
    shutdown_tx: watch::Sender<bool>,

    /// Handles for integration tasks
    integration_handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

/// Capacity for the integration→engine message channel
/// Provides backpressure when integrations send faster than the engine can process
const FROM_INTEGRATION_CHANNEL_SIZE: usize = 1024;

/// Capacity for the engine→exporter event channel
const EVENT_CHANNEL_SIZE: usize = 1024;

impl Engine {
    /// Create a new Engine instance
    pub fn new() -> Self {
        let (message_tx, message_rx) = mpsc::channel(FROM_INTEGRATION_CHANNEL_SIZE);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            state: ArcSwap::new(Arc::default()),
            message_rx: Mutex::new(message_rx),
            message_tx,
            events,
            shutdown_tx,
            integration_handles: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Register integrations from the link-time registry
    ///
    /// Factories that fail are logged and skipped; factories returning `None`
    /// are disabled by configuration.
    pub fn register_integrations_from_config(&self, ctx: &IntegrationContext) {
        for constr in super::integration::REGISTRY {
            let integration = match constr(ctx) {
                Ok(Some(i)) => i,
                Err(e) => {
                    error!("failed to setup integration: {:#}", e);
                    continue;
                }
                Ok(None) => continue,
            };
            let name = integration.name().to_string();
            self.register_integration(name, integration);
        }
    }

    /// Register an integration with the engine
    ///
    /// This spawns the integration in a background task, hands it a sink,
    /// and keeps it alive until the engine shuts down.
    pub fn register_integration(&self, name: String, mut integration: Box<dyn Integration>) {
        let sink = EntitySink::new(name.clone(), self.message_tx.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("Registering integration: {}", name);

        let handle = tokio::spawn(async move {
            if let Err(e) = integration.setup(sink).await {
                warn!("Integration '{}' setup failed: {}", name, e);
                return;
            }

            while !*shutdown_rx.borrow_and_update() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }

            if let Err(e) = integration.shutdown().await {
                warn!("Integration '{}' shutdown failed: {}", name, e);
            }
        });

        if let Ok(mut handles) = self.integration_handles.lock() {
            handles.push(handle);
        }
    }

    /// Run the engine's main event loop until `shutdown` resolves
    pub async fn run<F>(&self, shutdown: F) -> Result<(), Box<dyn Error + Send>>
    where
        F: Future<Output = ()>,
    {
        info!("Engine starting");

        let mut rx = self.message_rx.lock().await;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => self.handle_message(msg),
                    None => break,
                },
                _ = &mut shutdown => break,
            }
        }

        info!("Engine shutting down");
        Ok(())
    }

    /// Stop all integrations and wait for their tasks to finish
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        let handles = match self.integration_handles.lock() {
            Ok(mut handles) => std::mem::take(&mut *handles),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Integration task failed: {}", e);
            }
        }
    }

    /// Get a snapshot of the current engine state.
    ///
    /// Clones the `Arc` (atomic refcount bump), essentially free.
    pub fn state_snapshot(&self) -> Arc<State> {
        self.state.load_full()
    }

    /// Subscribe to events applied by the engine
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Apply a message from an integration
    fn handle_message(&self, msg: FromIntegrationMessage) {
        match msg {
            FromIntegrationMessage::EntityAdded {
                descriptor,
                integration_name,
            } => {
                info!(
                    "Entity added: {} (from {})",
                    descriptor.unique_id, integration_name
                );

                {
                    let mut state = State::clone(&self.state.load());
                    state.sensors.insert(
                        descriptor.unique_id.clone(),
                        SensorState {
                            descriptor: descriptor.clone(),
                            integration: integration_name,
                            value: Default::default(),
                        },
                    );
                    self.state.store(Arc::new(state));
                }

                self.emit(Event::EntityAdded { descriptor });
            }
            FromIntegrationMessage::SensorStateChanged { entity_id, value } => {
                {
                    let mut state = State::clone(&self.state.load());
                    let Some(sensor) = state.sensors.get_mut(&entity_id) else {
                        warn!("State written for unknown entity: {}", entity_id);
                        return;
                    };
                    if sensor.value != value {
                        info!("Sensor state changed: {} -> {:?}", entity_id, value);
                    }
                    sensor.value = value;
                    self.state.store(Arc::new(state));
                }

                self.emit(Event::SensorStateChanged { entity_id, value });
            }
        }
    }

    fn emit(&self, event: Event) {
        // No exporters subscribed is fine
        if self.events.send(event).is_err() {
            debug!("No event subscribers");
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
