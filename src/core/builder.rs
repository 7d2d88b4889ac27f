use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    core::ManagerConfig,
    events::Bus,
    hooks::Hooks,
    show::Show,
    subscribers::{Subscribe, SubscriberSet},
};

use super::manager::Manager;

/// Builder for a [`Manager`] with its shows, hooks and subscribers.
pub struct ManagerBuilder<C = ()> {
    cfg: ManagerConfig,
    shows: HashMap<String, Arc<Show>>,
    hooks: Hooks<C>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<C> ManagerBuilder<C>
where
    C: Send + Sync + 'static,
{
    /// Creates a builder with the given configuration.
    pub fn new(cfg: ManagerConfig) -> Self {
        Self {
            cfg,
            shows: HashMap::new(),
            hooks: Hooks::default(),
            subscribers: Vec::new(),
        }
    }

    /// Registers a show. A later show with the same name replaces it.
    pub fn with_show(mut self, show: Show) -> Self {
        self.shows.insert(show.name().to_string(), Arc::new(show));
        self
    }

    pub fn with_shows(mut self, shows: impl IntoIterator<Item = Show>) -> Self {
        for show in shows {
            self = self.with_show(show);
        }
        self
    }

    /// Sets the lifecycle hooks.
    pub fn with_hooks(mut self, hooks: Hooks<C>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Sets run event subscribers.
    ///
    /// Subscribers receive run events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the manager.
    ///
    /// With subscribers, this spawns their workers and the bus listener, so it must
    /// then be called inside a tokio runtime. The listener runs until
    /// [`Manager::shutdown`] or until the manager is dropped.
    pub fn build(self) -> Arc<Manager<C>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let closing = CancellationToken::new();
        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            Some(subscriber_listener(&bus, subs, closing.clone()))
        };
        Arc::new(Manager::new_internal(
            self.cfg,
            self.shows,
            self.hooks,
            bus,
            closing,
            listener,
        ))
    }
}

/// Forwards bus events to the subscriber set until `closing` fires.
///
/// On close, events already buffered on the bus are still forwarded, then every
/// subscriber queue is drained.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, closing: CancellationToken) -> JoinHandle<()> {
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = closing.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => set.emit(&ev),
                            Err(TryRecvError::Lagged(skipped)) => {
                                tracing::warn!(skipped, "subscriber listener lagged");
                            }
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
        set.shutdown().await;
        tracing::debug!("subscriber listener stopped");
    })
}
