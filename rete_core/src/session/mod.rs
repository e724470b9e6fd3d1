//! Session - the runtime handle that drives one network.
//!
//! A session owns its [`Network`]. Each call to [`Session::insert`] pushes one
//! fact through the network and returns only after propagation has settled,
//! so no assertion ever observes another one half-done. Complete matches are
//! handed out two ways: callbacks registered with [`Session::on_match`] run
//! as soon as an assertion settles, and [`Session::drain_activations`]
//! returns the queued activations in agenda order.
//!
//! Callbacks see every activation exactly once, including those produced by
//! priming nodes built on a live network and those already pending when the
//! session was created.

mod activation;

pub use activation::*;

use fact_model::Fact;
use tracing::{debug, info};

use crate::network::{Network, NetworkError, NetworkStats};

type MatchCallback = Box<dyn FnMut(&Activation)>;

/// Runtime handle bound to one network.
pub struct Session {
    network: Network,
    callbacks: Vec<MatchCallback>,
    /// Sequence number of the last activation handed to the callbacks.
    dispatched: u64,
}

impl Session {
    /// Create a session driving the given network.
    pub fn new(network: Network) -> Self {
        info!(
            network = %network.id(),
            nodes = network.node_count(),
            "Starting session"
        );
        Self {
            network,
            callbacks: Vec::new(),
            dispatched: 0,
        }
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Mutable access for building more nodes on a live network.
    ///
    /// Activations produced here reach the callbacks on the next
    /// `insert`, `start` or `drain_activations`. Use [`Session::build`] to
    /// dispatch them right away.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    /// Build nodes on the live network, then run callbacks for any
    /// activations that priming the new nodes produced.
    pub fn build<T, F>(&mut self, build: F) -> Result<T, NetworkError>
    where
        F: FnOnce(&mut Network) -> Result<T, NetworkError>,
    {
        let built = build(&mut self.network);
        self.dispatch();
        built
    }

    /// Register a callback run once for every new activation.
    pub fn on_match<F>(&mut self, callback: F)
    where
        F: FnMut(&Activation) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    /// Assert one fact. Returns the number of new activations.
    pub fn insert(&mut self, fact: Fact) -> Result<usize, NetworkError> {
        let produced = self.network.assert(fact);
        self.dispatch();
        produced
    }

    /// Parse a JSON object and assert it.
    pub fn insert_json(&mut self, json: &str) -> Result<usize, NetworkError> {
        let fact = Fact::from_json_str(json)?;
        self.insert(fact)
    }

    /// Assert the start sentinel, firing rules seeded with `IsStarted`.
    pub fn start(&mut self) -> Result<usize, NetworkError> {
        let produced = self.network.start();
        self.dispatch();
        produced
    }

    /// Activations not yet drained, in discovery order.
    pub fn pending_activations(&self) -> &[Activation] {
        self.network.pending_activations()
    }

    /// Take every pending activation, highest salience first and then in
    /// discovery order.
    pub fn drain_activations(&mut self) -> Vec<Activation> {
        self.dispatch();
        let mut activations = self.network.take_activations();
        activations.sort_by(Activation::agenda_order);
        activations
    }

    pub fn stats(&self) -> NetworkStats {
        self.network.stats()
    }

    /// Run the callbacks for every pending activation not yet dispatched.
    fn dispatch(&mut self) {
        let pending = self.network.pending_activations();
        let first = pending.partition_point(|activation| activation.sequence <= self.dispatched);
        let fresh = &pending[first..];
        let Some(last) = fresh.last() else {
            return;
        };

        debug!(count = fresh.len(), "Dispatching activations");
        for activation in fresh {
            for callback in self.callbacks.iter_mut() {
                callback(activation);
            }
        }
        self.dispatched = last.sequence;
    }
}

impl From<Network> for Session {
    fn from(network: Network) -> Self {
        Self::new(network)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("network", &self.network)
            .field("callbacks", &self.callbacks.len())
            .field("dispatched", &self.dispatched)
            .finish()
    }
}
