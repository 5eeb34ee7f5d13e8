//! Background training with a readiness signal.
//!
//! `ModelSession::spawn` moves an untrained model onto a worker thread and
//! returns immediately. Callers either poll `is_ready` or block on `wait` /
//! `wait_timeout`; until training completes, `predict` fails with
//! `ModelNotReady`.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{ModelError, Result};
use crate::models::PredictiveModel;

pub struct ModelSession<M> {
    slot: Arc<OnceLock<Result<M>>>,
    done: Mutex<Receiver<()>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    name: String,
}

impl<M> ModelSession<M>
where
    M: PredictiveModel + 'static,
{
    /// Start training `model` on a new thread. `seed` overrides the seed in
    /// the model's training configuration.
    pub fn spawn(model: M, seed: Option<u64>) -> Self {
        let name = model.name().to_string();
        let slot = Arc::new(OnceLock::new());
        let (tx, rx) = mpsc::channel();

        let worker_slot = Arc::clone(&slot);
        let worker_name = name.clone();
        let handle = thread::spawn(move || {
            let mut model = model;
            let outcome = match seed.or(model.training_config().seed) {
                Some(seed) => model.train(&mut StdRng::seed_from_u64(seed)),
                None => model.train(&mut StdRng::from_entropy()),
            };
            let outcome = outcome.map(|report| {
                log::info!(
                    "{} ready after {} epochs ({:.2?})",
                    worker_name,
                    report.epochs.len(),
                    report.elapsed
                );
                model
            });
            let _ = worker_slot.set(outcome);
            let _ = tx.send(());
        });

        Self {
            slot,
            done: Mutex::new(rx),
            worker: Mutex::new(Some(handle)),
            name,
        }
    }

    /// Wrap a model that was trained synchronously.
    pub fn from_trained(model: M) -> Self {
        let (_tx, rx) = mpsc::channel();
        let outcome = if model.is_ready() {
            Ok(model)
        } else {
            Err(ModelError::ModelNotReady)
        };
        let name = match &outcome {
            Ok(m) => m.name().to_string(),
            Err(_) => String::from("model"),
        };
        Self {
            slot: Arc::new(OnceLock::from(outcome)),
            done: Mutex::new(rx),
            worker: Mutex::new(None),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Training finished successfully.
    pub fn is_ready(&self) -> bool {
        matches!(self.slot.get(), Some(Ok(_)))
    }

    /// Training finished, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Block until training completes.
    pub fn wait(&self) -> Result<&M> {
        if self.slot.get().is_none() {
            let rx = self.done.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            // Disconnected means the worker is gone; the join below reports why.
            let _ = rx.recv();
        }
        self.join_worker();
        self.resolve()
    }

    /// Block for at most `timeout`; `ModelNotReady` if training is still
    /// running afterwards.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<&M> {
        if self.slot.get().is_none() {
            let rx = self.done.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match rx.recv_timeout(timeout) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
                Err(RecvTimeoutError::Timeout) => return Err(ModelError::ModelNotReady),
            }
        }
        self.join_worker();
        self.resolve()
    }

    /// The trained model, without blocking.
    pub fn model(&self) -> Result<&M> {
        self.resolve()
    }

    pub fn predict(&self, input: &M::Input) -> Result<M::Output> {
        self.resolve()?.predict(input)
    }

    fn join_worker(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("{} training thread panicked", self.name);
                let _ = self
                    .slot
                    .set(Err(ModelError::init("training thread panicked")));
            }
        }
    }

    fn resolve(&self) -> Result<&M> {
        match self.slot.get() {
            Some(Ok(model)) => Ok(model),
            Some(Err(e)) => Err(e.clone()),
            None => Err(ModelError::ModelNotReady),
        }
    }
}
