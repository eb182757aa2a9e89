use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{NetworkError, Result};
use crate::eval::metrics::{self, EvaluationReport};
use crate::loss::mse::MseLoss;
use crate::network::network::Network;
use crate::train::results::TrainingResults;
use crate::train::sample::Sample;
use crate::train::train_config::{BatchMode, TrainingParams};

/// Cloneable remote control for a [`Trainer`].
///
/// `stop()` may be called from any thread or from inside the progress
/// callback. The request is polled between batches and between epochs, so a
/// run ends at most one batch after the flag becomes visible.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
    training: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn is_training(&self) -> bool {
        self.training.load(Ordering::Acquire)
    }

    fn finish(&self) {
        self.training.store(false, Ordering::Release);
        self.stop.store(false, Ordering::Release);
    }
}

/// Drives the epoch/batch loop over the network it owns.
///
/// A trainer is bound to one network for its whole life. To train a different
/// network build a new trainer; `release_network` hands the network back and
/// leaves this trainer unbound.
#[derive(Debug)]
pub struct Trainer {
    network: Option<Network>,
    handle: StopHandle,
}

impl Trainer {
    pub fn new(network: Network) -> Trainer {
        Trainer { network: Some(network), handle: StopHandle::default() }
    }

    pub fn network(&self) -> Option<&Network> {
        self.network.as_ref()
    }

    pub fn release_network(&mut self) -> Option<Network> {
        self.network.take()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.handle.clone()
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    pub fn is_training(&self) -> bool {
        self.handle.is_training()
    }

    /// Trains for up to `params.num_epochs` epochs.
    ///
    /// `callback(epoch, mean_error)` runs on this thread once per completed
    /// epoch, in order, before a pending stop request is acted on. The stop
    /// flag is cleared when this returns.
    pub fn train<F>(&mut self, samples: &[Sample], params: &TrainingParams, callback: F) -> Result<TrainingResults>
    where
        F: FnMut(usize, f64),
    {
        let network = self.network.as_mut().ok_or(NetworkError::Unbound)?;
        if samples.is_empty() {
            return Err(NetworkError::EmptySamples);
        }
        params.validate()?;

        info!(
            "training {:?} on {} samples: lr={} epochs={} batch={} momentum={} mode={:?}",
            network.architecture(),
            samples.len(),
            params.learning_rate,
            params.num_epochs,
            params.batch_size,
            params.momentum,
            params.batch_mode,
        );

        self.handle.training.store(true, Ordering::Release);
        network.clear_accumulated_gradients();
        let outcome = run_training(network, samples, params, &self.handle, callback);
        if outcome.is_err() {
            // Half-summed batch gradients must not leak into the next run.
            network.clear_accumulated_gradients();
        }
        self.handle.finish();

        if let Ok(results) = &outcome {
            info!(
                "training finished after {} epoch(s), final error {:.6}{}",
                results.epochs_completed,
                results.final_error,
                if results.stopped { " (stopped)" } else { "" },
            );
        }
        outcome
    }

    /// Mean per-sample MSE over `samples` without touching the weights.
    pub fn test(&mut self, samples: &[Sample]) -> Result<f64> {
        let network = self.network.as_mut().ok_or(NetworkError::Unbound)?;
        if samples.is_empty() {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for sample in samples {
            total += sample_error(network, sample)?;
        }
        Ok(total / samples.len() as f64)
    }

    /// Full regression/classification report over `samples`.
    pub fn evaluate(&mut self, samples: &[Sample]) -> Result<EvaluationReport> {
        let network = self.network.as_mut().ok_or(NetworkError::Unbound)?;
        metrics::evaluate(network, samples)
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn run_training<F>(
    network: &mut Network,
    samples: &[Sample],
    params: &TrainingParams,
    handle: &StopHandle,
    mut callback: F,
) -> Result<TrainingResults>
where
    F: FnMut(usize, f64),
{
    let mut rng = match params.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut order: Vec<&Sample> = samples.iter().collect();
    let mut results = TrainingResults::default();

    for epoch in 0..params.num_epochs {
        if params.shuffle && epoch > 0 {
            order.shuffle(&mut rng);
        }

        let pass = run_one_epoch(network, &order, params, handle)?;
        results.record(pass.error);
        debug!("epoch {epoch}: error = {:.6}", pass.error);
        callback(epoch, pass.error);

        if handle.is_stop_requested() {
            if pass.cut_short || epoch + 1 < params.num_epochs {
                warn!("training stopped by request during epoch {epoch}");
                results.stopped = true;
            }
            break;
        }
    }

    Ok(results)
}

struct EpochPass {
    /// Mean of the per-batch errors measured right after each batch's update.
    error: f64,
    /// A stop request skipped at least one batch.
    cut_short: bool,
}

/// One pass over `samples` in contiguous batches.
fn run_one_epoch(
    network: &mut Network,
    samples: &[&Sample],
    params: &TrainingParams,
    handle: &StopHandle,
) -> Result<EpochPass> {
    let num_batches = samples.len().div_ceil(params.batch_size);
    let mut batch_errors = Vec::with_capacity(num_batches);

    for batch in samples.chunks(params.batch_size) {
        process_batch(network, batch, params)?;

        let mut batch_error = 0.0;
        for sample in batch {
            batch_error += sample_error(network, sample)?;
        }
        batch_errors.push(batch_error / batch.len() as f64);

        if handle.is_stop_requested() {
            break;
        }
    }

    let error = if batch_errors.is_empty() {
        0.0
    } else {
        batch_errors.iter().sum::<f64>() / batch_errors.len() as f64
    };
    Ok(EpochPass { error, cut_short: batch_errors.len() < num_batches })
}

fn process_batch(network: &mut Network, batch: &[&Sample], params: &TrainingParams) -> Result<()> {
    match params.batch_mode {
        BatchMode::Accumulate => {
            for sample in batch {
                network.forward(&sample.inputs)?;
                network.backward(&sample.outputs)?;
                network.accumulate_gradients()?;
            }
            network.apply_accumulated_gradients(params.learning_rate, params.momentum)
        }
        BatchMode::LastSample => {
            for sample in batch {
                network.forward(&sample.inputs)?;
                network.backward(&sample.outputs)?;
            }
            let learning_rate = params.learning_rate / batch.len() as f64;
            network.update_weights(learning_rate, params.momentum)
        }
    }
}

fn sample_error(network: &mut Network, sample: &Sample) -> Result<f64> {
    let output = network.forward(&sample.inputs)?;
    MseLoss::loss(&output, &sample.outputs)
}
