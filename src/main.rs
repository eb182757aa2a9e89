// Trains a network described by a JSON run file:
//   mlp-engine run.json
// Set RUST_LOG=debug for per-epoch output.
use anyhow::{Context, Result};
use log::info;

use mlp_engine::{export_results_csv, save_network, RunConfig, Trainer};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args()
        .nth(1)
        .context("usage: mlp-engine <run.json>")?;
    let config = RunConfig::load_json(&path)
        .with_context(|| format!("reading run configuration {path}"))?;

    let network = config.network.build().context("building network")?;
    let mut trainer = Trainer::new(network);

    let total = config.training.num_epochs;
    let report_every = (total / 10).max(1);
    let results = trainer
        .train(&config.samples, &config.training, |epoch, error| {
            if epoch % report_every == 0 || epoch + 1 == total {
                info!("epoch {}/{total}: error = {error:.6}", epoch + 1);
            }
        })
        .context("training failed")?;
    info!(
        "completed {} epoch(s), final error {:.6}",
        results.epochs_completed, results.final_error
    );

    if !config.test_samples.is_empty() {
        let report = trainer.evaluate(&config.test_samples).context("evaluating test samples")?;
        info!("test mse = {:.6}, mae = {:.6}, r2 = {:.4}", report.mse, report.mae, report.r2);
        if let Some(cls) = report.classification {
            info!(
                "accuracy = {:.2}%, precision = {:.4}, recall = {:.4}, f1 = {:.4}",
                cls.accuracy * 100.0,
                cls.precision,
                cls.recall,
                cls.f1
            );
        }
    }

    let network = trainer.network().context("trainer has no network")?;
    if let Some(out) = &config.weights_out {
        save_network(network, out).with_context(|| format!("saving weights to {out}"))?;
        info!("weights written to {out}");
    }
    if let Some(csv) = &config.results_csv {
        export_results_csv(&results.epoch_errors, csv).with_context(|| format!("writing {csv}"))?;
        info!("epoch errors written to {csv}");
    }
    Ok(())
}
