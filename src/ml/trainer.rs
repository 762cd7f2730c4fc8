// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + validation loop using Burn's DataLoader and Adam.
//
// Backend split:
//   - Training uses Autodiff<Wgpu> for gradients
//   - model.valid() returns the model on plain Wgpu
//   - The validation batcher must also use the plain backend
//
// Loss is the model's own categorical cross-entropy over the
// teacher-forced unroll; the optimiser is Adam. The model is
// saved (all three sub-networks + params.json) after every epoch,
// overwriting the previous epoch — the facade contract is "one
// model directory", not a per-epoch history.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataloader::DataLoaderBuilder,
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use serde_json::{Map, Value};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::LineBatcher, dataset::LineDataset};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::{HtrModel, HtrModelConfig};

type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
type ValidBackend = burn::backend::Wgpu;

pub fn run_training(
    cfg:           &TrainConfig,
    model_cfg:     &HtrModelConfig,
    preprocessing: &Map<String, Value>,
    train_dataset: LineDataset,
    val_dataset:   LineDataset,
    ckpt_manager:  CheckpointManager,
) -> Result<()> {
    let device = burn::backend::wgpu::WgpuDevice::default();
    tracing::info!("Using WGPU device: {:?}", device);
    train_loop(
        cfg, model_cfg, preprocessing,
        train_dataset, val_dataset, ckpt_manager, device,
    )
}

fn train_loop(
    cfg:           &TrainConfig,
    model_cfg:     &HtrModelConfig,
    preprocessing: &Map<String, Value>,
    train_dataset: LineDataset,
    val_dataset:   LineDataset,
    ckpt_manager:  CheckpointManager,
    device:        burn::backend::wgpu::WgpuDevice,
) -> Result<()> {

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: HtrModel<TrainBackend> = model_cfg.init(&device);
    tracing::info!(
        "Model ready: units={}, output_size={}, {} decode steps",
        model_cfg.units, model_cfg.output_size, model_cfg.max_text_length,
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let optim_cfg = AdamConfig::new().with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // One pass over a dataset is ceil(size / batch_size) steps
    let train_steps = div_ceil(train_dataset.sample_count(), cfg.batch_size);
    let val_steps   = div_ceil(val_dataset.sample_count(), cfg.batch_size);
    tracing::info!(
        "Per epoch: {} training steps, {} validation steps",
        train_steps, val_steps,
    );

    // ── Training data loader (Autodiff backend) ───────────────────────────────
    let train_batcher =
        LineBatcher::<TrainBackend>::new(device.clone(), model_cfg.output_size);
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(cfg.batch_size)
        .shuffle(42)
        .num_workers(1)
        .build(train_dataset);

    // ── Validation data loader (inner backend — no autodiff overhead) ─────────
    let val_batcher =
        LineBatcher::<ValidBackend>::new(device.clone(), model_cfg.output_size);
    let val_loader = DataLoaderBuilder::new(val_batcher)
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_dataset);

    let metrics = MetricsLogger::new(&cfg.model_dir)?;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let outputs = model.unroll(batch.images, batch.decoder_inputs);
            let loss    = model.training_loss(&outputs, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + Adam update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.lr, model, grads);
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();

        let mut val_loss_sum   = 0.0f64;
        let mut val_batches    = 0usize;
        let mut correct_tokens = 0usize;
        let mut total_tokens   = 0usize;

        for batch in val_loader.iter() {
            let outputs = model_valid.unroll(batch.images, batch.decoder_inputs);
            let loss: f64 = model_valid
                .training_loss(&outputs, batch.targets.clone())
                .into_scalar()
                .elem::<f64>();
            val_loss_sum += loss;
            val_batches  += 1;

            // Teacher-forced token accuracy, step by step
            let [batch_size, _] = batch.targets.dims();
            for (t, y_hat) in outputs.iter().enumerate() {
                // argmax(1) returns [batch, 1] — flatten before .equal()
                let predicted = y_hat.clone().argmax(1).flatten::<1>(0, 1);
                let expected  = batch
                    .targets
                    .clone()
                    .slice([0..batch_size, t..t + 1])
                    .reshape([batch_size]);

                let correct: i64 = predicted
                    .equal(expected)
                    .int()
                    .sum()
                    .into_scalar()
                    .elem::<i64>();

                correct_tokens += correct as usize;
                total_tokens   += batch_size;
            }
        }

        let avg_val_loss = if val_batches  > 0 { val_loss_sum / val_batches as f64 } else { f64::NAN };
        let token_acc    = if total_tokens > 0 { correct_tokens as f64 / total_tokens as f64 } else { 0.0 };

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | token_acc={:.1}%",
            epoch, cfg.epochs, avg_train_loss, avg_val_loss, token_acc * 100.0,
        );

        metrics.log(&EpochMetrics::new(epoch, avg_train_loss, avg_val_loss, token_acc))?;

        ckpt_manager.save(&model, model_cfg, preprocessing)?;
        tracing::info!("Model saved after epoch {}", epoch);
    }

    tracing::info!("Training complete!");
    Ok(())
}

fn div_ceil(size: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    (size + batch_size - 1) / batch_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_per_epoch_rounds_up() {
        assert_eq!(div_ceil(100, 8), 13);
        assert_eq!(div_ceil(96, 8),  12);
        assert_eq!(div_ceil(1, 8),   1);
        assert_eq!(div_ceil(0, 8),   0);
    }
}
