// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: average cross-entropy loss on training set
//   - val_loss:   average cross-entropy loss on validation set
//   - token_acc:  fraction of teacher-forced decode steps whose
//                 argmax matched the ground-truth token
//
// Output file: {model_dir}/metrics.csv
//
// Loss should decrease each epoch; val_loss rising while
// train_loss falls indicates overfitting.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy loss over all training batches.
    /// Random initialisation gives ~ln(output_size)
    pub train_loss: f64,

    /// Average cross-entropy loss on the validation set.
    /// Should track train_loss — divergence indicates overfitting
    pub val_loss: f64,

    /// Fraction of teacher-forced steps predicted exactly right.
    /// Range: [0.0, 1.0]
    pub token_acc: f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, token_acc: f64) -> Self {
        Self { epoch, train_loss, val_loss, token_acc }
    }

    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Header only if the file is new — appending across runs is fine
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,val_loss,token_acc")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.val_loss,
            m.token_acc,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );

        Ok(())
    }

    /// Return the path to the metrics CSV file
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, 2.5, 2.3, 0.2);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_csv_header_and_rows() {
        let dir = std::env::temp_dir()
            .join(format!("htr-metrics-{}", std::process::id()))
            .to_string_lossy()
            .into_owned();

        let logger = MetricsLogger::new(dir.clone()).unwrap();
        logger.log(&EpochMetrics::new(1, 3.1, 3.0, 0.1)).unwrap();

        let contents = fs::read_to_string(logger.csv_path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("epoch,train_loss,val_loss,token_acc"));
        assert!(lines.next().unwrap().starts_with("1,3.1"));

        fs::remove_dir_all(&dir).ok();
    }
}
