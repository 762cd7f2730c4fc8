// ============================================================
// Layer 6 — Charset Store
// ============================================================
// Manages charset building, saving, and loading.
//
// The charset is the contract between training and recognition:
// a model's output distribution is indexed by charset codes, so
// recognizing with a different charset than the one trained with
// silently garbles every transcription. Persisting the charset
// next to the model weights keeps the two in lockstep.
//
// File: {model_dir}/charset.json

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::domain::charset::Charset;

pub struct CharsetStore {
    dir: PathBuf,
}

impl CharsetStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    /// Load an existing charset or build one from the transcripts.
    pub fn load_or_build<'a>(
        &self,
        transcripts: impl IntoIterator<Item = &'a str>,
    ) -> Result<Charset> {
        let path = self.dir.join("charset.json");
        if path.exists() {
            tracing::info!("Loading existing charset from disk");
            self.load()
        } else {
            let charset = Charset::from_corpus(transcripts);
            tracing::info!(
                "Built charset with {} tokens (incl. SOS/EOS)",
                charset.output_size()
            );
            self.save(&charset)?;
            Ok(charset)
        }
    }

    /// Load a previously saved charset.
    pub fn load(&self) -> Result<Charset> {
        let path = self.dir.join("charset.json");
        let json = std::fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read charset from '{}'. \
                     Make sure you have run 'train' before 'recognize'.",
                    path.display()
                )
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, charset: &Charset) -> Result<()> {
        std::fs::create_dir_all(&self.dir).ok();

        let path = self.dir.join("charset.json");
        std::fs::write(&path, serde_json::to_string_pretty(charset)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Saved charset to '{}'", path.display());
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> String {
        std::env::temp_dir()
            .join(format!("htr-charset-{}-{}", tag, std::process::id()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_build_then_reload_is_identical() {
        let dir   = temp_dir("reload");
        let store = CharsetStore::new(dir.clone());

        let built  = store.load_or_build(["hello", "world"]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(built, loaded);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_second_build_reuses_saved_charset() {
        let dir   = temp_dir("reuse");
        let store = CharsetStore::new(dir.clone());

        let first  = store.load_or_build(["abc"]).unwrap();
        // different corpus, but the saved charset wins
        let second = store.load_or_build(["xyz"]).unwrap();
        assert_eq!(first, second);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_fails_without_file() {
        let store = CharsetStore::new(temp_dir("missing-charset"));
        assert!(store.load().is_err());
    }
}
