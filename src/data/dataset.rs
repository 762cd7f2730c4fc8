use burn::data::dataset::Dataset;

use crate::data::adapter::TrainingExample;

/// In-memory dataset over adapted training examples.
pub struct LineDataset {
    examples: Vec<TrainingExample>,
}

impl LineDataset {
    pub fn new(examples: Vec<TrainingExample>) -> Self {
        Self { examples }
    }

    pub fn sample_count(&self) -> usize {
        self.examples.len()
    }
}

impl Dataset<TrainingExample> for LineDataset {
    fn get(&self, index: usize) -> Option<TrainingExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}
