//! Model checkpointing keyed by environment id and date.

use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use chrono::NaiveDate;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extension burn's binary recorder writes.
const RECORD_EXTENSION: &str = "bin";

/// Configuration for the checkpointer.
#[derive(Debug, Clone)]
pub struct CheckpointerConfig {
    /// Directory to store checkpoints.
    pub checkpoint_dir: PathBuf,
    /// Environment id used as the file name prefix.
    pub env_id: String,
    /// Training iterations between saves.
    pub save_interval: usize,
}

impl CheckpointerConfig {
    pub fn new(checkpoint_dir: impl Into<PathBuf>, env_id: impl Into<String>) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            env_id: env_id.into(),
            save_interval: 100,
        }
    }

    pub fn with_save_interval(mut self, interval: usize) -> Self {
        self.save_interval = interval;
        self
    }
}

/// Error type for checkpointing operations.
#[derive(Debug)]
pub enum CheckpointError {
    /// IO error during save/load.
    Io(io::Error),
    /// Burn recorder error.
    Recorder(String),
    /// No checkpoints found.
    NoCheckpoints,
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointError::Io(e) => write!(f, "IO error: {}", e),
            CheckpointError::Recorder(e) => write!(f, "Recorder error: {}", e),
            CheckpointError::NoCheckpoints => write!(f, "No checkpoints found"),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CheckpointError {
    fn from(e: io::Error) -> Self {
        CheckpointError::Io(e)
    }
}

/// Saves the model every `save_interval` iterations.
pub struct Checkpointer {
    config: CheckpointerConfig,
}

impl Checkpointer {
    /// Creates the checkpoint directory if it doesn't exist.
    pub fn new(config: CheckpointerConfig) -> Result<Self, CheckpointError> {
        fs::create_dir_all(&config.checkpoint_dir)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &CheckpointerConfig {
        &self.config
    }

    pub fn should_save(&self, iteration: usize) -> bool {
        self.config.save_interval > 0 && iteration > 0 && iteration % self.config.save_interval == 0
    }

    /// `{dir}/{env_id}_{YYYY-MM-DD}.bin`
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.config
            .checkpoint_dir
            .join(format!("{}_{}", self.config.env_id, date.format("%Y-%m-%d")))
            .with_extension(RECORD_EXTENSION)
    }

    /// Save under today's local date, overwriting an earlier save from today.
    pub fn save<B: Backend, M: Module<B>>(&self, model: &M) -> Result<PathBuf, CheckpointError> {
        self.save_as(model, chrono::Local::now().date_naive())
    }

    pub fn save_as<B: Backend, M: Module<B>>(
        &self,
        model: &M,
        date: NaiveDate,
    ) -> Result<PathBuf, CheckpointError> {
        let path = self.path_for(date);
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        model
            .clone()
            .save_file(&path, &recorder)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;
        log::info!("saved checkpoint {}", path.display());
        Ok(path)
    }

    /// Load parameters into `model_template` on `device`.
    pub fn load<B: Backend, M: Module<B>>(
        model_template: M,
        path: &Path,
        device: &B::Device,
    ) -> Result<M, CheckpointError> {
        if !path.with_extension(RECORD_EXTENSION).exists() {
            return Err(CheckpointError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        model_template
            .load_file(path.to_path_buf(), &recorder, device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))
    }

    /// Most recent checkpoint for this environment id.
    ///
    /// Dates sort lexicographically, so the last name wins.
    pub fn latest(&self) -> Result<PathBuf, CheckpointError> {
        let prefix = format!("{}_", self.config.env_id);
        let mut checkpoints: Vec<PathBuf> = fs::read_dir(&self.config.checkpoint_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with(&prefix))
                        .unwrap_or(false)
            })
            .collect();
        checkpoints.sort();
        checkpoints.pop().ok_or(CheckpointError::NoCheckpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::{Linear, LinearConfig};
    use burn::tensor::Tensor;
    use tempfile::tempdir;

    type B = NdArray<f32>;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_should_save() {
        let dir = tempdir().unwrap();
        let config = CheckpointerConfig::new(dir.path(), "Env-v0").with_save_interval(100);
        let checkpointer = Checkpointer::new(config).unwrap();

        assert!(!checkpointer.should_save(0));
        assert!(!checkpointer.should_save(50));
        assert!(checkpointer.should_save(100));
        assert!(checkpointer.should_save(200));
    }

    #[test]
    fn test_path_is_env_and_date() {
        let dir = tempdir().unwrap();
        let checkpointer = Checkpointer::new(CheckpointerConfig::new(dir.path(), "Env-v0")).unwrap();
        assert_eq!(
            checkpointer.path_for(date(2024, 3, 9)),
            dir.path().join("Env-v0_2024-03-09.bin")
        );
    }

    #[test]
    fn test_checkpoint_dir_creation() {
        let dir = tempdir().unwrap();
        let subdir = dir.path().join("nested/checkpoints");
        let _checkpointer = Checkpointer::new(CheckpointerConfig::new(&subdir, "Env-v0")).unwrap();
        assert!(subdir.exists());
    }

    #[test]
    fn test_save_load_preserves_parameters() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let checkpointer = Checkpointer::new(CheckpointerConfig::new(dir.path(), "Env-v0")).unwrap();

        let model: Linear<B> = LinearConfig::new(4, 2).init(&device);
        let path = checkpointer.save_as(&model, date(2024, 1, 1)).unwrap();
        assert!(path.exists());

        let template: Linear<B> = LinearConfig::new(4, 2).init(&device);
        let loaded = Checkpointer::load(template, &path, &device).unwrap();

        let x = Tensor::<B, 2>::from_floats([[1.0, 2.0, 3.0, 4.0]], &device);
        let a: Vec<f32> = model.forward(x.clone()).into_data().iter::<f32>().collect();
        let b: Vec<f32> = loaded.forward(x).into_data().iter::<f32>().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_latest_picks_newest_date() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let checkpointer = Checkpointer::new(CheckpointerConfig::new(dir.path(), "Env-v0")).unwrap();
        let model: Linear<B> = LinearConfig::new(2, 2).init(&device);

        checkpointer.save_as(&model, date(2024, 1, 2)).unwrap();
        checkpointer.save_as(&model, date(2024, 1, 10)).unwrap();
        fs::write(dir.path().join("Other-v0_2099-01-01.bin"), b"x").unwrap();

        assert_eq!(
            checkpointer.latest().unwrap(),
            checkpointer.path_for(date(2024, 1, 10))
        );
    }

    #[test]
    fn test_latest_without_checkpoints() {
        let dir = tempdir().unwrap();
        let checkpointer = Checkpointer::new(CheckpointerConfig::new(dir.path(), "Env-v0")).unwrap();
        assert!(matches!(checkpointer.latest(), Err(CheckpointError::NoCheckpoints)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let device = Default::default();
        let template: Linear<B> = LinearConfig::new(2, 2).init(&device);
        let result = Checkpointer::load(template, &dir.path().join("nope.bin"), &device);
        assert!(matches!(result, Err(CheckpointError::Io(_))));
    }
}
