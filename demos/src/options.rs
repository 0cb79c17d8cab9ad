//! `--key value` flag parsing shared by the subcommands.

use std::path::PathBuf;

use curiosity_rl::TrainingConfig;
use side_scroller::{ActionSet, SideScrollerConfig};

/// Flags accepted by `train` and `eval`.
#[derive(Debug, Clone)]
pub struct Options {
    pub workers: usize,
    pub steps: usize,
    pub iterations: Option<usize>,
    pub episodes: usize,
    pub use_icm: bool,
    pub lr_schedule: bool,
    pub max_step: Option<usize>,
    pub learning_rate: Option<f64>,
    pub save_dir: Option<PathBuf>,
    pub load: Option<PathBuf>,
    pub metrics: Option<PathBuf>,
    pub seed: u64,
    pub action_set: ActionSet,
}

impl Default for Options {
    fn default() -> Self {
        let config = TrainingConfig::default();
        Self {
            workers: config.num_worker,
            steps: config.num_step,
            iterations: None,
            episodes: 5,
            use_icm: config.use_icm,
            lr_schedule: config.lr_schedule,
            max_step: None,
            learning_rate: None,
            save_dir: Some(PathBuf::from("checkpoints")),
            load: None,
            metrics: None,
            seed: 0,
            action_set: ActionSet::Simple,
        }
    }
}

fn value<'a>(flag: &str, it: &mut impl Iterator<Item = &'a String>) -> Result<&'a str, String> {
    it.next()
        .map(String::as_str)
        .ok_or_else(|| format!("{} needs a value", flag))
}

fn number<T: std::str::FromStr>(flag: &str, raw: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, raw))
}

impl Options {
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut options = Self::default();
        let mut it = args.iter();
        while let Some(flag) = it.next() {
            match flag.as_str() {
                "--workers" => options.workers = number(flag, value(flag, &mut it)?)?,
                "--steps" => options.steps = number(flag, value(flag, &mut it)?)?,
                "--iterations" => options.iterations = Some(number(flag, value(flag, &mut it)?)?),
                "--episodes" => options.episodes = number(flag, value(flag, &mut it)?)?,
                "--max-step" => options.max_step = Some(number(flag, value(flag, &mut it)?)?),
                "--lr" => options.learning_rate = Some(number(flag, value(flag, &mut it)?)?),
                "--seed" => options.seed = number(flag, value(flag, &mut it)?)?,
                "--icm" => options.use_icm = true,
                "--no-icm" => options.use_icm = false,
                "--lr-schedule" => options.lr_schedule = true,
                "--save-dir" => options.save_dir = Some(PathBuf::from(value(flag, &mut it)?)),
                "--no-save" => options.save_dir = None,
                "--load" => options.load = Some(PathBuf::from(value(flag, &mut it)?)),
                "--metrics" => options.metrics = Some(PathBuf::from(value(flag, &mut it)?)),
                "--actions" => {
                    let name = value(flag, &mut it)?;
                    options.action_set = ActionSet::parse(name)
                        .ok_or_else(|| format!("unknown action set '{}'", name))?;
                }
                other => return Err(format!("unknown flag '{}'", other)),
            }
        }
        Ok(options)
    }

    pub fn training_config(&self) -> TrainingConfig {
        let mut config = TrainingConfig::new()
            .with_num_worker(self.workers)
            .with_num_step(self.steps)
            .with_icm(self.use_icm)
            .with_lr_schedule(self.lr_schedule);
        if let Some(max_step) = self.max_step {
            config = config.with_max_step(max_step);
        }
        if let Some(lr) = self.learning_rate {
            config = config.with_learning_rate(lr);
        }
        if let Some(dir) = &self.save_dir {
            config = config.with_save_dir(dir.clone());
        }
        if let Some(path) = &self.load {
            config = config.with_load_model_path(path.clone());
        }
        config
    }

    pub fn game_config(&self) -> SideScrollerConfig {
        SideScrollerConfig::new()
            .with_seed(self.seed)
            .with_action_set(self.action_set)
    }
}
