//! `train`: PPO (+ICM) on the side scroller.

use std::error::Error;

use burn::optim::AdamConfig;
use burn::tensor::backend::AutodiffBackend;
use curiosity_rl::{
    Agent, AgentConfig, Checkpointer, CsvSink, IcmPpoModel, LogSink, MultiSink, Trainer,
};
use side_scroller::SideScroller;

use crate::options::Options;

pub fn run<B: AutodiffBackend>(options: &Options, device: B::Device) -> Result<(), Box<dyn Error>> {
    let config = options.training_config().build()?;
    let game_config = options.game_config().with_env_id(config.env_id.clone());
    let games = SideScroller::for_workers(&game_config, config.num_worker)?;
    let n_actions = game_config.action_set.len();

    println!("=== PPO{} on {} ===", if config.use_icm { " + ICM" } else { "" }, config.env_id);
    println!(
        "  Workers: {} x {} steps = {} samples/iteration",
        config.num_worker,
        config.num_step,
        config.samples_per_iteration()
    );
    println!(
        "  Actions: {} ({}), lr {:.1e}{}",
        n_actions,
        game_config.action_set.name(),
        config.learning_rate,
        if config.lr_schedule { " linear decay" } else { "" }
    );
    println!();

    let mut model: IcmPpoModel<B> = config.model_config(n_actions).init(&device);
    if let Some(path) = &config.load_model_path {
        model = Checkpointer::load(model, path, &device)?;
        log::info!("warm start from {}", path.display());
    }

    let agent = Agent::new(
        model,
        AdamConfig::new().init(),
        AgentConfig::from_training(&config),
        device,
    )?;

    let mut sinks = MultiSink::new().add(LogSink);
    if let Some(path) = &options.metrics {
        sinks = sinks.add(CsvSink::new(path)?);
    }

    let mut trainer = Trainer::new(config, agent, games, sinks)?;
    let summaries = trainer.run(options.iterations)?;

    if let Some(last) = summaries.last() {
        println!(
            "Finished {} iterations, {} steps, {} sample episodes, max_prob {:.3}",
            last.iteration, last.global_step, last.sample_episodes, last.max_prob
        );
    }
    Ok(())
}
