//! `eval`: play episodes with a trained model.

use std::error::Error;

use burn::optim::AdamConfig;
use burn::tensor::backend::AutodiffBackend;
use curiosity_rl::{
    Agent, AgentConfig, Checkpointer, FramePreprocessor, Game, IcmPpoModel, ObservationHistory,
};
use side_scroller::SideScroller;

use crate::options::Options;

pub fn run<B: AutodiffBackend>(options: &Options, device: B::Device) -> Result<(), Box<dyn Error>> {
    let path = options
        .load
        .as_ref()
        .ok_or("eval needs --load <checkpoint>")?;
    let config = options.training_config().with_num_worker(1);
    let mut game = SideScroller::new(options.game_config().with_env_id(config.env_id.clone()))?;
    let n_actions = game.n_actions();

    let template: IcmPpoModel<B> = config.model_config(n_actions).init(&device);
    let model = Checkpointer::load(template, path, &device)?;
    let agent = Agent::new(
        model,
        AdamConfig::new().init(),
        AgentConfig::from_training(&config),
        device,
    )?;

    let preprocessor = FramePreprocessor::new(config.frame_height, config.frame_width);
    for episode in 1..=options.episodes {
        let first = preprocessor.process(&game.reset()?)?;
        let mut history = ObservationHistory::filled(&first, config.history);
        let mut total = 0.0;
        let mut steps = 0;
        loop {
            let action = agent.get_action(history.as_slice())?[0];
            let step = game.step(action)?;
            total += step.reward;
            steps += 1;
            history.push(&preprocessor.process(&step.frame)?)?;
            if step.done {
                log::info!(
                    "episode {} | return {:.1} | steps {} | stage {} | x {}",
                    episode,
                    total,
                    steps,
                    step.info.stage,
                    step.info.x_pos
                );
                break;
            }
        }
    }
    Ok(())
}
