//! Command line driver for curiosity_rl.
//!
//! ```bash
//! # PPO + ICM, 16 workers, checkpoints under ./checkpoints
//! cargo run --release -- train
//!
//! # Extrinsic reward only, linear LR decay, metrics to CSV
//! cargo run --release -- train --no-icm --lr-schedule --metrics metrics.csv
//!
//! # Warm start, then watch the result
//! cargo run --release -- train --load checkpoints/SideScroller-v0_2026-01-01.bin
//! cargo run --release -- eval --load checkpoints/SideScroller-v0_2026-01-01.bin
//! ```
#![recursion_limit = "256"]

mod eval;
mod options;
mod train;

use std::io::Write;

use burn::backend::Autodiff;

use options::Options;

#[cfg(not(feature = "wgpu"))]
type B = Autodiff<burn::backend::NdArray<f32>>;
#[cfg(feature = "wgpu")]
type B = Autodiff<burn::backend::Wgpu>;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} [{}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return;
    }

    let options = match Options::parse(&args[2..]) {
        Ok(options) => options,
        Err(msg) => {
            println!("{}", msg);
            println!();
            print_usage();
            std::process::exit(2);
        }
    };

    let device = Default::default();
    let result = match args[1].as_str() {
        "train" => train::run::<B>(&options, device),
        "eval" => eval::run::<B>(&options, device),
        _ => {
            println!("Unknown command: {}", args[1]);
            println!();
            print_usage();
            return;
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Usage: cargo run --release -- <train|eval> [flags]");
    println!();
    println!("  train                 PPO (+ ICM) on the side scroller");
    println!("  eval                  Play episodes with a saved model (needs --load)");
    println!();
    println!("Flags:");
    println!("  --workers N           Parallel games (default 16)");
    println!("  --steps N             Rollout steps per worker (default 128)");
    println!("  --iterations N        Stop after N iterations");
    println!("  --max-step N          Global step budget");
    println!("  --lr X                Learning rate (default 1e-4)");
    println!("  --lr-schedule         Linear decay to zero over the step budget");
    println!("  --icm / --no-icm      Curiosity module on or off (default on)");
    println!("  --save-dir DIR        Checkpoint directory (default ./checkpoints)");
    println!("  --no-save             Disable checkpoints");
    println!("  --load PATH           Warm start / evaluate from a checkpoint");
    println!("  --metrics PATH        Also write metrics as CSV");
    println!("  --seed N              Level seed");
    println!("  --actions SET         right_only | simple | complex");
    println!("  --episodes N          Episodes to play in eval (default 5)");
    println!();
}
