use std::env;

use anyhow::{Context, bail};
use log::info;
use machine_learning::next_frame;
use mlp_viz::{VizConfig, VizState};

const USAGE: &str = "usage: mlp-viz [--config <file.json>] [--json]";

/// Applies the run's events as they come, until the run is over.
async fn follow(state: &mut VizState) {
    loop {
        state.tick();
        if !state.is_running() {
            break;
        }
        next_frame().await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config_path = None;
    let mut json = false;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config_path = Some(args.next().context(USAGE)?),
            "--json" => json = true,
            other => bail!("unexpected argument '{other}'\n{USAGE}"),
        }
    }

    let config = match config_path {
        Some(path) => VizConfig::load(&path).with_context(|| format!("cannot load '{path}'"))?,
        None => VizConfig::default(),
    };
    info!("training with {}", config.params);

    let mut state = VizState::new(&config);
    let run = state
        .start()
        .context("the configured params can't be trained")?;

    let (outcome, ()) = futures::join!(run.run(), follow(&mut state));
    let outcome = outcome?;
    state.tick();

    match outcome.final_loss {
        Some(loss) => println!("{} steps, final loss {loss:.6}", outcome.steps),
        None => println!("{} steps", outcome.steps),
    }

    if let Some(snapshot) = state.snapshot() {
        println!("last snapshot at step {}", snapshot.step);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(state.diagrams())?);
    }

    Ok(())
}
