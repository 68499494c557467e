use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use guild_sidebar::{GuildListView, InMemorySource, RecordingController};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod scenario;

use scenario::{Scenario, Step};

/// How long the inbox must stay quiet before a settle step is considered done.
const QUIET_PERIOD: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(about = "Replays a scripted chat session against the guild sidebar")]
struct Args {
    /// Scenario file (JSON).
    scenario: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the sidebar after every step.
    #[arg(long)]
    print_steps: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::load_settings(args.config.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let scenario = Scenario::load(&args.scenario)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build replay runtime")?;

    let source = Arc::new(InMemorySource::new());
    scenario.seed(&source);

    let ctrl = RecordingController::new();
    let mut view = GuildListView::new(
        source.clone(),
        Box::new(ctrl.clone()),
        runtime.handle().clone(),
        settings.sidebar_config(),
    );
    view.set_visible(true);

    let settle_timeout = settings.settle_timeout();
    info!(steps = scenario.steps.len(), "replaying scenario");
    for (i, step) in scenario.steps.into_iter().enumerate() {
        debug!(step = i + 1, ?step, "applying step");
        apply_step(&mut view, &source, step, settle_timeout);
        if args.print_steps {
            println!("after step {}:\n{}", i + 1, render::render_sidebar(&view));
        }
    }
    settle(&mut view, settle_timeout);

    print!("{}", render::render_sidebar(&view));
    println!("controller calls:");
    for call in ctrl.calls() {
        println!("  {}", render::describe_call(&call));
    }

    view.set_visible(false);
    Ok(())
}

fn apply_step(view: &mut GuildListView, source: &InMemorySource, step: Step, settle_timeout: Duration) {
    match step {
        Step::Publish(event) => {
            source.publish(event);
            settle(view, settle_timeout);
        }
        Step::Select { guild_id } => view.select_guild(guild_id),
        Step::Unselect => view.unselect(),
        Step::Invalidate => view.invalidate(),
        Step::InvalidateUnreads => view.invalidate_unreads(),
        Step::Hide => view.set_visible(false),
        Step::Show => view.set_visible(true),
        Step::Settle => settle(view, settle_timeout),
        Step::SetReady(ready) => source.set_ready(ready),
        Step::CacheGuild(guild) => source.upsert_guild(guild),
        Step::ForgetGuild { guild_id } => {
            source.remove_guild(guild_id);
        }
        Step::SetReadState { guild_id, state } => source.set_read_state(guild_id, state),
        Step::SetFetchFailure(err) => source.set_fetch_failure(err.map(Into::into)),
    }
}

/// Applies inbox messages until nothing arrives for a quiet period and no
/// fetch is outstanding, or until `timeout` passes.
fn settle(view: &mut GuildListView, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !view.process_next(QUIET_PERIOD) && !view.is_fetching() {
            break;
        }
    }
}
