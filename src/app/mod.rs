mod probes;
mod progress;
mod summary;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use probe_runner::Runner;
use probe_runner::args::RunnerArgs;
use probe_runner::error::AppResult;

enum StopReason {
    DurationElapsed,
    Interrupted,
}

pub(crate) async fn run_local(args: RunnerArgs) -> AppResult<()> {
    let runner = Runner::with_config(args.runner_config());
    runner.add_test(probes::byte_copy(
        args.payload_bytes.get(),
        args.failure_rate,
    ));

    let interrupted = CancellationToken::new();
    let signal_handle = {
        let interrupted = interrupted.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupted.cancel();
            } else {
                warn!("Failed to listen for Ctrl-C; the run ends only when its duration elapses.");
            }
        })
    };

    runner.start()?;
    info!(
        "Running {} workers for {}s (rate: {}).",
        runner.parallel_tests(),
        args.duration.as_secs(),
        progress::describe_rate(args.target_rate)
    );

    let deadline = tokio::time::sleep(args.duration);
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval_at(
        Instant::now()
            .checked_add(args.report_interval)
            .unwrap_or_else(Instant::now),
        args.report_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = loop {
        tokio::select! {
            () = &mut deadline => break StopReason::DurationElapsed,
            () = interrupted.cancelled() => break StopReason::Interrupted,
            _ = ticker.tick() => {
                println!("{}", progress::format_line(&runner.snapshot()));
            }
        }
    };
    signal_handle.abort();

    if matches!(reason, StopReason::Interrupted) {
        info!("Interrupted, stopping workers.");
    }

    let stopped = runner.stop(args.graceful_timeout).await;
    let stats = summary::compute_summary_stats(&stopped);
    summary::print_summary(&stopped, &stats);
    Ok(())
}
