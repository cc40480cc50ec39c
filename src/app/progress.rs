use probe_runner::RunSnapshot;

use super::summary::{error_rate_x100, rate_x100};

pub(crate) fn format_line(snapshot: &RunSnapshot) -> String {
    let rate = rate_x100(snapshot.executed, snapshot.elapsed);
    let error_rate = error_rate_x100(snapshot.executed, snapshot.errors);
    format!(
        "[{:>4}.{}s] executed={} errors={} ({}.{:02}%) rate={}.{:02}/s workers={}",
        snapshot.elapsed.as_secs(),
        snapshot.elapsed.subsec_millis() / 100,
        snapshot.executed,
        snapshot.errors,
        error_rate / 100,
        error_rate % 100,
        rate / 100,
        rate % 100,
        snapshot.active_workers
    )
}

pub(crate) fn describe_rate(target_rate: f64) -> String {
    if target_rate.is_finite() && target_rate > 0.0 {
        format!("{}/s", target_rate)
    } else {
        "unlimited".to_owned()
    }
}
