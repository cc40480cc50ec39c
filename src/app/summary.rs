use std::time::Duration;

use probe_runner::StopSummary;

pub(crate) struct SummaryStats {
    pub(crate) tests_per_sec_x100: u64,
    pub(crate) error_rate_x100: u64,
}

pub(crate) fn compute_summary_stats(summary: &StopSummary) -> SummaryStats {
    SummaryStats {
        tests_per_sec_x100: rate_x100(summary.executed, summary.elapsed),
        error_rate_x100: error_rate_x100(summary.executed, summary.errors),
    }
}

/// Executions per second, scaled by 100.
pub(crate) fn rate_x100(executed: u64, elapsed: Duration) -> u64 {
    if executed == 0 {
        return 0;
    }
    let elapsed_ms = elapsed.as_millis().max(1);
    let scaled = u128::from(executed)
        .saturating_mul(100_000)
        .checked_div(elapsed_ms)
        .unwrap_or(0);
    u64::try_from(scaled).map_or(u64::MAX, |value| value)
}

/// Failed share of executions in percent, scaled by 100.
pub(crate) fn error_rate_x100(executed: u64, errors: u64) -> u64 {
    if executed == 0 {
        return 0;
    }
    let scaled = u128::from(errors)
        .saturating_mul(10_000)
        .checked_div(u128::from(executed))
        .unwrap_or(0);
    u64::try_from(scaled).map_or(u64::MAX, |value| value)
}

pub(crate) fn print_summary(summary: &StopSummary, stats: &SummaryStats) {
    println!("Duration: {}.{:03}s", summary.elapsed.as_secs(), summary.elapsed.subsec_millis());
    println!("Total Tests: {}", summary.executed);
    println!(
        "Errors: {} ({}.{:02}%)",
        summary.errors,
        stats.error_rate_x100 / 100,
        stats.error_rate_x100 % 100
    );
    println!(
        "Avg Tests/s: {}.{:02}",
        stats.tests_per_sec_x100 / 100,
        stats.tests_per_sec_x100 % 100
    );
    println!(
        "Workers: {} joined, {} aborted, {} faulted",
        summary.joined, summary.aborted, summary.faulted
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_are_zero_without_executions() -> Result<(), String> {
        let stats = compute_summary_stats(&StopSummary::default());
        if stats.tests_per_sec_x100 != 0 || stats.error_rate_x100 != 0 {
            return Err("Expected zeroed stats".to_owned());
        }
        Ok(())
    }

    #[test]
    fn stats_use_fixed_point() -> Result<(), String> {
        let summary = StopSummary {
            elapsed: Duration::from_millis(2_000),
            executed: 1_001,
            errors: 7,
            ..StopSummary::default()
        };
        let stats = compute_summary_stats(&summary);
        if stats.tests_per_sec_x100 != 50_050 {
            return Err(format!("Unexpected rate: {}", stats.tests_per_sec_x100));
        }
        if stats.error_rate_x100 != 69 {
            return Err(format!("Unexpected error rate: {}", stats.error_rate_x100));
        }
        Ok(())
    }

    #[test]
    fn sub_millisecond_runs_do_not_divide_by_zero() -> Result<(), String> {
        let rate = rate_x100(5, Duration::from_micros(10));
        if rate != 500_000 {
            return Err(format!("Unexpected rate: {}", rate));
        }
        Ok(())
    }
}
