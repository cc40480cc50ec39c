use std::hint::black_box;
use std::sync::Arc;

use rand::Rng;

use probe_runner::args::Probability;

/// Builds the demo probe: copy a fixed payload into a fresh buffer and check
/// the copy, then report failure with probability `failure_rate`.
pub(crate) fn byte_copy(
    payload_bytes: usize,
    failure_rate: Probability,
) -> impl Fn() -> bool + Send + Sync + 'static {
    let source: Arc<[u8]> = (0..payload_bytes)
        .map(|index| u8::try_from(index % 251).unwrap_or(0))
        .collect();
    let failure_rate = failure_rate.get();

    move || {
        let mut target = vec![0u8; source.len()];
        target.copy_from_slice(&source);
        let copied = black_box(&target) == &*source;
        if failure_rate > 0.0 && rand::thread_rng().gen_bool(failure_rate) {
            return false;
        }
        copied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_without_failures_always_passes() -> Result<(), String> {
        let probe = byte_copy(1024, Probability::NEVER);
        if !(0..100).all(|_| probe()) {
            return Err("Expected every copy to pass".to_owned());
        }
        Ok(())
    }

    #[test]
    fn certain_failure_always_fails() -> Result<(), String> {
        let always = Probability::try_from(1.0).map_err(|err| err.to_string())?;
        let probe = byte_copy(16, always);
        if (0..100).any(|_| probe()) {
            return Err("Expected every copy to fail".to_owned());
        }
        Ok(())
    }

    #[test]
    fn failure_ratio_tracks_probability() -> Result<(), String> {
        let quarter = Probability::try_from(0.25).map_err(|err| err.to_string())?;
        let probe = byte_copy(8, quarter);
        let failures = (0..20_000).filter(|_| !probe()).count();
        if !(4_000..=6_000).contains(&failures) {
            return Err(format!("Unexpected failure count: {}", failures));
        }
        Ok(())
    }
}
