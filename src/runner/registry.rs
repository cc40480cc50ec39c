use std::sync::{Arc, PoisonError, RwLock};

use rand::Rng;
use rand::seq::SliceRandom;

use super::probe::Probe;

/// Append-only probe list.
///
/// Readers clone the current `Arc` under a short read lock and draw from that
/// snapshot, so an append never shows up half-written. Appends copy the list
/// only while a snapshot is still held by some worker.
#[derive(Debug, Default)]
pub(super) struct ProbeRegistry {
    probes: RwLock<Arc<Vec<Probe>>>,
}

impl ProbeRegistry {
    pub(super) fn push(&self, probe: Probe) {
        let mut probes = self.probes.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut probes).push(probe);
    }

    pub(super) fn snapshot(&self) -> Arc<Vec<Probe>> {
        let probes = self.probes.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&probes)
    }

    pub(super) fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Uniform draw over the probes registered so far.
    pub(super) fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Probe> {
        self.snapshot().choose(rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_probe(hits: &Arc<AtomicUsize>) -> Probe {
        let hits = Arc::clone(hits);
        Probe::blocking(move || {
            hits.fetch_add(1, Ordering::Relaxed);
            true
        })
    }

    fn call(probe: &Probe) -> Result<bool, String> {
        match probe {
            Probe::Blocking(probe) => Ok(probe()),
            Probe::Async(_) => Err("Expected a blocking probe".to_owned()),
        }
    }

    #[test]
    fn empty_registry_yields_nothing() -> Result<(), String> {
        let registry = ProbeRegistry::default();
        let mut rng = StdRng::seed_from_u64(7);
        if registry.pick(&mut rng).is_some() {
            return Err("Empty registry returned a probe".to_owned());
        }
        Ok(())
    }

    #[test]
    fn snapshot_is_unaffected_by_later_appends() -> Result<(), String> {
        let registry = ProbeRegistry::default();
        registry.push(Probe::blocking(|| true));
        let before = registry.snapshot();
        registry.push(Probe::blocking(|| false));
        if before.len() != 1 || registry.len() != 2 {
            return Err(format!(
                "Unexpected lengths: snapshot {}, registry {}",
                before.len(),
                registry.len()
            ));
        }
        Ok(())
    }

    #[test]
    fn draws_cover_every_probe_roughly_evenly() -> Result<(), String> {
        let registry = ProbeRegistry::default();
        let counters: Vec<Arc<AtomicUsize>> =
            (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        for hits in &counters {
            registry.push(counting_probe(hits));
        }

        let mut rng = StdRng::seed_from_u64(42);
        let draws = 40_000;
        for _ in 0..draws {
            let probe = registry.pick(&mut rng).ok_or("Registry unexpectedly empty")?;
            call(&probe)?;
        }

        for (idx, hits) in counters.iter().enumerate() {
            let seen = hits.load(Ordering::Relaxed);
            // Expect ~10_000 each; allow a wide band to keep the test stable.
            if !(9_000..=11_000).contains(&seen) {
                return Err(format!("Probe {} drawn {} times", idx, seen));
            }
        }
        Ok(())
    }
}
