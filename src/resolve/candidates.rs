//! Candidate pool accumulated across registries

use semver::Version;

/// One eligible version and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Version string exactly as the registry reported it
    pub version: String,
    /// Parsed (normalized) version used for ordering
    pub parsed: Version,
    /// Position of the registry in configured order
    pub registry_index: usize,
}

/// Eligible versions from one resolution pass plus failure bookkeeping
#[derive(Debug, Default)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    queried: usize,
    transient_failures: usize,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    /// Records that a registry was queried and whether it failed transiently
    pub fn record_query(&mut self, transient_failure: bool) {
        self.queried += 1;
        if transient_failure {
            self.transient_failures += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Folds another pass's bookkeeping (and candidates) into this one
    pub fn absorb(&mut self, other: CandidatePool) {
        self.candidates.extend(other.candidates);
        self.queried += other.queried;
        self.transient_failures += other.transient_failures;
    }

    /// True if at least one registry was queried and every one failed transiently
    pub fn all_failed_transiently(&self) -> bool {
        self.queried > 0 && self.queried == self.transient_failures
    }

    /// Candidates from greatest to least version.
    ///
    /// Equal versions keep the one from the earliest registry.
    pub fn into_descending(mut self) -> Vec<Candidate> {
        self.candidates.sort_by(|a, b| {
            b.parsed
                .cmp(&a.parsed)
                .then(a.registry_index.cmp(&b.registry_index))
        });
        self.candidates.dedup_by(|later, earlier| later.parsed == earlier.parsed);
        self.candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(version: &str, registry_index: usize) -> Candidate {
        Candidate {
            version: version.to_string(),
            parsed: Version::parse(version).unwrap(),
            registry_index,
        }
    }

    #[test]
    fn test_descending_with_registry_tie_break() {
        let mut pool = CandidatePool::new();
        pool.push(candidate("1.0.0", 0));
        pool.push(candidate("2.0.0", 1));
        pool.push(candidate("2.0.0", 0));
        pool.push(candidate("1.5.0", 1));

        let ordered = pool.into_descending();
        let summary: Vec<_> = ordered
            .iter()
            .map(|c| (c.version.as_str(), c.registry_index))
            .collect();
        assert_eq!(summary, vec![("2.0.0", 0), ("1.5.0", 1), ("1.0.0", 0)]);
    }

    #[test]
    fn test_all_failed_transiently() {
        let mut pool = CandidatePool::new();
        assert!(!pool.all_failed_transiently());

        pool.record_query(true);
        pool.record_query(true);
        assert!(pool.all_failed_transiently());

        let mut fallback = CandidatePool::new();
        fallback.record_query(false);
        pool.absorb(fallback);
        assert!(!pool.all_failed_transiently());
    }
}
