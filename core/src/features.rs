use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Bag of weighted terms. `length` is kept in step with the weights so reads
/// never rescan the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    features: HashMap<String, f64>,
    length: f64,
}

impl FeatureVector {
    pub fn new() -> Self { Self::default() }

    /// Adds `weight` to the term's current weight.
    pub fn add_term(&mut self, term: &str, weight: f64) {
        *self.features.entry(term.to_string()).or_insert(0.0) += weight;
        self.length += weight;
    }

    /// Replaces the term's weight.
    pub fn set_term(&mut self, term: &str, weight: f64) {
        let old = self.features.insert(term.to_string(), weight).unwrap_or(0.0);
        self.length += weight - old;
    }

    pub fn remove_term(&mut self, term: &str) -> Option<f64> {
        let old = self.features.remove(term)?;
        self.length -= old;
        Some(old)
    }

    /// Weight of `term`, 0.0 when absent.
    pub fn weight(&self, term: &str) -> f64 {
        self.features.get(term).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, term: &str) -> bool { self.features.contains_key(term) }

    /// Sum of all weights.
    pub fn length(&self) -> f64 { self.length }

    /// Number of distinct terms.
    pub fn feature_count(&self) -> usize { self.features.len() }

    pub fn is_empty(&self) -> bool { self.features.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.features.iter().map(|(t, w)| (t.as_str(), *w))
    }

    /// Terms ordered by descending weight, ties broken alphabetically.
    pub fn sorted(&self) -> Vec<(&str, f64)> {
        let mut out: Vec<(&str, f64)> = self.iter().collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        out
    }

    /// Keeps only the `k` heaviest terms.
    pub fn clip(&mut self, k: usize) {
        if self.features.len() <= k { return; }
        let keep: HashMap<String, f64> = self.sorted().into_iter().take(k).map(|(t, w)| (t.to_string(), w)).collect();
        self.length = keep.values().sum();
        self.features = keep;
    }

    /// Scales weights so they sum to 1. An empty or zero-length vector is left as is.
    pub fn normalize(&mut self) {
        if self.length <= 0.0 { return; }
        let len = self.length;
        for w in self.features.values_mut() { *w /= len; }
        self.length = 1.0;
    }
}

impl<'a> FromIterator<&'a str> for FeatureVector {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut fv = FeatureVector::new();
        for term in iter { fv.add_term(term, 1.0); }
        fv
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (term, weight) in self.sorted() {
            writeln!(f, "{term}\t{weight}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_tracks_weights() {
        let mut fv = FeatureVector::new();
        fv.add_term("cat", 1.0);
        fv.add_term("cat", 1.0);
        fv.add_term("sat", 0.5);
        assert_eq!(fv.feature_count(), 2);
        assert_eq!(fv.weight("cat"), 2.0);
        assert_eq!(fv.length(), 2.5);

        fv.set_term("cat", 1.0);
        assert_eq!(fv.length(), 1.5);
        assert_eq!(fv.remove_term("sat"), Some(0.5));
        assert_eq!(fv.length(), 1.0);
        assert_eq!(fv.weight("missing"), 0.0);
    }

    #[test]
    fn clip_keeps_heaviest() {
        let mut fv: FeatureVector = ["a", "a", "a", "b", "b", "c"].into_iter().collect();
        fv.clip(2);
        assert_eq!(fv.feature_count(), 2);
        assert!(!fv.contains("c"));
        assert_eq!(fv.length(), 5.0);
    }

    #[test]
    fn normalize_sums_to_one() {
        let mut fv: FeatureVector = ["x", "y", "y", "y"].into_iter().collect();
        fv.normalize();
        assert!((fv.weight("y") - 0.75).abs() < 1e-12);
        assert!((fv.length() - 1.0).abs() < 1e-12);
    }
}
