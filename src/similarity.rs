use std::collections::{BTreeSet, HashMap};

use crate::model::Sku;

/// Which SKUs count as "similar" to a given SKU. Used only for ranking
/// (affinity expansion), never for correctness, so implementations are free
/// to be loose. Results must be deterministic for a given input.
pub trait SimilarityRelation: Send + Sync {
    /// Similar SKUs, excluding `sku` itself, in a deterministic order.
    fn similar_to(&self, sku: &Sku) -> Vec<Sku>;
}

/// The identity relation: nothing is similar to anything. Default.
pub struct NoSimilarity;

impl SimilarityRelation for NoSimilarity {
    fn similar_to(&self, _sku: &Sku) -> Vec<Sku> {
        Vec::new()
    }
}

/// Explicit SKU → similar-SKUs table, supplied as static configuration.
pub struct SkuTable {
    map: HashMap<Sku, BTreeSet<Sku>>,
}

impl SkuTable {
    /// Build from pairs. With `symmetric`, every `(a, b)` also records `(b, a)`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Sku, Sku)>, symmetric: bool) -> Self {
        let mut map: HashMap<Sku, BTreeSet<Sku>> = HashMap::new();
        for (a, b) in pairs {
            if a == b {
                continue;
            }
            if symmetric {
                map.entry(b.clone()).or_default().insert(a.clone());
            }
            map.entry(a).or_default().insert(b);
        }
        Self { map }
    }

    /// Parse a JSON object of the form `{"SKU": ["OTHER", ...], ...}`.
    pub fn from_json_str(raw: &str, symmetric: bool) -> Result<Self, serde_json::Error> {
        let table: HashMap<String, Vec<String>> = serde_json::from_str(raw)?;
        let pairs = table.into_iter().flat_map(|(sku, similars)| {
            let sku = Sku::new(sku);
            similars
                .into_iter()
                .map(move |s| (sku.clone(), Sku::new(s)))
        });
        Ok(Self::from_pairs(pairs, symmetric))
    }
}

impl SimilarityRelation for SkuTable {
    fn similar_to(&self, sku: &Sku) -> Vec<Sku> {
        self.map
            .get(sku)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// SKU → category mapping; SKUs sharing a category are similar.
pub struct CategoryMap {
    categories: HashMap<Sku, String>,
    by_category: HashMap<String, BTreeSet<Sku>>,
}

impl CategoryMap {
    pub fn from_entries(entries: impl IntoIterator<Item = (Sku, String)>) -> Self {
        let mut categories = HashMap::new();
        let mut by_category: HashMap<String, BTreeSet<Sku>> = HashMap::new();
        for (sku, category) in entries {
            by_category.entry(category.clone()).or_default().insert(sku.clone());
            categories.insert(sku, category);
        }
        Self { categories, by_category }
    }
}

impl SimilarityRelation for CategoryMap {
    fn similar_to(&self, sku: &Sku) -> Vec<Sku> {
        let Some(category) = self.categories.get(sku) else {
            return Vec::new();
        };
        self.by_category[category]
            .iter()
            .filter(|s| *s != sku)
            .cloned()
            .collect()
    }
}

/// Normalized edit-distance similarity over the known SKU catalog.
/// Two SKU codes are similar when `1 - dist/max_len >= threshold`.
pub struct EditDistance {
    catalog: BTreeSet<Sku>,
    threshold: f64,
}

impl EditDistance {
    pub const DEFAULT_THRESHOLD: f64 = 0.6;

    pub fn new(catalog: impl IntoIterator<Item = Sku>, threshold: f64) -> Self {
        Self {
            catalog: catalog.into_iter().collect(),
            threshold,
        }
    }
}

impl SimilarityRelation for EditDistance {
    fn similar_to(&self, sku: &Sku) -> Vec<Sku> {
        self.catalog
            .iter()
            .filter(|other| *other != sku && normalized_similarity(sku.as_str(), other.as_str()) >= self.threshold)
            .cloned()
            .collect()
    }
}

/// `1 - levenshtein / max_len`, case-insensitive over ASCII SKU codes.
pub fn normalized_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.chars().map(|c| c.to_ascii_uppercase()).collect();
    let b: Vec<char> = b.chars().map(|c| c.to_ascii_uppercase()).collect();
    let max_len = a.len().max(b.len());
    1.0 - (levenshtein(&a, &b) as f64) / (max_len as f64)
}

/// Two-row dynamic-programming edit distance.
fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let n = b.len();
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = usize::from(ca != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_similarity_is_empty() {
        assert!(NoSimilarity.similar_to(&Sku::from("A")).is_empty());
    }

    #[test]
    fn table_lookup_and_symmetry() {
        let rel = SkuTable::from_pairs([(Sku::from("B"), Sku::from("A"))], true);
        assert_eq!(rel.similar_to(&Sku::from("B")), vec![Sku::from("A")]);
        assert_eq!(rel.similar_to(&Sku::from("A")), vec![Sku::from("B")]);
        assert!(rel.similar_to(&Sku::from("C")).is_empty());
    }

    #[test]
    fn table_asymmetric() {
        let rel = SkuTable::from_pairs([(Sku::from("B"), Sku::from("A"))], false);
        assert_eq!(rel.similar_to(&Sku::from("B")), vec![Sku::from("A")]);
        assert!(rel.similar_to(&Sku::from("A")).is_empty());
    }

    #[test]
    fn table_from_json() {
        let rel = SkuTable::from_json_str(r#"{"B": ["A", "C"]}"#, false).unwrap();
        assert_eq!(
            rel.similar_to(&Sku::from("B")),
            vec![Sku::from("A"), Sku::from("C")]
        );
    }

    #[test]
    fn table_rejects_bad_json() {
        assert!(SkuTable::from_json_str(r#"["not", "a", "map"]"#, false).is_err());
    }

    #[test]
    fn category_groups() {
        let rel = CategoryMap::from_entries([
            (Sku::from("MUG-RED"), "mugs".to_owned()),
            (Sku::from("MUG-BLUE"), "mugs".to_owned()),
            (Sku::from("PLATE"), "plates".to_owned()),
        ]);
        assert_eq!(rel.similar_to(&Sku::from("MUG-RED")), vec![Sku::from("MUG-BLUE")]);
        assert!(rel.similar_to(&Sku::from("PLATE")).is_empty());
        assert!(rel.similar_to(&Sku::from("UNKNOWN")).is_empty());
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(levenshtein(&['a', 'b', 'c'], &['a', 'b', 'c']), 0);
        assert_eq!(levenshtein(&['a', 'b', 'c'], &['a', 'x', 'c']), 1);
        assert_eq!(levenshtein(&[], &['a']), 1);
        assert!(normalized_similarity("ABC123", "ABC124") > 0.8);
        assert_eq!(normalized_similarity("", "ABC"), 0.0);
    }

    #[test]
    fn edit_distance_relation_respects_threshold() {
        let rel = EditDistance::new(
            [Sku::from("WIDGET-10"), Sku::from("WIDGET-12"), Sku::from("GADGET")],
            EditDistance::DEFAULT_THRESHOLD,
        );
        let similar = rel.similar_to(&Sku::from("WIDGET-10"));
        assert_eq!(similar, vec![Sku::from("WIDGET-12")]);
    }

    #[test]
    fn edit_distance_is_case_insensitive() {
        assert_eq!(normalized_similarity("widget", "WIDGET"), 1.0);
    }
}
