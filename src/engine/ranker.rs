use crate::model::*;

use super::affinity::Candidate;

/// A location may take the unit only if doing so cannot invert pick order:
/// stock of the same SKU already there must not be newer than the unit.
/// Equal timestamps are fine; locations not holding the SKU cannot invert.
pub fn fifo_eligible(unit: &Unit, sku_oldest: Option<Ms>) -> bool {
    match sku_oldest {
        Some(oldest) => oldest <= unit.receipt_ts,
        None => true,
    }
}

/// Pick the best eligible candidate: match quality first (same SKU >
/// similar > empty slot), then — within same-SKU matches — the location
/// with the oldest stock, so consecutive receipts keep filling from the
/// oldest slot and pairwise pick order stays monotone. After that, most
/// available capacity to favor consolidation, then location id for
/// determinism. Ineligible locations are skipped, not repaired. `None`
/// means nothing in the catalog can take the unit.
pub fn rank(unit: &Unit, candidates: &[Candidate]) -> Option<(LocationId, Rationale)> {
    candidates
        .iter()
        .filter(|c| fifo_eligible(unit, c.sku_oldest))
        .min_by(|a, b| {
            a.match_kind
                .cmp(&b.match_kind)
                .then_with(|| a.sku_oldest.cmp(&b.sku_oldest))
                .then_with(|| b.available.cmp(&a.available))
                .then_with(|| a.location_id.cmp(&b.location_id))
        })
        .map(|c| (c.location_id.clone(), c.match_kind.rationale()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MatchKind;

    fn unit(receipt_ts: Ms) -> Unit {
        Unit {
            unit_id: UnitId::from("U-1"),
            sku: Sku::from("WIDGET"),
            receipt_ts,
            quantity: 1,
            expires_at: None,
        }
    }

    fn candidate(id: &str, kind: MatchKind, available: u32, sku_oldest: Option<Ms>) -> Candidate {
        Candidate {
            location_id: LocationId::from(id),
            match_kind: kind,
            available,
            distinct_skus: 1,
            sku_oldest,
            stock_oldest: sku_oldest,
        }
    }

    #[test]
    fn older_stock_behind_is_eligible() {
        assert!(fifo_eligible(&unit(2_000), Some(1_000)));
        assert!(fifo_eligible(&unit(2_000), Some(2_000))); // equal is fine
        assert!(fifo_eligible(&unit(2_000), None));
    }

    #[test]
    fn newer_stock_ahead_is_not() {
        assert!(!fifo_eligible(&unit(1_000), Some(2_000)));
    }

    #[test]
    fn same_sku_beats_similar_and_empty() {
        let candidates = vec![
            candidate("C-01", MatchKind::Empty, 100, None),
            candidate("B-01", MatchKind::Similar, 50, None),
            candidate("A-01", MatchKind::Same, 1, Some(500)),
        ];
        let (id, rationale) = rank(&unit(1_000), &candidates).unwrap();
        assert_eq!(id, LocationId::from("A-01"));
        assert_eq!(rationale, Rationale::SameSkuMatch);
    }

    #[test]
    fn same_sku_prefers_the_oldest_stock() {
        // More room at A-02, but A-01 holds the older stock — it wins so
        // receipts keep filling from the oldest slot.
        let candidates = vec![
            candidate("A-01", MatchKind::Same, 3, Some(100)),
            candidate("A-02", MatchKind::Same, 9, Some(200)),
        ];
        let (id, _) = rank(&unit(1_000), &candidates).unwrap();
        assert_eq!(id, LocationId::from("A-01"));
    }

    #[test]
    fn capacity_breaks_quality_ties() {
        let candidates = vec![
            candidate("A-01", MatchKind::Same, 2, Some(500)),
            candidate("A-02", MatchKind::Same, 9, Some(500)),
        ];
        let (id, _) = rank(&unit(1_000), &candidates).unwrap();
        assert_eq!(id, LocationId::from("A-02"));
    }

    #[test]
    fn location_id_breaks_full_ties() {
        let candidates = vec![
            candidate("A-02", MatchKind::Empty, 5, None),
            candidate("A-01", MatchKind::Empty, 5, None),
        ];
        let (id, rationale) = rank(&unit(1_000), &candidates).unwrap();
        assert_eq!(id, LocationId::from("A-01"));
        assert_eq!(rationale, Rationale::EmptyFifoSlot);
    }

    #[test]
    fn ineligible_same_sku_loses_to_empty() {
        // The same-SKU slot holds strictly newer stock; an empty slot wins.
        let candidates = vec![
            candidate("A-01", MatchKind::Same, 9, Some(5_000)),
            candidate("B-01", MatchKind::Empty, 5, None),
        ];
        let (id, rationale) = rank(&unit(1_000), &candidates).unwrap();
        assert_eq!(id, LocationId::from("B-01"));
        assert_eq!(rationale, Rationale::EmptyFifoSlot);
    }

    #[test]
    fn nothing_eligible_is_none() {
        let candidates = vec![candidate("A-01", MatchKind::Same, 9, Some(5_000))];
        assert!(rank(&unit(1_000), &candidates).is_none());
        assert!(rank(&unit(1_000), &[]).is_none());
    }
}
