//! Set algebra over result sets.
//!
//! Implements the union/intersection rules that merge the raw query results
//! of one category (metadata, content, or local) into a single contribution,
//! including the default-value rules for unused categories: an include
//! category with no queries contributes the universal set, an exclude
//! category with no queries contributes the empty set. That asymmetry is
//! intentional and must be preserved exactly.

use crate::asset::ResultSet;

/// A category's contribution to the include pool.
///
/// `Universe` stands for "all assets visible to this run" and is the
/// identity element for intersection. It stays symbolic until the pipeline
/// needs an enumerable set, at which point it resolves against the assets
/// fetched during the run.
#[derive(Debug, Clone)]
pub enum Contribution {
    Universe,
    Set(ResultSet),
}

impl Contribution {
    pub fn is_universe(&self) -> bool {
        matches!(self, Contribution::Universe)
    }

    /// Intersect two contributions. `Universe` is the identity.
    pub fn intersect(self, other: Contribution) -> Contribution {
        match (self, other) {
            (Contribution::Universe, c) | (c, Contribution::Universe) => c,
            (Contribution::Set(a), Contribution::Set(b)) => Contribution::Set(a.intersect(&b)),
        }
    }

    /// Enumerate the contribution, substituting `known` for the universe.
    pub fn resolve(self, known: &ResultSet) -> ResultSet {
        match self {
            Contribution::Universe => known.clone(),
            Contribution::Set(set) => set,
        }
    }
}

/// Union of all member sets. Empty input yields the empty set (identity
/// element for union).
pub fn union_all(sets: &[ResultSet]) -> ResultSet {
    let mut out = ResultSet::new();
    for set in sets {
        out.merge(set);
    }
    out
}

/// Intersection of all member sets. Empty input yields `Universe`
/// (identity element for intersection, per the category default rule).
pub fn intersect_all(sets: &[ResultSet]) -> Contribution {
    let mut iter = sets.iter();
    let Some(first) = iter.next() else {
        return Contribution::Universe;
    };
    let mut out = first.clone();
    for set in iter {
        out = out.intersect(set);
    }
    Contribution::Set(out)
}

/// An include category's contribution: an asset must satisfy the union
/// condition *and* the intersection condition when both are supplied.
/// A list with no queries imposes no constraint.
pub fn include_contribution(union_sets: &[ResultSet], inter_sets: &[ResultSet]) -> Contribution {
    let union_part = if union_sets.is_empty() {
        Contribution::Universe
    } else {
        Contribution::Set(union_all(union_sets))
    };
    union_part.intersect(intersect_all(inter_sets))
}

/// An exclude category's contribution: an asset need only satisfy one of
/// the two specified conditions to be excluded, so the union-mode result
/// and the intersection-mode result are themselves unioned. Empty lists
/// contribute nothing.
pub fn exclude_contribution(union_sets: &[ResultSet], inter_sets: &[ResultSet]) -> ResultSet {
    let mut out = union_all(union_sets);
    if !inter_sets.is_empty() {
        if let Contribution::Set(inter) = intersect_all(inter_sets) {
            out.merge(&inter);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetId, AssetRecord};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn set(ids: &[&str]) -> ResultSet {
        ids.iter()
            .map(|id| AssetRecord::from_value(json!({ "id": id })).unwrap())
            .collect()
    }

    #[test]
    fn test_union_idempotent() {
        let a = set(&["1", "2"]);
        assert_eq!(
            union_all(&[a.clone()]).len(),
            union_all(&[a.clone(), a.clone()]).len()
        );
    }

    #[test]
    fn test_intersect_idempotent() {
        let a = set(&["1", "2"]);
        let once = intersect_all(&[a.clone()]).resolve(&ResultSet::new());
        let twice = intersect_all(&[a.clone(), a.clone()]).resolve(&ResultSet::new());
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn test_union_commutative() {
        let a = set(&["1", "2"]);
        let b = set(&["2", "3"]);
        let ab = union_all(&[a.clone(), b.clone()]);
        let ba = union_all(&[b, a]);
        assert_eq!(
            ab.ids().collect::<Vec<_>>(),
            ba.ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_intersect_commutative() {
        let a = set(&["1", "2"]);
        let b = set(&["2", "3"]);
        let known = ResultSet::new();
        let ab = intersect_all(&[a.clone(), b.clone()]).resolve(&known);
        let ba = intersect_all(&[b, a]).resolve(&known);
        assert_eq!(
            ab.ids().collect::<Vec<_>>(),
            ba.ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_monotonicity() {
        let a = set(&["1", "2"]);
        let b = set(&["2", "3", "4"]);
        let u = union_all(&[a.clone(), b.clone()]);
        let i = intersect_all(&[a.clone(), b.clone()]).resolve(&ResultSet::new());
        assert!(u.len() >= a.len() && u.len() >= b.len());
        assert!(i.len() <= a.len() && i.len() <= b.len());
    }

    #[test]
    fn test_inclusion_exclusion() {
        let a = set(&["1", "2", "3"]);
        let b = set(&["2", "3", "4", "5"]);
        let u = union_all(&[a.clone(), b.clone()]);
        let i = intersect_all(&[a.clone(), b.clone()]).resolve(&ResultSet::new());
        assert_eq!(u.len() + i.len(), a.len() + b.len());
    }

    #[test]
    fn test_empty_intersection_is_universe() {
        assert!(intersect_all(&[]).is_universe());
    }

    #[test]
    fn test_universe_is_intersection_identity() {
        let a = set(&["1", "2"]);
        let combined = Contribution::Universe.intersect(Contribution::Set(a.clone()));
        let resolved = combined.resolve(&ResultSet::new());
        assert_eq!(resolved.len(), a.len());
    }

    #[test]
    fn test_universe_resolves_to_known() {
        let known = set(&["1", "2", "3"]);
        let resolved = Contribution::Universe.resolve(&known);
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn test_include_contribution_combines_modes() {
        // union(1,2,3) ∩ intersection(2,3 ∩ 3,4) = {3}
        let u = vec![set(&["1", "2"]), set(&["3"])];
        let i = vec![set(&["2", "3"]), set(&["3", "4"])];
        let c = include_contribution(&u, &i).resolve(&ResultSet::new());
        assert_eq!(c.ids().map(AssetId::as_str).collect::<Vec<_>>(), vec!["3"]);
    }

    #[test]
    fn test_include_contribution_empty_is_universe() {
        assert!(include_contribution(&[], &[]).is_universe());
    }

    #[test]
    fn test_exclude_contribution_unions_modes() {
        // union-mode {1} ∪ intersection-mode ({2,3} ∩ {3}) = {1, 3}
        let u = vec![set(&["1"])];
        let i = vec![set(&["2", "3"]), set(&["3"])];
        let e = exclude_contribution(&u, &i);
        assert_eq!(e.len(), 2);
        assert!(e.contains(&AssetId::from("1")));
        assert!(e.contains(&AssetId::from("3")));
    }

    #[test]
    fn test_exclude_contribution_empty_is_empty() {
        assert!(exclude_contribution(&[], &[]).is_empty());
    }
}
