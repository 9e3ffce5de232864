use std::collections::{HashMap, HashSet};

use serde::Serialize;
use uuid::Uuid;

use salon_types::{Reaction, ReactionKind};

/// Tally for one reaction kind on one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionSummary {
    pub kind: ReactionKind,
    pub emoji: &'static str,
    pub count: usize,
    pub viewer_reacted: bool,
}

/// Collapse the (kind, user) rows of a single entity into per-kind tallies.
///
/// Only kinds with at least one reaction are returned, in canonical kind
/// order. A repeated (kind, user) pair is counted once.
pub fn summarize(rows: &[(ReactionKind, Uuid)], viewer: Option<Uuid>) -> Vec<ReactionSummary> {
    let mut counts = [0usize; ReactionKind::ALL.len()];
    let mut reacted = [false; ReactionKind::ALL.len()];
    let mut seen: HashSet<(ReactionKind, Uuid)> = HashSet::with_capacity(rows.len());

    for &(kind, user_id) in rows {
        if !seen.insert((kind, user_id)) {
            continue;
        }
        let slot = kind as usize;
        counts[slot] += 1;
        if viewer == Some(user_id) {
            reacted[slot] = true;
        }
    }

    ReactionKind::ALL
        .into_iter()
        .filter(|&kind| counts[kind as usize] > 0)
        .map(|kind| ReactionSummary {
            kind,
            emoji: kind.emoji(),
            count: counts[kind as usize],
            viewer_reacted: reacted[kind as usize],
        })
        .collect()
}

/// Batch form of [`summarize`]: reactions for many entities fetched in one
/// query, keyed by target id. Entities without reactions are absent.
pub fn summarize_by_target(
    reactions: &[Reaction],
    viewer: Option<Uuid>,
) -> HashMap<Uuid, Vec<ReactionSummary>> {
    let mut by_target: HashMap<Uuid, Vec<(ReactionKind, Uuid)>> = HashMap::new();
    for r in reactions {
        by_target
            .entry(r.target.id())
            .or_default()
            .push((r.kind, r.user_id));
    }

    by_target
        .into_iter()
        .map(|(target, rows)| (target, summarize(&rows, viewer)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use salon_types::ReactionTarget;

    #[test]
    fn counts_in_canonical_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![
            (ReactionKind::Question, a),
            (ReactionKind::Like, a),
            (ReactionKind::Like, b),
            (ReactionKind::Celebrate, c),
        ];
        let summary = summarize(&rows, Some(b));

        let kinds: Vec<_> = summary.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![ReactionKind::Like, ReactionKind::Celebrate, ReactionKind::Question]
        );
        assert_eq!(summary[0].count, 2);
        assert!(summary[0].viewer_reacted);
        assert!(!summary[1].viewer_reacted);
        assert!(!summary[2].viewer_reacted);

        let total: usize = summary.iter().map(|s| s.count).sum();
        assert_eq!(total, rows.len());
    }

    #[test]
    fn zero_count_kinds_are_omitted() {
        let rows = vec![(ReactionKind::Helpful, Uuid::new_v4())];
        let summary = summarize(&rows, None);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].kind, ReactionKind::Helpful);
        assert!(summarize(&[], None).is_empty());
    }

    #[test]
    fn anonymous_viewer_never_reacted() {
        let u = Uuid::new_v4();
        let summary = summarize(&[(ReactionKind::Like, u)], None);
        assert!(!summary[0].viewer_reacted);
    }

    #[test]
    fn duplicate_rows_count_once() {
        let u = Uuid::new_v4();
        let rows = vec![(ReactionKind::Like, u), (ReactionKind::Like, u)];
        let summary = summarize(&rows, Some(u));
        assert_eq!(summary[0].count, 1);
        assert!(summary[0].viewer_reacted);
    }

    #[test]
    fn batch_summary_is_keyed_by_target() {
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        let viewer = Uuid::new_v4();
        let reaction = |target, kind, user_id| Reaction {
            target: ReactionTarget::Post(target),
            user_id,
            kind,
            created_at: Utc::now(),
        };
        let rows = vec![
            reaction(p1, ReactionKind::Like, viewer),
            reaction(p1, ReactionKind::Like, Uuid::new_v4()),
            reaction(p2, ReactionKind::Helpful, Uuid::new_v4()),
        ];

        let map = summarize_by_target(&rows, Some(viewer));
        assert_eq!(map.len(), 2);
        assert_eq!(map[&p1][0].count, 2);
        assert!(map[&p1][0].viewer_reacted);
        assert_eq!(map[&p2][0].kind, ReactionKind::Helpful);
        assert!(!map[&p2][0].viewer_reacted);
    }
}
