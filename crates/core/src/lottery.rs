//! Priority-lottery resolution.
//!
//! Resolves a snapshot of pending applications into winners and discards,
//! honoring priority rounds, per-slot capacity, and one-win-per-student
//! exclusivity. Pure: the caller supplies the snapshot and the random
//! source, and commits the outcome atomically. Ties are broken by an
//! unbiased shuffle — never by submission order or student identity — so
//! tests inject a seeded generator while production uses a thread rng.

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

/// Lowest and highest priority ranks; rounds run 1, 2, 3 in order.
pub const PRIORITY_MIN: u8 = 1;
pub const PRIORITY_MAX: u8 = 3;

/// One pending (`applied`) reservation as seen by the allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub reservation_id: String,
    pub student_id: String,
    pub slot_id: String,
    pub priority: u8,
}

/// A confirmed application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub reservation_id: String,
    pub student_id: String,
    pub slot_id: String,
    pub priority: u8,
}

/// The full resolution of one lottery run.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Applications to confirm, flagged as the student's first day.
    pub winners: Vec<Winner>,
    /// Reservation ids to delete: every remaining `applied` record of a
    /// student who won anything, this run or previously.
    pub discarded: Vec<String>,
    /// Reservation ids left `applied` for a future run or manual handling.
    pub remaining: Vec<String>,
}

/// Capacity snapshot for the slots under resolution.
#[derive(Debug, Clone, Default)]
pub struct SlotCapacities {
    /// Configured `max_capacity` per slot id.
    pub max_capacity: HashMap<String, u32>,
    /// Already-confirmed reservation count per slot id, before this run.
    pub confirmed_count: HashMap<String, u32>,
}

impl SlotCapacities {
    fn remaining(&self, slot_id: &str, won_this_run: u32) -> u32 {
        let max = self.max_capacity.get(slot_id).copied().unwrap_or(0);
        let taken = self.confirmed_count.get(slot_id).copied().unwrap_or(0) + won_this_run;
        max.saturating_sub(taken)
    }
}

/// Resolve all pending applications in three priority rounds.
///
/// `already_confirmed` holds the students who already hold a confirmed
/// reservation from a prior run or manual action; they cannot win again,
/// and their leftover applications are pruned. Deterministic for a fixed
/// `rng`: slots are visited in id order and the only nondeterminism is the
/// shuffle itself.
pub fn resolve<R: Rng + ?Sized>(
    applications: &[Application],
    capacities: &SlotCapacities,
    already_confirmed: &HashSet<String>,
    rng: &mut R,
) -> Outcome {
    let mut outcome = Outcome::default();
    let mut run_winners: HashSet<String> = HashSet::new();
    let mut won_per_slot: HashMap<String, u32> = HashMap::new();

    for round in PRIORITY_MIN..=PRIORITY_MAX {
        // Deterministic slot visiting order given a fixed rng.
        let mut by_slot: BTreeMap<&str, Vec<&Application>> = BTreeMap::new();
        for app in applications {
            if app.priority == round
                && !already_confirmed.contains(&app.student_id)
                && !run_winners.contains(&app.student_id)
            {
                by_slot.entry(&app.slot_id).or_default().push(app);
            }
        }

        for (slot_id, mut applicants) in by_slot {
            let won = won_per_slot.get(slot_id).copied().unwrap_or(0);
            let remaining = capacities.remaining(slot_id, won) as usize;

            let admitted: Vec<&Application> = if applicants.len() <= remaining {
                applicants
            } else {
                applicants.shuffle(rng);
                applicants.truncate(remaining);
                applicants
            };

            for app in admitted {
                run_winners.insert(app.student_id.clone());
                *won_per_slot.entry(app.slot_id.clone()).or_default() += 1;
                outcome.winners.push(Winner {
                    reservation_id: app.reservation_id.clone(),
                    student_id: app.student_id.clone(),
                    slot_id: app.slot_id.clone(),
                    priority: app.priority,
                });
            }
        }
    }

    // Prune every leftover application of any winning student, so each
    // student keeps exactly one reservation. Losers keep theirs.
    let winning_ids: HashSet<&str> = outcome
        .winners
        .iter()
        .map(|w| w.reservation_id.as_str())
        .collect();
    for app in applications {
        if winning_ids.contains(app.reservation_id.as_str()) {
            continue;
        }
        if run_winners.contains(&app.student_id) || already_confirmed.contains(&app.student_id) {
            outcome.discarded.push(app.reservation_id.clone());
        } else {
            outcome.remaining.push(app.reservation_id.clone());
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn app(id: &str, student: &str, slot: &str, priority: u8) -> Application {
        Application {
            reservation_id: id.to_string(),
            student_id: student.to_string(),
            slot_id: slot.to_string(),
            priority,
        }
    }

    fn caps(entries: &[(&str, u32, u32)]) -> SlotCapacities {
        let mut c = SlotCapacities::default();
        for (slot, max, confirmed) in entries {
            c.max_capacity.insert((*slot).to_string(), *max);
            c.confirmed_count.insert((*slot).to_string(), *confirmed);
        }
        c
    }

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn under_capacity_everyone_wins() {
        let apps = [app("r1", "s1", "slot-a", 1), app("r2", "s2", "slot-a", 1)];
        let outcome = resolve(&apps, &caps(&[("slot-a", 5, 0)]), &HashSet::new(), &mut rng(0));
        assert_eq!(outcome.winners.len(), 2);
        assert!(outcome.discarded.is_empty());
        assert!(outcome.remaining.is_empty());
    }

    #[test]
    fn over_capacity_admits_exactly_remaining() {
        let apps = [
            app("r1", "s1", "slot-a", 1),
            app("r2", "s2", "slot-a", 1),
            app("r3", "s3", "slot-a", 1),
        ];
        let outcome = resolve(&apps, &caps(&[("slot-a", 1, 0)]), &HashSet::new(), &mut rng(0));
        assert_eq!(outcome.winners.len(), 1);
        assert_eq!(outcome.remaining.len(), 2);
    }

    #[test]
    fn confirmed_count_reduces_remaining_capacity() {
        let apps = [app("r1", "s1", "slot-a", 1), app("r2", "s2", "slot-a", 1)];
        let outcome = resolve(&apps, &caps(&[("slot-a", 3, 2)]), &HashSet::new(), &mut rng(0));
        assert_eq!(outcome.winners.len(), 1);
    }

    #[test]
    fn capacity_carries_across_rounds() {
        // Priority-1 winner consumes the single seat; the priority-2
        // applicant for the same slot loses.
        let apps = [app("r1", "s1", "slot-a", 1), app("r2", "s2", "slot-a", 2)];
        let outcome = resolve(&apps, &caps(&[("slot-a", 1, 0)]), &HashSet::new(), &mut rng(0));
        assert_eq!(outcome.winners.len(), 1);
        assert_eq!(outcome.winners[0].student_id, "s1");
        assert_eq!(outcome.remaining, vec!["r2".to_string()]);
    }

    #[test]
    fn winner_cannot_win_again_in_later_round() {
        let apps = [app("r1", "s1", "slot-a", 1), app("r2", "s1", "slot-b", 2)];
        let capacities = caps(&[("slot-a", 1, 0), ("slot-b", 1, 0)]);
        let outcome = resolve(&apps, &capacities, &HashSet::new(), &mut rng(0));
        assert_eq!(outcome.winners.len(), 1);
        assert_eq!(outcome.winners[0].reservation_id, "r1");
        // The losing alternate application of the winner is pruned.
        assert_eq!(outcome.discarded, vec!["r2".to_string()]);
    }

    #[test]
    fn previously_confirmed_student_is_excluded_and_pruned() {
        let apps = [app("r1", "s1", "slot-a", 1), app("r2", "s2", "slot-a", 1)];
        let already: HashSet<String> = ["s1".to_string()].into();
        let outcome = resolve(&apps, &caps(&[("slot-a", 5, 0)]), &already, &mut rng(0));
        assert_eq!(outcome.winners.len(), 1);
        assert_eq!(outcome.winners[0].student_id, "s2");
        assert_eq!(outcome.discarded, vec!["r1".to_string()]);
    }

    #[test]
    fn no_student_holds_more_than_one_win() {
        let apps: Vec<Application> = (0..6)
            .flat_map(|i| {
                let student = format!("s{i}");
                vec![
                    app(&format!("r{i}a"), &student, "slot-a", 1),
                    app(&format!("r{i}b"), &student, "slot-b", 2),
                    app(&format!("r{i}c"), &student, "slot-c", 3),
                ]
            })
            .collect();
        let capacities = caps(&[("slot-a", 2, 0), ("slot-b", 2, 0), ("slot-c", 2, 0)]);
        let outcome = resolve(&apps, &capacities, &HashSet::new(), &mut rng(7));

        let mut seen = HashSet::new();
        for w in &outcome.winners {
            assert!(seen.insert(w.student_id.clone()), "student won twice");
        }
    }

    #[test]
    fn no_slot_exceeds_capacity() {
        let apps: Vec<Application> = (0..10)
            .map(|i| app(&format!("r{i}"), &format!("s{i}"), "slot-a", 1))
            .collect();
        let outcome = resolve(&apps, &caps(&[("slot-a", 4, 1)]), &HashSet::new(), &mut rng(3));
        assert_eq!(outcome.winners.len(), 3);
    }

    #[test]
    fn slot_without_capacity_entry_admits_nobody() {
        let apps = [app("r1", "s1", "slot-x", 1)];
        let outcome = resolve(&apps, &SlotCapacities::default(), &HashSet::new(), &mut rng(0));
        assert!(outcome.winners.is_empty());
        assert_eq!(outcome.remaining, vec!["r1".to_string()]);
    }

    #[test]
    fn resolution_is_deterministic_for_a_fixed_seed() {
        let apps: Vec<Application> = (0..8)
            .map(|i| app(&format!("r{i}"), &format!("s{i}"), "slot-a", 1))
            .collect();
        let capacities = caps(&[("slot-a", 3, 0)]);
        let a = resolve(&apps, &capacities, &HashSet::new(), &mut rng(42));
        let b = resolve(&apps, &capacities, &HashSet::new(), &mut rng(42));
        assert_eq!(a.winners, b.winners);
        assert_eq!(a.remaining, b.remaining);
    }

    #[test]
    fn tie_break_is_roughly_uniform() {
        // 3 applicants, capacity 1: over 1000 seeded runs each should win
        // about a third of the time. Statistical bound, not exact equality.
        let apps = [
            app("r1", "s1", "slot-a", 1),
            app("r2", "s2", "slot-a", 1),
            app("r3", "s3", "slot-a", 1),
        ];
        let capacities = caps(&[("slot-a", 1, 0)]);
        let mut wins: HashMap<String, u32> = HashMap::new();
        for seed in 0..1000 {
            let outcome = resolve(&apps, &capacities, &HashSet::new(), &mut rng(seed));
            assert_eq!(outcome.winners.len(), 1);
            *wins.entry(outcome.winners[0].student_id.clone()).or_default() += 1;
        }
        for student in ["s1", "s2", "s3"] {
            let count = wins.get(student).copied().unwrap_or(0);
            assert!(
                (233..=433).contains(&count),
                "win count for {student} out of range: {count}"
            );
        }
    }
}
