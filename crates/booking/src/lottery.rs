//! The lottery run: snapshot, resolve, commit atomically, notify.
//!
//! An administrator-invoked batch job. It assumes no concurrent booking
//! activity against the affected slots; a simple in-process run-lock flag
//! guards against double invocation, and the final commit is one atomic
//! batch so a failed run applies nothing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use practicum_core::lottery::{self, Application, SlotCapacities};
use practicum_core::reservation::ReservationStatus;
use practicum_core::{cache, DomainError};
use practicum_db::models::collections::{RESERVATIONS, SLOTS};
use practicum_db::models::reservation::Reservation;
use practicum_db::models::slot::Slot;
use practicum_db::repositories::{ReservationRepo, SlotRepo, StudentRepo};
use practicum_db::store::WriteBatch;
use practicum_db::Stored;
use rand::Rng;

use crate::context::AppContext;
use crate::error::{OpError, OpResult};
use crate::notify::NotificationRequest;

/// Counts reported for a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Applications confirmed.
    pub winners: usize,
    /// Applications deleted because their student won something.
    pub discarded: usize,
    /// Applications left pending for a future run.
    pub remaining: usize,
}

/// Provides the lottery batch resolution.
#[derive(Default)]
pub struct LotteryService {
    running: AtomicBool,
}

impl LotteryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the lottery with the production random source.
    pub async fn run(&self, ctx: &AppContext) -> OpResult<RunSummary> {
        self.run_with_rng(ctx, &mut rand::rng()).await
    }

    /// Run the lottery with an injected random source (seeded in tests).
    pub async fn run_with_rng<R: Rng + ?Sized>(
        &self,
        ctx: &AppContext,
        rng: &mut R,
    ) -> OpResult<RunSummary> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(OpError::Domain(DomainError::Conflict(
                "A lottery run is already in progress".to_string(),
            )));
        }
        let result = Self::resolve_and_commit(ctx, rng).await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn resolve_and_commit<R: Rng + ?Sized>(
        ctx: &AppContext,
        rng: &mut R,
    ) -> OpResult<RunSummary> {
        let store = ctx.store.as_ref();
        let reservations = ReservationRepo::list_all(store).await?;
        let slots = SlotRepo::list_all(store).await?;

        let mut applications = Vec::new();
        for r in &reservations {
            if r.data.status != ReservationStatus::Applied {
                continue;
            }
            match r.data.priority {
                Some(priority) => applications.push(Application {
                    reservation_id: r.id.clone(),
                    student_id: r.data.student_id.clone(),
                    slot_id: r.data.slot_id.clone(),
                    priority,
                }),
                None => {
                    tracing::warn!(reservation_id = %r.id, "Applied reservation without priority, skipping");
                }
            }
        }

        let mut capacities = SlotCapacities::default();
        for s in &slots {
            capacities
                .max_capacity
                .insert(s.id.clone(), s.data.max_capacity);
        }
        let mut already_confirmed: HashSet<String> = HashSet::new();
        for r in &reservations {
            if r.data.status == ReservationStatus::Confirmed {
                *capacities
                    .confirmed_count
                    .entry(r.data.slot_id.clone())
                    .or_default() += 1;
                already_confirmed.insert(r.data.student_id.clone());
            }
        }

        let outcome = lottery::resolve(&applications, &capacities, &already_confirmed, rng);

        // One atomic batch: confirmations, deletions, and the cache updates
        // of every touched slot. Nothing partially applied.
        let by_id: HashMap<&str, &Stored<Reservation>> = reservations
            .iter()
            .map(|r| (r.id.as_str(), r))
            .collect();
        let mut slot_map: HashMap<String, Slot> = slots
            .iter()
            .map(|s| (s.id.clone(), s.data.clone()))
            .collect();
        let mut touched_slots: HashSet<String> = HashSet::new();
        let mut batch = WriteBatch::new();
        let mut confirmed: Vec<(String, Reservation)> = Vec::new();

        for winner in &outcome.winners {
            let stored = by_id.get(winner.reservation_id.as_str()).ok_or_else(|| {
                OpError::not_found("reservation", &winner.reservation_id)
            })?;
            let mut reservation = stored.data.clone();
            reservation.status = ReservationStatus::Confirmed;
            reservation.is_first_day = true;
            batch.set(RESERVATIONS, &winner.reservation_id, &reservation)?;

            if let Some(slot) = slot_map.get_mut(&winner.slot_id) {
                cache::upsert_entry(
                    &mut slot.availability_cache,
                    reservation.cache_entry(&winner.reservation_id),
                );
                touched_slots.insert(winner.slot_id.clone());
            }
            confirmed.push((winner.reservation_id.clone(), reservation));
        }

        for reservation_id in &outcome.discarded {
            batch.delete(RESERVATIONS, reservation_id);
            if let Some(stored) = by_id.get(reservation_id.as_str()) {
                if let Some(slot) = slot_map.get_mut(&stored.data.slot_id) {
                    if cache::remove_entry(&mut slot.availability_cache, reservation_id) {
                        touched_slots.insert(stored.data.slot_id.clone());
                    }
                }
            }
        }

        for slot_id in &touched_slots {
            if let Some(slot) = slot_map.get(slot_id) {
                batch.set(SLOTS, slot_id, slot)?;
            }
        }

        store.apply_batch(batch).await?;

        let summary = RunSummary {
            winners: outcome.winners.len(),
            discarded: outcome.discarded.len(),
            remaining: outcome.remaining.len(),
        };
        tracing::info!(
            winners = summary.winners,
            discarded = summary.discarded,
            remaining = summary.remaining,
            "Lottery run committed"
        );

        // Fire-and-forget: a failed notification never unwinds the
        // committed allocation.
        for (reservation_id, reservation) in &confirmed {
            Self::notify_winner(ctx, reservation_id, reservation).await;
        }

        Ok(summary)
    }

    async fn notify_winner(ctx: &AppContext, reservation_id: &str, reservation: &Reservation) {
        let student = match StudentRepo::find_by_id(ctx.store.as_ref(), &reservation.student_id)
            .await
        {
            Ok(Some(student)) => student,
            Ok(None) => {
                tracing::warn!(reservation_id, "Winner's student record missing, not notifying");
                return;
            }
            Err(error) => {
                tracing::warn!(reservation_id, %error, "Could not load winner for notification");
                return;
            }
        };

        let request = NotificationRequest {
            to: student.data.email.clone(),
            subject: "Practicum reservation confirmed".to_string(),
            body: format!(
                "Your application was confirmed: {} {}-{} (training {}).",
                reservation.slot_date,
                reservation.custom_start_time,
                reservation.custom_end_time,
                reservation.slot_training_type,
            ),
        };
        if let Err(error) = ctx.notifier.dispatch(request).await {
            tracing::warn!(reservation_id, %error, "Winner notification failed");
        }
    }
}
