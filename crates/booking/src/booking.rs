//! Reservation operations: direct booking, lottery application,
//! cancellation, approval, completion, attendance, and deletion.
//!
//! Every operation that changes active-interval membership writes the
//! reservation and its slot's availability cache inside one transaction;
//! a conflicting concurrent writer fails the commit rather than leaving
//! the cache and the reservation store disagreeing.

use practicum_core::reservation::{
    check_cancellation_window, derive_actual_minutes, is_bookable, validate_transition,
    CancelledBy, ReservationStatus,
};
use practicum_core::{cache, capacity, time, DomainError};
use practicum_db::models::collections::{RESERVATIONS, SLOTS};
use practicum_db::models::reservation::Reservation;
use practicum_db::models::slot::Slot;
use practicum_db::repositories::{ReservationRepo, StudentRepo};
use practicum_db::store::{txn_set, StoreTransaction};
use practicum_db::Stored;

use crate::context::AppContext;
use crate::error::{OpError, OpResult};

/// A direct-mode booking or lottery application payload.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub student_id: String,
    pub slot_id: String,
    /// Requested sub-interval, `HH:MM`, subject to quantization.
    pub start_time: String,
    pub end_time: String,
}

/// Read a slot inside a transaction, failing with `RecordNotFound` when it
/// vanished between read and write.
pub(crate) async fn get_slot_txn(
    txn: &mut dyn StoreTransaction,
    slot_id: &str,
) -> OpResult<Slot> {
    let doc = txn
        .get(SLOTS, slot_id)
        .await?
        .ok_or_else(|| OpError::not_found("slot", slot_id))?;
    Ok(doc.decode::<Slot>()?.data)
}

pub(crate) async fn get_reservation_txn(
    txn: &mut dyn StoreTransaction,
    reservation_id: &str,
) -> OpResult<Reservation> {
    let doc = txn
        .get(RESERVATIONS, reservation_id)
        .await?
        .ok_or_else(|| OpError::not_found("reservation", reservation_id))?;
    Ok(doc.decode::<Reservation>()?.data)
}

/// Patch (or, as inconsistency recovery, insert) a reservation's cache
/// entry on its slot, logging when the expected entry was missing.
fn patch_cache_entry(slot: &mut Slot, reservation: &Reservation, reservation_id: &str) {
    let outcome = cache::upsert_entry(
        &mut slot.availability_cache,
        reservation.cache_entry(reservation_id),
    );
    if outcome == cache::UpsertOutcome::Inserted {
        let recovered = DomainError::InconsistentCacheState {
            reservation_id: reservation_id.to_string(),
        };
        tracing::warn!(error = %recovered, "Recovered by inserting the missing cache entry");
    }
}

/// Validate that the requested interval obeys the quantization policy
/// within the slot's bounds.
fn check_quantization(slot: &Slot, start: u16, end: u16) -> Result<(), DomainError> {
    let (slot_start, slot_end) = slot.bounds_minutes()?;
    if !time::valid_start_minutes(slot_start, slot_end).contains(&start) {
        return Err(DomainError::Validation(format!(
            "'{}' is not a valid start time for this slot",
            time::format_minutes(start)
        )));
    }
    if !time::valid_end_minutes(start, slot_end).contains(&end) {
        return Err(DomainError::Validation(format!(
            "'{}' is not a valid end time for a booking starting at '{}'",
            time::format_minutes(end),
            time::format_minutes(start)
        )));
    }
    Ok(())
}

/// Provides the reservation lifecycle operations.
pub struct BookingService;

impl BookingService {
    /// Direct-mode booking: capacity-checked, created straight into
    /// `confirmed`.
    ///
    /// The capacity decision is made against the slot's availability cache
    /// *inside* the transaction that also writes the new reservation, so
    /// two racing bookings of the same slot serialize on the slot document
    /// rather than both passing a stale check.
    pub async fn book_direct(
        ctx: &AppContext,
        request: &BookingRequest,
    ) -> OpResult<Stored<Reservation>> {
        Self::create_reservation(ctx, request, ReservationStatus::Confirmed, None).await
    }

    /// Lottery-mode application: created as `applied`, bypassing the
    /// capacity check entirely — resolution enforces capacity later.
    pub async fn apply_for_lottery(
        ctx: &AppContext,
        request: &BookingRequest,
        priority: u8,
    ) -> OpResult<Stored<Reservation>> {
        if !(practicum_core::lottery::PRIORITY_MIN..=practicum_core::lottery::PRIORITY_MAX)
            .contains(&priority)
        {
            return Err(DomainError::Validation(format!(
                "Priority must be between 1 and 3, got {priority}"
            ))
            .into());
        }
        if ReservationRepo::has_application_at_priority(
            ctx.store.as_ref(),
            &request.student_id,
            priority,
        )
        .await?
        {
            return Err(DomainError::PriorityAlreadyTaken { priority }.into());
        }
        Self::create_reservation(ctx, request, ReservationStatus::Applied, Some(priority)).await
    }

    async fn create_reservation(
        ctx: &AppContext,
        request: &BookingRequest,
        status: ReservationStatus,
        priority: Option<u8>,
    ) -> OpResult<Stored<Reservation>> {
        let store = ctx.store.as_ref();

        StudentRepo::find_by_id(store, &request.student_id)
            .await?
            .ok_or_else(|| OpError::not_found("student", &request.student_id))?;

        if ReservationRepo::find_active_for_student_slot(
            store,
            &request.student_id,
            &request.slot_id,
        )
        .await?
        .is_some()
        {
            return Err(DomainError::Conflict(
                "Student already holds a reservation for this slot".to_string(),
            )
            .into());
        }

        let start = time::parse_minutes(&request.start_time)?;
        let end = time::parse_minutes(&request.end_time)?;

        let mut txn = store.begin().await?;
        let mut slot = get_slot_txn(txn.as_mut(), &request.slot_id).await?;
        if !slot.is_active {
            return Err(DomainError::Validation("Slot is not active".to_string()).into());
        }
        check_quantization(&slot, start, end)?;

        let reservation = Reservation::new(
            &request.student_id,
            &request.slot_id,
            &slot,
            &request.start_time,
            &request.end_time,
            status,
            priority,
        );

        if !is_bookable(
            ctx.clock.now(),
            reservation.start_datetime()?,
            ctx.config.booking_lead_hours,
        ) {
            return Err(DomainError::Validation(
                "Slot can no longer be booked this close to its start".to_string(),
            )
            .into());
        }

        if status == ReservationStatus::Confirmed {
            // Live capacity only: completed and cancelled entries do not
            // contend with new bookings.
            let existing: Vec<capacity::Interval> = slot
                .availability_cache
                .iter()
                .filter(|e| e.status.counts_for_capacity())
                .map(|e| {
                    Ok(capacity::Interval::new(
                        time::parse_minutes(&e.start)?,
                        time::parse_minutes(&e.end)?,
                    ))
                })
                .collect::<Result<_, DomainError>>()?;
            capacity::check_capacity(
                &existing,
                capacity::Interval::new(start, end),
                slot.max_capacity,
            )?;
        }

        let reservation_id = ReservationRepo::new_id();
        txn_set(txn.as_mut(), RESERVATIONS, &reservation_id, &reservation)?;
        cache::upsert_entry(
            &mut slot.availability_cache,
            reservation.cache_entry(&reservation_id),
        );
        txn_set(txn.as_mut(), SLOTS, &request.slot_id, &slot)?;
        txn.commit().await?;

        tracing::info!(
            %reservation_id,
            student_id = %request.student_id,
            slot_id = %request.slot_id,
            %status,
            "Reservation created"
        );
        Ok(Stored {
            id: reservation_id,
            version: 0,
            data: reservation,
        })
    }

    /// Cancel a reservation.
    ///
    /// Students are held to the cancellation cutoff computed against the
    /// reservation's own start; administrators are not. The cache entry is
    /// removed in the same transaction.
    pub async fn cancel(
        ctx: &AppContext,
        reservation_id: &str,
        actor: CancelledBy,
    ) -> OpResult<()> {
        let mut txn = ctx.store.begin().await?;
        let mut reservation = get_reservation_txn(txn.as_mut(), reservation_id).await?;
        validate_transition(reservation.status, ReservationStatus::Cancelled)?;

        let now = ctx.clock.now();
        if actor == CancelledBy::Student {
            check_cancellation_window(
                now,
                reservation.start_datetime()?,
                ctx.config.cancellation_cutoff_hours,
            )?;
        }

        reservation.status = ReservationStatus::Cancelled;
        reservation.cancelled_at = Some(now);
        reservation.cancelled_by = Some(actor);
        txn_set(txn.as_mut(), RESERVATIONS, reservation_id, &reservation)?;

        let mut slot = get_slot_txn(txn.as_mut(), &reservation.slot_id).await?;
        if !cache::remove_entry(&mut slot.availability_cache, reservation_id) {
            tracing::warn!(reservation_id, "Cache entry already absent on cancellation");
        }
        txn_set(txn.as_mut(), SLOTS, &reservation.slot_id, &slot)?;
        txn.commit().await?;

        tracing::info!(reservation_id, ?actor, "Reservation cancelled");
        Ok(())
    }

    /// Admin approval of a pending application: `applied` -> `confirmed`,
    /// cache entry patched (or re-inserted) in the same transaction.
    pub async fn approve(ctx: &AppContext, reservation_id: &str) -> OpResult<()> {
        let mut txn = ctx.store.begin().await?;
        let mut reservation = get_reservation_txn(txn.as_mut(), reservation_id).await?;
        validate_transition(reservation.status, ReservationStatus::Confirmed)?;

        reservation.status = ReservationStatus::Confirmed;
        txn_set(txn.as_mut(), RESERVATIONS, reservation_id, &reservation)?;

        let mut slot = get_slot_txn(txn.as_mut(), &reservation.slot_id).await?;
        patch_cache_entry(&mut slot, &reservation, reservation_id);
        txn_set(txn.as_mut(), SLOTS, &reservation.slot_id, &slot)?;
        txn.commit().await?;

        tracing::info!(reservation_id, "Application approved");
        Ok(())
    }

    /// Record kiosk attendance times on a confirmed reservation. No cache
    /// mutation: attendance does not change interval membership.
    pub async fn record_attendance(
        ctx: &AppContext,
        reservation_id: &str,
        check_in_time: Option<String>,
        check_out_time: Option<String>,
    ) -> OpResult<()> {
        for value in check_in_time.iter().chain(check_out_time.iter()) {
            time::parse_minutes(value)?;
        }

        let mut txn = ctx.store.begin().await?;
        let mut reservation = get_reservation_txn(txn.as_mut(), reservation_id).await?;
        if reservation.status != ReservationStatus::Confirmed {
            return Err(DomainError::Conflict(format!(
                "Attendance can only be recorded on a confirmed reservation, not {}",
                reservation.status
            ))
            .into());
        }
        if check_in_time.is_some() {
            reservation.check_in_time = check_in_time;
        }
        if check_out_time.is_some() {
            reservation.check_out_time = check_out_time;
        }
        txn_set(txn.as_mut(), RESERVATIONS, reservation_id, &reservation)?;
        txn.commit().await?;
        Ok(())
    }

    /// Admin approval of attendance: `confirmed` -> `completed` with
    /// credited minutes. Precedence for the minutes: the explicit override,
    /// else the recorded check-in/check-out pair, else the nominal booked
    /// interval. The cache entry's status label is refreshed.
    pub async fn complete(
        ctx: &AppContext,
        reservation_id: &str,
        explicit_minutes: Option<u16>,
    ) -> OpResult<()> {
        let mut txn = ctx.store.begin().await?;
        let mut reservation = get_reservation_txn(txn.as_mut(), reservation_id).await?;
        validate_transition(reservation.status, ReservationStatus::Completed)?;

        let interval = reservation.interval()?;
        let check_in = reservation
            .check_in_time
            .as_deref()
            .map(time::parse_minutes)
            .transpose()?;
        let check_out = reservation
            .check_out_time
            .as_deref()
            .map(time::parse_minutes)
            .transpose()?;
        reservation.actual_minutes = Some(derive_actual_minutes(
            explicit_minutes,
            check_in,
            check_out,
            interval.start,
            interval.end,
        ));
        reservation.status = ReservationStatus::Completed;
        txn_set(txn.as_mut(), RESERVATIONS, reservation_id, &reservation)?;

        let mut slot = get_slot_txn(txn.as_mut(), &reservation.slot_id).await?;
        patch_cache_entry(&mut slot, &reservation, reservation_id);
        txn_set(txn.as_mut(), SLOTS, &reservation.slot_id, &slot)?;
        txn.commit().await?;

        tracing::info!(
            reservation_id,
            actual_minutes = ?reservation.actual_minutes,
            "Reservation completed"
        );
        Ok(())
    }

    /// Correct the credited minutes on an already-completed reservation.
    pub async fn correct_actual_minutes(
        ctx: &AppContext,
        reservation_id: &str,
        actual_minutes: u16,
    ) -> OpResult<()> {
        let mut txn = ctx.store.begin().await?;
        let mut reservation = get_reservation_txn(txn.as_mut(), reservation_id).await?;
        if reservation.status != ReservationStatus::Completed {
            return Err(DomainError::Conflict(
                "Only completed reservations accept a minutes correction".to_string(),
            )
            .into());
        }
        reservation.actual_minutes = Some(actual_minutes);
        txn_set(txn.as_mut(), RESERVATIONS, reservation_id, &reservation)?;
        txn.commit().await?;
        Ok(())
    }

    /// Administrative removal of a reservation record (as opposed to
    /// cancellation). Strips the cache entry in the same transaction.
    pub async fn delete(ctx: &AppContext, reservation_id: &str) -> OpResult<()> {
        let mut txn = ctx.store.begin().await?;
        let reservation = get_reservation_txn(txn.as_mut(), reservation_id).await?;
        txn.delete(RESERVATIONS, reservation_id);

        match txn.get(SLOTS, &reservation.slot_id).await? {
            Some(doc) => {
                let mut slot = doc.decode::<Slot>()?.data;
                if !cache::remove_entry(&mut slot.availability_cache, reservation_id) {
                    tracing::warn!(reservation_id, "Cache entry already absent on deletion");
                }
                txn_set(txn.as_mut(), SLOTS, &reservation.slot_id, &slot)?;
            }
            None => {
                tracing::warn!(
                    reservation_id,
                    slot_id = %reservation.slot_id,
                    "Deleting reservation whose slot no longer exists"
                );
            }
        }
        txn.commit().await?;

        tracing::info!(reservation_id, "Reservation deleted");
        Ok(())
    }
}
