use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::limits::*;
use crate::model::*;
use crate::observability::observe;

use super::{availability, fees, Engine, EngineError};

/// Reject any over-long text field up front so no snapshot grows unbounded.
fn check_len(fields: &[&str]) -> Result<(), EngineError> {
    if fields.iter().any(|f| f.len() > MAX_TEXT_FIELD_LEN) {
        return Err(EngineError::LimitExceeded("text field too long"));
    }
    Ok(())
}

impl Engine {
    // ── Customers ────────────────────────────────────────────

    pub async fn register_customer(&self, new: NewCustomer) -> Result<Id, EngineError> {
        observe("register_customer", self.register_customer_inner(new).await)
    }

    async fn register_customer_inner(&self, new: NewCustomer) -> Result<Id, EngineError> {
        if new.full_name.trim().is_empty() {
            return Err(EngineError::InvalidInput("customer name is required"));
        }
        if new.email.trim().is_empty() {
            return Err(EngineError::InvalidInput("customer email is required"));
        }
        check_len(&[
            &new.full_name,
            &new.email,
            &new.phone_number,
            &new.address,
            &new.customer_type,
        ])?;

        let mut state = self.state.write().await;
        if state.customers.len() >= MAX_RECORDS_PER_KIND {
            return Err(EngineError::LimitExceeded("too many customers"));
        }

        let id = state.allocate_customer_id(new.id);
        if let Some(requested) = new.id
            && requested != id {
                debug!(requested, assigned = id, "customer id taken, reassigned");
            }

        state.customers.push(Customer {
            id,
            full_name: new.full_name,
            email: new.email,
            phone_number: new.phone_number,
            address: new.address,
            customer_type: new.customer_type,
            registration_date: new.registration_date,
            active: true,
        });
        self.persist_customers(&state)?;
        self.notify
            .send(Topic::Customers, &ChangeEvent::CustomerRegistered { id });
        Ok(id)
    }

    pub async fn update_customer(&self, update: CustomerUpdate) -> Result<(), EngineError> {
        observe("update_customer", self.update_customer_inner(update).await)
    }

    async fn update_customer_inner(&self, update: CustomerUpdate) -> Result<(), EngineError> {
        if update.full_name.trim().is_empty() {
            return Err(EngineError::InvalidInput("customer name is required"));
        }
        check_len(&[
            &update.full_name,
            &update.email,
            &update.phone_number,
            &update.address,
            &update.customer_type,
        ])?;

        let mut state = self.state.write().await;
        let customer = state
            .customer_mut(update.id)
            .ok_or(EngineError::CustomerNotFound(update.id))?;
        customer.full_name = update.full_name;
        customer.email = update.email;
        customer.phone_number = update.phone_number;
        customer.address = update.address;
        customer.customer_type = update.customer_type;

        self.persist_customers(&state)?;
        self.notify
            .send(Topic::Customers, &ChangeEvent::CustomerUpdated { id: update.id });
        Ok(())
    }

    /// One-way: an inactive customer stays inactive. Deactivating twice is
    /// a no-op that still succeeds.
    pub async fn deactivate_customer(&self, id: Id) -> Result<(), EngineError> {
        observe("deactivate_customer", self.deactivate_customer_inner(id).await)
    }

    async fn deactivate_customer_inner(&self, id: Id) -> Result<(), EngineError> {
        let mut state = self.state.write().await;
        let customer = state
            .customer_mut(id)
            .ok_or(EngineError::CustomerNotFound(id))?;
        customer.active = false;

        self.persist_customers(&state)?;
        self.notify
            .send(Topic::Customers, &ChangeEvent::CustomerDeactivated { id });
        Ok(())
    }

    // ── Vehicles ─────────────────────────────────────────────

    pub async fn add_vehicle(&self, new: NewVehicle) -> Result<Id, EngineError> {
        observe("add_vehicle", self.add_vehicle_inner(new).await)
    }

    async fn add_vehicle_inner(&self, new: NewVehicle) -> Result<Id, EngineError> {
        if new.make.trim().is_empty() || new.model.trim().is_empty() {
            return Err(EngineError::InvalidInput("vehicle make and model are required"));
        }
        if new.registration_number.trim().is_empty() {
            return Err(EngineError::InvalidInput("registration number is required"));
        }
        if new.daily_rate.is_sign_negative() {
            return Err(EngineError::InvalidInput("daily rate must not be negative"));
        }
        check_len(&[
            &new.make,
            &new.model,
            &new.registration_number,
            &new.vehicle_type,
            &new.location,
        ])?;

        let mut state = self.state.write().await;
        if state.vehicles.len() >= MAX_RECORDS_PER_KIND {
            return Err(EngineError::LimitExceeded("too many vehicles"));
        }

        let id = state.allocate_vehicle_id(new.id);
        if let Some(requested) = new.id
            && requested != id {
                debug!(requested, assigned = id, "vehicle id taken, reassigned");
            }

        state.vehicles.push(Vehicle {
            id,
            make: new.make,
            model: new.model,
            year: new.year,
            registration_number: new.registration_number,
            vehicle_type: new.vehicle_type,
            daily_rate: new.daily_rate,
            mileage: new.mileage,
            location: new.location,
            availability: true,
            status: VehicleStatus::Available,
        });
        self.persist_vehicles(&state)?;
        self.notify
            .send(Topic::Vehicles, &ChangeEvent::VehicleAdded { id });
        Ok(id)
    }

    pub async fn update_vehicle(&self, update: VehicleUpdate) -> Result<(), EngineError> {
        observe("update_vehicle", self.update_vehicle_inner(update).await)
    }

    async fn update_vehicle_inner(&self, update: VehicleUpdate) -> Result<(), EngineError> {
        if update.make.trim().is_empty() || update.model.trim().is_empty() {
            return Err(EngineError::InvalidInput("vehicle make and model are required"));
        }
        if update.daily_rate.is_sign_negative() {
            return Err(EngineError::InvalidInput("daily rate must not be negative"));
        }
        check_len(&[
            &update.make,
            &update.model,
            &update.registration_number,
            &update.vehicle_type,
            &update.location,
        ])?;

        let mut state = self.state.write().await;
        let vehicle = state
            .vehicle_mut(update.id)
            .ok_or(EngineError::VehicleNotFound(update.id))?;
        vehicle.make = update.make;
        vehicle.model = update.model;
        vehicle.year = update.year;
        vehicle.registration_number = update.registration_number;
        vehicle.vehicle_type = update.vehicle_type;
        vehicle.daily_rate = update.daily_rate;
        vehicle.mileage = update.mileage;
        vehicle.location = update.location;
        // availability/status stay untouched: those transitions belong to
        // the booking workflow via commit/release.

        self.persist_vehicles(&state)?;
        self.notify
            .send(Topic::Vehicles, &ChangeEvent::VehicleUpdated { id: update.id });
        Ok(())
    }

    /// Remove a vehicle from the fleet. Refused while the vehicle is
    /// committed, and refused while any rental or reservation record still
    /// references it (removal would leave dangling history).
    pub async fn remove_vehicle(&self, id: Id) -> Result<(), EngineError> {
        observe("remove_vehicle", self.remove_vehicle_inner(id).await)
    }

    async fn remove_vehicle_inner(&self, id: Id) -> Result<(), EngineError> {
        let mut state = self.state.write().await;
        let vehicle = state.vehicle(id).ok_or(EngineError::VehicleNotFound(id))?;
        if !availability::is_available(vehicle) {
            return Err(EngineError::VehicleUnavailable {
                vehicle_id: id,
                status: vehicle.status,
            });
        }
        if state.vehicle_referenced(id) {
            return Err(EngineError::VehicleInUse(id));
        }

        state.vehicles.retain(|v| v.id != id);
        self.persist_vehicles(&state)?;
        self.notify
            .send(Topic::Vehicles, &ChangeEvent::VehicleRemoved { id });
        Ok(())
    }

    // ── Rentals ──────────────────────────────────────────────

    /// Open a rental. The availability check and the vehicle commit happen
    /// under one write lock with no intervening await, so a double booking
    /// cannot interleave.
    pub async fn create_rental(&self, draft: RentalDraft) -> Result<Id, EngineError> {
        observe("create_rental", self.create_rental_inner(draft).await)
    }

    async fn create_rental_inner(&self, draft: RentalDraft) -> Result<Id, EngineError> {
        if draft.return_date < draft.rental_date {
            return Err(EngineError::InvalidInput(
                "planned return precedes rental date",
            ));
        }

        let mut state = self.state.write().await;
        if state.rentals.len() >= MAX_RECORDS_PER_KIND {
            return Err(EngineError::LimitExceeded("too many rentals"));
        }
        if state.customer(draft.customer_id).is_none() {
            return Err(EngineError::CustomerNotFound(draft.customer_id));
        }

        let vehicle = state
            .vehicle_mut(draft.vehicle_id)
            .ok_or(EngineError::VehicleNotFound(draft.vehicle_id))?;
        if !availability::is_available(vehicle) {
            return Err(EngineError::VehicleUnavailable {
                vehicle_id: draft.vehicle_id,
                status: vehicle.status,
            });
        }
        let daily_rate = vehicle.daily_rate;
        availability::commit(vehicle, VehicleStatus::Rented);

        let id = state.next_rental_id();
        let mut rental = RentalTransaction {
            id,
            rental_date: draft.rental_date,
            return_date: draft.return_date,
            actual_return_date: None,
            overdue_days: 0,
            rental_fee: Decimal::ZERO,
            status: RentalStatus::Rented,
            vehicle_id: draft.vehicle_id,
            customer_id: draft.customer_id,
        };
        rental.rental_fee = fees::rental_fee(&rental, daily_rate);
        state.rentals.push(rental);

        self.persist_rentals(&state)?;
        self.persist_vehicles(&state)?;
        info!(rental = id, vehicle = draft.vehicle_id, "rental opened");
        self.notify.send(
            Topic::Rentals,
            &ChangeEvent::RentalOpened {
                id,
                vehicle_id: draft.vehicle_id,
            },
        );
        self.notify.send(
            Topic::Vehicles,
            &ChangeEvent::VehicleUpdated {
                id: draft.vehicle_id,
            },
        );
        Ok(id)
    }

    /// Close a rental with the final fee. `Returned` is terminal: a second
    /// close is rejected, never re-charged. The vehicle is released
    /// unconditionally; under the availability invariant it cannot have
    /// been reserved while rented.
    pub async fn close_rental(
        &self,
        id: Id,
        actual_return_date: DateTime<Utc>,
        fee: Decimal,
    ) -> Result<(), EngineError> {
        observe(
            "close_rental",
            self.close_rental_inner(id, actual_return_date, fee).await,
        )
    }

    async fn close_rental_inner(
        &self,
        id: Id,
        actual_return_date: DateTime<Utc>,
        fee: Decimal,
    ) -> Result<(), EngineError> {
        if fee.is_sign_negative() {
            return Err(EngineError::InvalidInput("fee must not be negative"));
        }

        let mut state = self.state.write().await;
        let rental = state.rental_mut(id).ok_or(EngineError::RentalNotFound(id))?;
        if rental.status == RentalStatus::Returned {
            return Err(EngineError::RentalClosed(id));
        }
        rental.actual_return_date = Some(actual_return_date);
        rental.rental_fee = fee;
        rental.status = RentalStatus::Returned;
        let vehicle_id = rental.vehicle_id;

        if let Some(vehicle) = state.vehicle_mut(vehicle_id) {
            availability::release(vehicle);
        } else {
            warn!(rental = id, vehicle = vehicle_id, "closed rental has no vehicle record");
        }

        self.persist_rentals(&state)?;
        self.persist_vehicles(&state)?;
        info!(rental = id, vehicle = vehicle_id, "rental closed");
        self.notify
            .send(Topic::Rentals, &ChangeEvent::RentalClosed { id, vehicle_id });
        self.notify
            .send(Topic::Vehicles, &ChangeEvent::VehicleUpdated { id: vehicle_id });
        Ok(())
    }

    // ── Reservations ─────────────────────────────────────────

    pub async fn create_reservation(&self, draft: ReservationDraft) -> Result<Id, EngineError> {
        observe(
            "create_reservation",
            self.create_reservation_inner(draft).await,
        )
    }

    async fn create_reservation_inner(&self, draft: ReservationDraft) -> Result<Id, EngineError> {
        let mut state = self.state.write().await;
        if state.reservations.len() >= MAX_RECORDS_PER_KIND {
            return Err(EngineError::LimitExceeded("too many reservations"));
        }
        if state.customer(draft.customer_id).is_none() {
            return Err(EngineError::CustomerNotFound(draft.customer_id));
        }

        let vehicle = state
            .vehicle_mut(draft.vehicle_id)
            .ok_or(EngineError::VehicleNotFound(draft.vehicle_id))?;
        if !availability::is_available(vehicle) {
            return Err(EngineError::VehicleUnavailable {
                vehicle_id: draft.vehicle_id,
                status: vehicle.status,
            });
        }
        availability::commit(vehicle, VehicleStatus::Reserved);

        let id = state.next_reservation_id();
        state.reservations.push(Reservation {
            id,
            vehicle_id: draft.vehicle_id,
            customer_id: draft.customer_id,
            reservation_date: draft.reservation_date,
            status: ReservationStatus::Reserved,
        });

        self.persist_reservations(&state)?;
        self.persist_vehicles(&state)?;
        info!(reservation = id, vehicle = draft.vehicle_id, "reservation placed");
        self.notify.send(
            Topic::Reservations,
            &ChangeEvent::ReservationPlaced {
                id,
                vehicle_id: draft.vehicle_id,
            },
        );
        self.notify.send(
            Topic::Vehicles,
            &ChangeEvent::VehicleUpdated {
                id: draft.vehicle_id,
            },
        );
        Ok(id)
    }

    /// Cancel a reservation. `Cancelled` is terminal: a second cancel is
    /// rejected rather than silently re-applied.
    pub async fn cancel_reservation(&self, id: Id) -> Result<(), EngineError> {
        observe("cancel_reservation", self.cancel_reservation_inner(id).await)
    }

    async fn cancel_reservation_inner(&self, id: Id) -> Result<(), EngineError> {
        let mut state = self.state.write().await;
        let reservation = state
            .reservation_mut(id)
            .ok_or(EngineError::ReservationNotFound(id))?;
        if reservation.status == ReservationStatus::Cancelled {
            return Err(EngineError::ReservationCancelled(id));
        }
        reservation.status = ReservationStatus::Cancelled;
        let vehicle_id = reservation.vehicle_id;

        if let Some(vehicle) = state.vehicle_mut(vehicle_id) {
            availability::release(vehicle);
        } else {
            warn!(reservation = id, vehicle = vehicle_id, "cancelled reservation has no vehicle record");
        }

        self.persist_reservations(&state)?;
        self.persist_vehicles(&state)?;
        info!(reservation = id, vehicle = vehicle_id, "reservation cancelled");
        self.notify.send(
            Topic::Reservations,
            &ChangeEvent::ReservationCancelled { id, vehicle_id },
        );
        self.notify
            .send(Topic::Vehicles, &ChangeEvent::VehicleUpdated { id: vehicle_id });
        Ok(())
    }

    // ── Overdue sweep ────────────────────────────────────────

    /// One pass of the overdue monitor: promote `Rented` rentals past
    /// their planned return to `Overdue` and recompute overdue days and
    /// fees (they grow monotonically until the rental closes). `Returned`
    /// rentals are never touched. A rental that cannot be evaluated is
    /// skipped without blocking the rest of the pass.
    ///
    /// Returns the number of rentals updated. Normally driven by
    /// [`crate::monitor::OverdueMonitor`]; exposed so tests and embedders
    /// can tick deterministically.
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> usize {
        let mut state = self.state.write().await;
        let mut changed: Vec<(Id, i64)> = Vec::new();

        for idx in 0..state.rentals.len() {
            let (id, status, planned, vehicle_id) = {
                let r = &state.rentals[idx];
                (r.id, r.status, r.return_date, r.vehicle_id)
            };
            if status == RentalStatus::Returned || now <= planned {
                continue;
            }

            let days = fees::days_overdue(planned, now);
            let Some(daily_rate) = state.vehicle(vehicle_id).map(|v| v.daily_rate) else {
                warn!(rental = id, vehicle = vehicle_id, "overdue sweep: vehicle record missing, skipping");
                continue;
            };

            let rental = &mut state.rentals[idx];
            if rental.status == RentalStatus::Overdue && rental.overdue_days == days {
                continue; // nothing new since the last tick
            }
            let newly_overdue = rental.status == RentalStatus::Rented;
            rental.status = RentalStatus::Overdue;
            rental.overdue_days = days;
            rental.rental_fee = fees::rental_fee(rental, daily_rate);
            if newly_overdue {
                info!(rental = id, days, "rental overdue");
            }
            changed.push((id, days));
        }

        let overdue_total = state
            .rentals
            .iter()
            .filter(|r| r.status == RentalStatus::Overdue)
            .count();
        metrics::gauge!(crate::observability::OVERDUE_RENTALS).set(overdue_total as f64);

        if changed.is_empty() {
            return 0;
        }
        if let Err(e) = self.persist_rentals(&state) {
            error!("overdue sweep: persist failed: {e}");
        }
        for (id, overdue_days) in &changed {
            self.notify.send(
                Topic::Rentals,
                &ChangeEvent::RentalOverdue {
                    id: *id,
                    overdue_days: *overdue_days,
                },
            );
        }
        changed.len()
    }
}
