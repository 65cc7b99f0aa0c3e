use rust_decimal::Decimal;

use crate::model::*;

use super::{fees, Engine, EngineError};

/// Collection sizes, for startup logging and gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetCounts {
    pub customers: usize,
    pub vehicles: usize,
    pub rentals: usize,
    pub reservations: usize,
}

impl Engine {
    // ── Finders ──────────────────────────────────────────────

    pub async fn find_customer(&self, id: Id) -> Option<Customer> {
        self.state.read().await.customer(id).cloned()
    }

    pub async fn find_vehicle(&self, id: Id) -> Option<Vehicle> {
        self.state.read().await.vehicle(id).cloned()
    }

    pub async fn find_rental(&self, id: Id) -> Option<RentalTransaction> {
        self.state.read().await.rental(id).cloned()
    }

    pub async fn find_reservation(&self, id: Id) -> Option<Reservation> {
        self.state.read().await.reservation(id).cloned()
    }

    /// The one rental with status Rented or Overdue on this vehicle, if any.
    pub async fn find_active_rental(&self, vehicle_id: Id) -> Option<RentalTransaction> {
        self.state
            .read()
            .await
            .active_rental_for_vehicle(vehicle_id)
            .cloned()
    }

    pub async fn check_reservation_status(&self, id: Id) -> Option<ReservationStatus> {
        self.state.read().await.reservation(id).map(|r| r.status)
    }

    // ── Listings ─────────────────────────────────────────────

    pub async fn list_customers(&self) -> Vec<Customer> {
        self.state.read().await.customers.clone()
    }

    pub async fn list_vehicles(&self) -> Vec<Vehicle> {
        self.state.read().await.vehicles.clone()
    }

    pub async fn list_rentals(&self) -> Vec<RentalTransaction> {
        self.state.read().await.rentals.clone()
    }

    pub async fn list_reservations(&self) -> Vec<Reservation> {
        self.state.read().await.reservations.clone()
    }

    pub async fn counts(&self) -> FleetCounts {
        let state = self.state.read().await;
        FleetCounts {
            customers: state.customers.len(),
            vehicles: state.vehicles.len(),
            rentals: state.rentals.len(),
            reservations: state.reservations.len(),
        }
    }

    // ── Search ───────────────────────────────────────────────

    /// Case-insensitive substring match on each provided filter field; an
    /// omitted field matches everything. Store iteration order preserved.
    pub async fn search_vehicles(&self, filter: &VehicleFilter) -> Vec<Vehicle> {
        let needle =
            |field: &Option<String>| field.as_deref().unwrap_or_default().to_lowercase();
        let vehicle_type = needle(&filter.vehicle_type);
        let make = needle(&filter.make);
        let model = needle(&filter.model);
        let location = needle(&filter.location);

        self.state
            .read()
            .await
            .vehicles
            .iter()
            .filter(|v| {
                v.vehicle_type.to_lowercase().contains(&vehicle_type)
                    && v.make.to_lowercase().contains(&make)
                    && v.model.to_lowercase().contains(&model)
                    && v.location.to_lowercase().contains(&location)
            })
            .cloned()
            .collect()
    }

    // ── Fees ─────────────────────────────────────────────────

    /// Fee for the rental as it stands: billable days times the vehicle's
    /// current daily rate, plus the overdue surcharge when overdue.
    pub async fn calculate_fee(&self, rental_id: Id) -> Result<Decimal, EngineError> {
        let state = self.state.read().await;
        let rental = state
            .rental(rental_id)
            .ok_or(EngineError::RentalNotFound(rental_id))?;
        let daily_rate = state
            .vehicle(rental.vehicle_id)
            .map(|v| v.daily_rate)
            .ok_or(EngineError::VehicleNotFound(rental.vehicle_id))?;
        Ok(fees::rental_fee(rental, daily_rate))
    }
}
