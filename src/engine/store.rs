use crate::model::*;

/// The authoritative in-memory collections. Insertion order is preserved
/// and every query that returns a sequence reports it in this order.
#[derive(Debug, Default)]
pub struct FleetState {
    pub customers: Vec<Customer>,
    pub vehicles: Vec<Vehicle>,
    pub rentals: Vec<RentalTransaction>,
    pub reservations: Vec<Reservation>,
}

fn next_id(taken: impl Iterator<Item = Id>) -> Id {
    taken.max().unwrap_or(0) + 1
}

impl FleetState {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Customers ────────────────────────────────────────────

    pub fn customer(&self, id: Id) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn customer_mut(&mut self, id: Id) -> Option<&mut Customer> {
        self.customers.iter_mut().find(|c| c.id == id)
    }

    /// Honor the requested id unless it is taken (or zero); otherwise hand
    /// out the next free id.
    pub fn allocate_customer_id(&self, requested: Option<Id>) -> Id {
        match requested {
            Some(id) if id >= 1 && self.customer(id).is_none() => id,
            _ => next_id(self.customers.iter().map(|c| c.id)),
        }
    }

    // ── Vehicles ─────────────────────────────────────────────

    pub fn vehicle(&self, id: Id) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicle_mut(&mut self, id: Id) -> Option<&mut Vehicle> {
        self.vehicles.iter_mut().find(|v| v.id == id)
    }

    pub fn allocate_vehicle_id(&self, requested: Option<Id>) -> Id {
        match requested {
            Some(id) if id >= 1 && self.vehicle(id).is_none() => id,
            _ => next_id(self.vehicles.iter().map(|v| v.id)),
        }
    }

    /// True while any rental or reservation record, open or historical,
    /// still points at the vehicle. Such a vehicle must not be removed or
    /// its persisted records could no longer be written.
    pub fn vehicle_referenced(&self, id: Id) -> bool {
        self.rentals.iter().any(|r| r.vehicle_id == id)
            || self.reservations.iter().any(|r| r.vehicle_id == id)
    }

    // ── Rentals ──────────────────────────────────────────────

    pub fn rental(&self, id: Id) -> Option<&RentalTransaction> {
        self.rentals.iter().find(|r| r.id == id)
    }

    pub fn rental_mut(&mut self, id: Id) -> Option<&mut RentalTransaction> {
        self.rentals.iter_mut().find(|r| r.id == id)
    }

    pub fn next_rental_id(&self) -> Id {
        next_id(self.rentals.iter().map(|r| r.id))
    }

    /// The one rental with status Rented or Overdue on this vehicle, if any.
    pub fn active_rental_for_vehicle(&self, vehicle_id: Id) -> Option<&RentalTransaction> {
        self.rentals
            .iter()
            .find(|r| r.vehicle_id == vehicle_id && r.is_active())
    }

    // ── Reservations ─────────────────────────────────────────

    pub fn reservation(&self, id: Id) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn reservation_mut(&mut self, id: Id) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    pub fn next_reservation_id(&self) -> Id {
        next_id(self.reservations.iter().map(|r| r.id))
    }

    pub fn active_reservation_for_vehicle(&self, vehicle_id: Id) -> Option<&Reservation> {
        self.reservations
            .iter()
            .find(|r| r.vehicle_id == vehicle_id && r.is_active())
    }
}
