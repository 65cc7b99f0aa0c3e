use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Entity identifier. Allocated by the store as `max(existing) + 1`,
/// starting at 1 for an empty collection.
pub type Id = u64;

// ── Status enums ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    Available,
    Rented,
    Reserved,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::Rented => "Rented",
            VehicleStatus::Reserved => "Reserved",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalStatus {
    Rented,
    Overdue,
    Returned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Reserved,
    Cancelled,
}

// ── Entities ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: Id,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    /// Categorical, e.g. "Private" or "Corporate".
    pub customer_type: String,
    pub registration_date: DateTime<Utc>,
    /// One-way flag: deactivation is never reversed.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: Id,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub registration_number: String,
    pub vehicle_type: String,
    pub daily_rate: Decimal,
    pub mileage: u32,
    pub location: String,
    /// Must agree with `status` at all times; written only together with it
    /// by the availability module.
    pub availability: bool,
    pub status: VehicleStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RentalTransaction {
    pub id: Id,
    pub rental_date: DateTime<Utc>,
    /// Planned return date agreed at pickup.
    pub return_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub overdue_days: i64,
    pub rental_fee: Decimal,
    pub status: RentalStatus,
    pub vehicle_id: Id,
    pub customer_id: Id,
}

impl RentalTransaction {
    /// Rented or Overdue: the single open booking a vehicle may carry.
    pub fn is_active(&self) -> bool {
        matches!(self.status, RentalStatus::Rented | RentalStatus::Overdue)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reservation {
    pub id: Id,
    pub vehicle_id: Id,
    pub customer_id: Id,
    pub reservation_date: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Reserved
    }
}

// ── Command drafts ───────────────────────────────────────────────

/// Registration input. A requested id that collides with an existing
/// customer is reassigned; the command returns the id actually used.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub id: Option<Id>,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub customer_type: String,
    pub registration_date: DateTime<Utc>,
}

/// Contact/profile update. Never touches the active flag or the
/// registration date.
#[derive(Debug, Clone)]
pub struct CustomerUpdate {
    pub id: Id,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub customer_type: String,
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub id: Option<Id>,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub registration_number: String,
    pub vehicle_type: String,
    pub daily_rate: Decimal,
    pub mileage: u32,
    pub location: String,
}

/// Attribute update. Availability and status belong to the booking
/// workflow and are not touched here.
#[derive(Debug, Clone)]
pub struct VehicleUpdate {
    pub id: Id,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub registration_number: String,
    pub vehicle_type: String,
    pub daily_rate: Decimal,
    pub mileage: u32,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct RentalDraft {
    pub vehicle_id: Id,
    pub customer_id: Id,
    pub rental_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReservationDraft {
    pub vehicle_id: Id,
    pub customer_id: Id,
    pub reservation_date: DateTime<Utc>,
}

/// Search filter: each provided field is a case-insensitive substring
/// match; an omitted field matches everything.
#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub vehicle_type: Option<String>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
}

// ── Change notifications ─────────────────────────────────────────

/// One notification channel per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Customers,
    Vehicles,
    Rentals,
    Reservations,
}

/// What a mutation did, broadcast so an embedding presentation layer can
/// refresh the affected views without polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    CustomerRegistered { id: Id },
    CustomerUpdated { id: Id },
    CustomerDeactivated { id: Id },
    VehicleAdded { id: Id },
    VehicleUpdated { id: Id },
    VehicleRemoved { id: Id },
    RentalOpened { id: Id, vehicle_id: Id },
    RentalClosed { id: Id, vehicle_id: Id },
    RentalOverdue { id: Id, overdue_days: i64 },
    ReservationPlaced { id: Id, vehicle_id: Id },
    ReservationCancelled { id: Id, vehicle_id: Id },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rental(status: RentalStatus) -> RentalTransaction {
        RentalTransaction {
            id: 1,
            rental_date: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            return_date: Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap(),
            actual_return_date: None,
            overdue_days: 0,
            rental_fee: Decimal::ZERO,
            status,
            vehicle_id: 1,
            customer_id: 1,
        }
    }

    #[test]
    fn active_rental_states() {
        assert!(rental(RentalStatus::Rented).is_active());
        assert!(rental(RentalStatus::Overdue).is_active());
        assert!(!rental(RentalStatus::Returned).is_active());
    }

    #[test]
    fn status_serializes_to_bare_variant_name() {
        assert_eq!(
            serde_json::to_string(&VehicleStatus::Available).unwrap(),
            "\"Available\""
        );
        assert_eq!(
            serde_json::to_string(&RentalStatus::Overdue).unwrap(),
            "\"Overdue\""
        );
        assert_eq!(
            serde_json::to_string(&ReservationStatus::Cancelled).unwrap(),
            "\"Cancelled\""
        );
    }
}
