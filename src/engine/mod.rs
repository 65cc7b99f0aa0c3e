mod availability;
mod error;
mod fees;
mod mutations;
mod queries;
mod store;

pub use availability::{commit, invariant_holds, is_available, release};
pub use error::{EngineError, ErrorKind};
pub use fees::{billable_days, days_overdue, rental_fee};
pub use queries::FleetCounts;
pub use store::FleetState;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::*;
use crate::notify::NotifyHub;
use crate::snapshot::{
    self, CustomerRecord, RentalRecord, ReservationRecord, SnapshotStore, VehicleRecord,
};

/// The booking/availability core. One write lock serializes every command
/// and every monitor tick against each other, so the availability check and
/// the vehicle commit of a booking are a single indivisible step, and a
/// tick never observes a half-applied command.
pub struct Engine {
    state: RwLock<FleetState>,
    snapshots: SnapshotStore,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    /// Load persisted snapshots from `data_dir` (created if missing) and
    /// build the in-memory state.
    pub fn open(data_dir: PathBuf, notify: Arc<NotifyHub>) -> io::Result<Self> {
        let snapshots = SnapshotStore::new(data_dir)?;

        let customers: Vec<Customer> = snapshots
            .load::<CustomerRecord>(snapshot::CUSTOMER_KEY)?
            .into_iter()
            .map(Into::into)
            .collect();
        let vehicles: Vec<Vehicle> = snapshots
            .load::<VehicleRecord>(snapshot::VEHICLE_KEY)?
            .into_iter()
            .map(Into::into)
            .collect();
        let rentals: Vec<RentalTransaction> = snapshots
            .load::<RentalRecord>(snapshot::RENTAL_KEY)?
            .into_iter()
            .map(RentalRecord::into_rental)
            .collect();
        let reservations: Vec<Reservation> = snapshots
            .load::<ReservationRecord>(snapshot::RESERVATION_KEY)?
            .into_iter()
            .map(ReservationRecord::into_reservation)
            .collect();

        let state = FleetState {
            customers,
            vehicles,
            rentals,
            reservations,
        };
        Ok(Self {
            state: RwLock::new(state),
            snapshots,
            notify,
        })
    }

    // ── Persistence (called with the write guard held) ───────

    fn persist_customers(&self, state: &FleetState) -> Result<(), EngineError> {
        let records: Vec<CustomerRecord> = state.customers.iter().map(Into::into).collect();
        self.snapshots
            .save(snapshot::CUSTOMER_KEY, &records)
            .map_err(|e| EngineError::Storage(e.to_string()))
    }

    fn persist_vehicles(&self, state: &FleetState) -> Result<(), EngineError> {
        let records: Vec<VehicleRecord> = state.vehicles.iter().map(Into::into).collect();
        self.snapshots
            .save(snapshot::VEHICLE_KEY, &records)
            .map_err(|e| EngineError::Storage(e.to_string()))
    }

    fn persist_rentals(&self, state: &FleetState) -> Result<(), EngineError> {
        let records = state
            .rentals
            .iter()
            .map(|r| {
                let vehicle = state
                    .vehicle(r.vehicle_id)
                    .ok_or(EngineError::VehicleNotFound(r.vehicle_id))?;
                let customer = state
                    .customer(r.customer_id)
                    .ok_or(EngineError::CustomerNotFound(r.customer_id))?;
                Ok(RentalRecord::new(r, vehicle, customer))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        self.snapshots
            .save(snapshot::RENTAL_KEY, &records)
            .map_err(|e| EngineError::Storage(e.to_string()))
    }

    fn persist_reservations(&self, state: &FleetState) -> Result<(), EngineError> {
        let records = state
            .reservations
            .iter()
            .map(|r| {
                let vehicle = state
                    .vehicle(r.vehicle_id)
                    .ok_or(EngineError::VehicleNotFound(r.vehicle_id))?;
                let customer = state
                    .customer(r.customer_id)
                    .ok_or(EngineError::CustomerNotFound(r.customer_id))?;
                Ok(ReservationRecord::new(r, vehicle, customer))
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        self.snapshots
            .save(snapshot::RESERVATION_KEY, &records)
            .map_err(|e| EngineError::Storage(e.to_string()))
    }
}
