//! The availability invariant: `vehicle.availability` is true iff
//! `vehicle.status` is `Available`. Nothing outside this module writes
//! either field once a vehicle is in the store, so the two can never be
//! observed disagreeing.

use crate::model::{Vehicle, VehicleStatus};

/// A vehicle is bookable (rentable or reservable) iff this is true.
pub fn is_available(vehicle: &Vehicle) -> bool {
    vehicle.availability
}

/// Commit the vehicle to a rental or reservation. Both state fields change
/// in the same call, never independently.
pub fn commit(vehicle: &mut Vehicle, status: VehicleStatus) {
    debug_assert!(
        status != VehicleStatus::Available,
        "commit target must be a committed status"
    );
    vehicle.availability = false;
    vehicle.status = status;
}

/// Return the vehicle to the bookable pool.
pub fn release(vehicle: &mut Vehicle) {
    vehicle.availability = true;
    vehicle.status = VehicleStatus::Available;
}

/// Invariant check for tests and debug assertions.
pub fn invariant_holds(vehicle: &Vehicle) -> bool {
    vehicle.availability == (vehicle.status == VehicleStatus::Available)
}
