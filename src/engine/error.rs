use crate::model::{Id, VehicleStatus};

/// Command failures. Everything here is recoverable by the caller;
/// nothing in the core terminates the process.
#[derive(Debug)]
pub enum EngineError {
    CustomerNotFound(Id),
    VehicleNotFound(Id),
    RentalNotFound(Id),
    ReservationNotFound(Id),
    /// Vehicle is already committed to a rental or reservation.
    VehicleUnavailable { vehicle_id: Id, status: VehicleStatus },
    /// Vehicle cannot be removed while committed or referenced by
    /// rental/reservation history.
    VehicleInUse(Id),
    /// `Returned` is terminal: a closed rental rejects further transitions.
    RentalClosed(Id),
    /// `Cancelled` is terminal: a cancelled reservation rejects further
    /// transitions.
    ReservationCancelled(Id),
    InvalidInput(&'static str),
    LimitExceeded(&'static str),
    Storage(String),
}

/// The coarse taxonomy callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Storage,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::CustomerNotFound(_)
            | EngineError::VehicleNotFound(_)
            | EngineError::RentalNotFound(_)
            | EngineError::ReservationNotFound(_) => ErrorKind::NotFound,
            EngineError::VehicleUnavailable { .. }
            | EngineError::VehicleInUse(_)
            | EngineError::RentalClosed(_)
            | EngineError::ReservationCancelled(_) => ErrorKind::Conflict,
            EngineError::InvalidInput(_) | EngineError::LimitExceeded(_) => {
                ErrorKind::InvalidInput
            }
            EngineError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::CustomerNotFound(id) => write!(f, "customer not found: {id}"),
            EngineError::VehicleNotFound(id) => write!(f, "vehicle not found: {id}"),
            EngineError::RentalNotFound(id) => write!(f, "rental not found: {id}"),
            EngineError::ReservationNotFound(id) => write!(f, "reservation not found: {id}"),
            EngineError::VehicleUnavailable { vehicle_id, status } => {
                write!(f, "vehicle {vehicle_id} unavailable: {status}")
            }
            EngineError::VehicleInUse(id) => {
                write!(f, "vehicle {id} still referenced by bookings")
            }
            EngineError::RentalClosed(id) => write!(f, "rental {id} already returned"),
            EngineError::ReservationCancelled(id) => {
                write!(f, "reservation {id} already cancelled")
            }
            EngineError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
