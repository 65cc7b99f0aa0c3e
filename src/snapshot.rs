use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::*;

// Storage keys, one snapshot file per entity kind.
pub const CUSTOMER_KEY: &str = "customer_list";
pub const VEHICLE_KEY: &str = "vehicle_list";
pub const RENTAL_KEY: &str = "rental_list";
pub const RESERVATION_KEY: &str = "reservation_list";

/// JSON snapshot persistence. Each entity kind is one file, rewritten in
/// full after every mutating command: serialize to `<key>.json.tmp`, fsync,
/// rename over the live file, so a torn write can never corrupt the previous
/// snapshot. A crash between mutation and save loses at most that command.
pub struct SnapshotStore {
    data_dir: PathBuf,
}

impl SnapshotStore {
    /// Open the store rooted at `data_dir`, creating the directory if needed.
    pub fn new(data_dir: PathBuf) -> io::Result<Self> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }

    /// Load one entity kind. A missing file is an empty collection.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> io::Result<Vec<T>> {
        let file = match File::open(self.file_path(key)) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Atomically rewrite one entity kind.
    pub fn save<T: Serialize>(&self, key: &str, records: &[T]) -> io::Result<()> {
        let start = std::time::Instant::now();
        let path = self.file_path(key);
        let tmp_path = path.with_extension("json.tmp");

        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, records)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp_path, &path)?;

        metrics::histogram!(crate::observability::SNAPSHOT_WRITE_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        Ok(())
    }
}

// ── On-disk records ──────────────────────────────────────────────
//
// Field names match the legacy storage format (camelCase, `type` for the
// type fields) so existing exports load unchanged. Rental and
// reservation records embed full vehicle/customer snapshots; the in-memory
// entities keep only the ids and resolve through the store.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub id: Id,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    #[serde(rename = "type")]
    pub customer_type: String,
    pub registration_date: DateTime<Utc>,
    pub active_status: bool,
}

impl From<&Customer> for CustomerRecord {
    fn from(c: &Customer) -> Self {
        Self {
            id: c.id,
            full_name: c.full_name.clone(),
            email: c.email.clone(),
            phone_number: c.phone_number.clone(),
            address: c.address.clone(),
            customer_type: c.customer_type.clone(),
            registration_date: c.registration_date,
            active_status: c.active,
        }
    }
}

impl From<CustomerRecord> for Customer {
    fn from(r: CustomerRecord) -> Self {
        Self {
            id: r.id,
            full_name: r.full_name,
            email: r.email,
            phone_number: r.phone_number,
            address: r.address,
            customer_type: r.customer_type,
            registration_date: r.registration_date,
            active: r.active_status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: Id,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub registration_number: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub daily_rate: Decimal,
    pub mileage: u32,
    pub location: String,
    pub availability: bool,
    pub status: VehicleStatus,
}

impl From<&Vehicle> for VehicleRecord {
    fn from(v: &Vehicle) -> Self {
        Self {
            id: v.id,
            make: v.make.clone(),
            model: v.model.clone(),
            year: v.year,
            registration_number: v.registration_number.clone(),
            vehicle_type: v.vehicle_type.clone(),
            daily_rate: v.daily_rate,
            mileage: v.mileage,
            location: v.location.clone(),
            availability: v.availability,
            status: v.status,
        }
    }
}

impl From<VehicleRecord> for Vehicle {
    fn from(r: VehicleRecord) -> Self {
        Self {
            id: r.id,
            make: r.make,
            model: r.model,
            year: r.year,
            registration_number: r.registration_number,
            vehicle_type: r.vehicle_type,
            daily_rate: r.daily_rate,
            mileage: r.mileage,
            location: r.location,
            availability: r.availability,
            status: r.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalRecord {
    pub id: Id,
    pub rental_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub overdue_days: i64,
    pub rental_fee: Decimal,
    pub status: RentalStatus,
    pub vehicle: VehicleRecord,
    pub customer: CustomerRecord,
}

impl RentalRecord {
    pub fn new(rental: &RentalTransaction, vehicle: &Vehicle, customer: &Customer) -> Self {
        Self {
            id: rental.id,
            rental_date: rental.rental_date,
            return_date: rental.return_date,
            actual_return_date: rental.actual_return_date,
            overdue_days: rental.overdue_days,
            rental_fee: rental.rental_fee,
            status: rental.status,
            vehicle: vehicle.into(),
            customer: customer.into(),
        }
    }

    /// Extract the in-memory entity; the embedded snapshots collapse back
    /// to foreign keys.
    pub fn into_rental(self) -> RentalTransaction {
        RentalTransaction {
            id: self.id,
            rental_date: self.rental_date,
            return_date: self.return_date,
            actual_return_date: self.actual_return_date,
            overdue_days: self.overdue_days,
            rental_fee: self.rental_fee,
            status: self.status,
            vehicle_id: self.vehicle.id,
            customer_id: self.customer.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    pub id: Id,
    pub reserved_vehicle: VehicleRecord,
    pub reserving_customer: CustomerRecord,
    pub reservation_date: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl ReservationRecord {
    pub fn new(reservation: &Reservation, vehicle: &Vehicle, customer: &Customer) -> Self {
        Self {
            id: reservation.id,
            reserved_vehicle: vehicle.into(),
            reserving_customer: customer.into(),
            reservation_date: reservation.reservation_date,
            status: reservation.status,
        }
    }

    pub fn into_reservation(self) -> Reservation {
        Reservation {
            id: self.id,
            vehicle_id: self.reserved_vehicle.id,
            customer_id: self.reserving_customer.id,
            reservation_date: self.reservation_date,
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_store(name: &str) -> SnapshotStore {
        let dir = std::env::temp_dir().join("fleetd_test_snapshot").join(name);
        let _ = fs::remove_dir_all(&dir);
        SnapshotStore::new(dir).unwrap()
    }

    fn sample_customer() -> Customer {
        Customer {
            id: 1,
            full_name: "John Doe".into(),
            email: "john.doe@example.com".into(),
            phone_number: "555-0100".into(),
            address: "12 Depot Rd".into(),
            customer_type: "Private".into(),
            registration_date: Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap(),
            active: true,
        }
    }

    fn sample_vehicle() -> Vehicle {
        Vehicle {
            id: 7,
            make: "Toyota".into(),
            model: "Corolla".into(),
            year: 2021,
            registration_number: "ABC-123".into(),
            vehicle_type: "Sedan".into(),
            daily_rate: Decimal::from(100),
            mileage: 42_000,
            location: "Downtown".into(),
            availability: true,
            status: VehicleStatus::Available,
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let store = test_store("roundtrip");
        let records = vec![CustomerRecord::from(&sample_customer())];
        store.save(CUSTOMER_KEY, &records).unwrap();

        let loaded: Vec<CustomerRecord> = store.load(CUSTOMER_KEY).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn missing_file_loads_empty() {
        let store = test_store("missing");
        let loaded: Vec<CustomerRecord> = store.load(CUSTOMER_KEY).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn save_overwrites_previous_snapshot() {
        let store = test_store("overwrite");
        let mut customer = sample_customer();
        store
            .save(CUSTOMER_KEY, &[CustomerRecord::from(&customer)])
            .unwrap();

        customer.email = "new@example.com".into();
        store
            .save(CUSTOMER_KEY, &[CustomerRecord::from(&customer)])
            .unwrap();

        let loaded: Vec<CustomerRecord> = store.load(CUSTOMER_KEY).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].email, "new@example.com");
    }

    #[test]
    fn field_names_match_storage_format() {
        let json = serde_json::to_string(&CustomerRecord::from(&sample_customer())).unwrap();
        assert!(json.contains("\"fullName\""));
        assert!(json.contains("\"phoneNumber\""));
        assert!(json.contains("\"activeStatus\""));
        assert!(json.contains("\"type\":\"Private\""));
        // Dates persist as strings.
        assert!(json.contains("\"registrationDate\":\"2026-01-15T00:00:00Z\""));

        let json = serde_json::to_string(&VehicleRecord::from(&sample_vehicle())).unwrap();
        assert!(json.contains("\"registrationNumber\""));
        assert!(json.contains("\"dailyRate\""));
        assert!(json.contains("\"status\":\"Available\""));
    }

    #[test]
    fn rental_record_embeds_and_extracts() {
        let vehicle = sample_vehicle();
        let customer = sample_customer();
        let rental = RentalTransaction {
            id: 3,
            rental_date: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            return_date: Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap(),
            actual_return_date: None,
            overdue_days: 0,
            rental_fee: Decimal::from(200),
            status: RentalStatus::Rented,
            vehicle_id: vehicle.id,
            customer_id: customer.id,
        };

        let record = RentalRecord::new(&rental, &vehicle, &customer);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"vehicle\""));
        assert!(json.contains("\"customer\""));
        assert!(json.contains("\"actualReturnDate\":null"));

        let back: RentalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_rental(), rental);
    }

    #[test]
    fn reservation_record_embeds_and_extracts() {
        let vehicle = sample_vehicle();
        let customer = sample_customer();
        let reservation = Reservation {
            id: 2,
            vehicle_id: vehicle.id,
            customer_id: customer.id,
            reservation_date: Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
            status: ReservationStatus::Reserved,
        };

        let record = ReservationRecord::new(&reservation, &vehicle, &customer);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"reservedVehicle\""));
        assert!(json.contains("\"reservingCustomer\""));

        let back: ReservationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.into_reservation(), reservation);
    }
}
