use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::engine::Engine;
use crate::observability;

/// Background task that periodically sweeps rentals for overdue status.
///
/// The sweep and caller commands serialize on the engine's state lock, so a
/// tick never observes a half-applied command. The cadence only affects
/// freshness, never correctness. Whoever composes the system owns the
/// lifecycle: `start` spawns the task, `stop` ends it after the in-flight
/// tick completes.
pub struct OverdueMonitor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl OverdueMonitor {
    pub fn start(engine: Arc<Engine>, period: Duration) -> Self {
        let (shutdown, mut rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let start = std::time::Instant::now();
                        let updated = engine.sweep_overdue(Utc::now()).await;
                        metrics::counter!(observability::SWEEPS_TOTAL).increment(1);
                        metrics::histogram!(observability::SWEEP_DURATION_SECONDS)
                            .record(start.elapsed().as_secs_f64());
                        if updated > 0 {
                            info!(updated, "overdue sweep updated rentals");
                        } else {
                            debug!("overdue sweep: nothing due");
                        }
                    }
                    _ = rx.changed() => break,
                }
            }
        });
        Self { shutdown, handle }
    }

    /// Signal the task and wait for the in-flight tick to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use crate::notify::NotifyHub;
    use chrono::{Duration as ChronoDuration, Utc};
    use rust_decimal::Decimal;
    use std::path::PathBuf;

    fn test_data_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("fleetd_test_monitor").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[tokio::test]
    async fn monitor_promotes_overdue_rentals() {
        let engine = Arc::new(
            Engine::open(test_data_dir("promote"), Arc::new(NotifyHub::new())).unwrap(),
        );

        let customer_id = engine
            .register_customer(NewCustomer {
                id: None,
                full_name: "Ada Fleet".into(),
                email: "ada@example.com".into(),
                phone_number: "555-0101".into(),
                address: "1 Garage Way".into(),
                customer_type: "Private".into(),
                registration_date: Utc::now(),
            })
            .await
            .unwrap();
        let vehicle_id = engine
            .add_vehicle(NewVehicle {
                id: None,
                make: "Toyota".into(),
                model: "Corolla".into(),
                year: 2021,
                registration_number: "ABC-123".into(),
                vehicle_type: "Sedan".into(),
                daily_rate: Decimal::from(100),
                mileage: 42_000,
                location: "Downtown".into(),
            })
            .await
            .unwrap();

        // Planned return already three days in the past.
        let now = Utc::now();
        let rental_id = engine
            .create_rental(RentalDraft {
                vehicle_id,
                customer_id,
                rental_date: now - ChronoDuration::days(5),
                return_date: now - ChronoDuration::days(3),
            })
            .await
            .unwrap();

        let monitor = OverdueMonitor::start(engine.clone(), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        monitor.stop().await;

        let rental = engine.find_rental(rental_id).await.unwrap();
        assert_eq!(rental.status, RentalStatus::Overdue);
        assert!(rental.overdue_days >= 3);
    }

    #[tokio::test]
    async fn stop_ends_the_task() {
        let engine = Arc::new(
            Engine::open(test_data_dir("stop"), Arc::new(NotifyHub::new())).unwrap(),
        );
        let monitor = OverdueMonitor::start(engine, Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(30)).await;
        monitor.stop().await; // hangs if the task never observes shutdown
    }
}
