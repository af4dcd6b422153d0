//! Reservation countdown
//!
//! The only ongoing background activity in the client: a recurring tick that
//! recomputes every line's reservation status from wall-clock time and
//! publishes it over a watch channel. The task is aborted when the handle
//! drops, so an unmounted cart view stops ticking instead of updating dead
//! state.

use std::time::Duration;

use jiff::Timestamp;
use peony::{
    cart::CartSnapshot,
    ids::ProductId,
    reservation::{ReservationClock, ReservationStatus},
};
use tokio::{sync::watch, task::JoinHandle};

/// Status of one line at the latest tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCountdown {
    pub product_id: ProductId,
    pub status: ReservationStatus,
    pub remaining_seconds: i64,
}

/// Owner of the ticking task; drop it to stop the countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    task: JoinHandle<()>,
    receiver: watch::Receiver<Vec<LineCountdown>>,
}

impl CountdownHandle {
    /// Start ticking over a snapshot of the cart. The snapshot is fixed for
    /// the lifetime of the handle; restart the countdown after a cart
    /// mutation.
    #[must_use]
    pub fn start(snapshot: CartSnapshot, period: Duration) -> Self {
        let clock = snapshot.clock();
        let (sender, receiver) = watch::channel(compute(&snapshot, &clock, Timestamp::now()));

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                if sender
                    .send(compute(&snapshot, &clock, Timestamp::now()))
                    .is_err()
                {
                    break;
                }
            }
        });

        Self { task, receiver }
    }

    /// The statuses published at the latest tick.
    #[must_use]
    pub fn statuses(&self) -> Vec<LineCountdown> {
        self.receiver.borrow().clone()
    }

    /// A receiver for callers that want to await changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<LineCountdown>> {
        self.receiver.clone()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn compute(
    snapshot: &CartSnapshot,
    clock: &ReservationClock,
    now: Timestamp,
) -> Vec<LineCountdown> {
    snapshot
        .lines
        .iter()
        .map(|line| LineCountdown {
            product_id: line.product_id,
            status: clock.status(line.reserved_at, now),
            remaining_seconds: clock.remaining_seconds(line.reserved_at, now),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use peony::cart::CartLine;
    use peony::ids::SellerId;

    use super::*;

    fn snapshot_with_line(reserved_seconds_ago: i64) -> CartSnapshot {
        CartSnapshot {
            lines: vec![CartLine {
                product_id: ProductId::new(1),
                seller_id: SellerId::new(10),
                name: "Bouquet 1".to_owned(),
                price: 100_00,
                quantity: 1,
                photo_id: None,
                reserved_at: Some(
                    Timestamp::now() - SignedDuration::from_secs(reserved_seconds_ago),
                ),
                preorder_delivery_date: None,
            }],
            reservation_ttl_seconds: 300,
        }
    }

    #[tokio::test]
    async fn publishes_statuses_immediately() {
        let handle = CountdownHandle::start(snapshot_with_line(10), Duration::from_secs(5));

        let statuses = handle.statuses();

        assert_eq!(statuses.len(), 1);
        assert_eq!(
            statuses.first().map(|s| s.status),
            Some(ReservationStatus::Active)
        );
    }

    #[tokio::test]
    async fn expired_line_reports_zero_remaining() {
        let handle = CountdownHandle::start(snapshot_with_line(500), Duration::from_secs(5));

        let statuses = handle.statuses();

        assert_eq!(
            statuses.first().map(|s| (s.status, s.remaining_seconds)),
            Some((ReservationStatus::Expired, 0))
        );
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_task() {
        let handle = CountdownHandle::start(snapshot_with_line(10), Duration::from_millis(1));
        let task_handle = handle.task.abort_handle();

        drop(handle);

        // Cancellation is observed asynchronously.
        for _ in 0..100 {
            if task_handle.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert!(task_handle.is_finished(), "task aborted with the handle");
    }
}
