//! Admin-side watch for newly created bookings.

use crate::error::AppResult;
use crate::models::BookingRecord;
use crate::tasks::PollLimits;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub trait BookingFeed: Send + Sync + 'static {
    fn latest_bookings(&self) -> BoxFuture<'_, AppResult<Vec<BookingRecord>>>;
}

/// Remembers every booking id seen so far and reports only arrivals.
#[derive(Debug, Default, Clone)]
pub struct NewOrderDetector {
    seen: HashSet<String>,
    primed: bool,
}

impl NewOrderDetector {
    /// Unprimed: the first observation only records what already exists.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seen<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            seen: ids.into_iter().map(Into::into).collect(),
            primed: true,
        }
    }

    /// Ids not seen before, in input order. The seen set only ever grows.
    pub fn observe<'a, I>(&mut self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut fresh = Vec::new();
        for id in ids {
            if self.seen.insert(id.to_string()) && self.primed {
                fresh.push(id.to_string());
            }
        }
        self.primed = true;
        fresh
    }

    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    pub fn is_primed(&self) -> bool {
        self.primed
    }
}

#[derive(Debug, Clone)]
pub struct NewOrders {
    pub bookings: Vec<BookingRecord>,
    pub detected_at: DateTime<Utc>,
}

pub struct OrderMonitor {
    active: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl OrderMonitor {
    /// Start watching; new arrivals are delivered on the returned channel.
    pub fn spawn<F: BookingFeed>(
        feed: Arc<F>,
        interval: Duration,
        limits: PollLimits,
        detector: NewOrderDetector,
    ) -> (Self, mpsc::Receiver<NewOrders>) {
        let (tx, rx) = mpsc::channel(16);
        let active = Arc::new(AtomicBool::new(true));
        let task = tokio::spawn(run_monitor(
            feed,
            interval,
            limits,
            detector,
            Arc::clone(&active),
            tx,
        ));
        (
            Self {
                active,
                task: Some(task),
            },
            rx,
        )
    }

    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for OrderMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_monitor<F: BookingFeed>(
    feed: Arc<F>,
    interval: Duration,
    limits: PollLimits,
    mut detector: NewOrderDetector,
    active: Arc<AtomicBool>,
    tx: mpsc::Sender<NewOrders>,
) {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempts: u32 = 0;

    loop {
        ticker.tick().await;
        if limits.time_exhausted(started.elapsed()) || limits.attempts_exhausted(attempts) {
            log::info!("Order monitor reached its limit after {attempts} fetches");
            break;
        }
        attempts = attempts.saturating_add(1);

        let bookings = match feed.latest_bookings().await {
            Ok(bookings) => bookings,
            Err(e) => {
                log::warn!("Failed to fetch bookings for order monitor: {e}");
                continue;
            }
        };
        if !active.load(Ordering::SeqCst) {
            return;
        }

        let fresh: HashSet<String> = detector
            .observe(bookings.iter().map(|b| b.id.as_str()))
            .into_iter()
            .collect();
        if fresh.is_empty() {
            continue;
        }

        log::info!("Detected {} new booking(s)", fresh.len());
        let batch = NewOrders {
            bookings: bookings
                .into_iter()
                .filter(|b| fresh.contains(&b.id))
                .collect(),
            detected_at: Utc::now(),
        };
        if tx.send(batch).await.is_err() {
            log::debug!("Order monitor receiver dropped, stopping");
            break;
        }
    }

    active.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use futures_util::FutureExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_reports_only_new_ids() {
        let mut detector = NewOrderDetector::with_seen(["1", "2", "3"]);
        let fresh = detector.observe(["1", "2", "3", "4", "5"]);
        assert_eq!(fresh, vec!["4", "5"]);
        assert_eq!(detector.seen().len(), 5);
    }

    #[test]
    fn test_removals_are_ignored() {
        let mut detector = NewOrderDetector::with_seen(["1", "2", "3", "4", "5"]);
        assert!(detector.observe(["1", "2"]).is_empty());
        assert_eq!(detector.seen().len(), 5);
        assert!(detector.seen().contains("5"));
    }

    #[test]
    fn test_first_observation_primes_silently() {
        let mut detector = NewOrderDetector::new();
        assert!(!detector.is_primed());
        assert!(detector.observe(["1", "2"]).is_empty());
        assert!(detector.is_primed());
        assert_eq!(detector.observe(["1", "2", "7"]), vec!["7"]);
    }

    fn booking(id: &str) -> BookingRecord {
        BookingRecord {
            id: id.to_string(),
            show_id: Some("s1".to_string()),
            ticket_type_id: Some("standard".to_string()),
            customer_name: "Le C".to_string(),
            phone: "0987654321".to_string(),
            quantity: 1,
            total_amount: 1_200_000,
            payment_status: PaymentStatus::Pending,
            payment_time: None,
            created_at: None,
            show: None,
            ticket_type: None,
        }
    }

    struct ScriptedFeed {
        pages: Mutex<VecDeque<Vec<&'static str>>>,
        calls: AtomicUsize,
    }

    impl BookingFeed for ScriptedFeed {
        fn latest_bookings(&self) -> BoxFuture<'_, AppResult<Vec<BookingRecord>>> {
            async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let mut pages = self.pages.lock().unwrap();
                let page = if pages.len() > 1 {
                    pages.pop_front().unwrap_or_default()
                } else {
                    pages.front().cloned().unwrap_or_default()
                };
                Ok(page.into_iter().map(booking).collect())
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_notifies_arrivals() {
        let feed = Arc::new(ScriptedFeed {
            pages: Mutex::new(VecDeque::from(vec![
                vec!["1", "2"],
                vec!["1", "2", "3"],
                vec!["2", "3"],
                vec!["2", "3", "4", "5"],
            ])),
            calls: AtomicUsize::new(0),
        });
        let (mut monitor, mut rx) = OrderMonitor::spawn(
            feed.clone(),
            Duration::from_millis(6000),
            PollLimits::UNBOUNDED,
            NewOrderDetector::new(),
        );

        let first = rx.recv().await.unwrap();
        assert_eq!(first.bookings.len(), 1);
        assert_eq!(first.bookings[0].id, "3");

        let second = rx.recv().await.unwrap();
        let ids: Vec<_> = second.bookings.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "5"]);

        monitor.stop();
        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_respects_attempt_limit() {
        let feed = Arc::new(ScriptedFeed {
            pages: Mutex::new(VecDeque::from(vec![vec!["1"]])),
            calls: AtomicUsize::new(0),
        });
        let limits = PollLimits {
            max_attempts: Some(3),
            max_duration: None,
        };
        let (monitor, mut rx) = OrderMonitor::spawn(
            feed.clone(),
            Duration::from_millis(6000),
            limits,
            NewOrderDetector::new(),
        );

        // the channel closes once the loop ends
        assert!(rx.recv().await.is_none());
        assert_eq!(feed.calls.load(Ordering::SeqCst), 3);
        assert!(!monitor.is_running());
    }
}
