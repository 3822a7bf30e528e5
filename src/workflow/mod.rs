//! Visitor checkout: select a package, book, pay, wait for tickets.
//!
//! `CheckoutFlow` is a state machine over [`CheckoutState`]. Timers live
//! inside [`CheckoutFlow::next_event`] and the ticket poller is owned by the
//! flow while it sits in `Succeeded`; leaving that state (or dropping the
//! flow) stops it.

pub mod payment;
pub mod ticket_card;

pub use payment::*;
pub use ticket_card::*;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::BookingSessionStore;
use crate::tasks::{PollLimits, TicketPoller, TicketSource};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// Backend operations the checkout needs.
pub trait CheckoutBackend: TicketSource {
    fn create_booking<'a>(
        &'a self,
        request: &'a CreateBookingRequest,
    ) -> BoxFuture<'a, AppResult<CreateBookingResponse>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub show_id: String,
    pub max_quantity: u32,
    pub countdown_secs: u32,
    pub countdown_tick: Duration,
    pub handoff_delay: Duration,
    pub poll_interval: Duration,
    pub poll_limits: PollLimits,
}

impl CheckoutSettings {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let show_id = config
            .storefront
            .show_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AppError::ConfigError("storefront.show_id is not configured".to_string())
            })?;

        Ok(Self {
            show_id,
            max_quantity: config.storefront.max_quantity,
            countdown_secs: config.storefront.countdown_secs,
            countdown_tick: config.storefront.countdown_tick(),
            handoff_delay: config.storefront.handoff_delay(),
            poll_interval: config.polling.ticket_interval(),
            poll_limits: PollLimits {
                max_attempts: config.polling.ticket_max_attempts,
                max_duration: config.polling.ticket_max_duration(),
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPhase {
    /// Short pause before ticket polling begins.
    Handoff,
    Polling,
    /// Polling hit its limits; [`CheckoutFlow::retry_polling`] starts over.
    GaveUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// The selection itself lives in the session store.
    Selecting,
    AwaitingPayment {
        booking: BookingRecord,
        payment: PaymentDisplay,
    },
    Processing {
        booking: BookingRecord,
        remaining: u32,
    },
    Succeeded {
        booking: BookingRecord,
        phase: SuccessPhase,
    },
    TicketReady {
        card: TicketCard,
    },
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::Selecting => "selecting",
            CheckoutState::AwaitingPayment { .. } => "awaiting_payment",
            CheckoutState::Processing { .. } => "processing",
            CheckoutState::Succeeded { .. } => "succeeded",
            CheckoutState::TicketReady { .. } => "ticket_ready",
        }
    }

    pub fn booking(&self) -> Option<&BookingRecord> {
        match self {
            CheckoutState::AwaitingPayment { booking, .. }
            | CheckoutState::Processing { booking, .. }
            | CheckoutState::Succeeded { booking, .. } => Some(booking),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    Countdown(u32),
    PaymentConfirmed,
    PollingStarted { booking_id: String },
    TicketIssued(TicketCard),
    PollingGaveUp,
}

/// Outcome of entering the payment screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEntry {
    Show,
    /// No booking in progress; the flow went back to selection.
    Redirect,
}

pub struct CheckoutFlow<B: CheckoutBackend> {
    backend: Arc<B>,
    catalog: ComboCatalog,
    settings: CheckoutSettings,
    store: BookingSessionStore,
    state: CheckoutState,
    poller: Option<TicketPoller<B>>,
}

impl<B: CheckoutBackend> CheckoutFlow<B> {
    pub fn new(backend: Arc<B>, catalog: ComboCatalog, settings: CheckoutSettings) -> Self {
        Self {
            backend,
            catalog,
            settings,
            store: BookingSessionStore::new(),
            state: CheckoutState::Selecting,
            poller: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn catalog(&self) -> &ComboCatalog {
        &self.catalog
    }

    pub fn selection(&self) -> Option<&BookingSelection> {
        self.store.selection()
    }

    pub fn select(&mut self, form: &BookingForm) -> AppResult<&BookingSelection> {
        self.expect_selecting()?;
        let selection = form.validate(&self.catalog, self.settings.max_quantity)?;
        log::debug!(
            "Selected {} x{} = {}",
            selection.combo_id(),
            selection.quantity(),
            selection.total_price()
        );
        Ok(self.store.begin(selection))
    }

    pub fn change_quantity(&mut self, quantity: u32) -> AppResult<&BookingSelection> {
        self.expect_selecting()?;
        if quantity > self.settings.max_quantity {
            return Err(AppError::ValidationError(format!(
                "Quantity must be between 1 and {}",
                self.settings.max_quantity
            )));
        }
        let selection = self.editable_selection()?;
        selection.set_quantity(quantity)?;
        Ok(selection)
    }

    pub fn change_combo(&mut self, combo_id: &str) -> AppResult<&BookingSelection> {
        self.expect_selecting()?;
        let combo = self
            .catalog
            .get(combo_id)
            .cloned()
            .ok_or_else(|| AppError::ValidationError(format!("Unknown package: {combo_id}")))?;
        let selection = self.editable_selection()?;
        selection.set_combo(&combo)?;
        Ok(selection)
    }

    /// Create the booking. On failure nothing changes and the selection can
    /// be submitted again.
    pub async fn submit(&mut self) -> AppResult<&CheckoutState> {
        self.expect_selecting()?;
        let selection = self.store.selection().ok_or_else(|| {
            AppError::ValidationError("Please choose a package first".to_string())
        })?;
        let request = CreateBookingRequest::from_selection(&self.settings.show_id, selection);

        let response = match self.backend.create_booking(&request).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Booking creation failed for {}: {e}", request.phone);
                return Err(e);
            }
        };

        let booking = BookingRecord::from_created(&request, &response);
        let artifact = response.payment_artifact();
        let payment = PaymentDisplay::resolve(&artifact);
        if !payment.is_usable() {
            log::warn!("Booking {} came back without a usable payment code", booking.id);
        }
        self.store.attach_booking(booking.clone(), artifact)?;
        self.enter(CheckoutState::AwaitingPayment { booking, payment });
        Ok(&self.state)
    }

    /// Guard for the payment screen.
    pub fn open_payment(&mut self) -> PaymentEntry {
        match self.state {
            CheckoutState::AwaitingPayment { .. }
            | CheckoutState::Processing { .. }
            | CheckoutState::Succeeded { .. } => PaymentEntry::Show,
            _ => {
                self.store.clear();
                self.enter(CheckoutState::Selecting);
                PaymentEntry::Redirect
            }
        }
    }

    pub fn confirm_payment(&mut self) -> AppResult<()> {
        let booking = match &self.state {
            CheckoutState::AwaitingPayment { booking, payment } if payment.is_usable() => booking.clone(),
            CheckoutState::AwaitingPayment { .. } => {
                return Err(AppError::ValidationError(
                    "No payment code is available for this booking".to_string(),
                ));
            }
            _ => {
                return Err(AppError::ValidationError(
                    "There is no booking awaiting payment".to_string(),
                ));
            }
        };

        log::info!("Payment confirmed by visitor for booking {}", booking.id);
        let next = if self.settings.countdown_secs == 0 {
            CheckoutState::Succeeded {
                booking,
                phase: SuccessPhase::Handoff,
            }
        } else {
            CheckoutState::Processing {
                booking,
                remaining: self.settings.countdown_secs,
            }
        };
        self.enter(next);
        Ok(())
    }

    /// Wait for whatever the current state is waiting on. `None` means there
    /// is nothing to wait for.
    ///
    /// Dropping the returned future before it resolves leaves the state as
    /// it was.
    pub async fn next_event(&mut self) -> Option<FlowEvent> {
        match &self.state {
            CheckoutState::Processing { booking, remaining } => {
                let (booking, remaining) = (booking.clone(), *remaining);
                tokio::time::sleep(self.settings.countdown_tick).await;
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.enter(CheckoutState::Succeeded {
                        booking,
                        phase: SuccessPhase::Handoff,
                    });
                    Some(FlowEvent::PaymentConfirmed)
                } else {
                    self.state = CheckoutState::Processing { booking, remaining };
                    Some(FlowEvent::Countdown(remaining))
                }
            }
            CheckoutState::Succeeded {
                booking,
                phase: SuccessPhase::Handoff,
            } => {
                let booking = booking.clone();
                tokio::time::sleep(self.settings.handoff_delay).await;
                Some(self.start_polling(booking))
            }
            CheckoutState::Succeeded {
                booking,
                phase: SuccessPhase::Polling,
            } => {
                let booking = booking.clone();
                self.await_tickets(booking).await
            }
            _ => None,
        }
    }

    /// Start polling again after the previous round gave up.
    pub fn retry_polling(&mut self) -> AppResult<FlowEvent> {
        match &self.state {
            CheckoutState::Succeeded {
                booking,
                phase: SuccessPhase::GaveUp,
            } => {
                let booking = booking.clone();
                Ok(self.start_polling(booking))
            }
            _ => Err(AppError::ValidationError(
                "Ticket polling is not waiting for a retry".to_string(),
            )),
        }
    }

    /// Back to an empty selection from anywhere. Also how a new booking
    /// starts after tickets were shown.
    pub fn abandon(&mut self) {
        if !matches!(self.state, CheckoutState::Selecting) {
            log::debug!("Checkout abandoned in state {}", self.state.name());
        }
        self.store.clear();
        self.enter(CheckoutState::Selecting);
    }

    fn start_polling(&mut self, booking: BookingRecord) -> FlowEvent {
        let booking_id = booking.id.clone();
        self.enter(CheckoutState::Succeeded {
            booking,
            phase: SuccessPhase::Polling,
        });

        let poller = TicketPoller::new(
            Arc::clone(&self.backend),
            self.settings.poll_interval,
            self.settings.poll_limits,
        );
        poller.start(booking_id.clone());
        self.poller = Some(poller);
        FlowEvent::PollingStarted { booking_id }
    }

    async fn await_tickets(&mut self, booking: BookingRecord) -> Option<FlowEvent> {
        let mut updates = self.poller.as_ref()?.subscribe();
        let snapshot = updates
            .wait_for(|snap| !snap.tickets.is_empty() || snap.gave_up)
            .await
            .ok()?
            .clone();

        if snapshot.tickets.is_empty() {
            log::warn!(
                "Gave up waiting for tickets of booking {} after {} attempts",
                booking.id,
                snapshot.attempts
            );
            self.enter(CheckoutState::Succeeded {
                booking,
                phase: SuccessPhase::GaveUp,
            });
            return Some(FlowEvent::PollingGaveUp);
        }

        let card = TicketCard::new(&booking, self.store.selection(), &snapshot.tickets);
        log::info!(
            "Booking {} received {} ticket(s)",
            booking.id,
            snapshot.tickets.len()
        );
        self.store.clear();
        self.enter(CheckoutState::TicketReady { card: card.clone() });
        Some(FlowEvent::TicketIssued(card))
    }

    /// Every transition goes through here so the poller never outlives the
    /// state that started it.
    fn enter(&mut self, next: CheckoutState) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        self.state = next;
    }

    fn expect_selecting(&self) -> AppResult<()> {
        match self.state {
            CheckoutState::Selecting => Ok(()),
            _ => Err(AppError::ValidationError(format!(
                "Cannot change the selection while {}",
                self.state.name()
            ))),
        }
    }

    fn editable_selection(&mut self) -> AppResult<&mut BookingSelection> {
        self.store
            .selection_mut()
            .ok_or_else(|| AppError::ValidationError("Please choose a package first".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeBackend {
        create: Mutex<VecDeque<AppResult<CreateBookingResponse>>>,
        tickets: Mutex<VecDeque<Vec<Ticket>>>,
        ticket_calls: AtomicUsize,
    }

    impl FakeBackend {
        fn booking(self, json: &str) -> Self {
            self.create
                .lock()
                .unwrap()
                .push_back(Ok(serde_json::from_str(json).unwrap()));
            self
        }

        fn failing(self) -> Self {
            self.create.lock().unwrap().push_back(Err(AppError::ApiError {
                status: 409,
                message: "Sold out".to_string(),
            }));
            self
        }

        fn tickets(self, answers: Vec<Vec<Ticket>>) -> Self {
            self.tickets.lock().unwrap().extend(answers);
            self
        }
    }

    impl TicketSource for FakeBackend {
        fn tickets_for_booking<'a>(&'a self, _booking_id: &'a str) -> BoxFuture<'a, AppResult<Vec<Ticket>>> {
            async move {
                self.ticket_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.tickets.lock().unwrap().pop_front().unwrap_or_default())
            }
            .boxed()
        }
    }

    impl CheckoutBackend for FakeBackend {
        fn create_booking<'a>(
            &'a self,
            _request: &'a CreateBookingRequest,
        ) -> BoxFuture<'a, AppResult<CreateBookingResponse>> {
            async move {
                self.create
                    .lock()
                    .unwrap()
                    .pop_front()
                    .unwrap_or_else(|| Err(AppError::InternalError("unscripted".into())))
            }
            .boxed()
        }
    }

    const PAID: &str = r#"{"bookingId": "65f1c2ab9e12d3a4b5c6d7e8", "totalAmount": 2400000, "paymentQrString": "000201010212"}"#;

    fn settings() -> CheckoutSettings {
        CheckoutSettings {
            show_id: "s1".to_string(),
            max_quantity: 10,
            countdown_secs: 15,
            countdown_tick: Duration::from_secs(1),
            handoff_delay: Duration::from_millis(500),
            poll_interval: Duration::from_secs(2),
            poll_limits: PollLimits::UNBOUNDED,
        }
    }

    fn form() -> BookingForm {
        BookingForm {
            customer_name: "Nguyen A".to_string(),
            phone: "0901234567".to_string(),
            combo_id: "standard".to_string(),
            quantity: 2,
            seat_numbers: vec![],
        }
    }

    fn ticket(code: &str) -> Ticket {
        Ticket {
            id: format!("t-{code}"),
            booking_id: "65f1c2ab9e12d3a4b5c6d7e8".to_string(),
            ticket_code: code.to_string(),
            status: TicketStatus::Valid,
            issued_at: None,
        }
    }

    fn flow(backend: FakeBackend, settings: CheckoutSettings) -> (CheckoutFlow<FakeBackend>, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        (
            CheckoutFlow::new(backend.clone(), ComboCatalog::default(), settings),
            backend,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_checkout() {
        let backend = FakeBackend::default()
            .booking(PAID)
            .tickets(vec![vec![], vec![ticket("TK-001")]]);
        let (mut flow, backend) = flow(backend, settings());

        assert_eq!(flow.select(&form()).unwrap().total_price(), 2_400_000);
        flow.submit().await.unwrap();
        assert_eq!(flow.open_payment(), PaymentEntry::Show);
        assert!(matches!(
            flow.state(),
            CheckoutState::AwaitingPayment { payment: PaymentDisplay::Code { .. }, .. }
        ));

        flow.confirm_payment().unwrap();
        let mut countdown = Vec::new();
        loop {
            match flow.next_event().await {
                Some(FlowEvent::Countdown(n)) => countdown.push(n),
                Some(FlowEvent::PaymentConfirmed) => break,
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(countdown, (1..=14).rev().collect::<Vec<_>>());

        assert_eq!(
            flow.next_event().await,
            Some(FlowEvent::PollingStarted {
                booking_id: "65f1c2ab9e12d3a4b5c6d7e8".to_string()
            })
        );
        let Some(FlowEvent::TicketIssued(card)) = flow.next_event().await else {
            panic!("expected tickets");
        };
        assert_eq!(card.reference, "BK-C6D7E8");
        assert_eq!(card.package, "Standard");
        assert_eq!(card.ticket_codes, vec!["TK-001"]);
        assert_eq!(card.total_amount, 2_400_000);
        assert_eq!(backend.ticket_calls.load(Ordering::SeqCst), 2);

        assert!(flow.selection().is_none());
        assert_eq!(flow.next_event().await, None);

        // polling is over; no further queries
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.ticket_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_selection() {
        let (mut flow, _) = flow(FakeBackend::default().failing(), settings());
        flow.select(&form()).unwrap();

        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, AppError::ApiError { status: 409, .. }));
        assert_eq!(flow.state(), &CheckoutState::Selecting);
        assert_eq!(flow.selection().unwrap().customer_name, "Nguyen A");
    }

    #[test]
    fn test_payment_entry_guard() {
        let (mut flow, _) = flow(FakeBackend::default(), settings());
        flow.select(&form()).unwrap();
        assert_eq!(flow.open_payment(), PaymentEntry::Redirect);
        assert!(flow.selection().is_none());
        assert!(flow.confirm_payment().is_err());
    }

    #[tokio::test]
    async fn test_unusable_payment_blocks_confirmation() {
        let backend = FakeBackend::default().booking(r#"{"id": 7, "totalAmount": "1200000"}"#);
        let (mut flow, _) = flow(backend, settings());
        flow.select(&BookingForm { quantity: 1, ..form() }).unwrap();
        flow.submit().await.unwrap();

        assert!(flow.confirm_payment().is_err());
        assert_eq!(flow.state().name(), "awaiting_payment");
    }

    #[test]
    fn test_selection_edits() {
        let (mut flow, _) = flow(FakeBackend::default(), settings());
        assert!(flow.change_quantity(3).is_err());

        flow.select(&form()).unwrap();
        assert_eq!(flow.change_quantity(3).unwrap().total_price(), 3_600_000);
        assert_eq!(flow.change_combo("vip").unwrap().total_price(), 7_500_000);
        assert!(flow.change_quantity(11).is_err());
        assert!(flow.change_combo("gold").is_err());
        assert_eq!(flow.selection().unwrap().total_price(), 7_500_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_countdown_goes_straight_to_success() {
        let backend = FakeBackend::default().booking(PAID);
        let (mut flow, _) = flow(
            backend,
            CheckoutSettings {
                countdown_secs: 0,
                ..settings()
            },
        );
        flow.select(&form()).unwrap();
        flow.submit().await.unwrap();
        flow.confirm_payment().unwrap();
        assert!(matches!(
            flow.state(),
            CheckoutState::Succeeded { phase: SuccessPhase::Handoff, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandon_stops_polling() {
        let backend = FakeBackend::default().booking(PAID);
        let (mut flow, backend) = flow(
            backend,
            CheckoutSettings {
                countdown_secs: 0,
                ..settings()
            },
        );
        flow.select(&form()).unwrap();
        flow.submit().await.unwrap();
        flow.confirm_payment().unwrap();
        assert!(matches!(flow.next_event().await, Some(FlowEvent::PollingStarted { .. })));

        tokio::time::sleep(Duration::from_secs(5)).await;
        flow.abandon();
        let calls = backend.ticket_calls.load(Ordering::SeqCst);
        assert_eq!(calls, 3);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.ticket_calls.load(Ordering::SeqCst), calls);
        assert_eq!(flow.state(), &CheckoutState::Selecting);
        assert_eq!(flow.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gave_up_then_retry() {
        let backend = FakeBackend::default()
            .booking(PAID)
            .tickets(vec![vec![], vec![], vec![ticket("TK-001")]]);
        let (mut flow, _) = flow(
            backend,
            CheckoutSettings {
                countdown_secs: 0,
                poll_limits: PollLimits {
                    max_attempts: Some(2),
                    max_duration: None,
                },
                ..settings()
            },
        );
        flow.select(&form()).unwrap();
        flow.submit().await.unwrap();
        flow.confirm_payment().unwrap();
        flow.next_event().await;

        assert_eq!(flow.next_event().await, Some(FlowEvent::PollingGaveUp));
        assert_eq!(flow.next_event().await, None);

        assert!(matches!(flow.retry_polling(), Ok(FlowEvent::PollingStarted { .. })));
        assert!(matches!(flow.next_event().await, Some(FlowEvent::TicketIssued(_))));
        assert!(flow.retry_polling().is_err());
    }
}
