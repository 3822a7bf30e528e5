use crate::error::{AppError, AppResult};
use crate::models::{BookingRecord, BookingSelection, PaymentArtifact};

/// In-memory holder of the visitor's current booking attempt.
///
/// Owned by one checkout flow; nothing here is persisted or shared.
#[derive(Debug, Default)]
pub struct BookingSessionStore {
    selection: Option<BookingSelection>,
    booking: Option<BookingRecord>,
    payment: Option<PaymentArtifact>,
}

impl BookingSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over with a fresh selection; any earlier booking is forgotten.
    pub fn begin(&mut self, selection: BookingSelection) -> &BookingSelection {
        self.booking = None;
        self.payment = None;
        self.selection.insert(selection)
    }

    pub fn selection(&self) -> Option<&BookingSelection> {
        self.selection.as_ref()
    }

    /// Edit the selection while it has not been submitted yet.
    pub fn selection_mut(&mut self) -> Option<&mut BookingSelection> {
        if self.booking.is_some() {
            return None;
        }
        self.selection.as_mut()
    }

    pub fn attach_booking(&mut self, booking: BookingRecord, payment: PaymentArtifact) -> AppResult<()> {
        if self.selection.is_none() {
            return Err(AppError::ValidationError(
                "No booking selection in progress".to_string(),
            ));
        }
        self.booking = Some(booking);
        self.payment = Some(payment);
        Ok(())
    }

    pub fn booking(&self) -> Option<&BookingRecord> {
        self.booking.as_ref()
    }

    pub fn payment(&self) -> Option<&PaymentArtifact> {
        self.payment.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.selection.is_some()
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.booking = None;
        self.payment = None;
    }
}
