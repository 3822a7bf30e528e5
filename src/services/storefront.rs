use crate::error::AppResult;
use crate::external::ApiClient;
use crate::models::*;
use crate::services::{BookingService, TicketService};
use crate::tasks::TicketSource;
use crate::workflow::CheckoutBackend;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// Live backend for the visitor checkout.
#[derive(Clone)]
pub struct StorefrontBackend {
    bookings: BookingService,
    tickets: TicketService,
}

impl StorefrontBackend {
    pub fn new(api: ApiClient) -> Self {
        Self {
            bookings: BookingService::new(api.clone()),
            tickets: TicketService::new(api),
        }
    }
}

impl TicketSource for StorefrontBackend {
    fn tickets_for_booking<'a>(&'a self, booking_id: &'a str) -> BoxFuture<'a, AppResult<Vec<Ticket>>> {
        self.tickets.for_booking(booking_id).boxed()
    }
}

impl CheckoutBackend for StorefrontBackend {
    fn create_booking<'a>(
        &'a self,
        request: &'a CreateBookingRequest,
    ) -> BoxFuture<'a, AppResult<CreateBookingResponse>> {
        self.bookings.create(request).boxed()
    }
}
