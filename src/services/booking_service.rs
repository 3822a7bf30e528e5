use crate::error::AppResult;
use crate::external::{ApiClient, NO_QUERY};
use crate::models::*;
use crate::tasks::BookingFeed;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use std::collections::BTreeMap;

/// Dashboard figures derived from a booking list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingStats {
    pub total_bookings: usize,
    pub by_status: BTreeMap<String, usize>,
    pub paid_revenue: u64,
    pub tickets_sold: u64,
}

#[derive(Clone)]
pub struct BookingService {
    api: ApiClient,
}

impl BookingService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create(&self, request: &CreateBookingRequest) -> AppResult<CreateBookingResponse> {
        let response: CreateBookingResponse = self.api.post("/bookings", request).await?;
        log::info!(
            "Booking {} created: {} x{} for {}",
            response.booking_id,
            request.ticket_type_id,
            request.quantity,
            response.total_amount
        );
        Ok(response)
    }

    pub async fn list(&self) -> AppResult<Listing<BookingRecord>> {
        self.api.get_list("/bookings", NO_QUERY).await
    }

    pub async fn get(&self, booking_id: &str) -> AppResult<BookingRecord> {
        self.api.get(&format!("/bookings/{booking_id}")).await
    }
}

impl BookingFeed for BookingService {
    fn latest_bookings(&self) -> BoxFuture<'_, AppResult<Vec<BookingRecord>>> {
        async move { self.list().await.map(Listing::into_items) }.boxed()
    }
}

/// Case-insensitive match on customer name, phone or booking id.
pub fn search_bookings<'a>(bookings: &'a [BookingRecord], query: &str) -> Vec<&'a BookingRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return bookings.iter().collect();
    }
    bookings
        .iter()
        .filter(|b| {
            b.customer_name.to_lowercase().contains(&needle)
                || b.phone.contains(&needle)
                || b.id.to_lowercase().contains(&needle)
        })
        .collect()
}

pub fn booking_stats(bookings: &[BookingRecord]) -> BookingStats {
    let mut stats = BookingStats {
        total_bookings: bookings.len(),
        ..BookingStats::default()
    };
    for booking in bookings {
        *stats
            .by_status
            .entry(booking.payment_status.to_string())
            .or_default() += 1;
        if booking.payment_status == PaymentStatus::Paid {
            stats.paid_revenue = stats.paid_revenue.saturating_add(booking.total_amount);
            stats.tickets_sold = stats.tickets_sold.saturating_add(u64::from(booking.quantity));
        }
    }
    stats
}

/// Seats already claimed for one show and ticket type. Failed bookings do
/// not hold stock.
pub fn booked_quantity(bookings: &[BookingRecord], show_id: &str, ticket_type_id: &str) -> u64 {
    bookings
        .iter()
        .filter(|b| b.counts_toward_stock())
        .filter(|b| b.show_id.as_deref() == Some(show_id))
        .filter(|b| b.ticket_type_id.as_deref() == Some(ticket_type_id))
        .map(|b| u64::from(b.quantity))
        .sum()
}
