use crate::error::{AppError, AppResult};
use crate::external::{ApiClient, NO_QUERY};
use crate::models::*;
use crate::services::booking_service::{BookingService, booked_quantity};

#[derive(Clone)]
pub struct TicketTypeService {
    api: ApiClient,
    bookings: BookingService,
}

impl TicketTypeService {
    pub fn new(api: ApiClient, bookings: BookingService) -> Self {
        Self { api, bookings }
    }

    pub async fn list(&self, show_id: Option<&str>) -> AppResult<Listing<TicketType>> {
        match show_id {
            Some(show_id) => {
                self.api
                    .get_list("/ticket-types", &[("showId", show_id)])
                    .await
            }
            None => self.api.get_list("/ticket-types", NO_QUERY).await,
        }
    }

    pub async fn create(&self, input: &TicketTypeInput) -> AppResult<TicketType> {
        input.validate()?;
        let created: TicketType = self.api.post("/ticket-types", input).await?;
        log::info!("Ticket type {} created for show {}", created.name, created.show_id);
        Ok(created)
    }

    /// Full replace. Refused locally when the new total would fall below
    /// what has already been booked.
    pub async fn update(&self, ticket_type_id: &str, input: &TicketTypeInput) -> AppResult<TicketType> {
        input.validate()?;
        let bookings = self.bookings.list().await?.into_items();
        ensure_quantity_floor(&bookings, ticket_type_id, input)?;

        let updated: TicketType = self
            .api
            .put(&format!("/ticket-types/{ticket_type_id}"), input)
            .await?;
        log::info!("Ticket type {} updated", updated.id);
        Ok(updated)
    }

    pub async fn delete(&self, ticket_type_id: &str) -> AppResult<()> {
        self.api
            .delete(&format!("/ticket-types/{ticket_type_id}"))
            .await?;
        log::info!("Ticket type {ticket_type_id} deleted");
        Ok(())
    }
}

pub fn ensure_quantity_floor(
    bookings: &[BookingRecord],
    ticket_type_id: &str,
    input: &TicketTypeInput,
) -> AppResult<()> {
    let booked = booked_quantity(bookings, &input.show_id, ticket_type_id);
    if u64::from(input.total_quantity) < booked {
        return Err(AppError::ValidationError(format!(
            "Total quantity cannot be lower than the {booked} ticket(s) already booked"
        )));
    }
    Ok(())
}
