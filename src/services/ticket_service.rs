use crate::error::AppResult;
use crate::external::{ApiClient, NO_QUERY};
use crate::models::*;
use crate::tasks::TicketSource;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    CheckedIn(Ticket),
    AlreadyUsed(Ticket),
}

impl CheckInOutcome {
    pub fn ticket(&self) -> &Ticket {
        match self {
            CheckInOutcome::CheckedIn(t) | CheckInOutcome::AlreadyUsed(t) => t,
        }
    }
}

#[derive(Clone)]
pub struct TicketService {
    api: ApiClient,
}

impl TicketService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> AppResult<Listing<Ticket>> {
        self.api.get_list("/tickets", NO_QUERY).await
    }

    /// Tickets issued for one booking; empty until the backend issues them.
    pub async fn for_booking(&self, booking_id: &str) -> AppResult<Vec<Ticket>> {
        let listing: Listing<Ticket> = self
            .api
            .get_list("/tickets", &[("bookingId", booking_id)])
            .await?;
        Ok(listing
            .into_items()
            .into_iter()
            .filter(|t| t.booking_id == booking_id)
            .collect())
    }

    pub async fn get(&self, ticket_id: &str) -> AppResult<Ticket> {
        self.api.get(&format!("/tickets/{ticket_id}")).await
    }

    /// 核销门票：已使用的票直接返回，不再请求更新
    pub async fn check_in(&self, ticket_id: &str) -> AppResult<CheckInOutcome> {
        let ticket = self.get(ticket_id).await?;
        if ticket.status == TicketStatus::Used {
            log::info!("Ticket {} already checked in", ticket.ticket_code);
            return Ok(CheckInOutcome::AlreadyUsed(ticket));
        }

        let updated: Ticket = self
            .api
            .patch(
                &format!("/tickets/{ticket_id}"),
                &UpdateTicketStatusRequest {
                    status: TicketStatus::Used,
                },
            )
            .await?;
        log::info!("Ticket {} checked in", updated.ticket_code);
        Ok(CheckInOutcome::CheckedIn(updated))
    }
}

impl TicketSource for TicketService {
    fn tickets_for_booking<'a>(&'a self, booking_id: &'a str) -> BoxFuture<'a, AppResult<Vec<Ticket>>> {
        self.for_booking(booking_id).boxed()
    }
}
