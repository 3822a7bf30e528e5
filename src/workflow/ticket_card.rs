use crate::models::{BookingRecord, BookingSelection, Ticket};
use crate::utils::format_vnd;
use serde::Serialize;
use std::fmt::Write;

const REFERENCE_LEN: usize = 6;

/// Confirmation shown once tickets are issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketCard {
    pub booking_id: String,
    pub reference: String,
    pub customer_name: String,
    pub package: String,
    pub quantity: u32,
    pub seat_numbers: Vec<String>,
    /// Amount charged by the server, not the local estimate.
    pub total_amount: u64,
    pub ticket_codes: Vec<String>,
}

impl TicketCard {
    pub fn new(booking: &BookingRecord, selection: Option<&BookingSelection>, tickets: &[Ticket]) -> Self {
        let package = selection
            .map(|s| s.combo_name().to_string())
            .or_else(|| booking.ticket_type.as_ref().map(|t| t.name.clone()))
            .unwrap_or_default();

        Self {
            booking_id: booking.id.clone(),
            reference: booking_reference(&booking.id),
            customer_name: booking.customer_name.clone(),
            package,
            quantity: booking.quantity,
            seat_numbers: selection.map(|s| s.seat_numbers.clone()).unwrap_or_default(),
            total_amount: booking.total_amount,
            ticket_codes: tickets.iter().map(|t| t.ticket_code.clone()).collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Booking   {}", self.reference);
        let _ = writeln!(out, "Customer  {}", self.customer_name);
        let _ = writeln!(out, "Package   {} x{}", self.package, self.quantity);
        if !self.seat_numbers.is_empty() {
            let _ = writeln!(out, "Seats     {}", self.seat_numbers.join(", "));
        }
        let _ = writeln!(out, "Total     {}", format_vnd(self.total_amount));
        for code in &self.ticket_codes {
            let _ = writeln!(out, "Ticket    {code}");
        }
        out
    }
}

/// `BK-` plus the last six alphanumerics of the id, uppercased and
/// left-padded with `0`.
pub fn booking_reference(booking_id: &str) -> String {
    let chars: Vec<char> = booking_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let tail: String = chars[chars.len().saturating_sub(REFERENCE_LEN)..].iter().collect();
    format!("BK-{tail:0>width$}", width = REFERENCE_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComboCatalog, PaymentStatus, TicketStatus, TicketTypeSummary};

    fn booking(id: &str) -> BookingRecord {
        BookingRecord {
            id: id.to_string(),
            show_id: Some("s1".to_string()),
            ticket_type_id: Some("vip".to_string()),
            customer_name: "Nguyen A".to_string(),
            phone: "0901234567".to_string(),
            quantity: 2,
            total_amount: 5_000_000,
            payment_status: PaymentStatus::Paid,
            payment_time: None,
            created_at: None,
            show: None,
            ticket_type: Some(TicketTypeSummary {
                name: "VIP".to_string(),
                color: None,
            }),
        }
    }

    #[test]
    fn test_reference() {
        assert_eq!(booking_reference("65f1c2ab9e12d3a4b5c6d7e8"), "BK-C6D7E8");
        assert_eq!(booking_reference("42"), "BK-000042");
        assert_eq!(booking_reference("bk_a-1"), "BK-00BKA1");
        assert_eq!(booking_reference(""), "BK-000000");
    }

    #[test]
    fn test_card_from_selection() {
        let catalog = ComboCatalog::default();
        let mut selection = catalog
            .get("vip")
            .map(|c| BookingSelection::new(c, 2).unwrap())
            .unwrap();
        selection.seat_numbers = vec!["A1".to_string(), "A2".to_string()];
        let tickets = vec![Ticket {
            id: "t1".to_string(),
            booking_id: "123abc".to_string(),
            ticket_code: "TK-001".to_string(),
            status: TicketStatus::Valid,
            issued_at: None,
        }];

        let card = TicketCard::new(&booking("123abc"), Some(&selection), &tickets);
        assert_eq!(card.reference, "BK-123ABC");
        assert_eq!(card.package, selection.combo_name());
        assert_eq!(card.total_amount, 5_000_000);

        let text = card.render();
        assert!(text.contains("Seats     A1, A2"));
        assert!(text.contains("Ticket    TK-001"));
    }

    #[test]
    fn test_card_without_selection_uses_ticket_type() {
        let card = TicketCard::new(&booking("9"), None, &[]);
        assert_eq!(card.package, "VIP");
        assert!(card.seat_numbers.is_empty());
        assert!(!card.render().contains("Seats"));
    }
}
