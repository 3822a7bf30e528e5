use crate::error::{AppError, AppResult};
use crate::models::common::{amount, id_string, opt_id_string};
use crate::models::{Combo, ComboCatalog, line_total};
use crate::utils::validate_phone;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Raw input of the selection step, before validation.
#[derive(Debug, Clone, Default)]
pub struct BookingForm {
    pub customer_name: String,
    pub phone: String,
    pub combo_id: String,
    pub quantity: u32,
    pub seat_numbers: Vec<String>,
}

impl BookingForm {
    pub fn validate(&self, catalog: &ComboCatalog, max_quantity: u32) -> AppResult<BookingSelection> {
        let customer_name = self.customer_name.trim();
        if customer_name.is_empty() {
            return Err(AppError::ValidationError("Customer name is required".to_string()));
        }
        let phone = validate_phone(&self.phone)?;
        if self.combo_id.trim().is_empty() {
            return Err(AppError::ValidationError("Please choose a package".to_string()));
        }
        let combo = catalog.get(self.combo_id.trim()).ok_or_else(|| {
            AppError::ValidationError(format!("Unknown package: {}", self.combo_id))
        })?;
        if self.quantity < 1 || self.quantity > max_quantity {
            return Err(AppError::ValidationError(format!(
                "Quantity must be between 1 and {max_quantity}"
            )));
        }

        let mut selection = BookingSelection::new(combo, self.quantity)?;
        selection.customer_name = customer_name.to_string();
        selection.phone = phone;
        selection.seat_numbers = self
            .seat_numbers
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(selection)
    }
}

/// The visitor's in-progress choice. Client-only, never persisted.
///
/// `total_price` is derived from the combo's unit price and the quantity and
/// can only change through [`BookingSelection::set_combo`] or
/// [`BookingSelection::set_quantity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingSelection {
    pub customer_name: String,
    pub phone: String,
    pub seat_numbers: Vec<String>,
    combo_id: String,
    combo_name: String,
    ticket_type_id: String,
    unit_price: u64,
    quantity: u32,
    total_price: u64,
}

impl BookingSelection {
    pub fn new(combo: &Combo, quantity: u32) -> AppResult<Self> {
        Ok(Self {
            customer_name: String::new(),
            phone: String::new(),
            seat_numbers: Vec::new(),
            combo_id: combo.id.clone(),
            combo_name: combo.name.clone(),
            ticket_type_id: combo.backend_ticket_type_id().to_string(),
            unit_price: combo.unit_price,
            quantity,
            total_price: line_total(combo.unit_price, quantity)?,
        })
    }

    pub fn set_combo(&mut self, combo: &Combo) -> AppResult<()> {
        let total_price = line_total(combo.unit_price, self.quantity)?;
        self.combo_id = combo.id.clone();
        self.combo_name = combo.name.clone();
        self.ticket_type_id = combo.backend_ticket_type_id().to_string();
        self.unit_price = combo.unit_price;
        self.total_price = total_price;
        Ok(())
    }

    pub fn set_quantity(&mut self, quantity: u32) -> AppResult<()> {
        if quantity == 0 {
            return Err(AppError::ValidationError("Quantity must be at least 1".to_string()));
        }
        self.total_price = line_total(self.unit_price, quantity)?;
        self.quantity = quantity;
        Ok(())
    }

    pub fn combo_id(&self) -> &str {
        &self.combo_id
    }

    pub fn combo_name(&self) -> &str {
        &self.combo_name
    }

    pub fn ticket_type_id(&self) -> &str {
        &self.ticket_type_id
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn total_price(&self) -> u64 {
        self.total_price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub show_id: String,
    pub ticket_type_id: String,
    pub customer_name: String,
    pub phone: String,
    pub quantity: u32,
}

impl CreateBookingRequest {
    pub fn from_selection(show_id: &str, selection: &BookingSelection) -> Self {
        Self {
            show_id: show_id.to_string(),
            ticket_type_id: selection.ticket_type_id().to_string(),
            customer_name: selection.customer_name.clone(),
            phone: selection.phone.clone(),
            quantity: selection.quantity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    #[serde(alias = "id", alias = "_id", deserialize_with = "id_string")]
    pub booking_id: String,
    #[serde(deserialize_with = "amount")]
    pub total_amount: u64,
    #[serde(default)]
    pub payment_qr_image: Option<String>,
    #[serde(default)]
    pub payment_qr_string: Option<String>,
    #[serde(default)]
    pub payment_qr_url: Option<String>,
}

impl CreateBookingResponse {
    pub fn payment_artifact(&self) -> PaymentArtifact {
        PaymentArtifact {
            qr_image: self.payment_qr_image.clone(),
            qr_string: self.payment_qr_string.clone(),
            qr_url: self.payment_qr_url.clone(),
        }
    }
}

/// Whatever the backend handed out as the means to pay for one booking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaymentArtifact {
    pub qr_image: Option<String>,
    pub qr_string: Option<String>,
    pub qr_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSummary {
    pub title: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTypeSummary {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    #[serde(alias = "_id", alias = "bookingId", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub show_id: Option<String>,
    #[serde(default, deserialize_with = "opt_id_string")]
    pub ticket_type_id: Option<String>,
    pub customer_name: String,
    pub phone: String,
    pub quantity: u32,
    #[serde(deserialize_with = "amount")]
    pub total_amount: u64,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub show: Option<ShowSummary>,
    #[serde(default)]
    pub ticket_type: Option<TicketTypeSummary>,
}

impl BookingRecord {
    /// Local record right after creation; the amount is the server's, the
    /// timestamps are unknown until the backend is read again.
    pub fn from_created(request: &CreateBookingRequest, response: &CreateBookingResponse) -> Self {
        Self {
            id: response.booking_id.clone(),
            show_id: Some(request.show_id.clone()),
            ticket_type_id: Some(request.ticket_type_id.clone()),
            customer_name: request.customer_name.clone(),
            phone: request.phone.clone(),
            quantity: request.quantity,
            total_amount: response.total_amount,
            payment_status: PaymentStatus::Pending,
            payment_time: None,
            created_at: None,
            show: None,
            ticket_type: None,
        }
    }

    pub fn counts_toward_stock(&self) -> bool {
        self.payment_status != PaymentStatus::Failed
    }
}
