use crate::error::{AppError, AppResult};
use crate::models::common::{amount, id_string};
use crate::utils::parse_hex_color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketType {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub show_id: String,
    pub name: String,
    pub color: String,
    #[serde(deserialize_with = "amount")]
    pub price: u64,
    pub total_quantity: u32,
    pub remaining_quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTypeInput {
    pub show_id: String,
    pub name: String,
    pub color: String,
    pub price: u64,
    pub total_quantity: u32,
}

impl From<&TicketType> for TicketTypeInput {
    fn from(t: &TicketType) -> Self {
        Self {
            show_id: t.show_id.clone(),
            name: t.name.clone(),
            color: t.color.clone(),
            price: t.price,
            total_quantity: t.total_quantity,
        }
    }
}

impl TicketTypeInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.show_id.trim().is_empty() {
            return Err(AppError::ValidationError("Show is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Ticket type name is required".to_string(),
            ));
        }
        parse_hex_color(&self.color)?;
        if self.total_quantity == 0 {
            return Err(AppError::ValidationError(
                "Total quantity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_color_and_quantity() {
        let mut input = TicketTypeInput {
            show_id: "1".to_string(),
            name: "VIP".to_string(),
            color: "#d4af37".to_string(),
            price: 2_500_000,
            total_quantity: 200,
        };
        assert!(input.validate().is_ok());

        input.color = "gold".to_string();
        assert!(input.validate().is_err());

        input.color = "#fff".to_string();
        input.total_quantity = 0;
        assert!(input.validate().is_err());
    }
}
