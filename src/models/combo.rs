use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// A fixed, named ticket package offered by the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combo {
    pub id: String,
    pub name: String,
    pub unit_price: u64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
    /// Backend ticket type the combo is sold as; falls back to the combo id.
    #[serde(default)]
    pub ticket_type_id: Option<String>,
}

impl Combo {
    pub fn backend_ticket_type_id(&self) -> &str {
        self.ticket_type_id.as_deref().unwrap_or(&self.id)
    }
}

pub fn default_combos() -> Vec<Combo> {
    fn combo(id: &str, name: &str, unit_price: u64, popular: bool, features: &[&str]) -> Combo {
        Combo {
            id: id.to_string(),
            name: name.to_string(),
            unit_price,
            features: features.iter().map(|f| f.to_string()).collect(),
            popular,
            ticket_type_id: None,
        }
    }

    vec![
        combo(
            "standard",
            "Standard",
            1_200_000,
            false,
            &["General admission", "Standing area"],
        ),
        combo(
            "vip",
            "VIP",
            2_500_000,
            true,
            &["Reserved seating", "Fast-lane entry", "Welcome drink"],
        ),
        combo(
            "premium",
            "Premium",
            4_000_000,
            false,
            &["Front-row seating", "Meet & greet", "Merchandise pack"],
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct ComboCatalog {
    combos: Vec<Combo>,
}

impl Default for ComboCatalog {
    fn default() -> Self {
        Self::new(default_combos())
    }
}

impl ComboCatalog {
    pub fn new(combos: Vec<Combo>) -> Self {
        Self { combos }
    }

    pub fn get(&self, id: &str) -> Option<&Combo> {
        self.combos.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combo> {
        self.combos.iter()
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    pub fn price_for(&self, combo_id: &str, quantity: u32) -> AppResult<u64> {
        let combo = self
            .get(combo_id)
            .ok_or_else(|| AppError::ValidationError(format!("Unknown package: {combo_id}")))?;
        line_total(combo.unit_price, quantity)
    }
}

/// unit price × quantity; overflow is reported rather than wrapped.
pub fn line_total(unit_price: u64, quantity: u32) -> AppResult<u64> {
    unit_price
        .checked_mul(u64::from(quantity))
        .ok_or_else(|| AppError::ValidationError("Total price is out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_for_every_quantity() {
        let catalog = ComboCatalog::default();
        for combo in catalog.iter() {
            for q in 1..=10u32 {
                assert_eq!(
                    catalog.price_for(&combo.id, q).unwrap(),
                    combo.unit_price * u64::from(q)
                );
            }
        }
        assert_eq!(catalog.price_for("standard", 2).unwrap(), 2_400_000);
    }

    #[test]
    fn test_unknown_combo() {
        let catalog = ComboCatalog::default();
        assert!(matches!(
            catalog.price_for("backstage", 1),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(line_total(u64::MAX, 2).is_err());
    }

    #[test]
    fn test_ticket_type_fallback() {
        let catalog = ComboCatalog::default();
        let vip = catalog.get("vip").unwrap();
        assert!(vip.popular);
        assert_eq!(vip.backend_ticket_type_id(), "vip");
    }
}
