use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use stockbook_core::{DomainError, DomainResult, LotNumber, MovementId, ProductId, StorageFacilityId};

/// Direction of a stock movement.
///
/// A closed two-valued tag; the stored quantity is always a magnitude and
/// the sign comes from here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementAction {
    Inbound,
    Outbound,
}

impl MovementAction {
    /// Decode the legacy storage literal. Returns `None` for anything else.
    ///
    /// The persisted rows keep the original system's free-text labels; this
    /// mapping is applied exactly once, at the storage boundary.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "入庫" => Some(Self::Inbound),
            "出庫" => Some(Self::Outbound),
            _ => None,
        }
    }

    /// The legacy storage literal for this action.
    pub fn wire_label(&self) -> &'static str {
        match self {
            Self::Inbound => "入庫",
            Self::Outbound => "出庫",
        }
    }

    /// +1 for inbound, -1 for outbound.
    pub fn sign(&self) -> i64 {
        match self {
            Self::Inbound => 1,
            Self::Outbound => -1,
        }
    }
}

/// One recorded unit of stock entering or leaving a location.
///
/// Movements are immutable once written; corrections are made by appending
/// compensating movements, never by editing history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    /// Denormalized copy of the product name as known at recording time.
    pub product_name: String,
    pub storage_facility_id: Option<StorageFacilityId>,
    pub lot_number: Option<LotNumber>,
    pub action: MovementAction,
    /// Non-negative magnitude; sign is implied by `action`.
    pub quantity: i64,
    pub occurred_at: NaiveDate,
}

/// A movement as submitted for recording, before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub product_id: ProductId,
    pub product_name: String,
    pub storage_facility_id: Option<StorageFacilityId>,
    pub lot_number: Option<LotNumber>,
    pub action: MovementAction,
    pub quantity: i64,
    pub occurred_at: NaiveDate,
}

impl MovementDraft {
    /// Enforce the write-time sign invariant: quantities are magnitudes.
    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity < 0 {
            return Err(DomainError::validation(
                "quantity must be a non-negative magnitude; direction comes from action",
            ));
        }
        Ok(())
    }

    /// Bind the draft to a store-assigned id.
    pub fn into_movement(self, id: MovementId) -> StockMovement {
        StockMovement {
            id,
            product_id: self.product_id,
            product_name: self.product_name,
            storage_facility_id: self.storage_facility_id,
            lot_number: self.lot_number,
            action: self.action,
            quantity: self.quantity,
            occurred_at: self.occurred_at,
        }
    }
}
