//! Mutation requests and the ledger's acknowledgement

use super::payload::{
    ActionType, KeepPayload, Leftover, MadePayload, MadeResult, MaterialLine, UsePayload,
    WastePayload,
};
use crate::error::{AppError, AppResult};
use crate::lot::{LotId, parent_lot_id};
use crate::order::UseType;
use serde::{Deserialize, Serialize};

// ============================================================================
// POST action
// ============================================================================

/// Lot an action is recorded against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTarget<P> {
    pub factory_code: String,
    pub lot_id: String,
    pub flavor_id: String,
    pub payload: P,
}

impl<P> ActionTarget<P> {
    pub fn new(
        factory_code: impl Into<String>,
        lot_id: impl Into<String>,
        flavor_id: impl Into<String>,
        payload: P,
    ) -> Self {
        Self {
            factory_code: factory_code.into(),
            lot_id: lot_id.into(),
            flavor_id: flavor_id.into(),
            payload,
        }
    }

    fn validate_target(&self) -> AppResult<()> {
        for (field, value) in [
            ("factory_code", &self.factory_code),
            ("lot_id", &self.lot_id),
            ("flavor_id", &self.flavor_id),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::required(field));
            }
        }
        Ok(())
    }
}

/// Body of `POST action`, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionBody {
    #[serde(rename = "KEEP")]
    Keep(ActionTarget<KeepPayload>),
    #[serde(rename = "USE")]
    Use(ActionTarget<UsePayload>),
    #[serde(rename = "WASTE")]
    Waste(ActionTarget<WastePayload>),
    #[serde(rename = "MADE_SPLIT")]
    MadeSplit(ActionTarget<MadePayload>),
}

impl ActionBody {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Keep(_) => ActionType::Keep,
            Self::Use(_) => ActionType::Use,
            Self::Waste(_) => ActionType::Waste,
            Self::MadeSplit(_) => ActionType::MadeSplit,
        }
    }

    fn parts(&self) -> (&str, &str, &str) {
        match self {
            Self::Keep(t) => (&t.factory_code, &t.lot_id, &t.flavor_id),
            Self::Use(t) => (&t.factory_code, &t.lot_id, &t.flavor_id),
            Self::Waste(t) => (&t.factory_code, &t.lot_id, &t.flavor_id),
            Self::MadeSplit(t) => (&t.factory_code, &t.lot_id, &t.flavor_id),
        }
    }

    pub fn factory_code(&self) -> &str {
        self.parts().0
    }

    pub fn lot_id(&self) -> &str {
        self.parts().1
    }

    pub fn flavor_id(&self) -> &str {
        self.parts().2
    }

    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::Keep(t) => {
                t.validate_target()?;
                t.payload.validate()
            }
            Self::Use(t) => {
                t.validate_target()?;
                t.payload.validate()
            }
            Self::Waste(t) => {
                t.validate_target()?;
                t.payload.validate()
            }
            Self::MadeSplit(t) => {
                t.validate_target()?;
                t.payload.validate()?;
                match &t.payload.split_lot_id {
                    Some(split) if parent_lot_id(split) != Some(t.lot_id.as_str()) => {
                        Err(AppError::invalid_lot_id(split.clone())
                            .with_detail("parent_lot_id", t.lot_id.clone()))
                    }
                    _ => Ok(()),
                }
            }
        }
    }
}

// ============================================================================
// POST orders-create
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderLine {
    pub flavor_id: String,
    pub use_type: UseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_code: Option<String>,
    /// 0 for OEM lines
    pub packs: u32,
    pub required_grams: f64,
    #[serde(default)]
    pub oem_partner: Option<String>,
}

/// Body of `POST orders-create`; `lot_id` is minted by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub factory_code: String,
    pub lot_id: String,
    /// `yyyy-MM-dd`
    pub ordered_at: String,
    #[serde(default)]
    pub deadline_at: Option<String>,
    pub lines: Vec<CreateOrderLine>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.factory_code.trim().is_empty() {
            return Err(AppError::required("factory_code"));
        }
        LotId::parse(&self.lot_id)
            .filter(|lot| !lot.is_child() && lot.factory_code == self.factory_code)
            .ok_or_else(|| AppError::invalid_lot_id(self.lot_id.clone()))?;
        if self.lines.is_empty() {
            return Err(AppError::new(crate::error::ErrorCode::OrderHasNoLines));
        }
        for line in &self.lines {
            if line.flavor_id.trim().is_empty() {
                return Err(AppError::required("flavor_id"));
            }
            if !(line.required_grams.is_finite() && line.required_grams > 0.0) {
                return Err(AppError::out_of_range(
                    "required_grams",
                    "required grams must be positive",
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// POST onsite-make
// ============================================================================

/// Body of `POST onsite-make`: unscheduled production on the floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnsiteMakeRequest {
    pub factory_code: String,
    pub flavor_id: String,
    pub use_type: UseType,
    pub use_code: String,
    pub packs: u32,
    pub produced_grams: f64,
    /// `yyyy-MM-dd`
    pub manufactured_at: String,
    #[serde(default)]
    pub oem_partner: Option<String>,
    #[serde(default)]
    pub result: MadeResult,
    pub leftover: Option<Leftover>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<MaterialLine>,
    /// Lot of the archived order the ledger synthesizes
    pub generated_lot_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
}

impl OnsiteMakeRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.use_code.trim().is_empty() {
            return Err(AppError::required("use_code"));
        }
        if self.use_type.is_oem() && self.oem_partner.as_deref().is_none_or(|p| p.trim().is_empty())
        {
            return Err(AppError::required("oem_partner"));
        }
        if !(self.produced_grams.is_finite() && self.produced_grams > 0.0) {
            return Err(AppError::out_of_range(
                "produced_grams",
                "produced grams must be positive",
            ));
        }
        LotId::parse(&self.generated_lot_id)
            .filter(|lot| !lot.is_child() && lot.factory_code == self.factory_code)
            .ok_or_else(|| AppError::invalid_lot_id(self.generated_lot_id.clone()))?;
        match (self.result, &self.leftover) {
            (MadeResult::Extra, Some(leftover)) => leftover.validate(),
            (MadeResult::Extra, None) => Err(AppError::required("leftover")),
            (MadeResult::Used, Some(_)) => Err(AppError::validation(
                "leftover is only sent when the result is extra",
            )),
            (MadeResult::Used, None) => Ok(()),
        }
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A state change, tagged by the ledger path it is posted to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "path")]
pub enum Mutation {
    #[serde(rename = "action")]
    Action(ActionBody),
    #[serde(rename = "orders-create")]
    CreateOrder(CreateOrderRequest),
    #[serde(rename = "onsite-make")]
    OnsiteMake(OnsiteMakeRequest),
}

impl Mutation {
    /// Ledger path this mutation is posted to
    pub fn path(&self) -> &'static str {
        match self {
            Self::Action(_) => "action",
            Self::CreateOrder(_) => "orders-create",
            Self::OnsiteMake(_) => "onsite-make",
        }
    }

    pub fn factory_code(&self) -> &str {
        match self {
            Self::Action(body) => body.factory_code(),
            Self::CreateOrder(req) => &req.factory_code,
            Self::OnsiteMake(req) => &req.factory_code,
        }
    }

    /// Lot the mutation targets or creates
    pub fn lot_id(&self) -> &str {
        match self {
            Self::Action(body) => body.lot_id(),
            Self::CreateOrder(req) => &req.lot_id,
            Self::OnsiteMake(req) => &req.generated_lot_id,
        }
    }

    /// Short label for logs: the path, or the action type
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Action(body) => body.action_type().as_str(),
            other => other.path(),
        }
    }

    /// Pre-submit validation; failures are never sent
    pub fn validate(&self) -> AppResult<()> {
        match self {
            Self::Action(body) => body.validate(),
            Self::CreateOrder(req) => req.validate(),
            Self::OnsiteMake(req) => req.validate(),
        }
    }
}

impl From<ActionBody> for Mutation {
    fn from(body: ActionBody) -> Self {
        Self::Action(body)
    }
}

impl From<CreateOrderRequest> for Mutation {
    fn from(req: CreateOrderRequest) -> Self {
        Self::CreateOrder(req)
    }
}

impl From<OnsiteMakeRequest> for Mutation {
    fn from(req: OnsiteMakeRequest) -> Self {
        Self::OnsiteMake(req)
    }
}

/// What is actually posted: the mutation plus its idempotency key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationEnvelope {
    #[serde(flatten)]
    pub mutation: Mutation,
    pub request_id: String,
}

impl MutationEnvelope {
    pub fn new(mutation: Mutation, request_id: impl Into<String>) -> Self {
        Self {
            mutation,
            request_id: request_id.into(),
        }
    }
}

/// Ledger reply to a mutation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MutationAck {
    pub ok: bool,
    /// The request id had already been applied; no new effect
    #[serde(default)]
    pub duplicate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Authoritative lot id of the created order or split child
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<String>,
}

impl MutationAck {
    pub fn applied(lot_id: Option<String>) -> Self {
        Self {
            ok: true,
            duplicate: false,
            message: None,
            lot_id,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            duplicate: false,
            message: Some(message.into()),
            lot_id: None,
        }
    }

    /// Replay of a stored ack for a repeated request id
    pub fn as_duplicate(&self) -> Self {
        Self {
            duplicate: true,
            ..self.clone()
        }
    }
}
