//! Floor and office inputs turned into validated requests
//!
//! Drafts hold what a form collects. `build` checks them against the order
//! and masters they refer to and produces the request body; anything that
//! fails here is a validation error and is never sent.

use super::payload::{Leftover, MadePayload, MadeResult, MaterialLine};
use super::request::{ActionBody, ActionTarget, CreateOrderLine, CreateOrderRequest, OnsiteMakeRequest};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::masters::MastersIndex;
use crate::order::{Order, UseType};
use crate::quantity::grams_for_packs;
use crate::util::format_ledger_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a production report covers the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Report everything still remaining in one go
    #[default]
    Bulk,
    /// Report part of the packs as a split-child lot
    Split,
}

fn reportable(materials: Vec<MaterialLine>) -> Vec<MaterialLine> {
    materials.into_iter().filter(MaterialLine::is_reportable).collect()
}

/// Leftover is only kept for `extra`
fn leftover_for(result: MadeResult, leftover: Option<Leftover>) -> AppResult<Option<Leftover>> {
    match result {
        MadeResult::Used => Ok(None),
        MadeResult::Extra => {
            let leftover = leftover.ok_or_else(|| AppError::required("leftover"))?;
            leftover.validate()?;
            Ok(Some(leftover))
        }
    }
}

fn pack_ratio(masters: &MastersIndex, flavor_id: &str) -> AppResult<f64> {
    masters.pack_to_gram(flavor_id).ok_or_else(|| {
        AppError::out_of_range("pack_to_gram", format!("flavor {} has no pack weight", flavor_id))
    })
}

fn known_flavor(masters: &MastersIndex, flavor_id: &str) -> AppResult<()> {
    masters
        .flavor(flavor_id)
        .map(|_| ())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::FlavorNotFound, format!("flavor {} not found", flavor_id))
        })
}

/// Use type of `use_code`, checking the flavor is allowed for it
fn use_type_for(masters: &MastersIndex, use_code: &str, flavor_id: &str) -> AppResult<UseType> {
    let use_ = masters.use_by_code(use_code).ok_or_else(|| {
        AppError::with_message(ErrorCode::UseNotFound, format!("use {} not found", use_code))
    })?;
    if !masters.is_flavor_allowed(use_code, flavor_id) {
        return Err(AppError::with_message(
            ErrorCode::FlavorNotAllowed,
            format!("flavor {} is not allowed for use {}", flavor_id, use_code),
        ));
    }
    Ok(use_.use_type)
}

fn required_partner(partner: Option<String>) -> AppResult<String> {
    partner
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::required("oem_partner"))
}

// ============================================================================
// Made report
// ============================================================================

/// Production report against an existing order
#[derive(Debug, Clone, PartialEq)]
pub struct MadeReport {
    pub mode: ReportMode,
    /// Packs made; ignored in bulk mode and for gram-only orders
    pub packs: u32,
    pub manufactured_at: NaiveDate,
    pub result: MadeResult,
    pub leftover: Option<Leftover>,
    pub materials: Vec<MaterialLine>,
    pub by: Option<String>,
}

impl MadeReport {
    pub fn bulk(manufactured_at: NaiveDate, result: MadeResult) -> Self {
        Self {
            mode: ReportMode::Bulk,
            packs: 0,
            manufactured_at,
            result,
            leftover: None,
            materials: Vec::new(),
            by: None,
        }
    }

    pub fn split(packs: u32, manufactured_at: NaiveDate, result: MadeResult) -> Self {
        Self {
            mode: ReportMode::Split,
            packs,
            ..Self::bulk(manufactured_at, result)
        }
    }

    pub fn with_leftover(mut self, location: impl Into<String>, grams: f64) -> Self {
        self.leftover = Some(Leftover::new(location, grams));
        self
    }

    pub fn with_materials(mut self, materials: Vec<MaterialLine>) -> Self {
        self.materials = materials;
        self
    }

    pub fn by(mut self, reporter_id: impl Into<String>) -> Self {
        self.by = Some(reporter_id.into());
        self
    }

    /// Build the `MADE_SPLIT` body for `order`.
    ///
    /// `split_lot_id` is the proposed child lot and is only attached in split
    /// mode.
    pub fn build(
        self,
        order: &Order,
        masters: &MastersIndex,
        split_lot_id: Option<String>,
    ) -> AppResult<ActionBody> {
        let line = order
            .primary_line()
            .ok_or_else(|| AppError::new(ErrorCode::OrderHasNoLines))?;
        if order.archived {
            return Err(AppError::new(ErrorCode::OrderArchived).with_detail("lot_id", order.lot_id.clone()));
        }
        if self.mode == ReportMode::Split && !line.can_split() {
            return Err(AppError::new(ErrorCode::SplitNotAllowed));
        }

        let (packs, grams) = if line.counts_packs() {
            let remaining = line.packs_remaining.max(0.0).round() as u32;
            let packs = match self.mode {
                ReportMode::Bulk => remaining,
                ReportMode::Split => self.packs,
            };
            if packs == 0 {
                return Err(AppError::out_of_range("packs", "packs must be positive"));
            }
            if packs > remaining {
                return Err(AppError::with_message(
                    ErrorCode::PacksExceedRemaining,
                    format!("{} packs reported but only {} remain", packs, remaining),
                )
                .with_detail("packs_remaining", remaining));
            }
            (packs, grams_for_packs(packs, pack_ratio(masters, &line.flavor_id)?))
        } else {
            (0, line.required_grams)
        };
        if !(grams > 0.0) {
            return Err(AppError::out_of_range("grams", "produced grams must be positive"));
        }

        let payload = MadePayload {
            packs,
            grams,
            manufactured_at: format_ledger_date(self.manufactured_at),
            result: self.result,
            leftover: leftover_for(self.result, self.leftover)?,
            materials: reportable(self.materials),
            split_lot_id: match self.mode {
                ReportMode::Split => split_lot_id,
                ReportMode::Bulk => None,
            },
            by: self.by,
        };
        let body = ActionBody::MadeSplit(ActionTarget::new(
            order.factory_code.clone(),
            order.lot_id.clone(),
            line.flavor_id.clone(),
            payload,
        ));
        body.validate()?;
        Ok(body)
    }
}

// ============================================================================
// Onsite make
// ============================================================================

/// Unscheduled production reported on the floor
#[derive(Debug, Clone, PartialEq)]
pub struct OnsiteMakeDraft {
    pub flavor_id: String,
    pub use_code: String,
    pub packs: u32,
    pub manufactured_at: NaiveDate,
    pub oem_partner: Option<String>,
    pub result: MadeResult,
    pub leftover: Option<Leftover>,
    pub materials: Vec<MaterialLine>,
    pub by: Option<String>,
}

impl OnsiteMakeDraft {
    pub fn new(
        flavor_id: impl Into<String>,
        use_code: impl Into<String>,
        packs: u32,
        manufactured_at: NaiveDate,
    ) -> Self {
        Self {
            flavor_id: flavor_id.into(),
            use_code: use_code.into(),
            packs,
            manufactured_at,
            oem_partner: None,
            result: MadeResult::Used,
            leftover: None,
            materials: Vec::new(),
            by: None,
        }
    }

    pub fn with_partner(mut self, partner: impl Into<String>) -> Self {
        self.oem_partner = Some(partner.into());
        self
    }

    pub fn with_leftover(mut self, location: impl Into<String>, grams: f64) -> Self {
        self.result = MadeResult::Extra;
        self.leftover = Some(Leftover::new(location, grams));
        self
    }

    /// Build the request; `generated_lot_id` is filled in by the caller once
    /// the lot has been minted.
    pub fn build(self, factory_code: &str, masters: &MastersIndex) -> AppResult<OnsiteMakeRequest> {
        let use_code = self.use_code.trim().to_string();
        if use_code.is_empty() {
            return Err(AppError::required("use_code"));
        }
        known_flavor(masters, &self.flavor_id)?;
        let use_type = use_type_for(masters, &use_code, &self.flavor_id)?;
        let oem_partner = if use_type.is_oem() {
            Some(required_partner(self.oem_partner)?)
        } else {
            None
        };

        let ratio = pack_ratio(masters, &self.flavor_id)?;
        let produced_grams = grams_for_packs(self.packs, ratio).max(0.0);
        if !(produced_grams > 0.0) {
            return Err(AppError::out_of_range(
                "packs",
                "produced grams must be positive",
            ));
        }

        Ok(OnsiteMakeRequest {
            factory_code: factory_code.to_string(),
            flavor_id: self.flavor_id,
            use_type,
            use_code,
            packs: self.packs,
            produced_grams,
            manufactured_at: format_ledger_date(self.manufactured_at),
            oem_partner,
            result: self.result,
            leftover: leftover_for(self.result, self.leftover)?,
            materials: reportable(self.materials),
            generated_lot_id: String::new(),
            by: self.by,
        })
    }
}

// ============================================================================
// Create order
// ============================================================================

/// One requested flavor of a new order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineDraft {
    pub flavor_id: String,
    pub use_code: Option<String>,
    /// Retail quantity
    pub packs: u32,
    /// OEM quantity
    pub grams: Option<f64>,
    pub oem_partner: Option<String>,
}

impl OrderLineDraft {
    pub fn packs(flavor_id: impl Into<String>, packs: u32) -> Self {
        Self {
            flavor_id: flavor_id.into(),
            use_code: None,
            packs,
            grams: None,
            oem_partner: None,
        }
    }

    pub fn oem(flavor_id: impl Into<String>, grams: f64, partner: impl Into<String>) -> Self {
        Self {
            flavor_id: flavor_id.into(),
            use_code: None,
            packs: 0,
            grams: Some(grams),
            oem_partner: Some(partner.into()),
        }
    }

    pub fn with_use(mut self, use_code: impl Into<String>) -> Self {
        self.use_code = Some(use_code.into());
        self
    }

    fn build(self, masters: &MastersIndex) -> AppResult<CreateOrderLine> {
        known_flavor(masters, &self.flavor_id)?;
        let use_code = self
            .use_code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let use_type = match &use_code {
            Some(code) => use_type_for(masters, code, &self.flavor_id)?,
            // without a use code the quantity decides
            None if self.grams.is_some() && self.packs == 0 => UseType::Oem,
            None => UseType::Retail,
        };

        match use_type {
            UseType::Retail => {
                if self.packs == 0 {
                    return Err(AppError::out_of_range("packs", "packs must be positive"));
                }
                let ratio = pack_ratio(masters, &self.flavor_id)?;
                Ok(CreateOrderLine {
                    flavor_id: self.flavor_id,
                    use_type,
                    use_code,
                    packs: self.packs,
                    required_grams: grams_for_packs(self.packs, ratio),
                    oem_partner: None,
                })
            }
            UseType::Oem => {
                let grams = self.grams.filter(|g| g.is_finite() && *g > 0.0).ok_or_else(|| {
                    AppError::out_of_range("grams", "grams must be positive")
                })?;
                Ok(CreateOrderLine {
                    flavor_id: self.flavor_id,
                    use_type,
                    use_code,
                    packs: 0,
                    required_grams: grams.round(),
                    oem_partner: Some(required_partner(self.oem_partner)?),
                })
            }
        }
    }
}

/// New order from the office form
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOrderDraft {
    pub ordered_at: NaiveDate,
    pub deadline_at: Option<NaiveDate>,
    pub lines: Vec<OrderLineDraft>,
}

impl CreateOrderDraft {
    pub fn new(ordered_at: NaiveDate, lines: Vec<OrderLineDraft>) -> Self {
        Self {
            ordered_at,
            deadline_at: None,
            lines,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline_at = Some(deadline);
        self
    }

    /// Build the request; `lot_id` is filled in by the caller once minted
    pub fn build(self, factory_code: &str, masters: &MastersIndex) -> AppResult<CreateOrderRequest> {
        if masters.factory(factory_code).is_none() {
            return Err(AppError::with_message(
                ErrorCode::FactoryNotFound,
                format!("factory {} not found", factory_code),
            ));
        }
        if self.lines.is_empty() {
            return Err(AppError::new(ErrorCode::OrderHasNoLines));
        }
        if self.deadline_at.is_some_and(|deadline| deadline < self.ordered_at) {
            return Err(AppError::out_of_range(
                "deadline_at",
                "deadline is before the order date",
            ));
        }
        let lines = self
            .lines
            .into_iter()
            .map(|line| line.build(masters))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(CreateOrderRequest {
            factory_code: factory_code.to_string(),
            lot_id: String::new(),
            ordered_at: format_ledger_date(self.ordered_at),
            deadline_at: self.deadline_at.map(format_ledger_date),
            lines,
        })
    }
}
