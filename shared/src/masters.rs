//! Lookup tables over the masters payload
//!
//! Built once per `GET masters` response. Missing or empty tables never fail
//! the build; [`MastersIndex::availability`] reports whether input forms
//! should be enabled.

use crate::error::AppError;
use crate::models::Masters;
use crate::order::UseType;
use crate::quantity::RecipeLine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factory {
    pub code: String,
    pub name: String,
}

/// Flavor with its recipe lines in `row_no` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub flavor_id: String,
    pub flavor_name: String,
    pub liquid_name: String,
    /// Grams per pack; `None` when unknown or non-positive
    pub pack_to_gram: Option<f64>,
    pub expiry_days: Option<u32>,
    pub recipe: Vec<RecipeLine>,
}

impl Flavor {
    /// Last day of use for a batch made on `manufactured`
    pub fn expiry_date(&self, manufactured: NaiveDate) -> Option<NaiveDate> {
        manufactured.checked_add_days(chrono::Days::new(u64::from(self.expiry_days?)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Use {
    pub code: String,
    pub name: String,
    pub use_type: UseType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reporter {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<f64>,
}

/// Whether masters are complete enough to take input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MastersAvailability {
    Ready,
    /// Inputs should be disabled; carries the reason to show
    Disabled(String),
}

impl MastersAvailability {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// `Err(MastersUnavailable)` when disabled
    pub fn ensure_ready(&self) -> Result<(), AppError> {
        match self {
            Self::Ready => Ok(()),
            Self::Disabled(reason) => Err(AppError::masters_unavailable(reason.clone())),
        }
    }
}

/// Indexed view over [`Masters`]
#[derive(Debug, Clone, Default)]
pub struct MastersIndex {
    factories: Vec<Factory>,
    storage_by_factory: HashMap<String, Vec<String>>,
    flavors: Vec<Flavor>,
    flavor_pos: HashMap<String, usize>,
    oem_partners: Vec<String>,
    uses: Vec<Use>,
    allowed_by_use: HashMap<String, HashSet<String>>,
    reporters: Vec<Reporter>,
}

fn clean(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite() && *v > 0.0)
}

fn cmp_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl MastersIndex {
    pub fn build(masters: &Masters) -> Self {
        let factories: Vec<Factory> = masters
            .factories
            .iter()
            .filter_map(|f| {
                Some(Factory {
                    code: clean(&f.factory_code)?,
                    name: f.factory_name.trim().to_string(),
                })
            })
            .collect();

        let mut storage_by_factory: HashMap<String, Vec<String>> = factories
            .iter()
            .map(|f| (f.code.clone(), Vec::new()))
            .collect();
        for location in &masters.locations {
            let (Some(factory), Some(name)) =
                (clean(&location.factory_code), clean(&location.location_name))
            else {
                continue;
            };
            let list = storage_by_factory.entry(factory).or_default();
            if !list.contains(&name) {
                list.push(name);
            }
        }

        let mut recipes: HashMap<&str, Vec<(Option<f64>, RecipeLine)>> = HashMap::new();
        for row in &masters.recipes {
            recipes.entry(row.flavor_id.trim()).or_default().push((
                row.row_no.filter(|n| n.is_finite()),
                RecipeLine {
                    ingredient: row.ingredient_name.trim().to_string(),
                    qty: row.qty.filter(|q| q.is_finite()).unwrap_or(0.0),
                    unit: row.unit.as_deref().unwrap_or("").trim().to_string(),
                },
            ));
        }

        let mut flavors = Vec::with_capacity(masters.flavors.len());
        let mut flavor_pos = HashMap::new();
        for row in &masters.flavors {
            let Some(flavor_id) = clean(&row.flavor_id) else {
                continue;
            };
            if flavor_pos.contains_key(&flavor_id) {
                tracing::warn!(flavor_id = %flavor_id, "duplicate flavor row ignored");
                continue;
            }
            let mut lines = recipes.remove(flavor_id.as_str()).unwrap_or_default();
            // stable: equal or missing row numbers keep sheet order
            lines.sort_by(|a, b| cmp_missing_last(a.0, b.0));

            flavor_pos.insert(flavor_id.clone(), flavors.len());
            flavors.push(Flavor {
                flavor_id,
                flavor_name: row.flavor_name.trim().to_string(),
                liquid_name: row.liquid_name.trim().to_string(),
                pack_to_gram: positive(row.pack_to_gram),
                expiry_days: row
                    .expiry_days
                    .filter(|d| d.is_finite() && *d >= 0.0)
                    .map(|d| d.round() as u32),
                recipe: lines.into_iter().map(|(_, line)| line).collect(),
            });
        }

        let oem_partners = masters
            .oem_partners
            .iter()
            .filter_map(|p| clean(&p.partner_name))
            .collect();

        let uses = masters
            .uses
            .iter()
            .filter_map(|u| {
                Some(Use {
                    code: clean(&u.use_code)?,
                    name: u.use_name.trim().to_string(),
                    use_type: u
                        .use_type
                        .as_deref()
                        .map(UseType::from_label)
                        .unwrap_or_default(),
                })
            })
            .collect();

        let mut allowed_by_use: HashMap<String, HashSet<String>> = HashMap::new();
        for row in &masters.use_flavors {
            if let (Some(code), Some(flavor)) = (clean(&row.use_code), clean(&row.flavor_id)) {
                allowed_by_use.entry(code).or_default().insert(flavor);
            }
        }

        let mut reporters: Vec<Reporter> = masters
            .reporters
            .iter()
            .filter(|r| {
                !r.active
                    .as_deref()
                    .is_some_and(|a| a.trim().eq_ignore_ascii_case("no"))
            })
            .filter_map(|r| {
                let id = r.reporter_id.as_deref().and_then(clean);
                let name = r.reporter_name.as_deref().and_then(clean);
                Some(Reporter {
                    id: id.clone().or_else(|| name.clone())?,
                    name: name.or(id)?,
                    factory_code: r.factory_code.as_deref().and_then(clean),
                    sort_order: r.sort_order.filter(|s| s.is_finite()),
                })
            })
            .collect();
        reporters.sort_by(|a, b| {
            cmp_missing_last(a.sort_order, b.sort_order).then_with(|| a.name.cmp(&b.name))
        });

        Self {
            factories,
            storage_by_factory,
            flavors,
            flavor_pos,
            oem_partners,
            uses,
            allowed_by_use,
            reporters,
        }
    }

    pub fn availability(&self) -> MastersAvailability {
        if self.factories.is_empty() {
            MastersAvailability::Disabled("no factories in masters".to_string())
        } else if self.flavors.is_empty() {
            MastersAvailability::Disabled("no flavors in masters".to_string())
        } else {
            MastersAvailability::Ready
        }
    }

    pub fn factories(&self) -> &[Factory] {
        &self.factories
    }

    pub fn factory(&self, code: &str) -> Option<&Factory> {
        self.factories.iter().find(|f| f.code == code)
    }

    /// Storage locations of a factory (empty for unknown factories)
    pub fn locations(&self, factory_code: &str) -> &[String] {
        self.storage_by_factory
            .get(factory_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn storage_by_factory(&self) -> &HashMap<String, Vec<String>> {
        &self.storage_by_factory
    }

    pub fn flavors(&self) -> &[Flavor] {
        &self.flavors
    }

    pub fn flavor(&self, flavor_id: &str) -> Option<&Flavor> {
        self.flavor_pos.get(flavor_id).map(|&i| &self.flavors[i])
    }

    pub fn pack_to_gram(&self, flavor_id: &str) -> Option<f64> {
        self.flavor(flavor_id)?.pack_to_gram
    }

    pub fn oem_partners(&self) -> &[String] {
        &self.oem_partners
    }

    pub fn uses(&self) -> &[Use] {
        &self.uses
    }

    pub fn use_by_code(&self, code: &str) -> Option<&Use> {
        self.uses.iter().find(|u| u.code == code)
    }

    /// Flavors selectable for a use; a use without restrictions allows all
    pub fn allowed_flavors(&self, use_code: &str) -> Vec<&Flavor> {
        match self.allowed_by_use.get(use_code) {
            Some(allowed) => self
                .flavors
                .iter()
                .filter(|f| allowed.contains(&f.flavor_id))
                .collect(),
            None => self.flavors.iter().collect(),
        }
    }

    pub fn is_flavor_allowed(&self, use_code: &str, flavor_id: &str) -> bool {
        self.allowed_by_use
            .get(use_code)
            .is_none_or(|allowed| allowed.contains(flavor_id))
    }

    /// Active reporters, by sort order then name
    pub fn reporters(&self) -> &[Reporter] {
        &self.reporters
    }

    /// Reporters of a factory plus those not tied to any factory
    pub fn reporters_for(&self, factory_code: &str) -> Vec<&Reporter> {
        self.reporters
            .iter()
            .filter(|r| r.factory_code.as_deref().is_none_or(|f| f == factory_code))
            .collect()
    }
}
