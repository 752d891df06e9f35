//! SKU catalog types.
//!
//! A product's plans are sent twice: once grouped by month (each month lists
//! its screen options) and once grouped by screen (each screen lists its
//! month options). Both indexes describe the same set of plans.

use serde::{Deserialize, Serialize};

/// One purchasable month/screen combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuPlan {
    pub month_id: u32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub month_content: String,
    pub screen_id: u32,
    #[serde(default)]
    pub max_user: u32,
    #[serde(default)]
    pub substitute_recharge: u32,
    /// Number of concurrent screens.
    #[serde(default)]
    pub screen: u32,
    #[serde(default)]
    pub screen_content: String,
    #[serde(default)]
    pub seat_type: String,
    #[serde(default)]
    pub type_plan_id: u64,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub currency_icon1: String,
    #[serde(default)]
    pub currency_icon2: String,
    #[serde(default)]
    pub currency_show_type: u32,
    #[serde(default)]
    pub original_price: String,
    #[serde(default)]
    pub sale_price: String,
    #[serde(default)]
    pub average_price: String,
    #[serde(default)]
    pub discount: String,
}

impl SkuPlan {
    /// The price fields that both catalog indexes must agree on.
    pub fn price_fields(&self) -> (&str, &str, &str, &str) {
        (
            &self.original_price,
            &self.sale_price,
            &self.average_price,
            &self.discount,
        )
    }

    /// Sale price as a number; `None` if the backend sent something unparsable.
    pub fn sale_amount(&self) -> Option<f64> {
        self.sale_price.trim().parse().ok()
    }

    /// Price with its currency symbol, e.g. `S/.14.87`.
    pub fn display_price(&self) -> String {
        format!("{}{}", self.currency_icon1, self.sale_price)
    }
}

/// A subscription duration and the screen options sold with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthOption {
    pub month_id: u32,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub month_content: String,
    #[serde(default)]
    pub screen: Vec<SkuPlan>,
}

/// A screen allowance and the durations sold with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenOption {
    pub screen_id: u32,
    #[serde(default)]
    pub max_user: u32,
    #[serde(default)]
    pub substitute_recharge: u32,
    #[serde(default)]
    pub screen: u32,
    #[serde(default)]
    pub screen_content: String,
    #[serde(default)]
    pub seat_type: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub month: Vec<SkuPlan>,
}

/// Cross-indexed plan set for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlanCatalog {
    #[serde(default)]
    pub month: Vec<MonthOption>,
    #[serde(default)]
    pub screen: Vec<ScreenOption>,
    #[serde(default)]
    pub default_month_id: u32,
    #[serde(default)]
    pub default_screen_id: u32,
}

/// A pair whose two index entries disagree or exist in only one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMismatch {
    pub month_id: u32,
    pub screen_id: u32,
    pub reason: MismatchReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    MissingFromScreenIndex,
    MissingFromMonthIndex,
    PriceDiffers,
}

impl PlanCatalog {
    pub fn month_option(&self, month_id: u32) -> Option<&MonthOption> {
        self.month.iter().find(|m| m.month_id == month_id)
    }

    pub fn screen_option(&self, screen_id: u32) -> Option<&ScreenOption> {
        self.screen.iter().find(|s| s.screen_id == screen_id)
    }

    /// Look the pair up through the month index.
    pub fn plan_by_month(&self, month_id: u32, screen_id: u32) -> Option<&SkuPlan> {
        self.month_option(month_id)?
            .screen
            .iter()
            .find(|p| p.screen_id == screen_id)
    }

    /// Look the pair up through the screen index.
    pub fn plan_by_screen(&self, month_id: u32, screen_id: u32) -> Option<&SkuPlan> {
        self.screen_option(screen_id)?
            .month
            .iter()
            .find(|p| p.month_id == month_id)
    }

    pub fn is_empty(&self) -> bool {
        self.month.is_empty() && self.screen.is_empty()
    }

    /// Every pair on which the two indexes disagree.
    pub fn check_consistency(&self) -> Vec<CatalogMismatch> {
        let mut mismatches = Vec::new();

        for month in &self.month {
            for plan in &month.screen {
                let reason = match self.plan_by_screen(month.month_id, plan.screen_id) {
                    None => Some(MismatchReason::MissingFromScreenIndex),
                    Some(other) if other.price_fields() != plan.price_fields() => {
                        Some(MismatchReason::PriceDiffers)
                    }
                    Some(_) => None,
                };
                if let Some(reason) = reason {
                    mismatches.push(CatalogMismatch {
                        month_id: month.month_id,
                        screen_id: plan.screen_id,
                        reason,
                    });
                }
            }
        }

        for screen in &self.screen {
            for plan in &screen.month {
                if self.plan_by_month(plan.month_id, screen.screen_id).is_none() {
                    mismatches.push(CatalogMismatch {
                        month_id: plan.month_id,
                        screen_id: screen.screen_id,
                        reason: MismatchReason::MissingFromMonthIndex,
                    });
                }
            }
        }

        mismatches
    }
}

/// SKU payload for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuData {
    pub id: u64,
    #[serde(rename = "_id", default)]
    pub object_id: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub thumb_img: String,
    #[serde(default)]
    pub show_status: i32,
    #[serde(default, rename = "selectInfo")]
    pub select_info: String,
    pub plan: PlanCatalog,
    /// Renewal pricing, when the product offers it.
    #[serde(default)]
    pub repayment: Option<PlanCatalog>,
}

impl SkuData {
    /// Identifier sent as `serviceId` when ordering.
    pub fn service_id(&self) -> String {
        if self.object_id.is_empty() {
            self.id.to_string()
        } else {
            self.object_id.clone()
        }
    }
}

#[cfg(test)]
pub(crate) fn plan(month_id: u32, screen_id: u32, sale_price: &str) -> SkuPlan {
    SkuPlan {
        month_id,
        month: month_id,
        month_content: format!("{month_id} mes"),
        screen_id,
        max_user: screen_id,
        substitute_recharge: 0,
        screen: screen_id,
        screen_content: format!("{screen_id} Pantalla"),
        seat_type: String::new(),
        type_plan_id: u64::from(month_id * 10 + screen_id),
        sort: 0,
        currency_icon1: "S/.".to_string(),
        currency_icon2: "PEN(S/.)".to_string(),
        currency_show_type: 1,
        original_price: sale_price.to_string(),
        sale_price: sale_price.to_string(),
        average_price: sale_price.to_string(),
        discount: "0".to_string(),
    }
}

/// Build a symmetric catalog from `(month, screen, price)` triples.
#[cfg(test)]
pub(crate) fn catalog(plans: &[(u32, u32, &str)]) -> PlanCatalog {
    let mut catalog = PlanCatalog::default();
    for &(m, s, price) in plans {
        let p = plan(m, s, price);
        match catalog.month.iter_mut().find(|o| o.month_id == m) {
            Some(option) => option.screen.push(p.clone()),
            None => catalog.month.push(MonthOption {
                month_id: m,
                month: m,
                month_content: p.month_content.clone(),
                screen: vec![p.clone()],
            }),
        }
        match catalog.screen.iter_mut().find(|o| o.screen_id == s) {
            Some(option) => option.month.push(p),
            None => catalog.screen.push(ScreenOption {
                screen_id: s,
                max_user: s,
                substitute_recharge: 0,
                screen: s,
                screen_content: p.screen_content.clone(),
                seat_type: String::new(),
                sort: 0,
                month: vec![p],
            }),
        }
    }
    if let Some(&(m, s, _)) = plans.first() {
        catalog.default_month_id = m;
        catalog.default_screen_id = s;
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexes_agree() {
        let catalog = catalog(&[(1, 1, "10"), (1, 2, "15"), (3, 1, "27")]);
        for (m, s) in [(1, 1), (1, 2), (3, 1)] {
            assert_eq!(
                catalog.plan_by_month(m, s).map(SkuPlan::price_fields),
                catalog.plan_by_screen(m, s).map(SkuPlan::price_fields),
            );
        }
        assert!(catalog.check_consistency().is_empty());
    }

    #[test]
    fn test_detects_mismatches() {
        let mut catalog = catalog(&[(1, 1, "10"), (1, 2, "15")]);
        catalog.screen[0].month[0].sale_price = "11".to_string();
        catalog.screen[1].month.clear();

        let mismatches = catalog.check_consistency();
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].reason, MismatchReason::PriceDiffers);
        assert_eq!(
            (mismatches[1].month_id, mismatches[1].screen_id, mismatches[1].reason),
            (1, 2, MismatchReason::MissingFromScreenIndex)
        );
    }

    #[test]
    fn test_decode_backend_payload() {
        let json = r#"{
            "id": 5, "_id": "66a1", "type_name": "Netflix", "show_status": 1,
            "plan": {
                "month": [{"month_id": 1, "month": 1, "month_content": "1 mes",
                    "screen": [{"month_id": 1, "screen_id": 1, "sale_price": "10", "type_plan_id": 11}]}],
                "screen": [{"screen_id": 1, "screen": 1,
                    "month": [{"month_id": 1, "screen_id": 1, "sale_price": "10", "type_plan_id": 11}]}],
                "default_month_id": 1, "default_screen_id": 1
            }
        }"#;
        let sku: SkuData = serde_json::from_str(json).unwrap();
        assert_eq!(sku.service_id(), "66a1");
        assert!(sku.repayment.is_none());
        assert_eq!(sku.plan.plan_by_month(1, 1).unwrap().sale_price, "10");
        assert_eq!(sku.plan.plan_by_month(1, 1).unwrap().sale_amount(), Some(10.0));
    }
}
