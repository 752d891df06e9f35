//! Plan selection over a loaded SKU catalog.
//!
//! # States
//! - Uninitialized: no catalog yet, selections are refused
//! - CatalogLoaded: catalog present, current selection resolves to no plan
//! - PlanResolved: current selection resolves to a plan
//!
//! # State Transitions
//! ```text
//! Uninitialized → CatalogLoaded: load(catalog)
//! CatalogLoaded → PlanResolved: default (or chosen) pair found
//! PlanResolved → PlanResolved: select_month / select_screen, pair found
//! PlanResolved → CatalogLoaded: select_month / select_screen, pair missing
//! any → Uninitialized: reset()
//! ```
//!
//! # Design Decisions
//! - Resolution reads only the loaded catalog; changing the selection never
//!   goes back to the network
//! - A pair missing from both indexes resolves to no plan instead of falling
//!   back to some other plan, so checkout cannot start on a wrong price

use thiserror::Error;

use crate::catalog::types::{MonthOption, PlanCatalog, ScreenOption, SkuData, SkuPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no plan catalog loaded")]
    NotLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Uninitialized,
    CatalogLoaded,
    PlanResolved,
}

/// Find the plan for a (month, screen) pair.
///
/// Tries the month index first, then the screen index.
pub fn resolve(catalog: &PlanCatalog, month_id: u32, screen_id: u32) -> Option<&SkuPlan> {
    catalog
        .plan_by_month(month_id, screen_id)
        .or_else(|| catalog.plan_by_screen(month_id, screen_id))
}

/// Month/screen picker for one product.
#[derive(Debug, Clone, Default)]
pub struct PlanSelector {
    catalog: Option<PlanCatalog>,
    repayment: Option<PlanCatalog>,
    month_id: u32,
    screen_id: u32,
}

impl PlanSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog and select its default pair.
    pub fn load(&mut self, catalog: PlanCatalog) {
        self.load_with_repayment(catalog, None);
    }

    /// Load a product's plan catalog together with its renewal pricing.
    pub fn load_sku(&mut self, sku: &SkuData) {
        self.load_with_repayment(sku.plan.clone(), sku.repayment.clone());
    }

    fn load_with_repayment(&mut self, catalog: PlanCatalog, repayment: Option<PlanCatalog>) {
        let mismatches = catalog.check_consistency();
        if let Some(first) = mismatches.first() {
            tracing::warn!(
                mismatches = mismatches.len(),
                first = ?first,
                "Plan catalog indexes disagree"
            );
        }

        self.month_id = catalog.default_month_id;
        self.screen_id = catalog.default_screen_id;
        self.catalog = Some(catalog);
        self.repayment = repayment;

        tracing::debug!(
            month_id = self.month_id,
            screen_id = self.screen_id,
            state = ?self.state(),
            "Plan catalog loaded"
        );
    }

    pub fn select_month(&mut self, month_id: u32) -> Result<Option<&SkuPlan>, SelectionError> {
        self.ensure_loaded()?;
        if self.month_id != month_id {
            self.month_id = month_id;
            self.log_selection();
        }
        Ok(self.current_plan())
    }

    pub fn select_screen(&mut self, screen_id: u32) -> Result<Option<&SkuPlan>, SelectionError> {
        self.ensure_loaded()?;
        if self.screen_id != screen_id {
            self.screen_id = screen_id;
            self.log_selection();
        }
        Ok(self.current_plan())
    }

    /// The plan matching the current selection, if the catalog has one.
    pub fn current_plan(&self) -> Option<&SkuPlan> {
        resolve(self.catalog.as_ref()?, self.month_id, self.screen_id)
    }

    pub fn can_pay(&self) -> bool {
        self.current_plan().is_some()
    }

    /// Plan shown in the page header: renewal pricing when available.
    pub fn header_plan(&self) -> Option<&SkuPlan> {
        self.repayment
            .as_ref()
            .and_then(|r| resolve(r, self.month_id, self.screen_id))
            .or_else(|| self.current_plan())
    }

    pub fn selection(&self) -> Option<(u32, u32)> {
        self.catalog.as_ref().map(|_| (self.month_id, self.screen_id))
    }

    pub fn selected_month(&self) -> Option<&MonthOption> {
        self.catalog.as_ref()?.month_option(self.month_id)
    }

    pub fn selected_screen(&self) -> Option<&ScreenOption> {
        self.catalog.as_ref()?.screen_option(self.screen_id)
    }

    pub fn months(&self) -> &[MonthOption] {
        self.catalog.as_ref().map_or(&[], |c| c.month.as_slice())
    }

    pub fn screens(&self) -> &[ScreenOption] {
        self.catalog.as_ref().map_or(&[], |c| c.screen.as_slice())
    }

    pub fn state(&self) -> SelectionState {
        match (&self.catalog, self.current_plan()) {
            (None, _) => SelectionState::Uninitialized,
            (Some(_), None) => SelectionState::CatalogLoaded,
            (Some(_), Some(_)) => SelectionState::PlanResolved,
        }
    }

    /// Forget the catalog and selection.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn ensure_loaded(&self) -> Result<(), SelectionError> {
        if self.catalog.is_some() {
            Ok(())
        } else {
            Err(SelectionError::NotLoaded)
        }
    }

    fn log_selection(&self) {
        match self.current_plan() {
            Some(plan) => tracing::debug!(
                month_id = self.month_id,
                screen_id = self.screen_id,
                type_plan_id = plan.type_plan_id,
                sale_price = %plan.sale_price,
                "Plan resolved"
            ),
            None => tracing::debug!(
                month_id = self.month_id,
                screen_id = self.screen_id,
                "No plan for selection"
            ),
        }
    }
}
