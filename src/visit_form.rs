//! Visit Entry Form: selection state, the field visibility rules, validation
//! and conversion into a [`VisitEntry`].
//!
//! Which fields are shown is decided by [`RULES`], a table of field →
//! requirements evaluated against the current selections. Selections that
//! end up hidden stay in the state (so toggling a parent back on restores
//! them) but never reach the submitted entry.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::dates::DayInterval;
use crate::models::{Purpose, RemarkKey, SalesOption, SampleType, VisitEntry};
use crate::visits::{VisitError, VisitLog};

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Customer name is required")]
    MissingCustomer,
    #[error(transparent)]
    Visit(#[from] VisitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Customer,
    Purpose(Purpose),
    Buyer,
    SalesOption(SalesOption),
    SampleType(SampleType),
    Remark(RemarkKey),
    Submit,
}

/// Condition a field depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    AnyPurpose,
    Purpose(Purpose),
    SalesOption(SalesOption),
    SampleType(SampleType),
}

use FormField as F;
use Requirement as R;

const SALES: R = R::Purpose(Purpose::Sales);
const ADMIN: R = R::Purpose(Purpose::Admin);
const COLLECTION: R = R::SalesOption(SalesOption::SampleCollection);

/// Field tree in display order; a field is visible when all its requirements hold
pub const RULES: &[(FormField, &[Requirement])] = &[
    (F::Customer, &[]),
    (F::Purpose(Purpose::Sales), &[]),
    (F::Purpose(Purpose::Admin), &[]),
    (F::Buyer, &[R::AnyPurpose]),
    (F::SalesOption(SalesOption::Regular), &[SALES]),
    (F::SalesOption(SalesOption::NewInquiry), &[SALES]),
    (F::SalesOption(SalesOption::SampleCollection), &[SALES]),
    (F::SalesOption(SalesOption::SampleSubmission), &[SALES]),
    (F::SampleType(SampleType::Fabric), &[SALES, COLLECTION]),
    (F::SampleType(SampleType::Interline), &[SALES, COLLECTION]),
    (F::Remark(RemarkKey::Fabric), &[SALES, COLLECTION, R::SampleType(SampleType::Fabric)]),
    (F::Remark(RemarkKey::Interline), &[SALES, COLLECTION, R::SampleType(SampleType::Interline)]),
    (F::Remark(RemarkKey::SampleSubmission), &[SALES, R::SalesOption(SalesOption::SampleSubmission)]),
    (F::Remark(RemarkKey::Regular), &[SALES, R::SalesOption(SalesOption::Regular)]),
    (F::Remark(RemarkKey::NewInquiry), &[SALES, R::SalesOption(SalesOption::NewInquiry)]),
    (F::Remark(RemarkKey::Payment), &[ADMIN]),
    (F::Remark(RemarkKey::Svat), &[ADMIN]),
    (F::Remark(RemarkKey::Grn), &[ADMIN]),
    (F::Submit, &[]),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitForm {
    date: NaiveDate,
    pub customer_name: String,
    pub buyer: Option<String>,
    purposes: BTreeSet<Purpose>,
    sales_options: BTreeSet<SalesOption>,
    sample_types: BTreeSet<SampleType>,
    remarks: BTreeMap<RemarkKey, String>,
}

impl VisitForm {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            customer_name: String::new(),
            buyer: None,
            purposes: BTreeSet::new(),
            sales_options: BTreeSet::new(),
            sample_types: BTreeSet::new(),
            remarks: BTreeMap::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn toggle_purpose(&mut self, purpose: Purpose) {
        toggle(&mut self.purposes, purpose);
    }

    pub fn toggle_sales_option(&mut self, option: SalesOption) {
        toggle(&mut self.sales_options, option);
    }

    pub fn toggle_sample_type(&mut self, sample: SampleType) {
        toggle(&mut self.sample_types, sample);
    }

    pub fn has_purpose(&self, purpose: Purpose) -> bool {
        self.purposes.contains(&purpose)
    }

    pub fn has_sales_option(&self, option: SalesOption) -> bool {
        self.sales_options.contains(&option)
    }

    pub fn has_sample_type(&self, sample: SampleType) -> bool {
        self.sample_types.contains(&sample)
    }

    pub fn set_remark(&mut self, key: RemarkKey, text: impl Into<String>) {
        self.remarks.insert(key, text.into());
    }

    pub fn remark(&self, key: RemarkKey) -> &str {
        self.remarks.get(&key).map(String::as_str).unwrap_or("")
    }

    fn holds(&self, requirement: Requirement) -> bool {
        match requirement {
            R::AnyPurpose => !self.purposes.is_empty(),
            R::Purpose(p) => self.has_purpose(p),
            R::SalesOption(o) => self.has_sales_option(o),
            R::SampleType(s) => self.has_sample_type(s),
        }
    }

    pub fn is_visible(&self, field: FormField) -> bool {
        RULES
            .iter()
            .find(|(f, _)| *f == field)
            .is_some_and(|(_, reqs)| reqs.iter().all(|r| self.holds(*r)))
    }

    /// Visible fields in display order
    pub fn visible_fields(&self) -> Vec<FormField> {
        RULES
            .iter()
            .filter(|(_, reqs)| reqs.iter().all(|r| self.holds(*r)))
            .map(|(field, _)| *field)
            .collect()
    }

    /// Keys of the remark fields currently shown
    pub fn remark_keys(&self) -> Vec<RemarkKey> {
        self.visible_fields()
            .into_iter()
            .filter_map(|f| match f {
                F::Remark(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.customer_name.trim().is_empty() {
            return Err(FormError::MissingCustomer);
        }
        Ok(())
    }

    /// Entry as it would be submitted now. Only visible selections and
    /// remark fields are carried over.
    pub fn build_entry(&self) -> Result<VisitEntry, FormError> {
        self.validate()?;
        let visible = |field| self.is_visible(field);
        Ok(VisitEntry {
            customer_name: self.customer_name.trim().to_string(),
            selected_purposes: self.purposes.iter().copied().collect(),
            buyer: match &self.buyer {
                Some(buyer) if visible(F::Buyer) => buyer.clone(),
                _ => String::new(),
            },
            sales_options: self
                .sales_options
                .iter()
                .copied()
                .filter(|o| visible(F::SalesOption(*o)))
                .collect(),
            sample_collection_types: self
                .sample_types
                .iter()
                .copied()
                .filter(|s| visible(F::SampleType(*s)))
                .collect(),
            remarks: self
                .remark_keys()
                .into_iter()
                .map(|key| (key.label().to_string(), self.remark(key).to_string()))
                .collect(),
            created_at: DayInterval::local(self.date).start,
        })
    }

    /// Validate and write the entry. On failure the form is left untouched.
    pub fn submit(&self, log: &VisitLog) -> Result<VisitEntry, FormError> {
        let entry = self.build_entry()?;
        if let Err(e) = log.record(&entry) {
            tracing::error!(error = %e, customer = %entry.customer_name, "failed to save visit");
            return Err(e.into());
        }
        Ok(entry)
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}
