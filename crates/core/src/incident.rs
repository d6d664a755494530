//! Fire incident records: the draft report, the persisted incident, and the
//! normalization and validation rules applied before anything is stored.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;
use crate::regions::RegionCatalog;
use crate::types::DbId;

/// File extensions accepted for attachment references.
pub const ALLOWED_ATTACHMENT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf"];

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Inclusive calendar-date range. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// A range with no bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| s <= date) && self.end.map_or(true, |e| date <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Reject ranges whose start falls after their end.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(CoreError::Validation(format!(
                    "start_date {start} is after end_date {end}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Responders
// ---------------------------------------------------------------------------

/// The organisational groups tracked separately on every incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderCategory {
    LocalAuthority,
    ForestProtection,
    EmergencyService,
    InternalAffairs,
    OtherOrganizations,
}

impl ResponderCategory {
    pub const ALL: [ResponderCategory; 5] = [
        ResponderCategory::LocalAuthority,
        ResponderCategory::ForestProtection,
        ResponderCategory::EmergencyService,
        ResponderCategory::InternalAffairs,
        ResponderCategory::OtherOrganizations,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ResponderCategory::LocalAuthority => "local_authority",
            ResponderCategory::ForestProtection => "forest_protection",
            ResponderCategory::EmergencyService => "emergency_service",
            ResponderCategory::InternalAffairs => "internal_affairs",
            ResponderCategory::OtherOrganizations => "other_organizations",
        }
    }

    /// Local authority crews never report aircraft.
    pub fn tracks_aircraft(self) -> bool {
        !matches!(self, ResponderCategory::LocalAuthority)
    }
}

/// Engagement and head counts for one responder category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderUnit {
    #[serde(default)]
    pub engaged: bool,
    pub people: Option<i32>,
    pub equipment: Option<i32>,
    pub aircraft: Option<i32>,
}

impl ResponderUnit {
    fn normalized(self, tracks_aircraft: bool) -> Self {
        Self {
            engaged: self.engaged,
            people: self.people.map(i32::saturating_abs),
            equipment: self.equipment.map(i32::saturating_abs),
            aircraft: if tracks_aircraft {
                self.aircraft.map(i32::saturating_abs)
            } else {
                None
            },
        }
    }

    /// True if any count is present and non-zero.
    pub fn has_any_count(&self) -> bool {
        [self.people, self.equipment, self.aircraft]
            .into_iter()
            .flatten()
            .any(|n| n != 0)
    }

    pub fn people_or_zero(&self) -> i64 {
        i64::from(self.people.unwrap_or(0))
    }

    pub fn equipment_or_zero(&self) -> i64 {
        i64::from(self.equipment.unwrap_or(0))
    }

    pub fn aircraft_or_zero(&self) -> i64 {
        i64::from(self.aircraft.unwrap_or(0))
    }
}

/// Responder units for all five categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderRoster {
    pub local_authority: ResponderUnit,
    pub forest_protection: ResponderUnit,
    pub emergency_service: ResponderUnit,
    pub internal_affairs: ResponderUnit,
    pub other_organizations: ResponderUnit,
}

impl ResponderRoster {
    pub fn unit(&self, category: ResponderCategory) -> &ResponderUnit {
        match category {
            ResponderCategory::LocalAuthority => &self.local_authority,
            ResponderCategory::ForestProtection => &self.forest_protection,
            ResponderCategory::EmergencyService => &self.emergency_service,
            ResponderCategory::InternalAffairs => &self.internal_affairs,
            ResponderCategory::OtherOrganizations => &self.other_organizations,
        }
    }

    pub fn unit_mut(&mut self, category: ResponderCategory) -> &mut ResponderUnit {
        match category {
            ResponderCategory::LocalAuthority => &mut self.local_authority,
            ResponderCategory::ForestProtection => &mut self.forest_protection,
            ResponderCategory::EmergencyService => &mut self.emergency_service,
            ResponderCategory::InternalAffairs => &mut self.internal_affairs,
            ResponderCategory::OtherOrganizations => &mut self.other_organizations,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResponderCategory, &ResponderUnit)> + '_ {
        ResponderCategory::ALL
            .into_iter()
            .map(move |c| (c, self.unit(c)))
    }

    fn normalized(mut self) -> Self {
        for category in ResponderCategory::ALL {
            let unit = self.unit_mut(category);
            *unit = unit.normalized(category.tracks_aircraft());
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Damage
// ---------------------------------------------------------------------------

/// Breakdown of the burned area by land type, in hectares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageBreakdown {
    pub forest: Option<f64>,
    pub forest_covered: Option<f64>,
    pub crown: Option<f64>,
    pub non_forest: Option<f64>,
}

impl DamageBreakdown {
    fn normalized(self) -> Self {
        Self {
            forest: self.forest.map(f64::abs),
            forest_covered: self.forest_covered.map(f64::abs),
            crown: self.crown.map(f64::abs),
            non_forest: self.non_forest.map(f64::abs),
        }
    }

    fn values(&self) -> [Option<f64>; 4] {
        [self.forest, self.forest_covered, self.crown, self.non_forest]
    }
}

// ---------------------------------------------------------------------------
// Report (draft) and incident (persisted)
// ---------------------------------------------------------------------------

/// Everything recorded about a fire, without a store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FireReport {
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub region: String,
    #[validate(length(min = 1, max = 255, message = "must be between 1 and 255 characters"))]
    pub location: String,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub branch: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub forestry: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub quarter: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub allotment: Option<String>,
    pub damage_area: Option<f64>,
    #[serde(default)]
    pub damage: DamageBreakdown,
    #[serde(default)]
    pub responders: ResponderRoster,
    pub damage_amount: Option<i64>,
    pub firefighting_cost: Option<i64>,
    pub misc_code: Option<i64>,
    pub description: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub attachment: Option<String>,
    #[serde(default)]
    pub reviewed: bool,
}

impl FireReport {
    /// Trim the location names and replace every quantity with its magnitude.
    pub fn normalized(mut self) -> Self {
        self.region = self.region.trim().to_string();
        self.location = self.location.trim().to_string();
        self.damage_area = self.damage_area.map(f64::abs);
        self.damage = self.damage.normalized();
        self.responders = self.responders.normalized();
        self.damage_amount = self.damage_amount.map(i64::saturating_abs);
        self.firefighting_cost = self.firefighting_cost.map(i64::saturating_abs);
        self.misc_code = self.misc_code.map(i64::saturating_abs);
        self
    }

    /// Field-level checks that need no reference data.
    pub fn validate_fields(&self) -> Result<(), CoreError> {
        self.validate()?;

        if self.region.trim().is_empty() {
            return Err(CoreError::Validation("region must not be empty".into()));
        }
        if self.location.trim().is_empty() {
            return Err(CoreError::Validation("location must not be empty".into()));
        }

        let areas = std::iter::once(self.damage_area).chain(self.damage.values());
        if areas.flatten().any(|v| !v.is_finite()) {
            return Err(CoreError::Validation(
                "damage figures must be finite numbers".into(),
            ));
        }

        validate_engagement(&self.responders)?;

        if let Some(name) = &self.attachment {
            validate_attachment_name(name)?;
        }
        Ok(())
    }

    /// Normalize, validate, and check the location against the catalog.
    ///
    /// This is the only way a request body becomes something the store accepts.
    pub fn prepare(self, catalog: &RegionCatalog) -> Result<Self, CoreError> {
        let report = self.normalized();
        report.validate_fields()?;
        catalog.validate_location(&report.region, &report.location)?;
        Ok(report)
    }
}

/// A stored fire incident.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FireIncident {
    pub id: DbId,
    #[serde(flatten)]
    pub report: FireReport,
}

impl FireIncident {
    pub fn region(&self) -> &str {
        &self.report.region
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// An engaged category must report at least one non-zero count.
pub fn validate_engagement(roster: &ResponderRoster) -> Result<(), CoreError> {
    for (category, unit) in roster.iter() {
        if unit.engaged && !unit.has_any_count() {
            return Err(CoreError::Validation(format!(
                "{} is marked as engaged but has no people, equipment or aircraft counts",
                category.key()
            )));
        }
    }
    Ok(())
}

/// Check the extension of an attachment reference.
pub fn validate_attachment_name(name: &str) -> Result<(), CoreError> {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_ATTACHMENT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "attachment '{name}' must be one of: {}",
            ALLOWED_ATTACHMENT_EXTENSIONS.join(", ")
        )));
    }
    Ok(())
}
