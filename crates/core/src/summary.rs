//! Regional fire summaries.
//!
//! [`summarize`] filters a batch of incidents, groups them by region in the
//! order regions are first seen, and sums damage and responder counts per
//! region and overall. It is a pure function: callers fetch the records and
//! apply visibility rules before handing them over.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::incident::{DateRange, FireIncident, ResponderCategory, ResponderUnit};

/// Region filter value that disables region filtering.
pub const ALL_REGIONS: &str = "all";

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Which incidents to include in a summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryFilter {
    /// Regions to keep. `None`, an empty list, or a list containing
    /// [`ALL_REGIONS`] keeps every region.
    pub regions: Option<Vec<String>>,
    #[serde(default)]
    pub date_range: DateRange,
}

impl SummaryFilter {
    pub fn everything() -> Self {
        Self::default()
    }

    fn region_set(&self) -> Option<&[String]> {
        match &self.regions {
            Some(list)
                if !list.is_empty() && !list.iter().any(|r| r.eq_ignore_ascii_case(ALL_REGIONS)) =>
            {
                Some(list.as_slice())
            }
            _ => None,
        }
    }

    pub fn matches(&self, incident: &FireIncident) -> bool {
        if !self.date_range.contains(incident.report.date) {
            return false;
        }
        match self.region_set() {
            Some(regions) => regions.iter().any(|r| r == &incident.report.region),
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// People, equipment and aircraft summed for one responder category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub people: i64,
    pub equipment: i64,
    pub aircraft: i64,
}

impl CategoryTotals {
    fn add_unit(&mut self, unit: &ResponderUnit) {
        self.people = self.people.saturating_add(unit.people_or_zero());
        self.equipment = self.equipment.saturating_add(unit.equipment_or_zero());
        self.aircraft = self.aircraft.saturating_add(unit.aircraft_or_zero());
    }
}

impl AddAssign for CategoryTotals {
    fn add_assign(&mut self, rhs: Self) {
        self.people = self.people.saturating_add(rhs.people);
        self.equipment = self.equipment.saturating_add(rhs.equipment);
        self.aircraft = self.aircraft.saturating_add(rhs.aircraft);
    }
}

/// Per-category totals, keyed the same way as the incident responder roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub local_authority: CategoryTotals,
    pub forest_protection: CategoryTotals,
    pub emergency_service: CategoryTotals,
    pub internal_affairs: CategoryTotals,
    pub other_organizations: CategoryTotals,
}

impl CategoryBreakdown {
    pub fn get(&self, category: ResponderCategory) -> &CategoryTotals {
        match category {
            ResponderCategory::LocalAuthority => &self.local_authority,
            ResponderCategory::ForestProtection => &self.forest_protection,
            ResponderCategory::EmergencyService => &self.emergency_service,
            ResponderCategory::InternalAffairs => &self.internal_affairs,
            ResponderCategory::OtherOrganizations => &self.other_organizations,
        }
    }

    fn get_mut(&mut self, category: ResponderCategory) -> &mut CategoryTotals {
        match category {
            ResponderCategory::LocalAuthority => &mut self.local_authority,
            ResponderCategory::ForestProtection => &mut self.forest_protection,
            ResponderCategory::EmergencyService => &mut self.emergency_service,
            ResponderCategory::InternalAffairs => &mut self.internal_affairs,
            ResponderCategory::OtherOrganizations => &mut self.other_organizations,
        }
    }
}

impl AddAssign for CategoryBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        for category in ResponderCategory::ALL {
            *self.get_mut(category) += *rhs.get(category);
        }
    }
}

/// Figures shared by a region row and the grand total.
///
/// Integer sums saturate at `i64::MAX` instead of wrapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub fire_count: i64,
    pub damage_area: f64,
    pub damage_amount: i64,
    pub people: i64,
    pub equipment: i64,
    /// Aircraft across the categories that track them.
    pub aircraft: i64,
    pub by_category: CategoryBreakdown,
}

impl SummaryMetrics {
    fn add_incident(&mut self, incident: &FireIncident) {
        let report = &incident.report;
        self.fire_count = self.fire_count.saturating_add(1);
        self.damage_area += report.damage_area.unwrap_or(0.0);
        self.damage_amount = self
            .damage_amount
            .saturating_add(report.damage_amount.unwrap_or(0));

        for (category, unit) in report.responders.iter() {
            self.people = self.people.saturating_add(unit.people_or_zero());
            self.equipment = self.equipment.saturating_add(unit.equipment_or_zero());
            if category.tracks_aircraft() {
                self.aircraft = self.aircraft.saturating_add(unit.aircraft_or_zero());
            }
            self.by_category.get_mut(category).add_unit(unit);
        }
    }
}

impl AddAssign<&SummaryMetrics> for SummaryMetrics {
    fn add_assign(&mut self, rhs: &SummaryMetrics) {
        self.fire_count = self.fire_count.saturating_add(rhs.fire_count);
        self.damage_area += rhs.damage_area;
        self.damage_amount = self.damage_amount.saturating_add(rhs.damage_amount);
        self.people = self.people.saturating_add(rhs.people);
        self.equipment = self.equipment.saturating_add(rhs.equipment);
        self.aircraft = self.aircraft.saturating_add(rhs.aircraft);
        self.by_category += rhs.by_category;
    }
}

/// One row of the summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    #[serde(flatten)]
    pub metrics: SummaryMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FireSummary {
    pub per_region: Vec<RegionSummary>,
    pub totals: SummaryMetrics,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Group the matching incidents by region and total them up.
///
/// Regions appear in the order they are first encountered in `records`.
/// Totals are the element-wise sum of the region rows.
pub fn summarize<'a, I>(records: I, filter: &SummaryFilter) -> FireSummary
where
    I: IntoIterator<Item = &'a FireIncident>,
{
    let mut per_region: Vec<RegionSummary> = Vec::new();

    for incident in records.into_iter().filter(|i| filter.matches(i)) {
        let idx = match per_region
            .iter()
            .position(|row| row.region == incident.report.region)
        {
            Some(idx) => idx,
            None => {
                per_region.push(RegionSummary {
                    region: incident.report.region.clone(),
                    metrics: SummaryMetrics::default(),
                });
                per_region.len() - 1
            }
        };
        per_region[idx].metrics.add_incident(incident);
    }

    let mut totals = SummaryMetrics::default();
    for row in &per_region {
        totals += &row.metrics;
    }

    FireSummary { per_region, totals }
}
