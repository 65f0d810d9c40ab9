use std::time::Duration;

use scraper::Html;
use tracing::{debug, warn};

use super::loader::open_environment_panel;
use super::session::{selector, texts, Session};
use super::traits::{Driver, NeighborhoodScraper};
use super::types::{ScrapeParams, ScraperKind};
use crate::error::Result;
use crate::models::{EnvField, EnvironmentRecord, Place};
use crate::storage::ColumnTable;

/// A single value read from its own element rather than from the group's list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TailValue {
    pub selector: &'static str,
    pub field: EnvField,
}

/// One block of the environment panel, read positionally.
///
/// The texts of `selector` in `start..end` are zipped against `fields`; a
/// position the page did not render leaves its field unset. The `tail` value
/// always lands in its own field, however long the list is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldGroup {
    pub name: &'static str,
    pub selector: &'static str,
    pub start: usize,
    pub end: Option<usize>,
    pub fields: &'static [EnvField],
    pub tail: Option<TailValue>,
}

const BOLD_VALUES: &str = "b.ng-binding";

pub const EDUCATION: FieldGroup = FieldGroup {
    name: "education",
    selector: "div.mwa-education__item-title.ng-binding",
    start: 0,
    end: None,
    fields: &[
        EnvField::Schools,
        EnvField::Kindergartens,
        EnvField::NonFormalInstitutions,
        EnvField::EducationAvgDistance,
    ],
    tail: None,
};

pub const GREEN_AREAS: FieldGroup = FieldGroup {
    name: "green areas",
    selector: BOLD_VALUES,
    start: 5,
    end: Some(9),
    fields: &[
        EnvField::GreenAreaSqm,
        EnvField::ParksCount,
        EnvField::GreenAvgDistance,
        EnvField::ParksAvgDistance,
    ],
    tail: None,
};

/// Three counts sit in the bold list; the average distance is rendered in a
/// separate column block.
pub const PUBLIC_BUILDINGS: FieldGroup = FieldGroup {
    name: "public buildings",
    selector: BOLD_VALUES,
    start: 9,
    end: Some(12),
    fields: &[
        EnvField::PublicInstitutions,
        EnvField::CommunityInstitutions,
        EnvField::ReligiousInstitutions,
    ],
    tail: Some(TailValue {
        selector: "div.mwa-cols__item-title.ng-binding",
        field: EnvField::PublicBuildingAvgDistance,
    }),
};

pub const ENVIRONMENT_GROUPS: [FieldGroup; 3] = [EDUCATION, GREEN_AREAS, PUBLIC_BUILDINGS];

impl FieldGroup {
    /// Texts of the group's slice of `selector`. Out-of-range slices clamp to
    /// the list.
    pub fn values(&self, page: &Html) -> Result<Vec<String>> {
        let all = texts(page, &selector(self.selector)?);
        let end = self.end.unwrap_or(all.len()).min(all.len());
        let start = self.start.min(end);
        Ok(all[start..end].to_vec())
    }

    /// First text of the tail selector, if the group has one and it rendered
    pub fn tail_value(&self, page: &Html) -> Result<Option<String>> {
        match self.tail {
            Some(tail) => Ok(texts(page, &selector(tail.selector)?).into_iter().next()),
            None => Ok(None),
        }
    }

    /// Selectors that must be present before the group can be read
    pub fn required_selectors(&self) -> Vec<&'static str> {
        let mut required = vec![self.selector];
        required.extend(self.tail.map(|t| t.selector));
        required
    }
}

/// Read every group into one record for `place`
pub fn decode_environment(page: &Html, place: &Place, groups: &[FieldGroup]) -> Result<EnvironmentRecord> {
    let mut record = EnvironmentRecord::new(place);
    for group in groups {
        let values = group.values(page)?;
        if values.len() != group.fields.len() {
            warn!(
                "{}: {} group has {} of {} values",
                place.neighborhood.name,
                group.name,
                values.len(),
                group.fields.len()
            );
        }
        for (field, value) in group.fields.iter().zip(values) {
            record.set(*field, value.trim().to_string());
        }

        if let Some(tail) = group.tail {
            match group.tail_value(page)? {
                Some(value) => record.set(tail.field, value.trim().to_string()),
                None => warn!(
                    "{}: {} group has no {}",
                    place.neighborhood.name,
                    group.name,
                    tail.field.column()
                ),
            }
        }
    }
    Ok(record)
}

/// Environmental aggregates, one record per neighborhood
pub struct EnvironmentScraper {
    groups: &'static [FieldGroup],
    panel_settle: Duration,
}

impl EnvironmentScraper {
    pub fn new(params: &ScrapeParams) -> Self {
        Self {
            groups: &ENVIRONMENT_GROUPS,
            panel_settle: params.panel_settle,
        }
    }
}

impl NeighborhoodScraper for EnvironmentScraper {
    type Record = EnvironmentRecord;

    fn kind(&self) -> ScraperKind {
        ScraperKind::Environment
    }

    fn load<D: Driver>(&self, session: &mut Session<D>) -> Result<Html> {
        open_environment_panel(session)?;
        session.settle(self.panel_settle);

        let mut required: Vec<&str> = Vec::new();
        for group in self.groups {
            for css in group.required_selectors() {
                if !required.contains(&css) {
                    required.push(css);
                }
            }
        }
        session.wait_for_all(&required)
    }

    fn extract(&self, page: &Html, place: &Place, table: &mut ColumnTable) -> Result<usize> {
        let record = decode_environment(page, place, self.groups)?;
        debug!("{:?}", record);
        table.append(&record);
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{City, Neighborhood};

    fn place() -> Place {
        Place {
            city: City { index: 2, name: "Herzliya".into() },
            neighborhood: Neighborhood { index: 0, name: "Center East".into() },
        }
    }

    fn panel(bold: &[&str], education: &[&str], distance: Option<&str>) -> Html {
        let mut html = String::from("<html><body>");
        for value in education {
            html.push_str(&format!(
                "<div class=\"mwa-education__item-title ng-binding\">{}</div>",
                value
            ));
        }
        for value in bold {
            html.push_str(&format!("<b class=\"ng-binding\">{}</b>", value));
        }
        if let Some(distance) = distance {
            html.push_str(&format!(
                "<div class=\"mwa-cols__item-title ng-binding\">{}</div>",
                distance
            ));
        }
        html.push_str("</body></html>");
        Html::parse_document(&html)
    }

    const BOLD: [&str; 12] = [
        "e0", "e1", "e2", "e3", "e4", "12,000", "8", "300", "450", "14", "22", "9",
    ];

    #[test]
    fn groups_map_to_their_fields() {
        let page = panel(&BOLD, &["5", "11", "3", "650"], Some("280"));
        let record = decode_environment(&page, &place(), &ENVIRONMENT_GROUPS).unwrap();

        assert_eq!(record.city, "Herzliya");
        assert_eq!(record.schools.as_deref(), Some("5"));
        assert_eq!(record.education_avg_distance.as_deref(), Some("650"));
        assert_eq!(record.green_area_sqm.as_deref(), Some("12,000"));
        assert_eq!(record.parks_avg_distance.as_deref(), Some("450"));
        assert_eq!(record.public_institutions.as_deref(), Some("14"));
        assert_eq!(record.religious_institutions.as_deref(), Some("9"));
        assert_eq!(record.public_building_avg_distance.as_deref(), Some("280"));
    }

    #[test]
    fn public_buildings_take_three_counts_plus_tail() {
        let page = panel(&BOLD, &[], Some("280"));
        assert_eq!(PUBLIC_BUILDINGS.values(&page).unwrap(), vec!["14", "22", "9"]);
        assert_eq!(PUBLIC_BUILDINGS.tail_value(&page).unwrap().as_deref(), Some("280"));
    }

    #[test]
    fn short_bold_list_keeps_distance_in_its_column() {
        let page = panel(&BOLD[..11], &[], Some("280"));
        let record = decode_environment(&page, &place(), &ENVIRONMENT_GROUPS).unwrap();

        assert_eq!(record.public_institutions.as_deref(), Some("14"));
        assert_eq!(record.community_institutions.as_deref(), Some("22"));
        assert_eq!(record.religious_institutions, None);
        assert_eq!(record.public_building_avg_distance.as_deref(), Some("280"));
    }

    #[test]
    fn extra_bold_values_do_not_displace_distance() {
        let mut bold = BOLD.to_vec();
        bold.push("extra");
        let page = panel(&bold, &[], Some("280"));
        let record = decode_environment(&page, &place(), &ENVIRONMENT_GROUPS).unwrap();

        assert_eq!(record.religious_institutions.as_deref(), Some("9"));
        assert_eq!(record.public_building_avg_distance.as_deref(), Some("280"));
    }

    #[test]
    fn missing_distance_leaves_counts_alone() {
        let page = panel(&BOLD, &[], None);
        let record = decode_environment(&page, &place(), &ENVIRONMENT_GROUPS).unwrap();

        assert_eq!(record.religious_institutions.as_deref(), Some("9"));
        assert_eq!(record.public_building_avg_distance, None);
    }

    #[test]
    fn missing_values_stay_empty() {
        let page = panel(&BOLD[..7], &["5"], None);
        let record = decode_environment(&page, &place(), &ENVIRONMENT_GROUPS).unwrap();

        assert_eq!(record.schools.as_deref(), Some("5"));
        assert_eq!(record.kindergartens, None);
        assert_eq!(record.parks_count.as_deref(), Some("8"));
        assert_eq!(record.green_avg_distance, None);
        assert_eq!(record.public_institutions, None);
        assert_eq!(record.public_building_avg_distance, None);
    }

    #[test]
    fn extract_appends_one_row() {
        let page = panel(&BOLD, &["5", "11", "3", "650"], Some("280"));
        let scraper = EnvironmentScraper::new(&ScrapeParams::environment());
        let mut table = ColumnTable::for_rows::<EnvironmentRecord>();

        assert_eq!(scraper.extract(&page, &place(), &mut table).unwrap(), 1);
        assert_eq!(table.row_count().unwrap(), 1);
        assert_eq!(
            table.column("Green_Areas_SQM").unwrap()[0].as_deref(),
            Some("12,000")
        );
    }
}
