use serde::{Deserialize, Serialize};

/// A city as shown on the portal's landing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub index: usize,
    pub name: String,
}

/// A neighborhood inside a city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighborhood {
    pub index: usize,
    pub name: String,
}

/// Where the crawler currently is; attached to every record it extracts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub city: City,
    pub neighborhood: Neighborhood,
}

/// Flush cycle of a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Accumulating,
    Flushing,
    Done,
}

/// Explicit crawl position. `neighborhood_index` is the next neighborhood
/// to visit inside `city_index`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlState {
    pub city_index: usize,
    pub neighborhood_index: usize,
    pub phase: Phase,
}

impl CrawlState {
    pub fn next_neighborhood(&mut self) {
        self.neighborhood_index += 1;
    }

    pub fn next_city(&mut self) {
        self.city_index += 1;
        self.neighborhood_index = 0;
    }
}

/// A record that can be laid out as one row of a columnar table
pub trait TableRow {
    /// Column names, in output order
    const COLUMNS: &'static [&'static str];

    /// Cell values, one per entry of `COLUMNS`
    fn cells(&self) -> Vec<Option<String>>;
}

/// One sold housing unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub sale_date: String,
    pub city: String,
    pub neighborhood: String,
    pub street: Option<String>,
    pub building_number: Option<String>,
    pub property_type: String,
    pub rooms: String,
    pub floor: String,
    pub area_sqm: String,
    pub price: String,
}

impl TableRow for TransactionRecord {
    const COLUMNS: &'static [&'static str] = &[
        "Sale_Date",
        "City",
        "Neighborhood",
        "Street",
        "Building_Number",
        "Property_Type",
        "Rooms",
        "Floor",
        "Square_Meter",
        "Price",
    ];

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            Some(self.sale_date.clone()),
            Some(self.city.clone()),
            Some(self.neighborhood.clone()),
            self.street.clone(),
            self.building_number.clone(),
            Some(self.property_type.clone()),
            Some(self.rooms.clone()),
            Some(self.floor.clone()),
            Some(self.area_sqm.clone()),
            Some(self.price.clone()),
        ]
    }
}

/// Environmental metrics shown in the "what's around" panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvField {
    Schools,
    Kindergartens,
    NonFormalInstitutions,
    EducationAvgDistance,
    GreenAreaSqm,
    ParksCount,
    GreenAvgDistance,
    ParksAvgDistance,
    PublicInstitutions,
    CommunityInstitutions,
    ReligiousInstitutions,
    PublicBuildingAvgDistance,
}

impl EnvField {
    pub const ALL: [EnvField; 12] = [
        EnvField::Schools,
        EnvField::Kindergartens,
        EnvField::NonFormalInstitutions,
        EnvField::EducationAvgDistance,
        EnvField::GreenAreaSqm,
        EnvField::ParksCount,
        EnvField::GreenAvgDistance,
        EnvField::ParksAvgDistance,
        EnvField::PublicInstitutions,
        EnvField::CommunityInstitutions,
        EnvField::ReligiousInstitutions,
        EnvField::PublicBuildingAvgDistance,
    ];

    pub fn column(self) -> &'static str {
        match self {
            EnvField::Schools => "Schools",
            EnvField::Kindergartens => "Kindergartens_And_Dormitories",
            EnvField::NonFormalInstitutions => "Non_Formal_Educational_Institutions",
            EnvField::EducationAvgDistance => "Education_Average_Distance",
            EnvField::GreenAreaSqm => "Green_Areas_SQM",
            EnvField::ParksCount => "Parks_And_Gardens",
            EnvField::GreenAvgDistance => "Green_Areas_Average_Distance",
            EnvField::ParksAvgDistance => "Parks_And_Gardens_Average_Distance",
            EnvField::PublicInstitutions => "Public_Institutions",
            EnvField::CommunityInstitutions => "Community_Institutions",
            EnvField::ReligiousInstitutions => "Religious_Institutions",
            EnvField::PublicBuildingAvgDistance => "Public_Building_Average_Distance",
        }
    }
}

/// Aggregated environment data for one neighborhood.
///
/// Metrics stay `None` when the panel did not render the element they are
/// read from, so a short group never shifts values into other columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentRecord {
    pub city: String,
    pub neighborhood: String,
    pub schools: Option<String>,
    pub kindergartens: Option<String>,
    pub non_formal_institutions: Option<String>,
    pub education_avg_distance: Option<String>,
    pub green_area_sqm: Option<String>,
    pub parks_count: Option<String>,
    pub green_avg_distance: Option<String>,
    pub parks_avg_distance: Option<String>,
    pub public_institutions: Option<String>,
    pub community_institutions: Option<String>,
    pub religious_institutions: Option<String>,
    pub public_building_avg_distance: Option<String>,
}

impl EnvironmentRecord {
    pub fn new(place: &Place) -> Self {
        Self {
            city: place.city.name.clone(),
            neighborhood: place.neighborhood.name.clone(),
            ..Self::default()
        }
    }

    pub fn set(&mut self, field: EnvField, value: String) {
        let slot = match field {
            EnvField::Schools => &mut self.schools,
            EnvField::Kindergartens => &mut self.kindergartens,
            EnvField::NonFormalInstitutions => &mut self.non_formal_institutions,
            EnvField::EducationAvgDistance => &mut self.education_avg_distance,
            EnvField::GreenAreaSqm => &mut self.green_area_sqm,
            EnvField::ParksCount => &mut self.parks_count,
            EnvField::GreenAvgDistance => &mut self.green_avg_distance,
            EnvField::ParksAvgDistance => &mut self.parks_avg_distance,
            EnvField::PublicInstitutions => &mut self.public_institutions,
            EnvField::CommunityInstitutions => &mut self.community_institutions,
            EnvField::ReligiousInstitutions => &mut self.religious_institutions,
            EnvField::PublicBuildingAvgDistance => &mut self.public_building_avg_distance,
        };
        *slot = Some(value);
    }

    pub fn get(&self, field: EnvField) -> Option<&str> {
        let slot = match field {
            EnvField::Schools => &self.schools,
            EnvField::Kindergartens => &self.kindergartens,
            EnvField::NonFormalInstitutions => &self.non_formal_institutions,
            EnvField::EducationAvgDistance => &self.education_avg_distance,
            EnvField::GreenAreaSqm => &self.green_area_sqm,
            EnvField::ParksCount => &self.parks_count,
            EnvField::GreenAvgDistance => &self.green_avg_distance,
            EnvField::ParksAvgDistance => &self.parks_avg_distance,
            EnvField::PublicInstitutions => &self.public_institutions,
            EnvField::CommunityInstitutions => &self.community_institutions,
            EnvField::ReligiousInstitutions => &self.religious_institutions,
            EnvField::PublicBuildingAvgDistance => &self.public_building_avg_distance,
        };
        slot.as_deref()
    }
}

impl TableRow for EnvironmentRecord {
    const COLUMNS: &'static [&'static str] = &[
        "City",
        "Neighborhood",
        "Schools",
        "Kindergartens_And_Dormitories",
        "Non_Formal_Educational_Institutions",
        "Education_Average_Distance",
        "Green_Areas_SQM",
        "Parks_And_Gardens",
        "Green_Areas_Average_Distance",
        "Parks_And_Gardens_Average_Distance",
        "Public_Institutions",
        "Community_Institutions",
        "Religious_Institutions",
        "Public_Building_Average_Distance",
    ];

    fn cells(&self) -> Vec<Option<String>> {
        let mut cells = vec![Some(self.city.clone()), Some(self.neighborhood.clone())];
        cells.extend(EnvField::ALL.iter().map(|f| self.get(*f).map(str::to_string)));
        cells
    }
}
