//! Region catalog: administrative regions and the sub-locations inside them.
//!
//! Loaded once at startup and shared read-only behind an `Arc`.

use indexmap::IndexMap;

use crate::error::CoreError;

/// Sub-locations shared by every region (national railway and road operators).
const NATIONAL_OPERATORS: [&str; 2] = ["АО НК «КТЖ»", "АО НК «КазАвтоЖол»"];

/// Built-in catalog, in display order. National operators are appended per region.
const BUILTIN_REGIONS: &[(&str, &[&str])] = &[
    (
        "Акмолинская область",
        &[
            "Акколь",
            "Барап",
            "Больше-Тюктинское",
            "Букпа",
            "Ерейментауское",
            "Кенесское",
            "Красноборское",
            "Куйбышевское",
            "Мало-Тюктинское",
            "Маралдинское",
            "Отрадненское",
            "Степногорское",
            "Урумкайское",
            "Бурабай ГНПП",
            "Буйратау ГНПП",
            "Кокшетау ГНПП",
            "РГКП Республиканский лесной селекционно-семеноводческий центр",
            "Сандыктауское учебно-производственное лесное хозяйство",
            "РГП на ПХВ Жасыл Аймақ",
            "Коргалжинский ГПЗ",
        ],
    ),
    (
        "Актюбинская область",
        &[
            "Актюбинское",
            "Больше-Барсукское",
            "Карабутакское",
            "Мартукское",
            "Темирское",
            "Уилское",
            "Хобдинское",
            "Иргиз-Тургайский ГПР",
        ],
    ),
    (
        "Алматинская область",
        &[
            "Баканасское",
            "Каскеленское",
            "Кегенское",
            "Куртинское",
            "Нарынкольское",
            "Кара Дала",
            "Шелекское",
            "«Кызыл жиде»",
            "Алматинский ГПЗ",
            "Иле-Алатауский ГНПП",
            "«Көлсай көлдері» ГНПП",
            "Чарынский ГНПП",
            "Иле-Балхаш ГПР",
        ],
    ),
    (
        "Атырауская область",
        &[
            "Атырауское",
            "Махамбетское",
            "Индерское",
            "Курмангазинское",
            "«Ақжайық» ГПР",
        ],
    ),
    (
        "Восточно-Казахстанская область",
        &[
            "Асубулакское",
            "Больше-Нарымское",
            "Верх-Убинское",
            "Зайсанское",
            "Зыряновское",
            "Курчумское",
            "Мало-Убинское",
            "Маркакольское",
            "Пихтовское",
            "Риддерское",
            "Самарское",
            "Усть-Каменогорское",
            "Черемшанское",
            "Западно-Алтайский ГПЗ",
            "Маркакольский ГПЗ",
            "Катон-Карагайский ГНПП",
        ],
    ),
    (
        "Жамбылская область",
        &[
            "Аккольское",
            "Акыртюбинское",
            "Байзакское",
            "Бурылбайталское",
            "Жамбылское",
            "Жуалынское",
            "Каракунузское",
            "Коктерекское",
            "Кордайское",
            "Коскудукское",
            "Луговское",
            "Меркенское",
            "Мойынкумское",
            "Сарысуское",
        ],
    ),
    (
        "Область Жетысу",
        &[
            "Алакольское",
            "Борлитобинское",
            "Жаркентское",
            "Капальское",
            "Талдыкорганское",
            "Уйгентасское",
            "Уштобинское",
            "Алакольский ГПЗ",
            "«Алтын-Эмель» ГНПП",
            "Жонгар-Алатауский ГНПП",
        ],
    ),
    (
        "Западно-Казахстанская область",
        &[
            "Акжаикское",
            "Бурлинское",
            "Тайпакское",
            "Уральское",
            "Урдинское",
            "Чапаевское",
            "Чингирлауское",
            "Январцевское",
            "«Бөкейорда» ГПР",
        ],
    ),
    (
        "Карагандинская область",
        &[
            "Актогайское",
            "Карагандинское",
            "Кувское",
            "Темиртауское",
            "«Буйратау» ГНПП",
            "Каркаралинский ГНПП",
            "Коргалжинский ГПЗ",
        ],
    ),
    (
        "Костанайская область",
        &[
            "Аракарагайское",
            "Басаманское",
            "Боровское",
            "Камыстинское",
            "Михайловское",
            "Пригородное",
            "Семиозерное",
            "Тарановское",
            "Узункольское",
            "Урицкое",
            "Усаковское",
            "Наурзумский ГПЗ",
            "Алтын Дала ГПР",
        ],
    ),
    (
        "Кызылординская область",
        &[
            "Аральское",
            "Жалагашское",
            "Жанакорганское",
            "Казалинское",
            "Кармакчинское",
            "Кызылординское",
            "Сырдарьинское",
            "Шиелийское",
            "Барсакельмесский ГПЗ",
        ],
    ),
    (
        "Мангыстауская область",
        &["Бейнеуское", "Самское", "Устюртский ГПЗ"],
    ),
    (
        "Павлодарская область",
        &[
            "Максимо-Горьковское",
            "Павлодарское",
            "Урлютюбское",
            "Баянаульский ГНПП",
            "«Ертис орманы» ГЛПР",
        ],
    ),
    (
        "Северо-Казахстанская область",
        &[
            "«Акан-Сері»",
            "Аккайынское",
            "Булаевское",
            "Бурлукское",
            "Есильское",
            "Жамбылское",
            "Кызылжарское",
            "Мамлютское",
            "Орлиногорское",
            "Пресновское",
            "Сергеевское",
            "Соколовское",
            "«Кокшетау» ГНПП",
        ],
    ),
    ("Область Улытау", &["Жанаркинское", "«Улытау» ГНПП"]),
    (
        "Туркестанская область",
        &[
            "Бадамское",
            "Жасыл желек",
            "Отрарское",
            "Созакское",
            "Шардаринское",
            "Жасыл аймак",
            "Жасыл белдеу",
            "Каратауский ГПЗ",
            "Сайрам-Угамский ГНПП",
            "Аксу-Жабаглинский ГПЗ",
            "Сырдарья-Туркестанский ГРП",
        ],
    ),
    (
        "Область Абай",
        &["«Семей орманы» ГЛПР", "Тарбагатайский ГНПП"],
    ),
];

/// Ordered mapping of region name to its sub-locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionCatalog {
    regions: IndexMap<String, Vec<String>>,
}

impl RegionCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        let regions = BUILTIN_REGIONS
            .iter()
            .map(|(region, locations)| {
                let locations = locations
                    .iter()
                    .chain(NATIONAL_OPERATORS.iter())
                    .map(|l| l.to_string())
                    .collect();
                (region.to_string(), locations)
            })
            .collect();
        Self { regions }
    }

    /// Build a catalog from explicit entries. Empty names are rejected.
    pub fn from_entries<I>(entries: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let mut regions = IndexMap::new();
        for (region, locations) in entries {
            let region = region.trim().to_string();
            if region.is_empty() {
                return Err(CoreError::Validation("Region name must not be empty".into()));
            }
            if locations.iter().any(|l| l.trim().is_empty()) {
                return Err(CoreError::Validation(format!(
                    "Region '{region}' has an empty location name"
                )));
            }
            if regions.insert(region.clone(), locations).is_some() {
                return Err(CoreError::Validation(format!(
                    "Region '{region}' is listed twice"
                )));
            }
        }
        if regions.is_empty() {
            return Err(CoreError::Validation("Region catalog is empty".into()));
        }
        Ok(Self { regions })
    }

    /// Parse a JSON object of `region -> [location, ...]`, preserving order.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let parsed: IndexMap<String, Vec<String>> = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid region catalog JSON: {e}")))?;
        Self::from_entries(parsed)
    }

    /// Region names in catalog order.
    pub fn all_regions(&self) -> Vec<&str> {
        self.regions.keys().map(String::as_str).collect()
    }

    /// Sub-locations of `region`, or an empty slice if the region is unknown.
    pub fn locations(&self, region: &str) -> &[String] {
        self.regions.get(region).map_or(&[], Vec::as_slice)
    }

    pub fn mapping(&self) -> &IndexMap<String, Vec<String>> {
        &self.regions
    }

    pub fn contains_region(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    pub fn validate_region(&self, region: &str) -> Result<(), CoreError> {
        if !self.contains_region(region) {
            return Err(CoreError::Validation(format!("Unknown region '{region}'")));
        }
        Ok(())
    }

    pub fn validate_location(&self, region: &str, location: &str) -> Result<(), CoreError> {
        self.validate_region(region)?;
        if !self.locations(region).iter().any(|l| l == location) {
            return Err(CoreError::Validation(format!(
                "Location '{location}' does not belong to region '{region}'"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn builtin_has_seventeen_regions_in_order() {
        let catalog = RegionCatalog::builtin();
        let regions = catalog.all_regions();
        assert_eq!(regions.len(), 17);
        assert_eq!(regions[0], "Акмолинская область");
        assert_eq!(regions[16], "Область Абай");
    }

    #[test]
    fn every_region_ends_with_national_operators() {
        let catalog = RegionCatalog::builtin();
        for region in catalog.all_regions() {
            let locations = catalog.locations(region);
            assert_eq!(&locations[locations.len() - 2..], &NATIONAL_OPERATORS.map(String::from));
        }
    }

    #[test]
    fn unknown_region_has_no_locations() {
        let catalog = RegionCatalog::builtin();
        assert!(catalog.locations("Atlantis").is_empty());
    }

    #[test]
    fn validate_location_checks_membership() {
        let catalog = RegionCatalog::builtin();
        assert!(catalog
            .validate_location("Алматинская область", "Каскеленское")
            .is_ok());
        assert_matches!(
            catalog.validate_location("Алматинская область", "Акколь"),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            catalog.validate_location("Atlantis", "Акколь"),
            Err(CoreError::Validation(msg)) if msg.contains("Unknown region")
        );
    }

    #[test]
    fn json_catalog_keeps_insertion_order() {
        let catalog =
            RegionCatalog::from_json_str(r#"{"Zeta": ["z1"], "Alpha": ["a1", "a2"]}"#).unwrap();
        assert_eq!(catalog.all_regions(), vec!["Zeta", "Alpha"]);
        assert_eq!(catalog.locations("Alpha"), &["a1".to_string(), "a2".to_string()]);
    }

    #[test]
    fn json_catalog_rejects_blank_names() {
        assert!(RegionCatalog::from_json_str(r#"{" ": ["x"]}"#).is_err());
        assert!(RegionCatalog::from_json_str(r#"{"R": [""]}"#).is_err());
        assert!(RegionCatalog::from_json_str("{}").is_err());
        assert!(RegionCatalog::from_json_str("not json").is_err());
    }
}
