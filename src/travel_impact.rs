//! Table-driven estimate of trip days lost to getting there.
//!
//! A coarse stand-in for a real routing lookup. Every rule is a
//! case-insensitive substring match against curated tables, tried in a fixed
//! order; the first rule that matches decides.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A hard-to-reach destination (hill station, remote valley, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteDestination {
    /// Lowercase key; underscore-separated keys also match on any part.
    pub name: String,
    pub nearest_airport: String,
    pub road_time_hours: u32,
    pub impact_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedImpact {
    pub name: String,
    pub impact_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Region {
    pub name: String,
    pub cities: Vec<String>,
}

/// Matches when the destination contains one of `destination_keywords` and
/// the origin contains one of `origin_keywords`.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectionalRule {
    pub destination_keywords: Vec<String>,
    pub origin_keywords: Vec<String>,
    pub impact_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TravelImpactTables {
    pub remote_destinations: Vec<RemoteDestination>,
    pub major_cities: Vec<NamedImpact>,
    pub beach_destinations: Vec<NamedImpact>,
    pub international_keywords: Vec<String>,
    pub international_impact_days: u32,
    pub regions: Vec<Region>,
    pub same_region_days: u32,
    pub cross_region_days: u32,
    pub directional_rules: Vec<DirectionalRule>,
    pub default_days: u32,
}

/// Which rule produced an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum TravelClass {
    MissingEndpoint,
    RemoteDestination { name: String, nearest_airport: String },
    MajorCity { name: String },
    BeachDestination { name: String },
    International,
    SameRegion { region: String },
    CrossRegion { from: String, to: String },
    Directional,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TravelImpact {
    pub days: u32,
    pub class: TravelClass,
}

#[derive(Debug, Clone, Copy)]
pub struct TravelImpactEstimator<'a> {
    tables: &'a TravelImpactTables,
}

impl<'a> TravelImpactEstimator<'a> {
    pub fn new(tables: &'a TravelImpactTables) -> Self {
        Self { tables }
    }

    /// Days consumed by travelling from `origin` to `destination`.
    pub fn estimate(&self, origin: &str, destination: &str) -> u32 {
        self.assess(origin, destination).days
    }

    pub fn assess(&self, origin: &str, destination: &str) -> TravelImpact {
        let impact = self.classify(&origin.trim().to_lowercase(), &destination.trim().to_lowercase());
        debug!(origin, destination, days = impact.days, class = ?impact.class, "travel impact");
        impact
    }

    fn classify(&self, origin: &str, destination: &str) -> TravelImpact {
        let tables = self.tables;
        if origin.is_empty() || destination.is_empty() {
            return TravelImpact {
                days: 0,
                class: TravelClass::MissingEndpoint,
            };
        }

        if let Some(remote) = tables
            .remote_destinations
            .iter()
            .find(|remote| remote_matches(&remote.name, destination))
        {
            let origin_is_major = tables
                .major_cities
                .iter()
                .any(|city| origin.contains(city.name.as_str()));
            return TravelImpact {
                days: remote.impact_days + u32::from(!origin_is_major),
                class: TravelClass::RemoteDestination {
                    name: remote.name.clone(),
                    nearest_airport: remote.nearest_airport.clone(),
                },
            };
        }

        if let Some(city) = find_named(&tables.major_cities, destination) {
            return TravelImpact {
                days: city.impact_days,
                class: TravelClass::MajorCity {
                    name: city.name.clone(),
                },
            };
        }

        if let Some(beach) = find_named(&tables.beach_destinations, destination) {
            return TravelImpact {
                days: beach.impact_days,
                class: TravelClass::BeachDestination {
                    name: beach.name.clone(),
                },
            };
        }

        let international = |text: &str| {
            tables
                .international_keywords
                .iter()
                .any(|keyword| text.contains(keyword.as_str()))
        };
        if international(origin) || international(destination) {
            return TravelImpact {
                days: tables.international_impact_days,
                class: TravelClass::International,
            };
        }

        if let (Some(from), Some(to)) = (self.region_of(origin), self.region_of(destination)) {
            return if from.name == to.name {
                TravelImpact {
                    days: tables.same_region_days,
                    class: TravelClass::SameRegion {
                        region: from.name.clone(),
                    },
                }
            } else {
                TravelImpact {
                    days: tables.cross_region_days,
                    class: TravelClass::CrossRegion {
                        from: from.name.clone(),
                        to: to.name.clone(),
                    },
                }
            };
        }

        if let Some(rule) = tables.directional_rules.iter().find(|rule| {
            contains_any(destination, &rule.destination_keywords)
                && contains_any(origin, &rule.origin_keywords)
        }) {
            return TravelImpact {
                days: rule.impact_days,
                class: TravelClass::Directional,
            };
        }

        TravelImpact {
            days: tables.default_days,
            class: TravelClass::Default,
        }
    }

    /// The last region listing a city contained in `place` wins.
    fn region_of(&self, place: &str) -> Option<&'a Region> {
        self.tables
            .regions
            .iter()
            .rev()
            .find(|region| contains_any(place, &region.cities))
    }
}

/// Sightseeing days left once travel is taken out; never below one.
pub fn effective_days(total_days: u32, impact_days: u32) -> u32 {
    total_days.saturating_sub(impact_days).max(1)
}

fn remote_matches(key: &str, destination: &str) -> bool {
    destination.contains(key) || key.split('_').any(|part| destination.contains(part))
}

fn find_named<'t>(table: &'t [NamedImpact], text: &str) -> Option<&'t NamedImpact> {
    table.iter().find(|entry| text.contains(entry.name.as_str()))
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword.as_str()))
}

const REMOTE_DESTINATIONS: &[(&str, &str, u32, u32)] = &[
    ("coorg", "mangalore", 3, 1),
    ("kodagu", "mangalore", 3, 1),
    ("ooty", "coimbatore", 3, 1),
    ("ootacamund", "coimbatore", 3, 1),
    ("munnar", "cochin", 4, 1),
    ("manali", "chandigarh", 8, 2),
    ("shimla", "chandigarh", 4, 1),
    ("darjeeling", "bagdogra", 3, 1),
    ("gangtok", "bagdogra", 4, 1),
    ("mussoorie", "dehradun", 1, 1),
    ("nainital", "pantnagar", 2, 1),
    ("mcleodganj", "dharamshala", 1, 1),
    ("kasol", "chandigarh", 6, 2),
    ("rishikesh", "dehradun", 1, 0),
    ("haridwar", "dehradun", 1, 0),
    ("almora", "pantnagar", 4, 1),
    ("lansdowne", "dehradun", 3, 1),
    ("kasauli", "chandigarh", 2, 1),
    ("dalhousie", "pathankot", 2, 1),
    ("khajjiar", "pathankot", 3, 1),
    ("kullu", "bhuntar", 1, 1),
    ("spiti", "chandigarh", 12, 2),
    ("ladakh", "leh", 1, 1),
    ("leh", "leh", 0, 1),
    ("srinagar", "srinagar", 0, 1),
    ("gulmarg", "srinagar", 2, 1),
    ("pahalgam", "srinagar", 3, 1),
    ("sonamarg", "srinagar", 3, 1),
    ("kodaikanal", "madurai", 3, 1),
    ("yercaud", "salem", 1, 0),
    ("coonoor", "coimbatore", 2, 1),
    ("kotagiri", "coimbatore", 2, 1),
    ("wayanad", "calicut", 2, 1),
    ("thekkady", "madurai", 3, 1),
    ("ponmudi", "trivandrum", 2, 1),
    ("vagamon", "cochin", 3, 1),
    ("sakleshpur", "bangalore", 4, 1),
    ("chikmagalur", "bangalore", 4, 1),
    ("kemmanagundi", "bangalore", 5, 1),
    ("kudremukh", "mangalore", 3, 1),
    ("shillong", "guwahati", 3, 1),
    ("cherrapunji", "guwahati", 4, 1),
    ("kaziranga", "guwahati", 4, 1),
    ("tawang", "guwahati", 8, 2),
    ("ziro", "guwahati", 6, 2),
    ("kohima", "dimapur", 2, 1),
    ("imphal", "imphal", 0, 1),
    ("aizawl", "lengpui", 1, 1),
    ("pushkar", "jaipur", 3, 1),
    ("mount_abu", "udaipur", 3, 1),
    ("bundi", "jaipur", 4, 1),
    ("chittorgarh", "udaipur", 2, 1),
    ("bikaner", "jodhpur", 3, 1),
    ("jaisalmer", "jodhpur", 5, 2),
];

const MAJOR_CITIES: &[(&str, u32)] = &[
    ("mumbai", 0), ("bangalore", 0), ("delhi", 0), ("chennai", 0), ("kolkata", 0),
    ("hyderabad", 0), ("pune", 0), ("ahmedabad", 0), ("surat", 0), ("jaipur", 0),
    ("lucknow", 0), ("kanpur", 0), ("nagpur", 0), ("indore", 0), ("thane", 0),
    ("bhopal", 0), ("visakhapatnam", 0), ("pimpri", 0), ("patna", 0), ("vadodara", 0),
    ("ludhiana", 0), ("agra", 0), ("nashik", 0), ("faridabad", 0), ("meerut", 0),
    ("rajkot", 0), ("kalyan", 0), ("vasai", 0), ("varanasi", 0), ("srinagar", 1),
    ("aurangabad", 0), ("dhanbad", 0), ("amritsar", 0), ("allahabad", 0), ("ranchi", 0),
    ("howrah", 0), ("coimbatore", 0), ("jabalpur", 0), ("gwalior", 0), ("vijayawada", 0),
    ("jodhpur", 0), ("madurai", 0), ("raipur", 0), ("kota", 0), ("chandigarh", 0),
    ("guwahati", 1), ("solapur", 0), ("tiruchirappalli", 0), ("hubli", 0), ("mysore", 0),
    ("tiruppur", 0), ("moradabad", 0), ("salem", 0), ("guntur", 0), ("bhiwandi", 0),
    ("saharanpur", 0), ("gorakhpur", 0), ("bikaner", 1), ("amravati", 0), ("noida", 0),
    ("jamshedpur", 0), ("bhilai", 0), ("warangal", 0), ("cuttack", 0), ("firozabad", 0),
    ("kochi", 0), ("cochin", 0), ("ernakulam", 0), ("trivandrum", 0), ("calicut", 0),
    ("kozhikode", 0), ("thrissur", 0), ("kollam", 0), ("alappuzha", 0), ("kottayam", 0),
    ("goa", 0), ("panaji", 0), ("margao", 0), ("vasco", 0),
];

const BEACH_DESTINATIONS: &[(&str, u32)] = &[
    ("goa", 0), ("pondicherry", 0), ("puducherry", 0), ("varkala", 0), ("kovalam", 0),
    ("mamallapuram", 0), ("mahabalipuram", 0), ("dhanushkodi", 1), ("rameswaram", 1),
    ("digha", 1), ("puri", 1), ("konark", 1), ("chandipur", 1), ("gopalpur", 1),
    ("vishakhapatnam", 0), ("vizag", 0), ("araku", 1), ("hampi", 1), ("badami", 1),
    ("aihole", 1), ("pattadakal", 1), ("bijapur", 1), ("gokarna", 1), ("karwar", 1),
    ("udupi", 1), ("mangalore", 0), ("kannur", 1), ("bekal", 1), ("kasaragod", 1),
];

const INTERNATIONAL_KEYWORDS: &[&str] = &[
    "usa", "america", "united states", "new york", "california", "washington",
    "uk", "england", "london", "scotland", "wales", "britain", "great britain",
    "europe", "france", "paris", "germany", "berlin", "italy", "rome", "spain",
    "netherlands", "amsterdam", "switzerland", "sweden", "norway", "denmark",
    "canada", "toronto", "vancouver", "montreal", "ottawa",
    "australia", "sydney", "melbourne", "perth", "brisbane", "adelaide",
    "singapore", "malaysia", "kuala lumpur", "thailand", "bangkok", "phuket",
    "indonesia", "bali", "jakarta", "philippines", "manila", "cebu",
    "japan", "tokyo", "kyoto", "osaka", "china", "beijing", "shanghai",
    "south korea", "seoul", "hong kong", "macau", "taiwan", "taipei",
    "dubai", "uae", "abu dhabi", "qatar", "doha", "kuwait", "bahrain",
    "saudi arabia", "riyadh", "jeddah", "oman", "muscat",
    "sri lanka", "colombo", "maldives", "male", "nepal", "kathmandu",
    "bhutan", "thimphu", "bangladesh", "dhaka", "myanmar", "yangon",
    "vietnam", "ho chi minh", "hanoi", "cambodia", "phnom penh",
    "south africa", "cape town", "johannesburg", "egypt", "cairo",
    "turkey", "istanbul", "russia", "moscow", "brazil", "rio de janeiro",
];

const REGIONS: &[(&str, &[&str])] = &[
    ("maharashtra", &["mumbai", "pune", "nagpur", "nashik", "aurangabad"]),
    ("karnataka", &["bangalore", "mysore", "hubli", "mangalore", "belgaum", "coorg"]),
    ("tamil_nadu", &["chennai", "coimbatore", "madurai", "salem", "tiruchirapalli", "ooty"]),
    ("kerala", &["kochi", "trivandrum", "calicut", "thrissur", "munnar"]),
    ("gujarat", &["ahmedabad", "surat", "vadodara", "rajkot"]),
    ("rajasthan", &["jaipur", "jodhpur", "udaipur", "bikaner", "pushkar"]),
    ("uttar_pradesh", &["lucknow", "kanpur", "agra", "varanasi", "allahabad"]),
    ("west_bengal", &["kolkata", "howrah", "darjeeling"]),
    ("delhi", &["delhi", "new delhi"]),
    ("punjab", &["ludhiana", "amritsar", "chandigarh"]),
    ("haryana", &["faridabad", "gurgaon", "chandigarh"]),
    ("himachal_pradesh", &["shimla", "manali", "dharamshala"]),
    ("uttarakhand", &["dehradun", "haridwar", "rishikesh", "nainital"]),
    ("goa", &["panaji", "margao", "vasco"]),
    ("assam", &["guwahati", "kaziranga"]),
    ("odisha", &["bhubaneswar", "cuttack", "puri"]),
    ("andhra_pradesh", &["hyderabad", "visakhapatnam", "vijayawada"]),
    ("telangana", &["hyderabad"]),
    ("jharkhand", &["ranchi", "jamshedpur"]),
    ("bihar", &["patna"]),
    ("madhya_pradesh", &["bhopal", "indore", "jabalpur"]),
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn named(items: &[(&str, u32)]) -> Vec<NamedImpact> {
    items
        .iter()
        .map(|(name, impact_days)| NamedImpact {
            name: name.to_string(),
            impact_days: *impact_days,
        })
        .collect()
}

impl Default for TravelImpactTables {
    fn default() -> Self {
        Self {
            remote_destinations: REMOTE_DESTINATIONS
                .iter()
                .map(|(name, airport, hours, days)| RemoteDestination {
                    name: name.to_string(),
                    nearest_airport: airport.to_string(),
                    road_time_hours: *hours,
                    impact_days: *days,
                })
                .collect(),
            major_cities: named(MAJOR_CITIES),
            beach_destinations: named(BEACH_DESTINATIONS),
            international_keywords: strings(INTERNATIONAL_KEYWORDS),
            international_impact_days: 2,
            regions: REGIONS
                .iter()
                .map(|(name, cities)| Region {
                    name: name.to_string(),
                    cities: strings(cities),
                })
                .collect(),
            same_region_days: 0,
            cross_region_days: 1,
            directional_rules: vec![
                DirectionalRule {
                    destination_keywords: strings(&["north", "kashmir", "ladakh", "himachal", "uttarakhand"]),
                    origin_keywords: strings(&["south", "kerala", "tamil", "karnataka", "andhra"]),
                    impact_days: 2,
                },
                DirectionalRule {
                    destination_keywords: strings(&["east", "assam", "meghalaya", "manipur", "nagaland"]),
                    origin_keywords: strings(&["west", "maharashtra", "gujarat", "rajasthan"]),
                    impact_days: 2,
                },
            ],
            default_days: 1,
        }
    }
}
