//! Drivers dimension: records, name normalization and id synthesis.
//!
//! Driver identity is the hardest part of the dimension model. A source row
//! carries only a display name and a contextual year; spelling and token
//! order drift across eras, and a handful of names are shared by different
//! real people. Matching is therefore tolerant (token permutations for 2–3
//! word names) while minting stays deterministic (initial-based ids with a
//! numeric suffix).

use serde::{Deserialize, Serialize};

/// Records at or before this year resolve a shared name to its
/// earliest-assigned id.
pub const EARLY_ERA_CUTOFF: i32 = 1991;

/// Records after this year resolve a shared name to its latest-assigned id;
/// years between the cutoffs fall back to the earliest. An approximate
/// heuristic; the source carries no authoritative disambiguation signal.
pub const LATE_ERA_CUTOFF: i32 = 2004;

/// One row of the drivers dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub driver_id: String,
    pub driver_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Standardize a display name for matching: trim and collapse whitespace.
pub fn normalize_driver_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All token orderings of a 2–3 word name, lowercased.
///
/// "Max Verstappen" matches "Verstappen Max" from older tables. Single-token
/// and 4+-token names match literally only; permuting those either does
/// nothing or explodes for little gain.
pub fn name_variants(name: &str) -> Vec<String> {
    let normalized = normalize_driver_name(name).to_lowercase();
    let tokens: Vec<&str> = normalized.split(' ').collect();
    match tokens.len() {
        2 => vec![
            tokens.join(" "),
            format!("{} {}", tokens[1], tokens[0]),
        ],
        3 => {
            let mut variants = Vec::with_capacity(6);
            let order = [
                [0, 1, 2],
                [0, 2, 1],
                [1, 0, 2],
                [1, 2, 0],
                [2, 0, 1],
                [2, 1, 0],
            ];
            for [a, b, c] in order {
                variants.push(format!("{} {} {}", tokens[a], tokens[b], tokens[c]));
            }
            variants
        }
        _ => vec![normalized],
    }
}

/// Base of a synthetic driver id: first three letters of the first name plus
/// first three of the last name, uppercased. Single-token names take their
/// first six characters. The registry appends the disambiguating suffix.
pub fn driver_base_id(name: &str) -> String {
    let normalized = normalize_driver_name(name);
    let tokens: Vec<&str> = normalized.split(' ').collect();
    if tokens.len() >= 2 {
        let first: String = tokens[0].chars().take(3).collect();
        let last: String = tokens[tokens.len() - 1].chars().take(3).collect();
        format!("{}{}", first, last).to_uppercase()
    } else {
        normalized.chars().take(6).collect::<String>().to_uppercase()
    }
}

/// Format a suffixed driver id. Two digits zero-padded up to 99, then plain.
pub fn driver_id_with_suffix(base: &str, suffix: u32) -> String {
    if suffix <= 99 {
        format!("{base}{suffix:02}")
    } else {
        format!("{base}{suffix}")
    }
}

/// Expand a scraped nationality code to a full country name.
///
/// Unknown codes pass through unchanged so nothing is lost on the way to the
/// warehouse.
pub fn country_name(code: &str) -> String {
    let full = match code.to_uppercase().as_str() {
        "ABU" => "United Arab Emirates",
        "AFG" => "Afghanistan",
        "ALB" => "Albania",
        "ALG" => "Algeria",
        "AND" => "Andorra",
        "ANG" => "Angola",
        "ARG" => "Argentina",
        "ARM" => "Armenia",
        "AUS" => "Australia",
        "AUT" => "Austria",
        "AZE" => "Azerbaijan",
        "BAH" => "Bahrain",
        "BAN" => "Bangladesh",
        "BAR" => "Barbados",
        "BEL" => "Belgium",
        "BER" => "Bermuda",
        "BOL" => "Bolivia",
        "BRA" => "Brazil",
        "BRN" => "Brunei",
        "BUL" => "Bulgaria",
        "BUR" => "Burkina Faso",
        "CAM" => "Cambodia",
        "CAN" => "Canada",
        "CHI" => "Chile",
        "CHN" => "China",
        "COL" => "Colombia",
        "CRC" => "Costa Rica",
        "CRO" => "Croatia",
        "CUB" => "Cuba",
        "CYP" => "Cyprus",
        "CZE" => "Czech Republic",
        "DDR" => "East Germany",
        "DEN" => "Denmark",
        "ECU" => "Ecuador",
        "EGY" => "Egypt",
        "ENG" => "England",
        "ESP" => "Spain",
        "EST" => "Estonia",
        "ETH" => "Ethiopia",
        "FIN" => "Finland",
        "FRA" => "France",
        "FRG" => "West Germany",
        "GBR" => "Great Britain",
        "GER" => "Germany",
        "GHA" => "Ghana",
        "GRE" => "Greece",
        "GUA" => "Guatemala",
        "HKG" => "Hong Kong",
        "HUN" => "Hungary",
        "INA" => "Indonesia",
        "IND" => "India",
        "IRL" => "Ireland",
        "IRN" => "Iran",
        "IRQ" => "Iraq",
        "ISL" => "Iceland",
        "ISR" => "Israel",
        "ITA" => "Italy",
        "JAM" => "Jamaica",
        "JOR" => "Jordan",
        "JPN" => "Japan",
        "KAZ" => "Kazakhstan",
        "KEN" => "Kenya",
        "KOR" => "South Korea",
        "KUW" => "Kuwait",
        "LAT" => "Latvia",
        "LIB" => "Lebanon",
        "LIE" => "Liechtenstein",
        "LTU" => "Lithuania",
        "LUX" => "Luxembourg",
        "MAD" => "Madagascar",
        "MAL" => "Malaysia",
        "MAR" => "Morocco",
        "MEX" => "Mexico",
        "MON" => "Monaco",
        "MYA" => "Myanmar",
        "NED" => "Netherlands",
        "NEP" => "Nepal",
        "NOR" => "Norway",
        "NZL" => "New Zealand",
        "PAK" => "Pakistan",
        "PAN" => "Panama",
        "PAR" => "Paraguay",
        "PER" => "Peru",
        "PHI" => "Philippines",
        "POL" => "Poland",
        "POR" => "Portugal",
        "PUR" => "Puerto Rico",
        "QAT" => "Qatar",
        "RHO" => "Rhodesia",
        "ROU" => "Romania",
        "RSA" => "South Africa",
        "RUS" => "Russia",
        "SAU" => "Saudi Arabia",
        "SCO" => "Scotland",
        "SEN" => "Senegal",
        "SIN" => "Singapore",
        "SLO" => "Slovenia",
        "SVK" => "Slovakia",
        "SWE" => "Sweden",
        "SWI" => "Switzerland",
        "SYR" => "Syria",
        "TCH" => "Czechoslovakia",
        "THA" => "Thailand",
        "TUN" => "Tunisia",
        "TUR" => "Turkey",
        "UAE" => "United Arab Emirates",
        "UKR" => "Ukraine",
        "URS" => "Soviet Union",
        "URU" => "Uruguay",
        "USA" => "United States",
        "UZB" => "Uzbekistan",
        "VEN" => "Venezuela",
        "VIE" => "Vietnam",
        "WAL" => "Wales",
        "YUG" => "Yugoslavia",
        "ZAM" => "Zambia",
        "ZIM" => "Zimbabwe",
        _ => return code.to_string(),
    };
    full.to_string()
}
