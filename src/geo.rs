//! Country names the map renderer recognises, keyed to ISO 3166-1 alpha-3.
//!
//! Matching is exact apart from ASCII case. Abbreviations and local names in
//! the source data (`EIRE`, `USA`, `RSA`, `Channel Islands`) do not match and
//! render as unmapped regions.

const COUNTRY_CODES: &[(&str, &str)] = &[
    ("Argentina", "ARG"),
    ("Australia", "AUS"),
    ("Austria", "AUT"),
    ("Bahrain", "BHR"),
    ("Bangladesh", "BGD"),
    ("Belgium", "BEL"),
    ("Brazil", "BRA"),
    ("Bulgaria", "BGR"),
    ("Canada", "CAN"),
    ("Chile", "CHL"),
    ("China", "CHN"),
    ("Colombia", "COL"),
    ("Croatia", "HRV"),
    ("Cyprus", "CYP"),
    ("Czech Republic", "CZE"),
    ("Czechia", "CZE"),
    ("Denmark", "DNK"),
    ("Egypt", "EGY"),
    ("Estonia", "EST"),
    ("Finland", "FIN"),
    ("France", "FRA"),
    ("Germany", "DEU"),
    ("Greece", "GRC"),
    ("Hong Kong", "HKG"),
    ("Hungary", "HUN"),
    ("Iceland", "ISL"),
    ("India", "IND"),
    ("Indonesia", "IDN"),
    ("Ireland", "IRL"),
    ("Israel", "ISR"),
    ("Italy", "ITA"),
    ("Japan", "JPN"),
    ("Jordan", "JOR"),
    ("Kenya", "KEN"),
    ("Kuwait", "KWT"),
    ("Latvia", "LVA"),
    ("Lebanon", "LBN"),
    ("Lithuania", "LTU"),
    ("Luxembourg", "LUX"),
    ("Malaysia", "MYS"),
    ("Malta", "MLT"),
    ("Mexico", "MEX"),
    ("Morocco", "MAR"),
    ("Netherlands", "NLD"),
    ("New Zealand", "NZL"),
    ("Nigeria", "NGA"),
    ("Norway", "NOR"),
    ("Oman", "OMN"),
    ("Pakistan", "PAK"),
    ("Peru", "PER"),
    ("Philippines", "PHL"),
    ("Poland", "POL"),
    ("Portugal", "PRT"),
    ("Qatar", "QAT"),
    ("Romania", "ROU"),
    ("Russia", "RUS"),
    ("Saudi Arabia", "SAU"),
    ("Serbia", "SRB"),
    ("Singapore", "SGP"),
    ("Slovakia", "SVK"),
    ("Slovenia", "SVN"),
    ("South Africa", "ZAF"),
    ("South Korea", "KOR"),
    ("Spain", "ESP"),
    ("Sri Lanka", "LKA"),
    ("Sweden", "SWE"),
    ("Switzerland", "CHE"),
    ("Taiwan", "TWN"),
    ("Thailand", "THA"),
    ("Tunisia", "TUN"),
    ("Turkey", "TUR"),
    ("Ukraine", "UKR"),
    ("United Arab Emirates", "ARE"),
    ("United Kingdom", "GBR"),
    ("United States", "USA"),
    ("Uruguay", "URY"),
    ("Vietnam", "VNM"),
];

pub fn iso3_for(country: &str) -> Option<&'static str> {
    let name = country.trim();
    COUNTRY_CODES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(iso3_for("United Kingdom"), Some("GBR"));
        assert_eq!(iso3_for("france"), Some("FRA"));
        assert_eq!(iso3_for(" Germany "), Some("DEU"));
    }

    #[test]
    fn test_abbreviations_are_not_aliased() {
        assert_eq!(iso3_for("UK"), None);
        assert_eq!(iso3_for("EIRE"), None);
        assert_eq!(iso3_for("USA"), None);
        assert_eq!(iso3_for("Unspecified"), None);
    }
}
