//! Region name to coordinate resolution.
//!
//! Maps a user-selected region name to geographic coordinates and a display
//! name for the system prompt. The table covers the Indian states and union
//! territories; anything unrecognized silently degrades to the default
//! location.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Fallback latitude (Visakhapatnam).
pub const DEFAULT_LATITUDE: f64 = 17.6868;

/// Fallback longitude (Visakhapatnam).
pub const DEFAULT_LONGITUDE: f64 = 83.2185;

/// Fallback display name.
pub const DEFAULT_LOCATION_NAME: &str = "Visakhapatnam, Andhra Pradesh";

/// Sentinel value the selection UI sends when no region is chosen.
pub const REGION_PLACEHOLDER: &str = "Select State";

/// Approximate center coordinates per region, keyed lowercase.
static REGION_COORDINATES: LazyLock<HashMap<&'static str, (f64, f64)>> = LazyLock::new(|| {
    HashMap::from([
        ("andaman and nicobar islands", (11.7401, 92.6586)),
        ("andhra pradesh", (15.9129, 79.7400)),
        ("arunachal pradesh", (28.2180, 94.7278)),
        ("assam", (26.2006, 92.9376)),
        ("bihar", (25.0961, 85.3131)),
        ("chandigarh", (30.7333, 76.7794)),
        ("chhattisgarh", (21.2787, 81.8661)),
        ("dadra and nagar haveli and daman and diu", (20.1809, 73.0169)),
        ("delhi", (28.7041, 77.1025)),
        ("goa", (15.2993, 74.1240)),
        ("gujarat", (22.2587, 71.1924)),
        ("haryana", (29.0588, 76.0856)),
        ("himachal pradesh", (31.1048, 77.1734)),
        ("jammu and kashmir", (33.7782, 76.5762)),
        ("jharkhand", (23.6102, 85.2799)),
        ("karnataka", (15.3173, 75.7139)),
        ("kerala", (10.8505, 76.2711)),
        ("ladakh", (34.1526, 77.5770)),
        ("lakshadweep", (10.5667, 72.6417)),
        ("madhya pradesh", (22.9734, 78.6569)),
        ("maharashtra", (19.7515, 75.7139)),
        ("manipur", (24.6637, 93.9063)),
        ("meghalaya", (25.4670, 91.3662)),
        ("mizoram", (23.1645, 92.9376)),
        ("nagaland", (26.1584, 94.5624)),
        ("odisha", (20.9517, 85.0985)),
        ("puducherry", (11.9416, 79.8083)),
        ("punjab", (31.1471, 75.3412)),
        ("rajasthan", (27.0238, 74.2179)),
        ("sikkim", (27.5330, 88.5122)),
        ("tamil nadu", (11.1271, 78.6569)),
        ("telangana", (18.1124, 79.0193)),
        ("tripura", (23.9408, 91.9882)),
        ("uttar pradesh", (26.8467, 80.9462)),
        ("uttarakhand", (30.0668, 79.0193)),
        ("west bengal", (22.9868, 87.8550)),
    ])
});

/// A resolved location for the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Human-readable name used in the system prompt.
    pub display_name: String,
}

impl ResolvedLocation {
    fn default_location() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            display_name: DEFAULT_LOCATION_NAME.to_string(),
        }
    }
}

/// Resolve a region selection to coordinates and a display name.
///
/// Absent input, the placeholder value (any case), and unknown region names
/// all fall back to the default location. An unknown region is a silent
/// degrade, not an error.
#[must_use]
pub fn resolve(selected_region: Option<&str>) -> ResolvedLocation {
    let Some(region) = selected_region else {
        tracing::debug!("no region selected, using default location");
        return ResolvedLocation::default_location();
    };

    if region.trim().is_empty() || region.eq_ignore_ascii_case(REGION_PLACEHOLDER) {
        tracing::debug!("placeholder region selected, using default location");
        return ResolvedLocation::default_location();
    }

    let key = region.to_lowercase();
    match REGION_COORDINATES.get(key.as_str()) {
        Some(&(latitude, longitude)) => ResolvedLocation {
            latitude,
            longitude,
            display_name: format!("{}, India", title_case(region)),
        },
        None => {
            tracing::debug!(region = %region, "unknown region, using default location");
            ResolvedLocation::default_location()
        }
    }
}

/// All selectable region names, title-cased and sorted.
#[must_use]
pub fn region_names() -> Vec<String> {
    let mut names: Vec<String> = REGION_COORDINATES.keys().map(|k| title_case(k)).collect();
    names.sort();
    names
}

/// Capitalize the first letter of each whitespace-separated word.
fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_region_uses_default() {
        let loc = resolve(None);
        assert_eq!(loc.latitude, DEFAULT_LATITUDE);
        assert_eq!(loc.longitude, DEFAULT_LONGITUDE);
        assert_eq!(loc.display_name, "Visakhapatnam, Andhra Pradesh");
    }

    #[test]
    fn placeholder_is_case_insensitive() {
        for placeholder in ["Select State", "select state", "SELECT STATE"] {
            let loc = resolve(Some(placeholder));
            assert_eq!(loc.display_name, DEFAULT_LOCATION_NAME);
        }
    }

    #[test]
    fn known_region_resolves_with_country_suffix() {
        let loc = resolve(Some("tamil nadu"));
        assert_eq!(loc.latitude, 11.1271);
        assert_eq!(loc.longitude, 78.6569);
        assert_eq!(loc.display_name, "Tamil Nadu, India");

        // Case variations hit the same entry.
        let loc = resolve(Some("TAMIL NADU"));
        assert_eq!(loc.display_name, "Tamil Nadu, India");
    }

    #[test]
    fn unknown_region_falls_back_silently() {
        let loc = resolve(Some("Narnia"));
        assert_eq!(loc.latitude, DEFAULT_LATITUDE);
        assert_eq!(loc.display_name, DEFAULT_LOCATION_NAME);
    }

    #[test]
    fn region_names_are_sorted_and_title_cased() {
        let names = region_names();
        assert_eq!(names.len(), 36);
        assert!(names.contains(&"Tamil Nadu".to_string()));
        assert!(names.contains(&"Andaman And Nicobar Islands".to_string()));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn title_case_handles_mixed_input() {
        assert_eq!(title_case("tamil nadu"), "Tamil Nadu");
        assert_eq!(title_case("WEST bengal"), "West Bengal");
    }
}
