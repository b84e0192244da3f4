//! Reference data for the forecast species.

/// Variables requested from the archive by default.
pub const DEFAULT_VARIABLES: [&str; 7] = [
    "dust",
    "particulate_matter_10um",
    "particulate_matter_2.5um",
    "nitrogen_dioxide",
    "nitrogen_monoxide",
    "ozone",
    "sulphur_dioxide",
];

/// Short chemical label for a species name as it appears in the
/// `species` attribute of a forecast file.
///
/// Unknown names are returned unchanged.
pub fn display_name(species: &str) -> &str {
    match species {
        "Nitrogen Dioxide" => "NO₂",
        "Nitrogen Monoxide" => "NO",
        "Ozone" => "O₃",
        "Sulphur Dioxide" => "SO₂",
        "PM10 Aerosol" => "PM₁₀",
        "PM2.5 Aerosol" => "PM₂.₅",
        other => other,
    }
}
