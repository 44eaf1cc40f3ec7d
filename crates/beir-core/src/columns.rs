//! Fixed column layout of the extraction CSV.
//!
//! The order here is the wire order. The transposer derives organ rows from
//! every column that is *not* listed in [`STATIC_COLUMNS`], so adding a header
//! field means adding it here too.

pub const ROW_ID: &str = "row_id";
pub const STABILITY_CLASS: &str = "stability_class";
pub const DISTANCE_KM: &str = "distance_km";

/// Report header fields, one per labelled line in the report preamble.
pub const HEADER_COLUMNS: [&str; 24] = [
    "physical_stack_height_m",
    "stack_exit_velocity_m_s",
    "stack_diameter_m",
    "stack_effluent_temp_deg_c",
    "air_temperature_deg_c",
    "effective_release_height_m",
    "wind_speed_h=10_m_m_s",
    "wind_direction_degrees",
    "wind_from_the",
    "wind_speed_h=h-eff_m_s",
    STABILITY_CLASS,
    "receptor_height_m",
    "inversion_layer_height",
    "sample_time_min",
    "breathing_rate_m3_sec",
    "distance_coordinates",
    "maximum_dose_distance_km_",
    "maximum_tede_sv",
    "inner_contour_dose_sv",
    "middle_contour_dose_sv",
    "outer_contour_dose_sv",
    "exceeds_inner_dose_out_to_km",
    "exceeds_middle_dose_out_to_km",
    "exceeds_outer_dose_out_to_km",
];

/// Header fields carried as text rather than numbers.
pub const TEXT_HEADER_COLUMNS: [&str; 4] = [
    STABILITY_CLASS,
    "inversion_layer_height",
    "distance_coordinates",
    "wind_from_the",
];

/// Per-distance measurements taken from the first line of a data block.
pub const MEASUREMENT_COLUMNS: [&str; 6] = [
    DISTANCE_KM,
    "tede_sv",
    "respirable_time-integrated_air_concentration_bq-sec_m3",
    "ground_surface_deposition_kbq_m2",
    "ground_shine_dose_rate_sv_hr",
    "arrival_time_hour:min",
];

/// Organ dose columns in report order.
pub const ORGAN_COLUMNS: [&str; 23] = [
    "skin",
    "surface_bone",
    "spleen",
    "breast",
    "uli_wall",
    "thymus",
    "kidneys",
    "pancreas",
    "lung",
    "red_marrow",
    "ovaries",
    "stomach_wall",
    "lli_wall",
    "esophagus",
    "testes",
    "brain",
    "thyroid",
    "liver",
    "adrenals",
    "si_wall",
    "bladder_wall",
    "muscle",
    "uterus",
];

/// Exposure-pathway summary doses, listed as `(report label, column)`.
pub const COMPONENT_COLUMNS: [(&str, &str); 3] = [
    ("Inhalation", "inhalation_plume_passage"),
    ("Submersion", "submersion_plume_passage"),
    ("Ground Shine", "ground_shine"),
];

/// Every non-organ column of the extraction CSV.
pub static STATIC_COLUMNS: std::sync::LazyLock<Vec<&'static str>> =
    std::sync::LazyLock::new(|| {
        std::iter::once(ROW_ID)
            .chain(HEADER_COLUMNS)
            .chain(MEASUREMENT_COLUMNS)
            .chain(COMPONENT_COLUMNS.iter().map(|(_, column)| *column))
            .collect()
    });

/// Full extraction header in wire order.
#[must_use]
pub fn extraction_header() -> Vec<&'static str> {
    std::iter::once(ROW_ID)
        .chain(HEADER_COLUMNS)
        .chain(MEASUREMENT_COLUMNS)
        .chain(ORGAN_COLUMNS)
        .chain(COMPONENT_COLUMNS.iter().map(|(_, column)| *column))
        .collect()
}

/// Whether `column` belongs to the static (non-organ) set.
#[must_use]
pub fn is_static(column: &str) -> bool {
    STATIC_COLUMNS.contains(&column)
}

/// Whether `column` is a known organ dose column.
#[must_use]
pub fn is_known_organ(column: &str) -> bool {
    ORGAN_COLUMNS.contains(&column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_header_layout() {
        let header = extraction_header();
        assert_eq!(header.len(), 1 + 24 + 6 + 23 + 3);
        assert_eq!(header[0], ROW_ID);
        assert_eq!(header[1], "physical_stack_height_m");
        assert_eq!(header[31], "skin");
        assert_eq!(header.last(), Some(&"ground_shine"));
    }

    #[test]
    fn organs_are_not_static() {
        assert!(ORGAN_COLUMNS.iter().all(|organ| !is_static(organ)));
        assert!(is_static("row_id"));
        assert!(is_static("ground_shine"));
        assert!(TEXT_HEADER_COLUMNS.iter().all(|c| HEADER_COLUMNS.contains(c)));
    }
}
