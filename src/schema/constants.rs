//! Reserved configuration keys and well-known attribute names.

/// Top-level section holding global attributes
pub const SECTION_GLOBAL_ATTRIBUTES: &str = "global_attributes";
/// Top-level section holding dimensions
pub const SECTION_DIMENSIONS: &str = "dimensions";
/// Top-level section holding variables
pub const SECTION_VARIABLES: &str = "variables";
/// Top-level section holding groups
pub const SECTION_GROUPS: &str = "groups";
/// Per-group attribute section
pub const SECTION_GROUP_ATTRIBUTES: &str = "attributes";

/// Element type key
pub const KEY_DTYPE: &str = "dtype";
/// Explicit dimension length
pub const KEY_SIZE: &str = "size";
/// Data binding key for dimensions
pub const KEY_DAT: &str = "dat";
/// Ordered dimension references of a variable
pub const KEY_DIM: &str = "dim";
/// Coordinate variable switch of a dimension
pub const KEY_VAR: &str = "var";

/// Packing scale attribute
pub const ATTR_SCALE_FACTOR: &str = "scale_factor";
/// Packing offset attribute
pub const ATTR_ADD_OFFSET: &str = "add_offset";
/// Observed range attribute
pub const ATTR_ACTUAL_RANGE: &str = "actual_range";
/// Valid range attribute
pub const ATTR_VALID_RANGE: &str = "valid_range";
/// Fill value attribute
pub const ATTR_FILL_VALUE: &str = "_FillValue";
/// Precision hint, also a storage option
pub const KEY_LEAST_SIGNIFICANT_DIGIT: &str = "least_significant_digit";

/// netCDF4 creation keywords that are storage options, never attributes
pub const NC4_OPTIONS: [&str; 5] = [
    "zlib",
    "complevel",
    "shuffle",
    KEY_LEAST_SIGNIFICANT_DIGIT,
    "fill_value",
];

/// Keys that are written as-is instead of coerced to the variable type
pub const UNCOERCED_ATTRIBUTES: [&str; 4] = [
    ATTR_ADD_OFFSET,
    ATTR_SCALE_FACTOR,
    KEY_LEAST_SIGNIFICANT_DIGIT,
    ATTR_ACTUAL_RANGE,
];

/// Reserved dimension keys that never become attributes
pub const DIMENSION_RESERVED: [&str; 4] = [KEY_SIZE, KEY_DTYPE, KEY_DAT, KEY_VAR];

/// Embedded HDF-EOS structural metadata attribute
pub const ATTR_HDFEOS_STRUCT_METADATA: &str = "StructMetadata.0";

/// CF standard global attributes
pub const CF_GLOBAL_ATTRIBUTES: &[&str] = &[
    "title",
    "institution",
    "source",
    "history",
    "references",
    "comments",
    "Conventions",
];

/// ACDD 1.3 global attributes
pub const ACDD_GLOBAL_ATTRIBUTES: &[&str] = &[
    "summary",
    "id",
    "naming_authority",
    "source",
    "processing_level",
    "acknowledgment",
    "license",
    "standard_name_vocabulary",
    "date_created",
    "creator_name",
    "creator_email",
    "creator_url",
    "project",
    "publisher_name",
    "publisher_email",
    "publisher_url",
    "geospatial_bounds",
    "geospatial_bounds_crs",
    "geospatial_bounds_vertical_crs",
    "geospatial_lat_min",
    "geospatial_lat_max",
    "geospatial_lon_min",
    "geospatial_lon_max",
    "geospatial_vertical_min",
    "geospatial_vertical_max",
    "geospatial_vertical_positive",
    "time_coverage_start",
    "time_coverage_end",
    "time_coverage_duration",
    "time_coverage_resolution",
    "creator_type",
    "creator_institution",
    "publisher_type",
    "publisher_institution",
    "program",
    "contributor_name",
    "contributor_role",
    "geospatial_lat_units",
    "geospatial_lat_resolution",
    "geospatial_lon_units",
    "geospatial_lon_resolution",
    "geospatial_vertical_units",
    "geospatial_vertical_resolution",
    "date_modified",
    "date_issued",
    "date_metadata_modified",
    "product_version",
    "keywords_vocabulary",
    "platform",
    "platform_vocabulary",
    "instrument",
    "instrument_vocabulary",
    "cdm_data_type",
    "metadata_link",
    "keywords",
    "keyword_vocabulary",
    "contributor_url",
    "contributor_type",
    "contributor_institution",
    "contributor_email",
    "comment",
    "Metadata_Conventions",
];

/// True if the name is a CF or ACDD global attribute
pub fn is_standard_global_attribute(name: &str) -> bool {
    CF_GLOBAL_ATTRIBUTES.contains(&name) || ACDD_GLOBAL_ATTRIBUTES.contains(&name)
}
