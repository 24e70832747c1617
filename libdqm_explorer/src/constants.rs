// Empty lumisection thresholds
pub const DEFAULT_EMPTY_THRESHOLD: u64 = 0; // empty when entries <= 0
pub const LEGACY_EMPTY_THRESHOLD: u64 = 10; // empty when entries < 10 (diagnostic scripts)

// Default ME id classification. Ids at or below MAX_1D_ME_ID are 1D, the
// rest up to MAX_2D_ME_ID are 2D.
pub const MIN_ME_ID: u32 = 1;
pub const MAX_1D_ME_ID: u32 = 95;
pub const MAX_2D_ME_ID: u32 = 191;

// CMS run numbers are six digits
pub const RUN_NUMBER_WIDTH: usize = 6;

/// This is the version of the report format
pub const REPORT_FORMAT_VERSION: &str = "1.0";
