pub mod attendance_stats;
pub mod csv_export;
pub mod identifier_cache;
pub mod identifier_filter;
pub mod roster_filter;
