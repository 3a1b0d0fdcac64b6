//! Attendance aggregation: per-session counts, the rounded percentage rate,
//! and the fixed display banding used across every report.

use serde::Serialize;
use strum_macros::Display;
use utoipa::ToSchema;

use crate::model::{AttendanceEntry, AttendanceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub present_count: u32,
    pub total_count: u32,
    pub rate: u32,
}

/// `round(present / total * 100)`, round-half-up. An empty roster is 0%, not
/// a division by zero.
pub fn rate(present_count: u32, total_count: u32) -> u32 {
    if total_count == 0 {
        return 0;
    }
    ((present_count as f64 / total_count as f64) * 100.0).round() as u32
}

pub fn summarize(entries: &[AttendanceEntry]) -> AttendanceSummary {
    let present_count = entries
        .iter()
        .filter(|e| e.status == AttendanceStatus::Present)
        .count() as u32;
    let total_count = entries.len() as u32;

    AttendanceSummary {
        present_count,
        total_count,
        rate: rate(present_count, total_count),
    }
}

/// Rounded mean of per-session rates, the figure dashboards and reports show
/// for a class.
pub fn average_rate(rates: &[u32]) -> u32 {
    if rates.is_empty() {
        return 0;
    }
    let sum: u32 = rates.iter().sum();
    (sum as f64 / rates.len() as f64).round() as u32
}

/// Fixed three-tier banding: >= 90 excellent, 80-89 good, below 80 poor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
pub enum RateBand {
    Excellent,
    Good,
    Poor,
}

pub fn band(rate: u32) -> RateBand {
    if rate >= 90 {
        RateBand::Excellent
    } else if rate >= 80 {
        RateBand::Good
    } else {
        RateBand::Poor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index_number: &str, status: AttendanceStatus) -> AttendanceEntry {
        AttendanceEntry {
            student_id: index_number.to_string(),
            index_number: index_number.to_string(),
            full_name: index_number.to_string(),
            status,
        }
    }

    #[test]
    fn twenty_two_of_twenty_four_is_92() {
        assert_eq!(rate(22, 24), 92);
    }

    #[test]
    fn empty_roster_is_zero_not_a_crash() {
        assert_eq!(rate(0, 0), 0);
    }

    #[test]
    fn rate_rounds_half_up() {
        assert_eq!(rate(1, 8), 13); // 12.5
        assert_eq!(rate(7, 8), 88); // 87.5
        assert_eq!(rate(11, 24), 46); // 45.83
    }

    #[test]
    fn summarize_counts_present_entries() {
        let entries = vec![
            entry("CS/2024/001", AttendanceStatus::Present),
            entry("CS/2024/002", AttendanceStatus::Absent),
            entry("CS/2024/003", AttendanceStatus::Present),
        ];

        let summary = summarize(&entries);
        assert_eq!(summary.present_count, 2);
        assert_eq!(summary.total_count, 3);
        assert_eq!(summary.rate, 67);
    }

    #[test]
    fn band_edges() {
        assert_eq!(band(90), RateBand::Excellent);
        assert_eq!(band(89), RateBand::Good);
        assert_eq!(band(80), RateBand::Good);
        assert_eq!(band(79), RateBand::Poor);
        assert_eq!(band(0), RateBand::Poor);
    }

    #[test]
    fn average_rate_rounds() {
        assert_eq!(average_rate(&[]), 0);
        assert_eq!(average_rate(&[85, 92]), 89); // 88.5
        assert_eq!(average_rate(&[100, 0, 50]), 50);
    }
}
