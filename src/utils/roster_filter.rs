//! In-memory filtering for roster and report screens. A free-text term is a
//! case-insensitive substring match over a fixed field set; categorical
//! filters match exactly; everything must hold at once. Collections are small
//! enough that each request scans the whole list.

use chrono::NaiveDate;

use crate::model::{AttendanceSession, Class, Student};

/// The UI sends `all` for an unselected dropdown, which means no filter.
fn categorical_matches(filter: Option<&str>, value: &str) -> bool {
    match filter {
        None => true,
        Some("all") => true,
        Some(wanted) => wanted == value,
    }
}

pub fn term_matches(term: &str, fields: &[&str]) -> bool {
    let needle = term.to_lowercase();
    fields
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[derive(Debug, Default)]
pub struct StudentFilter<'a> {
    pub term: Option<&'a str>,
    pub academic_level: Option<&'a str>,
    pub program_type: Option<&'a str>,
}

impl StudentFilter<'_> {
    pub fn apply<'s>(&self, students: &'s [Student]) -> Vec<&'s Student> {
        students
            .iter()
            .filter(|student| {
                let term_ok = match self.term {
                    None => true,
                    Some(term) if term.is_empty() => true,
                    Some(term) => term_matches(
                        term,
                        &[&student.full_name, &student.index_number, &student.email],
                    ),
                };

                term_ok
                    && categorical_matches(self.academic_level, &student.academic_level)
                    && categorical_matches(self.program_type, &student.program_type)
            })
            .collect()
    }
}

/// Class search is by name or code only.
pub fn filter_classes<'c>(classes: &'c [Class], term: Option<&str>) -> Vec<&'c Class> {
    classes
        .iter()
        .filter(|class| match term {
            None => true,
            Some(term) if term.is_empty() => true,
            Some(term) => term_matches(term, &[&class.class_name, &class.class_code]),
        })
        .collect()
}

/// Session listing: exact date filter plus a term matched against any entry's
/// name or index number.
pub fn filter_sessions<'s>(
    sessions: &'s [AttendanceSession],
    date: Option<NaiveDate>,
    term: Option<&str>,
) -> Vec<&'s AttendanceSession> {
    sessions
        .iter()
        .filter(|session| {
            let date_ok = date.is_none_or(|wanted| session.date == wanted);
            let term_ok = match term {
                None => true,
                Some(term) if term.is_empty() => true,
                Some(term) => session
                    .entries
                    .iter()
                    .any(|entry| term_matches(term, &[&entry.full_name, &entry.index_number])),
            };
            date_ok && term_ok
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LifecycleStatus;
    use chrono::Utc;

    fn student(index_number: &str, name: &str, level: &str, program: &str) -> Student {
        Student {
            id: index_number.to_string(),
            index_number: index_number.to_string(),
            full_name: name.to_string(),
            email: format!("{}@university.edu", index_number.replace('/', ".")),
            phone: None,
            academic_level: level.to_string(),
            program_type: program.to_string(),
            password: "hash".to_string(),
            status: LifecycleStatus::Active,
            registration_date: Utc::now(),
            enrolled_classes: vec![],
            password_changed_at: None,
        }
    }

    fn roster() -> Vec<Student> {
        vec![
            student("CS/2024/001", "Alice Johnson", "Level 100", "regular"),
            student("CS/2024/002", "Bob Smith", "Level 100", "evening"),
            student("CS/2024/003", "Carol Davis", "Level 200", "regular"),
            student("CS/2024/004", "David Wilson", "Level 200", "regular"),
            student("CS/2024/005", "Emma Brown", "Level 300", "distance"),
        ]
    }

    #[test]
    fn index_number_term_finds_exactly_one() {
        let roster = roster();
        let filter = StudentFilter {
            term: Some("CS/2024/001"),
            ..Default::default()
        };

        let hits = filter.apply(&roster);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].full_name, "Alice Johnson");
    }

    #[test]
    fn term_is_case_insensitive_substring() {
        let roster = roster();
        let filter = StudentFilter {
            term: Some("aLiCe"),
            ..Default::default()
        };

        assert_eq!(filter.apply(&roster).len(), 1);
    }

    #[test]
    fn empty_term_and_all_sentinel_match_everything() {
        let roster = roster();

        let filter = StudentFilter {
            term: Some(""),
            academic_level: Some("all"),
            program_type: Some("all"),
        };
        assert_eq!(filter.apply(&roster).len(), roster.len());
    }

    #[test]
    fn adding_a_categorical_filter_never_grows_the_result() {
        let roster = roster();

        let loose = StudentFilter {
            academic_level: Some("Level 200"),
            ..Default::default()
        };
        let strict = StudentFilter {
            academic_level: Some("Level 200"),
            program_type: Some("regular"),
            ..Default::default()
        };

        let loose_hits = loose.apply(&roster);
        let strict_hits = strict.apply(&roster);
        assert!(strict_hits.len() <= loose_hits.len());
        for hit in &strict_hits {
            assert!(loose_hits.iter().any(|s| s.id == hit.id));
        }
    }

    #[test]
    fn filters_and_term_must_all_hold() {
        let roster = roster();
        let filter = StudentFilter {
            term: Some("Bob"),
            academic_level: Some("Level 100"),
            program_type: Some("regular"),
        };

        // Bob is Level 100 but evening, so the program filter excludes him.
        assert!(filter.apply(&roster).is_empty());
    }
}
