//! Delimited-text report rendering. One header row plus one row per record,
//! comma-joined fields, newline-joined rows. Only columns flagged as name
//! columns are quote-wrapped; no other escaping happens, exactly like the
//! spreadsheets the department has always produced. A value containing a
//! comma therefore shifts the row; callers are expected to know their data.

use actix_web::HttpResponse;
use actix_web::http::header;
use chrono::Utc;

pub struct Column {
    pub header: &'static str,
    pub quoted: bool,
}

impl Column {
    pub const fn plain(header: &'static str) -> Self {
        Self { header, quoted: false }
    }

    pub const fn quoted(header: &'static str) -> Self {
        Self { header, quoted: true }
    }
}

pub fn render(columns: &[Column], rows: &[Vec<String>]) -> String {
    let header = columns
        .iter()
        .map(|c| c.header)
        .collect::<Vec<_>>()
        .join(",");

    let mut lines = vec![header];
    for row in rows {
        let fields: Vec<String> = row
            .iter()
            .zip(columns)
            .map(|(value, column)| {
                if column.quoted {
                    format!("\"{value}\"")
                } else {
                    value.clone()
                }
            })
            .collect();
        lines.push(fields.join(","));
    }

    lines.join("\n")
}

/// `students` -> `students-2026-08-07.csv`
pub fn dated_filename(prefix: &str) -> String {
    format!("{prefix}-{}.csv", Utc::now().date_naive())
}

pub fn attachment(filename: &str, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/csv"))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: [Column; 4] = [
        Column::plain("Index Number"),
        Column::quoted("Full Name"),
        Column::plain("Email"),
        Column::plain("Status"),
    ];

    #[test]
    fn two_records_and_a_header_make_three_lines() {
        let rows = vec![
            vec![
                "CS/2024/001".to_string(),
                "Alice Johnson".to_string(),
                "alice@university.edu".to_string(),
                "active".to_string(),
            ],
            vec![
                "CS/2024/002".to_string(),
                "Bob Smith".to_string(),
                "bob@university.edu".to_string(),
                "active".to_string(),
            ],
        ];

        let doc = render(&COLUMNS, &rows);
        assert_eq!(doc.lines().count(), 3);
        assert!(doc.starts_with("Index Number,Full Name,Email,Status"));
    }

    #[test]
    fn name_columns_are_quoted() {
        let rows = vec![vec![
            "CS/2024/001".to_string(),
            "Alice Johnson".to_string(),
            "alice@university.edu".to_string(),
            "active".to_string(),
        ]];

        let doc = render(&COLUMNS, &rows);
        assert!(doc.contains("CS/2024/001,\"Alice Johnson\",alice@university.edu,active"));
    }

    #[test]
    fn unquoted_fields_are_not_escaped() {
        // Documented sharp edge: a comma inside a plain field shifts the row.
        let rows = vec![vec![
            "CS/2024/001".to_string(),
            "Alice Johnson".to_string(),
            "alice@university.edu, backup@university.edu".to_string(),
            "active".to_string(),
        ]];

        let doc = render(&COLUMNS, &rows);
        let data_line = doc.lines().nth(1).unwrap();
        assert_eq!(data_line.split(',').count(), 5);
    }
}
