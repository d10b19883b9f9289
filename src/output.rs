use crate::types::{CountryInsights, DashboardSnapshot};
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Files produced by [`write_dashboard`], in write order.
pub const DASHBOARD_FILES: [&str; 10] = [
    "bookings_by_country.csv",
    "revenue_by_month.csv",
    "exception_rate_by_country.csv",
    "bookings_by_type.csv",
    "exceptions_by_ops_source.csv",
    "revenue_by_division.csv",
    "revenue_by_country.csv",
    "bookings_by_month.csv",
    "exceptions_by_month.csv",
    "dashboard.json",
];

/// Write every dashboard view as its own CSV plus the full snapshot as
/// `dashboard.json`.
pub fn write_dashboard(dir: &Path, snapshot: &DashboardSnapshot) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let paths: Vec<PathBuf> = DASHBOARD_FILES.iter().map(|f| dir.join(f)).collect();
    write_csv(&paths[0], &snapshot.bookings_by_country)?;
    write_csv(&paths[1], &snapshot.revenue_by_month)?;
    write_csv(&paths[2], &snapshot.exception_rate_by_country)?;
    write_csv(&paths[3], &snapshot.bookings_by_type)?;
    write_csv(&paths[4], &snapshot.exceptions_by_ops_source)?;
    write_csv(&paths[5], &snapshot.revenue_by_division)?;
    write_csv(&paths[6], &snapshot.revenue_by_country)?;
    write_csv(&paths[7], &snapshot.bookings_by_month)?;
    write_csv(&paths[8], &snapshot.exceptions_by_month)?;
    write_json(&paths[9], snapshot)?;
    Ok(paths)
}

/// Markdown table of the first `max_rows` rows.
pub fn render_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_table(rows, max_rows));
}

pub fn print_insights(insights: &CountryInsights) {
    println!("Market Insight: {}\n", insights.country);
    preview_table_rows(&insights.carriers, insights.carriers.len());
    println!("FedEx Sentiment:\n{}\n", insights.fedex_sentiment);
    println!("Sales Tips:");
    for (idx, tip) in insights.sales_tips.iter().enumerate() {
        println!("  {}. {}", idx + 1, tip);
    }
    println!("\nEmail Template:\n{}\n", insights.email_template);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CountryBookings, MonthlyRevenue};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn renders_markdown_preview() {
        let rows = vec![
            CountryBookings {
                country: "NL".into(),
                total_bookings: 15,
            },
            CountryBookings {
                country: "DE".into(),
                total_bookings: 3,
            },
        ];
        let table = render_table(&rows, 1);
        assert!(table.contains("| Country"));
        assert!(table.contains("NL"));
        assert!(!table.contains("DE"));
        assert_eq!(render_table::<CountryBookings>(&[], 5), "(no rows)");
    }

    #[test]
    fn dashboard_export_covers_every_view() {
        let dir = TempDir::new().unwrap();
        let data = crate::types::Dataset {
            bookings: vec![crate::types::BookingRecord {
                year: 2024,
                month: 2,
                country: "NL".into(),
                booking_type: "Express".into(),
                record_count: 8,
            }],
            exceptions: vec![crate::types::ExceptionRecord {
                year: 2024,
                month: 2,
                country: "NL".into(),
                record_count: 2,
                ops_source_code: "WH".into(),
            }],
            revenue: vec![],
        };
        let snapshot = crate::metrics::build_snapshot(&data);
        let written = write_dashboard(dir.path(), &snapshot).unwrap();
        assert_eq!(written.len(), DASHBOARD_FILES.len());
        assert!(written.iter().all(|p| p.exists()));

        let monthly = fs::read_to_string(dir.path().join("bookings_by_month.csv")).unwrap();
        assert_eq!(monthly, "label,value\n2024-02,8\n");
        let exceptions = fs::read_to_string(dir.path().join("exceptions_by_month.csv")).unwrap();
        assert_eq!(exceptions, "label,value\n2024-02,2\n");
    }

    #[test]
    fn writes_csv_with_headers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("monthly.csv");
        write_csv(
            &path,
            &[MonthlyRevenue {
                month: "2024-01".into(),
                revenue: 120,
            }],
        )
        .unwrap();
        let body = fs::read_to_string(&path).unwrap();
        assert_eq!(body, "month,revenue\n2024-01,120\n");
    }
}
