use crate::types::{
    BookingRecord, CountryBookings, CountryException, ExceptionRecord, GroupTotal, MonthlyRevenue,
    RevenueRecord,
};
use crate::util::{month_key, percentage};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};

/// Country-ranked views are cut to this many entries.
pub const TOP_N: usize = 15;

/// Group-sum keeping first-seen key order, so the stable sorts below break
/// ties in favour of whichever group appeared first in the input. Totals
/// saturate at the `i64` bounds.
fn group_sum<T, K, V>(records: &[T], key: K, value: V) -> IndexMap<String, i64>
where
    K: Fn(&T) -> String,
    V: Fn(&T) -> i64,
{
    let mut map: IndexMap<String, i64> = IndexMap::new();
    for r in records {
        let total = map.entry(key(r)).or_insert(0);
        *total = total.saturating_add(value(r));
    }
    map
}

fn ranked(map: IndexMap<String, i64>, limit: Option<usize>) -> Vec<GroupTotal> {
    let mut rows: Vec<GroupTotal> = map
        .into_iter()
        .map(|(label, value)| GroupTotal { label, value })
        .collect();
    rows.sort_by(|a, b| b.value.cmp(&a.value));
    if let Some(n) = limit {
        rows.truncate(n);
    }
    rows
}

fn chronological<T, K, V>(records: &[T], key: K, value: V) -> BTreeMap<String, i64>
where
    K: Fn(&T) -> String,
    V: Fn(&T) -> i64,
{
    let mut map: BTreeMap<String, i64> = BTreeMap::new();
    for r in records {
        let total = map.entry(key(r)).or_insert(0);
        *total = total.saturating_add(value(r));
    }
    map
}

pub fn aggregate_bookings_by_country(records: &[BookingRecord]) -> Vec<CountryBookings> {
    ranked(
        group_sum(records, |r| r.country.clone(), |r| r.record_count),
        Some(TOP_N),
    )
    .into_iter()
    .map(|g| CountryBookings {
        country: g.label,
        total_bookings: g.value,
    })
    .collect()
}

pub fn aggregate_revenue_by_month(records: &[RevenueRecord]) -> Vec<MonthlyRevenue> {
    chronological(records, |r| month_key(r.year, r.month), |r| r.revenue_eur)
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect()
}

/// Exception rate per booking country.
///
/// The universe is the set of countries with booking rows: a country that
/// only appears in the exceptions has no denominator and is left out.
pub fn aggregate_exception_rate_by_country(
    bookings: &[BookingRecord],
    exceptions: &[ExceptionRecord],
) -> Vec<CountryException> {
    let booked = group_sum(bookings, |r| r.country.clone(), |r| r.record_count);
    let excepted: HashMap<String, i64> = group_sum(
        exceptions,
        |r| {
            if r.country.is_empty() {
                "Unknown".to_string()
            } else {
                r.country.clone()
            }
        },
        |r| r.record_count,
    )
    .into_iter()
    .collect();

    let mut rows: Vec<CountryException> = booked
        .into_iter()
        .map(|(country, bookings)| {
            let exceptions = excepted.get(&country).copied().unwrap_or(0);
            CountryException {
                exception_rate: percentage(exceptions, bookings),
                country,
                bookings,
                exceptions,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.exception_rate.total_cmp(&a.exception_rate));
    rows.truncate(TOP_N);
    rows
}

pub fn bookings_by_type(records: &[BookingRecord]) -> Vec<GroupTotal> {
    ranked(
        group_sum(records, |r| r.booking_type.clone(), |r| r.record_count),
        None,
    )
}

pub fn exceptions_by_ops_source(records: &[ExceptionRecord]) -> Vec<GroupTotal> {
    ranked(
        group_sum(records, |r| r.ops_source_code.clone(), |r| r.record_count),
        None,
    )
}

pub fn revenue_by_division(records: &[RevenueRecord]) -> Vec<GroupTotal> {
    ranked(
        group_sum(records, |r| r.division.clone(), |r| r.revenue_eur),
        None,
    )
}

pub fn revenue_by_country(records: &[RevenueRecord]) -> Vec<GroupTotal> {
    ranked(
        group_sum(records, |r| r.country.clone(), |r| r.revenue_eur),
        Some(TOP_N),
    )
}

pub fn bookings_by_month(records: &[BookingRecord]) -> Vec<GroupTotal> {
    chronological(records, |r| month_key(r.year, r.month), |r| r.record_count)
        .into_iter()
        .map(|(label, value)| GroupTotal { label, value })
        .collect()
}

pub fn exceptions_by_month(records: &[ExceptionRecord]) -> Vec<GroupTotal> {
    chronological(records, |r| month_key(r.year, r.month), |r| r.record_count)
        .into_iter()
        .map(|(label, value)| GroupTotal { label, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn booking(country: &str, count: i64) -> BookingRecord {
        booking_at(2024, 1, country, "Express", count)
    }

    fn booking_at(year: i64, month: i64, country: &str, kind: &str, count: i64) -> BookingRecord {
        BookingRecord {
            year,
            month,
            country: country.to_string(),
            booking_type: kind.to_string(),
            record_count: count,
        }
    }

    fn exception(country: &str, count: i64) -> ExceptionRecord {
        ExceptionRecord {
            year: 2024,
            month: 1,
            country: country.to_string(),
            record_count: count,
            ops_source_code: "WH".to_string(),
        }
    }

    fn revenue(year: i64, month: i64, country: &str, division: &str, eur: i64) -> RevenueRecord {
        RevenueRecord {
            year,
            month,
            country: country.to_string(),
            record_count: 1,
            division: division.to_string(),
            revenue_eur: eur,
        }
    }

    #[test]
    fn sums_bookings_per_country() {
        let rows = aggregate_bookings_by_country(&[booking("NL", 10), booking("NL", 5), booking("DE", 3)]);
        assert_eq!(
            rows,
            vec![
                CountryBookings {
                    country: "NL".into(),
                    total_bookings: 15
                },
                CountryBookings {
                    country: "DE".into(),
                    total_bookings: 3
                },
            ]
        );
    }

    #[test]
    fn ties_keep_first_seen_country() {
        let rows = aggregate_bookings_by_country(&[booking("FR", 4), booking("BE", 4), booking("AT", 9)]);
        let order: Vec<&str> = rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(order, vec!["AT", "FR", "BE"]);
    }

    #[test]
    fn country_view_is_cut_to_top_fifteen() {
        let records: Vec<BookingRecord> = (0..20).map(|i| booking(&format!("C{i:02}"), i)).collect();
        let rows = aggregate_bookings_by_country(&records);
        assert_eq!(rows.len(), TOP_N);
        assert_eq!(rows[0].country, "C19");
        assert_eq!(rows[14].country, "C05");

        let full: i64 = records.iter().map(|r| r.record_count).sum();
        let shown: i64 = rows.iter().map(|r| r.total_bookings).sum();
        assert!(shown <= full);
    }

    #[test]
    fn top_fifteen_sum_equals_total_when_few_countries() {
        let records = vec![booking("NL", 1), booking("DE", 2), booking("NL", 3)];
        let shown: i64 = aggregate_bookings_by_country(&records)
            .iter()
            .map(|r| r.total_bookings)
            .sum();
        assert_eq!(shown, 6);
    }

    #[test]
    fn zero_total_country_is_kept_at_bottom() {
        let rows = aggregate_bookings_by_country(&[booking("XX", 0), booking("NL", 2)]);
        assert_eq!(rows.last().map(|r| r.country.as_str()), Some("XX"));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn empty_inputs_give_empty_views() {
        assert!(aggregate_bookings_by_country(&[]).is_empty());
        assert!(aggregate_revenue_by_month(&[]).is_empty());
        assert!(aggregate_exception_rate_by_country(&[], &[]).is_empty());
        assert!(bookings_by_type(&[]).is_empty());
    }

    #[test]
    fn revenue_by_month_is_chronological_and_unique() {
        let rows = aggregate_revenue_by_month(&[
            revenue(2024, 10, "NL", "Freight", 5),
            revenue(2024, 2, "NL", "Freight", 7),
            revenue(2023, 12, "DE", "Express", 1),
            revenue(2024, 2, "DE", "Express", 3),
        ]);
        assert_eq!(
            rows,
            vec![
                MonthlyRevenue {
                    month: "2023-12".into(),
                    revenue: 1
                },
                MonthlyRevenue {
                    month: "2024-02".into(),
                    revenue: 10
                },
                MonthlyRevenue {
                    month: "2024-10".into(),
                    revenue: 5
                },
            ]
        );
    }

    #[test]
    fn exception_rate_uses_booking_denominator() {
        let rows = aggregate_exception_rate_by_country(&[booking("NL", 20)], &[exception("NL", 2)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].exception_rate, 10.0);
        assert_eq!(rows[0].exceptions, 2);
    }

    #[test]
    fn exception_only_countries_are_excluded() {
        let rows = aggregate_exception_rate_by_country(
            &[booking("NL", 20), booking("DE", 10)],
            &[exception("FR", 3), exception("", 1), exception("NL", 1)],
        );
        let countries: Vec<&str> = rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["NL", "DE"]);
        assert_eq!(rows[1].exception_rate, 0.0);
    }

    #[test]
    fn zero_booking_country_rate_is_zero() {
        let rows = aggregate_exception_rate_by_country(&[booking("NL", 0)], &[exception("NL", 4)]);
        assert_eq!(rows[0].exception_rate, 0.0);
    }

    #[test]
    fn exception_rates_rank_descending() {
        let rows = aggregate_exception_rate_by_country(
            &[booking("NL", 100), booking("DE", 10), booking("BE", 3)],
            &[exception("NL", 5), exception("DE", 5), exception("BE", 1)],
        );
        let rates: Vec<f64> = rows.iter().map(|r| r.exception_rate).collect();
        assert_eq!(rates, vec![50.0, 33.33, 5.0]);
    }

    #[test]
    fn grouped_views_sort_by_value() {
        let bookings = vec![
            booking_at(2024, 1, "NL", "Economy", 2),
            booking_at(2024, 1, "NL", "Express", 9),
            booking_at(2024, 2, "DE", "Economy", 4),
        ];
        assert_eq!(
            bookings_by_type(&bookings),
            vec![
                GroupTotal {
                    label: "Express".into(),
                    value: 9
                },
                GroupTotal {
                    label: "Economy".into(),
                    value: 6
                },
            ]
        );
        assert_eq!(
            bookings_by_month(&bookings)
                .iter()
                .map(|g| g.label.as_str())
                .collect::<Vec<_>>(),
            vec!["2024-01", "2024-02"]
        );

        let revenue_rows = vec![
            revenue(2024, 1, "NL", "Freight", 100),
            revenue(2024, 1, "DE", "Express", 300),
            revenue(2024, 2, "NL", "Express", 50),
        ];
        assert_eq!(revenue_by_division(&revenue_rows)[0].label, "Express");
        assert_eq!(revenue_by_country(&revenue_rows)[0].value, 300);
    }

    #[test]
    fn exceptions_grouped_by_source_and_month() {
        let mut rows = vec![exception("NL", 2), exception("DE", 5)];
        rows[1].ops_source_code = "CX".into();
        rows[1].month = 3;
        assert_eq!(exceptions_by_ops_source(&rows)[0].label, "CX");
        assert_eq!(
            exceptions_by_month(&rows)
                .iter()
                .map(|g| g.label.as_str())
                .collect::<Vec<_>>(),
            vec!["2024-01", "2024-03"]
        );
    }

    #[test]
    fn huge_counts_saturate() {
        let rows = aggregate_bookings_by_country(&[booking("NL", i64::MAX), booking("NL", i64::MAX)]);
        assert_eq!(rows[0].total_bookings, i64::MAX);

        let months = aggregate_revenue_by_month(&[
            revenue(2024, 1, "NL", "Freight", i64::MAX),
            revenue(2024, 1, "DE", "Freight", 1),
        ]);
        assert_eq!(months[0].revenue, i64::MAX);
    }

    #[test]
    fn exception_rate_view_is_cut_to_top_fifteen() {
        // C00 has the highest rate, C19 the lowest.
        let bookings: Vec<BookingRecord> = (0..20).map(|i| booking(&format!("C{i:02}"), 100)).collect();
        let exceptions: Vec<ExceptionRecord> = (0..20)
            .map(|i| exception(&format!("C{i:02}"), 20 - i))
            .collect();
        let rows = aggregate_exception_rate_by_country(&bookings, &exceptions);
        assert_eq!(rows.len(), TOP_N);
        assert_eq!(rows[0].country, "C00");
        assert_eq!(rows[0].exception_rate, 20.0);
        assert_eq!(rows[14].country, "C14");
        assert!(rows.iter().all(|r| r.country != "C19"));
    }

    #[test]
    fn revenue_by_country_is_cut_to_top_fifteen() {
        let records: Vec<RevenueRecord> = (0..20)
            .map(|i| revenue(2024, 1, &format!("C{i:02}"), "Freight", i * 10))
            .collect();
        let rows = revenue_by_country(&records);
        assert_eq!(rows.len(), TOP_N);
        assert_eq!(rows[0].label, "C19");
        assert_eq!(rows[0].value, 190);
        assert_eq!(rows[14].label, "C05");
    }

    #[test]
    fn repeated_calls_are_identical() {
        let records = vec![booking("NL", 1), booking("DE", 1), booking("BE", 2)];
        assert_eq!(
            aggregate_bookings_by_country(&records),
            aggregate_bookings_by_country(&records)
        );
    }
}
