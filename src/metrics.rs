use crate::aggregate;
use crate::types::{
    BookingRecord, DashboardMetrics, DashboardSnapshot, Dataset, ExceptionRecord, MarketContext,
    RevenueRecord,
};
use crate::util::percentage;
use std::collections::HashSet;

fn saturating_total(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

/// Dashboard-wide KPIs over the full, untruncated input.
pub fn calculate_metrics(
    bookings: &[BookingRecord],
    exceptions: &[ExceptionRecord],
    revenue: &[RevenueRecord],
) -> DashboardMetrics {
    let total_revenue = saturating_total(revenue.iter().map(|r| r.revenue_eur));
    let total_bookings = saturating_total(bookings.iter().map(|r| r.record_count));
    let total_exceptions = saturating_total(exceptions.iter().map(|r| r.record_count));
    // Only booking rows decide which countries are active.
    let countries: HashSet<&str> = bookings.iter().map(|r| r.country.as_str()).collect();
    DashboardMetrics {
        total_revenue,
        total_bookings,
        average_exception_rate: percentage(total_exceptions, total_bookings),
        active_countries: countries.len(),
    }
}

pub fn market_context(
    country: &str,
    bookings: &[BookingRecord],
    revenue: &[RevenueRecord],
) -> MarketContext {
    MarketContext {
        revenue_eur: saturating_total(
            revenue
                .iter()
                .filter(|r| r.country == country)
                .map(|r| r.revenue_eur),
        ),
        bookings: saturating_total(
            bookings
                .iter()
                .filter(|r| r.country == country)
                .map(|r| r.record_count),
        ),
    }
}

/// Every dashboard view plus the KPIs, recomputed from the raw dataset.
pub fn build_snapshot(data: &Dataset) -> DashboardSnapshot {
    DashboardSnapshot {
        metrics: calculate_metrics(&data.bookings, &data.exceptions, &data.revenue),
        bookings_by_country: aggregate::aggregate_bookings_by_country(&data.bookings),
        revenue_by_month: aggregate::aggregate_revenue_by_month(&data.revenue),
        exception_rate_by_country: aggregate::aggregate_exception_rate_by_country(
            &data.bookings,
            &data.exceptions,
        ),
        bookings_by_type: aggregate::bookings_by_type(&data.bookings),
        exceptions_by_ops_source: aggregate::exceptions_by_ops_source(&data.exceptions),
        revenue_by_division: aggregate::revenue_by_division(&data.revenue),
        revenue_by_country: aggregate::revenue_by_country(&data.revenue),
        bookings_by_month: aggregate::bookings_by_month(&data.bookings),
        exceptions_by_month: aggregate::exceptions_by_month(&data.exceptions),
    }
}
