use serde::{Deserialize, Serialize};
use tabled::Tabled;

// Raw CSV rows. Every field is kept as text so a bad number never fails the
// whole row; the loader turns them into typed records.

#[derive(Debug, Deserialize)]
pub struct RawBookingRow {
    #[serde(rename = "YearVal")]
    pub year: Option<String>,
    #[serde(rename = "MonthVal")]
    pub month: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "BookingType")]
    pub booking_type: Option<String>,
    #[serde(rename = "RecordCount")]
    pub record_count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawExceptionRow {
    #[serde(rename = "YearVal")]
    pub year: Option<String>,
    #[serde(rename = "MonthVal")]
    pub month: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "RecordCount")]
    pub record_count: Option<String>,
    #[serde(rename = "OpsSourceCode")]
    pub ops_source_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawRevenueRow {
    #[serde(rename = "YearVal")]
    pub year: Option<String>,
    #[serde(rename = "MonthVal")]
    pub month: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "RecordCount")]
    pub record_count: Option<String>,
    #[serde(rename = "Division")]
    pub division: Option<String>,
    #[serde(rename = "Revenue_EUR")]
    pub revenue_eur: Option<String>,
}

/// One pre-summed booking count for a year/month/country/type combination.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRecord {
    pub year: i64,
    pub month: i64,
    pub country: String,
    pub booking_type: String,
    pub record_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionRecord {
    pub year: i64,
    pub month: i64,
    pub country: String,
    pub record_count: i64,
    pub ops_source_code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueRecord {
    pub year: i64,
    pub month: i64,
    pub country: String,
    pub record_count: i64,
    pub division: String,
    pub revenue_eur: i64,
}

/// Everything loaded for one session. A reload replaces the whole value.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub bookings: Vec<BookingRecord>,
    pub exceptions: Vec<ExceptionRecord>,
    pub revenue: Vec<RevenueRecord>,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryBookings {
    #[tabled(rename = "Country")]
    pub country: String,
    #[tabled(rename = "TotalBookings")]
    pub total_bookings: i64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    #[tabled(rename = "Month")]
    pub month: String,
    #[tabled(rename = "Revenue")]
    pub revenue: i64,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryException {
    #[tabled(rename = "Country")]
    pub country: String,
    #[tabled(rename = "Bookings")]
    pub bookings: i64,
    #[tabled(rename = "Exceptions")]
    pub exceptions: i64,
    #[tabled(rename = "ExceptionRate", display_with = "display_rate")]
    pub exception_rate: f64,
}

/// A single bar in one of the auxiliary grouped views (by type, by division...).
#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct GroupTotal {
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Value")]
    pub value: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_revenue: i64,
    pub total_bookings: i64,
    pub average_exception_rate: f64,
    pub active_countries: usize,
}

/// Revenue and booking volume for one country, fed into the insight prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarketContext {
    pub revenue_eur: i64,
    pub bookings: i64,
}

/// Every view the dashboard renders, bundled for `dashboard.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub metrics: DashboardMetrics,
    pub bookings_by_country: Vec<CountryBookings>,
    pub revenue_by_month: Vec<MonthlyRevenue>,
    pub exception_rate_by_country: Vec<CountryException>,
    pub bookings_by_type: Vec<GroupTotal>,
    pub exceptions_by_ops_source: Vec<GroupTotal>,
    pub revenue_by_division: Vec<GroupTotal>,
    pub revenue_by_country: Vec<GroupTotal>,
    pub bookings_by_month: Vec<GroupTotal>,
    pub exceptions_by_month: Vec<GroupTotal>,
}

#[derive(Debug, Serialize, Deserialize, Tabled, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CarrierInfo {
    #[tabled(rename = "Carrier")]
    pub name: String,
    #[tabled(rename = "MarketShare", display_with = "display_share")]
    pub market_share: f64,
    #[serde(rename = "isFedEx")]
    #[tabled(rename = "Home")]
    pub is_fedex: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryInsights {
    pub country: String,
    pub carriers: Vec<CarrierInfo>,
    pub fedex_sentiment: String,
    pub sales_tips: Vec<String>,
    pub email_template: String,
    /// Epoch milliseconds.
    pub generated_at: i64,
}

fn display_rate(rate: &f64) -> String {
    format!("{:.2}%", rate)
}

fn display_share(share: &f64) -> String {
    format!("{:.1}%", share)
}
