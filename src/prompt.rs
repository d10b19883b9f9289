use crate::types::MarketContext;
use crate::util::format_int;

/// Build the market-insight prompt for one country.
pub fn build_insight_prompt(country: &str, context: &MarketContext) -> String {
    let mut prompt = format!(
        "You are a logistics market analyst advising a FedEx sales team.\n\n\
         COUNTRY: {}\n\
         CURRENT REVENUE: EUR {}\n\
         CURRENT BOOKING VOLUME: {} bookings\n",
        country,
        format_int(context.revenue_eur),
        format_int(context.bookings),
    );

    prompt.push_str(
        "\nTASKS:\n\
         - Estimate the market share (percent) of the main parcel and express carriers in this country, including FedEx. Shares must add up to 100.\n\
         - Summarise how FedEx is perceived in this market in two or three sentences.\n\
         - Give exactly 5 concrete sales tips for growing FedEx volume here.\n\
         - Draft a short outreach email a sales representative could send to a prospect in this country.\n",
    );

    prompt.push_str(
        "\nRESPONSE FORMAT - Respond ONLY with one JSON object, no markdown, no text outside the JSON:\n\
         {\n\
           \"carriers\": [{\"name\": \"Carrier name\", \"marketShare\": 25.0}],\n\
           \"fedexSentiment\": \"string\",\n\
           \"salesTips\": [\"tip 1\", \"tip 2\", \"tip 3\", \"tip 4\", \"tip 5\"],\n\
           \"emailTemplate\": \"string\"\n\
         }",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_country_and_volumes() {
        let prompt = build_insight_prompt(
            "Netherlands",
            &MarketContext {
                revenue_eur: 1_250_000,
                bookings: 4_321,
            },
        );
        assert!(prompt.contains("COUNTRY: Netherlands"));
        assert!(prompt.contains("EUR 1,250,000"));
        assert!(prompt.contains("4,321 bookings"));
        assert!(prompt.contains("\"fedexSentiment\""));
        assert!(prompt.contains("\"salesTips\""));
    }
}
