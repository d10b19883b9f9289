//! Deterministic stand-in insights for when no live provider answer is
//! usable. The same country name always yields the same carriers and text.

use crate::normalize::{finalize_carriers, HOME_CARRIER};
use crate::types::{CarrierInfo, CountryInsights};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const CARRIER_POOL: [&str; 12] = [
    "DHL Express",
    "UPS",
    "TNT",
    "DPD",
    "GLS",
    "Royal Mail",
    "La Poste",
    "Deutsche Post",
    "PostNL",
    "Aramex",
    "SF Express",
    "Local Post",
];

const SENTIMENTS: [&str; 4] = [
    "FedEx is recognised in {country} for reliable international express service, although price-sensitive shippers still lean towards the national post for domestic parcels.",
    "In {country}, FedEx is viewed as a premium option with strong tracking and customs support; awareness among small and mid-sized exporters is still growing.",
    "Customers in {country} associate FedEx with speed on long-haul lanes, while competitors dominate last-mile delivery and are perceived as cheaper.",
    "FedEx holds a solid reputation in {country} among larger accounts; service consistency is rated well, but local presence and pickup flexibility are areas to highlight.",
];

const TIPS: [&str; 8] = [
    "Target exporters in {country} with time-definite international services and transparent duty handling.",
    "Offer volume-tiered pricing to mid-sized e-commerce shippers in {country} to win share from domestic carriers.",
    "Highlight customs clearance expertise for shipments leaving {country}, especially to North America and Asia.",
    "Bundle returns management into proposals for online retailers operating in {country}.",
    "Run joint business reviews with top accounts in {country} using their own delivery performance data.",
    "Promote dangerous goods and healthcare shipping capabilities to specialised shippers in {country}.",
    "Use sustainability reporting and carbon-neutral options as a differentiator for corporate buyers in {country}.",
    "Partner with local marketplaces in {country} to integrate FedEx rates directly into seller tools.",
];

/// 32-bit rolling string hash (`h = h * 31 + c`) used as the RNG seed.
///
/// `c` walks UTF-16 code units rather than `char`s, so a name outside the
/// Basic Multilingual Plane contributes its two surrogates.
pub fn country_seed(country: &str) -> u64 {
    let mut hash: i32 = 0;
    for unit in country.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    u64::from(hash.unsigned_abs())
}

fn fill(template: &str, country: &str) -> String {
    template.replace("{country}", country)
}

fn synthetic_carriers(rng: &mut StdRng) -> Vec<CarrierInfo> {
    let count = rng.gen_range(5..=6);
    let mut pool: Vec<&str> = CARRIER_POOL.to_vec();
    pool.shuffle(rng);

    let mut carriers = vec![CarrierInfo {
        name: HOME_CARRIER.to_string(),
        market_share: rng.gen_range(8.0..25.0),
        is_fedex: true,
    }];
    carriers.extend(pool.into_iter().take(count - 1).map(|name| CarrierInfo {
        name: name.to_string(),
        market_share: rng.gen_range(5.0..35.0),
        is_fedex: false,
    }));
    finalize_carriers(carriers)
}

/// Build insights for `country` from its name alone.
pub fn synthetic_insights(country: &str, generated_at: i64) -> CountryInsights {
    let mut rng = StdRng::seed_from_u64(country_seed(country));
    let carriers = synthetic_carriers(&mut rng);

    let sentiment = SENTIMENTS[rng.gen_range(0..SENTIMENTS.len())];
    let mut tips: Vec<&str> = TIPS.to_vec();
    tips.shuffle(&mut rng);
    let sales_tips = tips.into_iter().take(5).map(|t| fill(t, country)).collect();

    let email_template = format!(
        "Subject: Faster, simpler shipping from {country}\n\n\
         Dear [Name],\n\n\
         I'm reaching out because businesses across {country} are using FedEx to reach customers abroad with dependable transit times and end-to-end tracking.\n\n\
         I'd welcome 20 minutes to look at your current shipping profile and share where we could save you time and cost.\n\n\
         Best regards,\n\
         [Your Name]\n\
         FedEx Sales"
    );

    CountryInsights {
        country: country.to_string(),
        carriers,
        fedex_sentiment: fill(sentiment, country),
        sales_tips,
        email_template,
        generated_at,
    }
}
