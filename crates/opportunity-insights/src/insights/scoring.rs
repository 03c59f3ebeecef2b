use serde::{Deserialize, Serialize};

/// Insight metrics rendered for a single catalog opportunity.
///
/// Every value is derived from the `(category, product)` pair alone, so the same
/// selection always yields the same report without persisting anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityMetrics {
    pub category: String,
    pub product: String,
    pub demand_score: u32,
    pub growth_score: u32,
    pub competition_score: u32,
    pub unit_economics_score: u32,
    pub differentiation_score: u32,
    /// Lower is safer.
    pub compliance_risk_score: u32,
    pub min_price: u32,
    pub max_price: u32,
    pub search_volume: u32,
    pub revenue_potential: u32,
}

/// Inclusive bounds for a generated metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricRange {
    pub min: u32,
    pub max: u32,
}

impl MetricRange {
    const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn pick(&self, draw: f64) -> u32 {
        let span = f64::from(self.max - self.min + 1);
        (draw * span).floor() as u32 + self.min
    }
}

pub const DEMAND: MetricRange = MetricRange::new(45, 95);
pub const GROWTH: MetricRange = MetricRange::new(40, 92);
pub const COMPETITION: MetricRange = MetricRange::new(25, 85);
pub const UNIT_ECONOMICS: MetricRange = MetricRange::new(35, 88);
pub const DIFFERENTIATION: MetricRange = MetricRange::new(30, 90);
pub const COMPLIANCE_RISK: MetricRange = MetricRange::new(10, 65);
// Price ranges must stay disjoint so min_price < max_price always holds.
pub const MIN_PRICE: MetricRange = MetricRange::new(12, 54);
pub const MAX_PRICE: MetricRange = MetricRange::new(55, 180);
pub const SEARCH_VOLUME: MetricRange = MetricRange::new(800, 65_000);
pub const REVENUE_POTENTIAL: MetricRange = MetricRange::new(40_000, 600_000);

/// Generate the insight metrics for a category/product selection.
///
/// Draw order is part of the contract: changing it changes every previously
/// shown report.
pub fn generate(category: &str, product: &str) -> OpportunityMetrics {
    let key = format!("{category}::{product}");
    let mut rng = Mulberry32::new(seed_for(&key));
    let mut next = |range: MetricRange| range.pick(rng.next_f64());

    let demand_score = next(DEMAND);
    let growth_score = next(GROWTH);
    let competition_score = next(COMPETITION);
    let unit_economics_score = next(UNIT_ECONOMICS);
    let differentiation_score = next(DIFFERENTIATION);
    let compliance_risk_score = next(COMPLIANCE_RISK);
    let min_price = next(MIN_PRICE);
    let max_price = next(MAX_PRICE);
    let search_volume = next(SEARCH_VOLUME);
    let revenue_potential = next(REVENUE_POTENTIAL);

    OpportunityMetrics {
        category: category.to_string(),
        product: product.to_string(),
        demand_score,
        growth_score,
        competition_score,
        unit_economics_score,
        differentiation_score,
        compliance_risk_score,
        min_price,
        max_price,
        search_volume,
        revenue_potential,
    }
}

/// Rolling `hash * 31 + unit` over UTF-16 code units with 32-bit wraparound,
/// then the absolute value of the signed result.
pub(crate) fn seed_for(key: &str) -> u32 {
    let hash = key
        .encode_utf16()
        .fold(0i32, |hash, unit| hash.wrapping_mul(31).wrapping_add(i32::from(unit)));
    hash.unsigned_abs()
}

/// mulberry32 generator producing values in `[0, 1)`.
struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        t ^ (t >> 14)
    }

    fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}
