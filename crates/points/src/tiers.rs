use config::{Tier, TierThresholds};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierInfo {
    pub tier: Tier,
    pub next_tier: Option<Tier>,
    pub points_to_next: Option<i64>,
}

pub fn tier_for_points(points: i64, thresholds: &TierThresholds) -> Tier {
    [Tier::Platinum, Tier::Gold, Tier::Silver]
        .into_iter()
        .find(|tier| points >= thresholds.minimum(*tier))
        .unwrap_or(Tier::Bronze)
}

pub fn has_tier(points: i64, required: Tier, thresholds: &TierThresholds) -> bool {
    tier_for_points(points, thresholds) >= required
}

pub fn tier_info(points: i64, thresholds: &TierThresholds) -> TierInfo {
    let tier = tier_for_points(points, thresholds);
    let next_tier = match tier {
        Tier::Bronze => Some(Tier::Silver),
        Tier::Silver => Some(Tier::Gold),
        Tier::Gold => Some(Tier::Platinum),
        Tier::Platinum => None,
    };
    TierInfo {
        tier,
        next_tier,
        points_to_next: next_tier.map(|next| thresholds.minimum(next) - points),
    }
}
