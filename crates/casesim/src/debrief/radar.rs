//! Projection of free-form competency names onto the fixed five-axis radar.

use serde::{Deserialize, Serialize};

use super::domain::{CompetencyScore, SCORE_MAX};

/// The five fixed visualization dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadarAxis {
    FinancialAcumen,
    StrategicThinking,
    MarketAwareness,
    RiskManagement,
    LeadershipJudgment,
}

impl RadarAxis {
    pub const ALL: [RadarAxis; 5] = [
        RadarAxis::FinancialAcumen,
        RadarAxis::StrategicThinking,
        RadarAxis::MarketAwareness,
        RadarAxis::RiskManagement,
        RadarAxis::LeadershipJudgment,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RadarAxis::FinancialAcumen => "Financial Acumen",
            RadarAxis::StrategicThinking => "Strategic Thinking",
            RadarAxis::MarketAwareness => "Market Awareness",
            RadarAxis::RiskManagement => "Risk Management",
            RadarAxis::LeadershipJudgment => "Leadership Judgment",
        }
    }

    const fn keywords(self) -> &'static [&'static str] {
        match self {
            RadarAxis::FinancialAcumen => &["financ", "acumen", "budget", "capital", "cost"],
            RadarAxis::StrategicThinking => &["strateg", "thinking", "vision", "planning"],
            RadarAxis::MarketAwareness => &["market", "customer", "competit", "industry"],
            RadarAxis::RiskManagement => &["risk", "mitigat", "complian"],
            RadarAxis::LeadershipJudgment => &[
                "leader",
                "judgment",
                "people",
                "team",
                "stakeholder",
                "communicat",
            ],
        }
    }
}

/// Axis values for the radar chart, each clamped to 0–5. An axis with no
/// matching competency stays at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarProjection {
    pub financial_acumen: f32,
    pub strategic_thinking: f32,
    pub market_awareness: f32,
    pub risk_management: f32,
    pub leadership_judgment: f32,
}

impl Default for RadarProjection {
    fn default() -> Self {
        Self::uniform(0.0)
    }
}

impl RadarProjection {
    pub fn uniform(value: f32) -> Self {
        let value = value.clamp(0.0, SCORE_MAX);
        Self {
            financial_acumen: value,
            strategic_thinking: value,
            market_awareness: value,
            risk_management: value,
            leadership_judgment: value,
        }
    }

    pub fn get(&self, axis: RadarAxis) -> f32 {
        match axis {
            RadarAxis::FinancialAcumen => self.financial_acumen,
            RadarAxis::StrategicThinking => self.strategic_thinking,
            RadarAxis::MarketAwareness => self.market_awareness,
            RadarAxis::RiskManagement => self.risk_management,
            RadarAxis::LeadershipJudgment => self.leadership_judgment,
        }
    }

    fn set(&mut self, axis: RadarAxis, value: f32) {
        let slot = match axis {
            RadarAxis::FinancialAcumen => &mut self.financial_acumen,
            RadarAxis::StrategicThinking => &mut self.strategic_thinking,
            RadarAxis::MarketAwareness => &mut self.market_awareness,
            RadarAxis::RiskManagement => &mut self.risk_management,
            RadarAxis::LeadershipJudgment => &mut self.leadership_judgment,
        };
        *slot = value.clamp(0.0, SCORE_MAX);
    }

    pub fn is_all_zero(&self) -> bool {
        RadarAxis::ALL.iter().all(|axis| self.get(*axis) == 0.0)
    }
}

/// Case-insensitive substring match against the axis keyword sets, in fixed
/// axis order. `None` means the competency is simply omitted from the radar.
pub fn map_to_axis(competency_name: &str) -> Option<RadarAxis> {
    let lowered = competency_name.to_lowercase();
    RadarAxis::ALL.into_iter().find(|axis| {
        axis.keywords()
            .iter()
            .any(|keyword| lowered.contains(keyword))
    })
}

/// Project competency scores onto the radar. Multiple competencies landing
/// on one axis keep the highest score. If nothing mapped but at least one
/// score exists, the first score is promoted onto strategic thinking so a
/// participant who gave real answers never sees an all-zero radar.
pub fn project(scores: &[CompetencyScore]) -> RadarProjection {
    let mut radar = RadarProjection::default();

    for score in scores {
        if let Some(axis) = map_to_axis(&score.name) {
            if score.score > radar.get(axis) {
                radar.set(axis, score.score);
            }
        }
    }

    if radar.is_all_zero() {
        if let Some(first) = scores.first() {
            radar.set(RadarAxis::StrategicThinking, first.score);
        }
    }

    radar
}
