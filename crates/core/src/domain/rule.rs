use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl RuleId {
    pub fn generate() -> Self {
        Self(format!("rule-{}", uuid::Uuid::new_v4()))
    }
}

/// Product attribute a condition reads.
///
/// Unrecognised names decode to `Unknown`, which never matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleParameter {
    DaysToExpiry,
    Stock,
    SalesVelocity,
    OriginalPrice,
    CurrentPrice,
    #[serde(other)]
    Unknown,
}

impl RuleParameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DaysToExpiry => "daysToExpiry",
            Self::Stock => "stock",
            Self::SalesVelocity => "salesVelocity",
            Self::OriginalPrice => "originalPrice",
            Self::CurrentPrice => "currentPrice",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessThanOrEqual,
    #[serde(other)]
    Unknown,
}

impl ComparisonOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Unknown => "?",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertType {
    Expiry,
    Stock,
    SalesVelocity,
    Other,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expiry => "expiry",
            Self::Stock => "stock",
            Self::SalesVelocity => "salesVelocity",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for AlertType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "expiry" => Ok(Self::Expiry),
            "stock" => Ok(Self::Stock),
            "salesVelocity" => Ok(Self::SalesVelocity),
            "other" => Ok(Self::Other),
            other => Err(format!("unsupported alert type `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub parameter: RuleParameter,
    pub operator: ComparisonOperator,
    pub value: f64,
}

impl RuleCondition {
    pub fn new(parameter: RuleParameter, operator: ComparisonOperator, value: f64) -> Self {
        Self { parameter, operator, value }
    }

    pub fn describe(&self) -> String {
        format!("{} {} {}", self.parameter.as_str(), self.operator.symbol(), self.value)
    }
}

/// A named, prioritized, toggleable discount policy.
///
/// `alert_threshold` is carried for the rule editor and is not read during
/// pricing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    pub discount: f64,
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub alert_type: AlertType,
    #[serde(default)]
    pub alert_threshold: f64,
}

fn default_active() -> bool {
    true
}
