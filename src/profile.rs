use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Years between the user and the persona the model plays.
pub const YEARS_AHEAD: u32 = 7;

/// Upper bound on a believable age; anything above is treated as unknown.
pub const MAX_AGE: u32 = 150;

/// Answers collected by onboarding; rendered into the system prompt.
///
/// Empty fields are omitted when serialized, so a fresh profile is `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_age"
    )]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub current_situation: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub past_struggles: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub current_challenges: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub future_goals: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub desired_personality: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dreams: String,
}

impl Profile {
    /// `None` when the age is unknown or out of range.
    pub fn future_age(&self) -> Option<u32> {
        self.age
            .filter(|a| *a <= MAX_AGE)
            .and_then(|a| a.checked_add(YEARS_AHEAD))
    }
}

/// The browser form submits age as a string; older clients send a number.
/// Anything that is not a whole, non-negative number reads as unknown rather
/// than failing the whole body.
fn deserialize_age<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| n.as_f64().and_then(whole_age)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_age))
        }
        _ => None,
    })
}

fn whole_age(v: f64) -> Option<u32> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}
