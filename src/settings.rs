use chrono::{DateTime, FixedOffset, Offset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::volume::{VolumeCalculator, VolumePolicy};

/// Literal YAML keys emitted for each logical frontmatter field.
///
/// Stored settings from older versions may carry a `volume` key for the
/// aggregate volume field; it is ignored since only per-exercise volumes are
/// emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YamlMapping {
    pub date: String,
    #[serde(rename = "type")]
    pub workout_type: String,
    pub duration: String,
    pub tags: String,
}

impl Default for YamlMapping {
    fn default() -> Self {
        YamlMapping {
            date: "date".to_string(),
            workout_type: "workout_type".to_string(),
            duration: "duration".to_string(),
            tags: "tags".to_string(),
        }
    }
}

impl YamlMapping {
    /// Set the key for a logical field by name (`date`, `type`, `duration`, `tags`)
    pub fn set(&mut self, field: &str, key: &str) -> Result<(), String> {
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("YAML key for {} must not be empty", field));
        }
        let slot = match field.to_lowercase().as_str() {
            "date" => &mut self.date,
            "type" | "workout_type" => &mut self.workout_type,
            "duration" => &mut self.duration,
            "tags" => &mut self.tags,
            _ => return Err(format!("Unknown frontmatter field: {}", field)),
        };
        *slot = key.to_string();
        Ok(())
    }

    fn keys(&self) -> [&str; 4] {
        [
            self.date.as_str(),
            self.workout_type.as_str(),
            self.duration.as_str(),
            self.tags.as_str(),
        ]
    }
}

/// Export configuration stored alongside the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Frontmatter key names
    pub yaml_mapping: YamlMapping,

    /// Note tags, each starting with `#`
    pub tags: Vec<String>,

    /// Body weight used for bodyweight exercise volume
    pub user_bodyweight: Option<Decimal>,

    /// Offset applied when rendering timestamps, in minutes east of UTC
    pub utc_offset_minutes: i32,

    /// Which sets count toward exported volume
    pub volume_policy: VolumePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            yaml_mapping: YamlMapping::default(),
            tags: vec!["#workout/gym".to_string()],
            user_bodyweight: None,
            utc_offset_minutes: 0,
            volume_policy: VolumePolicy::AllSets,
        }
    }
}

impl Settings {
    /// Every problem with these settings; empty when valid
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for tag in &self.tags {
            if !tag.starts_with('#') || tag.len() < 2 {
                errors.push(format!("Tag must start with '#': {}", tag));
            }
        }

        if let Some(bodyweight) = self.user_bodyweight {
            if bodyweight <= Decimal::ZERO {
                errors.push("userBodyweight must be a positive number".to_string());
            }
        }

        if self.yaml_mapping.keys().iter().any(|key| key.trim().is_empty()) {
            errors.push("YAML keys must not be empty".to_string());
        }

        if self.fixed_offset().is_none() {
            errors.push(format!("Invalid UTC offset: {} minutes", self.utc_offset_minutes));
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }

    /// Replace the tag list, adding a leading `#` where missing
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty() && t != "#")
            .map(|t| if t.starts_with('#') { t } else { format!("#{}", t) })
            .collect();
    }

    fn fixed_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }

    /// Configured offset, UTC when out of range
    pub fn offset(&self) -> FixedOffset {
        self.fixed_offset().unwrap_or_else(|| Utc.fix())
    }

    /// Timestamp as shown in exported notes
    pub fn local_time(&self, time: DateTime<Utc>) -> DateTime<FixedOffset> {
        time.with_timezone(&self.offset())
    }

    /// Volume calculator configured from these settings
    pub fn volume_calculator(&self) -> VolumeCalculator {
        VolumeCalculator::new(self.user_bodyweight).with_policy(self.volume_policy)
    }
}
