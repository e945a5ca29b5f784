//! Feature group descriptors.
//!
//! The forward preprocessing pipeline routes every original feature through
//! exactly one of three groups. Transformed column names carry the group's
//! transformer key as a `<key>__` prefix, which is how a condition is mapped
//! back to its group.

use serde::{Deserialize, Serialize};

/// One of the three preprocessing branches of the column transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    /// Iterative impute, then log1p, then standard scale.
    NumLogIter,
    /// Mode impute, then standard scale.
    NumMode,
    /// Constant impute with "Other", then one-hot encode dropping "Other".
    Categorical,
}

impl FeatureGroup {
    pub const ALL: [FeatureGroup; 3] = [
        FeatureGroup::NumLogIter,
        FeatureGroup::NumMode,
        FeatureGroup::Categorical,
    ];

    /// Name of the group's transformer inside the column transformer.
    pub fn key(self) -> &'static str {
        match self {
            FeatureGroup::NumLogIter => "num_log_iter",
            FeatureGroup::NumMode => "num_mode",
            FeatureGroup::Categorical => "cat",
        }
    }

    /// Prefix the column transformer puts in front of output column names.
    pub fn prefix(self) -> &'static str {
        match self {
            FeatureGroup::NumLogIter => "num_log_iter__",
            FeatureGroup::NumMode => "num_mode__",
            FeatureGroup::Categorical => "cat__",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.key() == key)
    }

    /// Split a transformed column name into its group and the remainder after
    /// the prefix. Returns `None` for names without a known prefix.
    pub fn split_transformed(name: &str) -> Option<(Self, &str)> {
        Self::ALL
            .into_iter()
            .find_map(|g| name.strip_prefix(g.prefix()).map(|rest| (g, rest)))
    }
}

impl std::fmt::Display for FeatureGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Ordered original-feature lists for each group.
///
/// Order matters: a feature's position in its list is its column in the
/// group's fitted scaler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureGroups {
    #[serde(default = "default_num_log_iter")]
    pub num_log_iter: Vec<String>,
    #[serde(default = "default_num_mode")]
    pub num_mode: Vec<String>,
    #[serde(default = "default_categorical")]
    pub categorical: Vec<String>,
}

impl Default for FeatureGroups {
    fn default() -> Self {
        Self {
            num_log_iter: default_num_log_iter(),
            num_mode: default_num_mode(),
            categorical: default_categorical(),
        }
    }
}

impl FeatureGroups {
    pub fn features(&self, group: FeatureGroup) -> &[String] {
        match group {
            FeatureGroup::NumLogIter => &self.num_log_iter,
            FeatureGroup::NumMode => &self.num_mode,
            FeatureGroup::Categorical => &self.categorical,
        }
    }

    /// Position of `feature` within `group`, if the group lists it.
    pub fn position(&self, group: FeatureGroup, feature: &str) -> Option<usize> {
        self.features(group).iter().position(|f| f == feature)
    }

    pub fn contains(&self, group: FeatureGroup, feature: &str) -> bool {
        self.position(group, feature).is_some()
    }

    /// Group an original feature belongs to.
    pub fn group_of(&self, feature: &str) -> Option<FeatureGroup> {
        FeatureGroup::ALL
            .into_iter()
            .find(|&g| self.contains(g, feature))
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn default_num_log_iter() -> Vec<String> {
    to_strings(&["LOAN", "VALUE", "MORTDUE", "YOJ", "CLAGE", "DEBTINC"])
}

fn default_num_mode() -> Vec<String> {
    to_strings(&["DELINQ", "DEROG", "NINQ", "CLNO"])
}

fn default_categorical() -> Vec<String> {
    to_strings(&["REASON", "JOB"])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_transformed() {
        assert_eq!(
            FeatureGroup::split_transformed("num_log_iter__CLAGE_log"),
            Some((FeatureGroup::NumLogIter, "CLAGE_log"))
        );
        assert_eq!(
            FeatureGroup::split_transformed("num_mode__DELINQ"),
            Some((FeatureGroup::NumMode, "DELINQ"))
        );
        assert_eq!(
            FeatureGroup::split_transformed("cat__JOB_Office"),
            Some((FeatureGroup::Categorical, "JOB_Office"))
        );
        assert_eq!(FeatureGroup::split_transformed("remainder__X"), None);
        assert_eq!(FeatureGroup::split_transformed("CLAGE"), None);
    }

    #[test]
    fn test_from_key() {
        assert_eq!(FeatureGroup::from_key("cat"), Some(FeatureGroup::Categorical));
        assert_eq!(FeatureGroup::from_key("num"), None);
    }

    #[test]
    fn test_default_positions() {
        let groups = FeatureGroups::default();
        assert_eq!(groups.position(FeatureGroup::NumLogIter, "CLAGE"), Some(4));
        assert_eq!(groups.position(FeatureGroup::NumMode, "CLNO"), Some(3));
        assert_eq!(groups.position(FeatureGroup::NumMode, "CLAGE"), None);
        assert_eq!(groups.group_of("JOB"), Some(FeatureGroup::Categorical));
        assert_eq!(groups.group_of("INCOME"), None);
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let groups: FeatureGroups =
            serde_json::from_str(r#"{"categorical": ["REASON"]}"#).unwrap();
        assert_eq!(groups.categorical, vec!["REASON"]);
        assert_eq!(groups.num_mode.len(), 4);
    }
}
