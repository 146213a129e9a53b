use crate::config::ConfigError;
use regex::Regex;

/// Include/exclude patterns over org names
#[derive(Debug, Clone, Default)]
pub struct OrgFilter {
    included: Vec<Regex>,
    excluded: Vec<Regex>,
}

impl OrgFilter {
    pub fn new(included: &[String], excluded: &[String]) -> Result<Self, ConfigError> {
        Ok(Self {
            included: compile(included)?,
            excluded: compile(excluded)?,
        })
    }

    /// An org is walked when it matches some included pattern (or none are
    /// given) and matches no excluded pattern.
    pub fn should_process(&self, org: &str) -> bool {
        let included = self.included.is_empty() || self.included.iter().any(|re| re.is_match(org));
        included && !self.excluded.iter().any(|re| re.is_match(org))
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}
