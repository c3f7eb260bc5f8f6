//! Tiered test-fixture selection.
//!
//! Which modules a test run covers is declared in
//! `testdata/module_sets.json`, so re-bounding CI time is a data change.
//! Three tiers: `quick` (a handful of modules, under a minute),
//! `comprehensive` (the curated categories) and `extensive`
//! (comprehensive plus the long tail).

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TestTier {
    Quick,
    Comprehensive,
    Extensive,
}

impl TestTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestTier::Quick => "quick",
            TestTier::Comprehensive => "comprehensive",
            TestTier::Extensive => "extensive",
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            TestTier::Quick => Duration::from_secs(60),
            TestTier::Comprehensive => Duration::from_secs(5 * 60),
            TestTier::Extensive => Duration::from_secs(30 * 60),
        }
    }
}

impl FromStr for TestTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(TestTier::Quick),
            "comprehensive" => Ok(TestTier::Comprehensive),
            "extensive" => Ok(TestTier::Extensive),
            other => Err(format!("unknown test tier: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TierSet {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bibles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ComprehensiveSet {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub english_major: Vec<String>,
    #[serde(default)]
    pub english_historic: Vec<String>,
    #[serde(default)]
    pub non_english: Vec<String>,
    #[serde(default)]
    pub original_languages: Vec<String>,
    #[serde(default)]
    pub strongs_bibles: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ExtensiveSet {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discover_all: bool,
    #[serde(default)]
    pub additional: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidationRules {
    #[serde(default)]
    pub min_verses: HashMap<String, i32>,
    #[serde(default)]
    pub expected_books: HashMap<String, i32>,
    #[serde(default)]
    pub required_references: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        ValidationRules {
            min_verses: HashMap::from([
                ("full_bible".to_string(), 23000),
                ("old_testament".to_string(), 20000),
                ("new_testament".to_string(), 7000),
            ]),
            expected_books: HashMap::from([
                ("protestant".to_string(), 66),
                ("catholic".to_string(), 73),
                ("orthodox".to_string(), 76),
            ]),
            required_references: vec![
                "Gen.1.1".to_string(),
                "Ps.23.1".to_string(),
                "John.3.16".to_string(),
                "Rev.22.21".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ModuleSetsConfig {
    #[serde(default)]
    pub quick: TierSet,
    #[serde(default)]
    pub comprehensive: ComprehensiveSet,
    #[serde(default)]
    pub extensive: ExtensiveSet,
    #[serde(default)]
    pub validation: ValidationRules,
}

impl ModuleSetsConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Module ids covered by a tier. Higher tiers include the lower ones.
    pub fn modules_for_tier(&self, tier: TestTier) -> Vec<String> {
        match tier {
            TestTier::Quick => self.quick.bibles.clone(),
            TestTier::Comprehensive => {
                let mut modules = Vec::new();
                modules.extend(self.comprehensive.english_major.iter().cloned());
                modules.extend(self.comprehensive.english_historic.iter().cloned());
                modules.extend(self.comprehensive.non_english.iter().cloned());
                modules.extend(self.comprehensive.original_languages.iter().cloned());
                modules.extend(self.comprehensive.strongs_bibles.iter().cloned());
                modules
            }
            TestTier::Extensive => {
                let mut modules = self.modules_for_tier(TestTier::Comprehensive);
                modules.extend(self.extensive.additional.iter().cloned());
                modules
            }
        }
    }
}
