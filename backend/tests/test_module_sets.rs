use std::path::Path;

use cedrus_backend::tiers::{ModuleSetsConfig, TestTier};

#[test]
fn bundled_module_sets_config_loads() {
    let config = ModuleSetsConfig::load(Path::new("testdata/module_sets.json")).unwrap();

    let quick = config.modules_for_tier(TestTier::Quick);
    assert!(quick.contains(&"KJV".to_string()));
    assert!(quick.len() <= 10);

    let comprehensive = config.modules_for_tier(TestTier::Comprehensive);
    assert!(comprehensive.len() > quick.len());

    let extensive = config.modules_for_tier(TestTier::Extensive);
    assert!(extensive.len() > comprehensive.len());
    assert!(config.extensive.discover_all);

    assert_eq!(config.validation.expected_books["protestant"], 66);
    assert!(config
        .validation
        .required_references
        .contains(&"Gen.1.1".to_string()));
}
