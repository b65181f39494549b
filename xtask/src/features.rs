use anyhow::Result;

/// Feature sets of `rcm-infra` that must keep building and passing tests
const FEATURE_SETS: &[&[&str]] = &[
    &[], // file session storage only
    &["keychain"],
];

pub fn test_feature_matrix() -> Result<()> {
    for (index, features) in FEATURE_SETS.iter().enumerate() {
        let joined = features.join(",");
        let mut args = vec!["test", "-p", "rcm-infra"];
        if !features.is_empty() {
            args.extend(["--features", joined.as_str()]);
        }

        println!("[{}/{}] cargo {}", index + 1, FEATURE_SETS.len(), args.join(" "));
        super::cargo(&args)?;
    }
    Ok(())
}
