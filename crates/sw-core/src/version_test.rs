use super::*;

fn v(s: &str) -> Version {
    Version::from_string(s).unwrap()
}

#[test]
fn test_parse_components() {
    assert_eq!(v("1.2.3").parts(), &[1, 2, 3]);
    assert_eq!(v("16").parts(), &[16]);
}

#[test]
fn test_invalid_versions() {
    for bad in ["", "a.b.2", "1-2", "1.", ".1", "1..2", "-1.0", "+1", " 1.0"] {
        let result = Version::from_string(bad);
        assert!(
            matches!(result, Err(CoreError::InvalidVersion { .. })),
            "expected InvalidVersion for {:?}",
            bad
        );
    }
}

#[test]
fn test_integer_ordering() {
    assert!(v("1.9") < v("1.10"));
    assert!(v("1.10") < v("2.0"));
    assert!(v("1.9") < v("2.0"));
}

#[test]
fn test_prefix_is_smaller() {
    assert!(v("1.2") < v("1.2.1"));
    assert!(v("1.2.1") > v("1.2"));
}

#[test]
fn test_equality_ignores_leading_zeros() {
    assert_eq!(v("1.2"), v("1.02"));
    assert_eq!(v("1.2.3"), v("1.2.03"));
    assert_ne!(v("1.2.3"), v("1.2.4"));
    assert_ne!(v("1.2").to_string(), v("1.02").to_string());
}

#[test]
fn test_sort() {
    let mut versions: Vec<Version> = ["2.2.3", "1.2.7", "4.2.4", "2.2.3", "1.2"]
        .iter()
        .map(|s| v(s))
        .collect();
    versions.sort();
    let rendered: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
    assert_eq!(rendered, vec!["1.2", "1.2.7", "2.2.3", "2.2.3", "4.2.4"]);
}

#[test]
fn test_display_keeps_original() {
    assert_eq!(v("0.01.2").to_string(), "0.01.2");
    assert_eq!(v("0.01.2").normalized(), "0.1.2");
    assert_eq!(v("1.2.3").normalized(), "1.2.3");
}

#[test]
fn test_hash_matches_equality() {
    let mut set = std::collections::HashSet::new();
    set.insert(v("1.2"));
    assert!(set.contains(&v("1.02")));
}

#[test]
fn test_serde_as_string() {
    let json = serde_json::to_string(&v("1.02")).unwrap();
    assert_eq!(json, "\"1.02\"");
    let parsed: Version = serde_json::from_str("\"3.4\"").unwrap();
    assert_eq!(parsed, v("3.4"));
    assert!(serde_json::from_str::<Version>("\"nope\"").is_err());
}

#[test]
fn test_is_version() {
    assert!(Version::is_version("16.12"));
    assert!(!Version::is_version("schemas"));
    assert!(!Version::is_version("fixtures"));
}
