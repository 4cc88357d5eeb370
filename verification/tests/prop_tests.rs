use proptest::prelude::*;
use socialkyc_verification::post_url::{extract_username, has_root_domain_and_https};

proptest! {
    #[test]
    fn any_subdomain_of_the_root_matches(sub in "[a-z][a-z0-9]{0,10}", path in "[a-z0-9/]{0,20}") {
        let url = format!("https://{sub}.twitter.com/{path}");
        prop_assert!(has_root_domain_and_https(&url, "twitter.com"));
    }

    #[test]
    fn glued_prefix_never_matches(prefix in "[a-z]{1,10}") {
        let url = format!("https://{prefix}twitter.com/alice/status/1");
        prop_assert!(!has_root_domain_and_https(&url, "twitter.com"));
    }

    #[test]
    fn http_never_matches(sub in "[a-z]{1,10}") {
        let url = format!("http://{sub}.x.com/alice/status/1");
        prop_assert!(!has_root_domain_and_https(&url, "x.com"));
    }

    #[test]
    fn handle_is_recovered(handle in "[A-Za-z0-9_]{1,15}", id in 1u64..u64::MAX) {
        let url = format!("https://x.com/{handle}/status/{id}");
        prop_assert_eq!(extract_username(&url).unwrap(), handle);
    }
}
