use std::str::FromStr;

/// Read an environment variable and parse it, ignoring blank or malformed values.
pub fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_parse_reads_and_rejects() {
        let mut scope = env::scoped(&["INSIGHT_TEST_NUM"]);
        assert_eq!(env_parse::<u64>("INSIGHT_TEST_NUM"), None);
        scope.set("INSIGHT_TEST_NUM", " 17 ");
        assert_eq!(env_parse::<u64>("INSIGHT_TEST_NUM"), Some(17));
        scope.set("INSIGHT_TEST_NUM", "soon");
        assert_eq!(env_parse::<u64>("INSIGHT_TEST_NUM"), None);
    }
}
