//! Topic parsing

/// Device code from a `/<prefix>/<device>` topic
///
/// Both segments must be non-empty and there must be exactly two.
pub fn device_code_from_topic(topic: &str) -> Option<&str> {
    let rest = topic.strip_prefix('/')?;
    let (prefix, code) = rest.split_once('/')?;
    if prefix.is_empty() || code.is_empty() || code.contains('/') {
        return None;
    }
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_code_from_topic() {
        assert_eq!(device_code_from_topic("/command/dev-1"), Some("dev-1"));
        assert_eq!(device_code_from_topic("/heartbeat/a.b"), Some("a.b"));
        assert_eq!(device_code_from_topic("command/dev-1"), None);
        assert_eq!(device_code_from_topic("/command/"), None);
        assert_eq!(device_code_from_topic("//dev-1"), None);
        assert_eq!(device_code_from_topic("/a/b/c"), None);
        assert_eq!(device_code_from_topic("/command"), None);
    }
}
