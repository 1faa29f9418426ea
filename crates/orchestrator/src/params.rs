use std::collections::BTreeMap;

/// Parse an opaque `key=value;key=value` connection parameter string.
///
/// Fragments without `=` and blank keys are dropped, whitespace around keys
/// and values is trimmed, and the last occurrence of a key wins. This never
/// fails; validation of which keys are required happens per connection kind
/// in the config generator.
pub fn parse_params(raw: &str) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for pair in raw.split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        params.insert(key.to_string(), value.trim().to_string());
    }
    params
}
