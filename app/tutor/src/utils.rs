//! Small helpers shared by config loading.

/// Expand `${VAR}` and `${VAR:-fallback}` in `input` from the environment.
///
/// Unset variables without a fallback expand to an empty string. An
/// unterminated `${` is copied through unchanged.
pub fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| std::env::var(name).ok())
}

/// [`expand_env_vars`] against an arbitrary lookup.
pub fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let expr = &after[..end];
        let (name, fallback) = match expr.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (expr, None),
        };
        match lookup(name).filter(|value| !value.is_empty()) {
            Some(value) => result.push_str(&value),
            None => result.push_str(fallback.unwrap_or_default()),
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "OPENAI_API_KEY" => Some("sk-test".into()),
            "EMPTY" => Some(String::new()),
            _ => None,
        }
    }

    #[test]
    fn expands_known_variables() {
        assert_eq!(
            expand_with(r#"api_key = "${OPENAI_API_KEY}""#, env),
            r#"api_key = "sk-test""#
        );
    }

    #[test]
    fn unknown_variables_expand_to_empty() {
        assert_eq!(expand_with("a${MISSING}b", env), "ab");
    }

    #[test]
    fn fallback_applies_to_unset_and_empty() {
        assert_eq!(expand_with("${MISSING:-11434}", env), "11434");
        assert_eq!(expand_with("${EMPTY:-x}", env), "x");
        assert_eq!(expand_with("${OPENAI_API_KEY:-x}", env), "sk-test");
    }

    #[test]
    fn unterminated_reference_is_kept() {
        assert_eq!(expand_with("cost: ${5", env), "cost: ${5");
        assert_eq!(expand_with("$HOME and $", env), "$HOME and $");
    }
}
