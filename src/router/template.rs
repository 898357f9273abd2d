//! URI templates with named placeholders
//!
//! Supports the two RFC 6570 forms the server needs: `{name}` captures a single
//! path segment and `{+name}` captures the rest of the identifier, slashes
//! included. Everything else in the pattern is matched literally.

use std::collections::HashMap;

use regex::Regex;

use crate::errors::RegistryError;

/// Placeholder name to captured value, produced per resolved request.
pub type PlaceholderBinding = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Placeholder { name: String, reserved: bool },
}

#[derive(Debug, Clone)]
pub struct UriTemplate {
    pattern: String,
    shape: String,
    names: Vec<String>,
    matcher: Regex,
}

impl UriTemplate {
    pub fn parse(pattern: &str) -> Result<Self, RegistryError> {
        let parts = split_parts(pattern)?;

        let mut names = Vec::new();
        let mut expression = String::from("^");
        let mut shape = String::new();
        let mut previous_was_placeholder = false;

        for part in &parts {
            match part {
                Part::Literal(text) => {
                    expression.push_str(&regex::escape(text));
                    shape.push_str(text);
                    previous_was_placeholder = false;
                }
                Part::Placeholder { name, reserved } => {
                    if previous_was_placeholder {
                        return Err(invalid(pattern, "adjacent placeholders are ambiguous"));
                    }
                    if names.contains(name) {
                        return Err(invalid(pattern, "placeholder names must be unique"));
                    }

                    let capture = if *reserved { ".+" } else { "[^/]+" };
                    expression.push_str(&format!("(?P<{name}>{capture})"));
                    shape.push_str(if *reserved { "{+}" } else { "{}" });
                    names.push(name.clone());
                    previous_was_placeholder = true;
                }
            }
        }

        if names.is_empty() {
            return Err(invalid(pattern, "template must contain at least one placeholder"));
        }

        expression.push('$');
        let matcher = Regex::new(&expression)
            .map_err(|_| invalid(pattern, "template does not compile to a matcher"))?;

        Ok(Self {
            pattern: pattern.to_string(),
            shape,
            names,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The pattern with placeholder names erased. Two templates with the same
    /// shape match exactly the same identifiers.
    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn placeholder_names(&self) -> &[String] {
        &self.names
    }

    pub fn matches(&self, identifier: &str) -> Option<PlaceholderBinding> {
        let captures = self.matcher.captures(identifier)?;

        Some(
            self.names
                .iter()
                .filter_map(|name| {
                    captures
                        .name(name)
                        .map(|value| (name.clone(), value.as_str().to_string()))
                })
                .collect(),
        )
    }
}

fn split_parts(pattern: &str) -> Result<Vec<Part>, RegistryError> {
    let mut parts = Vec::new();
    let mut rest = pattern;

    while !rest.is_empty() {
        match rest.find(['{', '}']) {
            Some(index) if rest.as_bytes()[index] == b'}' => {
                return Err(invalid(pattern, "unbalanced `}`"));
            }
            Some(start) => {
                if start > 0 {
                    parts.push(Part::Literal(rest[..start].to_string()));
                }

                let after_open = &rest[start + 1..];
                let end = after_open
                    .find('}')
                    .ok_or_else(|| invalid(pattern, "unterminated placeholder"))?;
                let raw_name = &after_open[..end];
                let (name, reserved) = match raw_name.strip_prefix('+') {
                    Some(name) => (name, true),
                    None => (raw_name, false),
                };

                if !is_valid_placeholder_name(name) {
                    return Err(invalid(
                        pattern,
                        "placeholder names must be ASCII identifiers",
                    ));
                }

                parts.push(Part::Placeholder {
                    name: name.to_string(),
                    reserved,
                });
                rest = &after_open[end + 1..];
            }
            None => {
                parts.push(Part::Literal(rest.to_string()));
                rest = "";
            }
        }
    }

    Ok(parts)
}

fn is_valid_placeholder_name(name: &str) -> bool {
    let mut characters = name.chars();
    match characters.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }

    characters.all(|character| character.is_ascii_alphanumeric() || character == '_')
}

fn invalid(pattern: &str, reason: &'static str) -> RegistryError {
    RegistryError::InvalidTemplate {
        pattern: pattern.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::UriTemplate;
    use crate::errors::RegistryError;

    #[test]
    fn binds_single_placeholder() {
        let template = UriTemplate::parse("users://{id}/profile").expect("valid template");

        let binding = template.matches("users://7/profile").expect("should match");
        assert_eq!(binding.len(), 1);
        assert_eq!(binding.get("id").map(String::as_str), Some("7"));
    }

    #[test]
    fn literal_suffix_must_match() {
        let template = UriTemplate::parse("users://{id}/profile").expect("valid template");

        assert!(template.matches("users://7").is_none());
        assert!(template.matches("users://7/profile/extra").is_none());
        assert!(template.matches("users:///profile").is_none());
    }

    #[test]
    fn simple_placeholder_stops_at_slash() {
        let template = UriTemplate::parse("users://{id}").expect("valid template");

        assert!(template.matches("users://7/profile").is_none());
    }

    #[test]
    fn reserved_placeholder_spans_slashes() {
        let template = UriTemplate::parse("file://{+path}").expect("valid template");

        let binding = template.matches("file://docs/guide.md").expect("should match");
        assert_eq!(binding.get("path").map(String::as_str), Some("docs/guide.md"));
        assert_eq!(template.shape(), "file://{+}");
    }

    #[test]
    fn literals_are_not_regex_syntax() {
        let template = UriTemplate::parse("report.v1://{name}").expect("valid template");

        assert!(template.matches("report.v1://q3").is_some());
        assert!(template.matches("reportXv1://q3").is_none());
    }

    #[test]
    fn binds_multiple_placeholders() {
        let template =
            UriTemplate::parse("orgs://{org}/members/{member}").expect("valid template");

        let binding = template
            .matches("orgs://acme/members/ann")
            .expect("should match");
        assert_eq!(binding.get("org").map(String::as_str), Some("acme"));
        assert_eq!(binding.get("member").map(String::as_str), Some("ann"));
        assert_eq!(template.placeholder_names(), ["org", "member"]);
    }

    #[test]
    fn shape_ignores_placeholder_names() {
        let left = UriTemplate::parse("users://{id}").expect("valid template");
        let right = UriTemplate::parse("users://{user_id}").expect("valid template");

        assert_eq!(left.shape(), right.shape());
    }

    #[test]
    fn rejects_malformed_templates() {
        for pattern in [
            "users://static",
            "users://{id",
            "users://id}",
            "users://{}",
            "users://{1d}",
            "users://{a}{b}",
            "users://{id}/{id}",
        ] {
            let error = UriTemplate::parse(pattern).expect_err("template should be rejected");
            assert!(
                matches!(error, RegistryError::InvalidTemplate { .. }),
                "{pattern} produced {error:?}"
            );
        }
    }
}
