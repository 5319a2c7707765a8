//! Route building: endpoint templating and query string assembly.
//!
//! A route is always relative to the handler's base address:
//! `resource_path/resource[/endpoint][?query]`.

use crate::{ConnectionSettings, Error, RequestDescriptor, Result};

/// Computes the endpoint segment for a descriptor.
///
/// - No template, one parameter: the parameter itself.
/// - No template, several parameters: [`Error::InvalidArgument`].
/// - Template: `{0}`, `{1}`, ... are replaced by the parameters. If the
///   template does not consume the parameters exactly, a single parameter is
///   appended as `template/parameter`; with several parameters the mismatch
///   is an [`Error::Format`].
///
/// ```
/// use ferrapi::{route, ApiMethod, RequestDescriptor};
///
/// let mut descriptor = RequestDescriptor::new(ApiMethod::Get);
/// descriptor.endpoint = Some("{0}/Classes".to_string());
/// descriptor.parameters = vec!["42".to_string()];
///
/// assert_eq!(route::build_endpoint(&descriptor).unwrap().as_deref(), Some("42/Classes"));
/// ```
pub fn build_endpoint(descriptor: &RequestDescriptor) -> Result<Option<String>> {
    let parameters = &descriptor.parameters;
    let template = descriptor
        .endpoint
        .as_deref()
        .map(|t| t.trim().trim_matches('/'))
        .filter(|t| !t.is_empty());

    let endpoint = match (template, parameters.as_slice()) {
        (None, []) => return Ok(None),
        (None, [single]) => single.clone(),
        (None, _) => {
            return Err(Error::InvalidArgument(format!(
                "An endpoint template is required to place {} parameters",
                parameters.len()
            )))
        }
        (Some(template), []) => template.to_string(),
        (Some(template), [single]) => match substitute(template, parameters) {
            Some(endpoint) => endpoint,
            None => format!("{}/{}", template, single),
        },
        (Some(template), _) => substitute(template, parameters).ok_or_else(|| {
            Error::Format(format!(
                "Endpoint template '{}' does not match the {} supplied parameters",
                template,
                parameters.len()
            ))
        })?,
    };

    let endpoint = endpoint.trim_matches('/');
    if endpoint.is_empty() {
        Ok(None)
    } else {
        Ok(Some(endpoint.to_string()))
    }
}

/// Computes the relative route for a descriptor.
///
/// ```
/// use ferrapi::{route, ApiMethod, ConnectionSettings, RequestDescriptor};
/// use std::time::Duration;
///
/// let settings = ConnectionSettings::new(
///     "https://api.example.com",
///     Some("Users"),
///     Some("api/"),
///     Duration::from_secs(30),
///     0,
/// )
/// .unwrap();
///
/// let mut descriptor = RequestDescriptor::new(ApiMethod::Get);
/// assert_eq!(route::build_route(&settings, &descriptor).unwrap(), "api/Users");
///
/// descriptor.parameters = vec!["10".to_string()];
/// assert_eq!(route::build_route(&settings, &descriptor).unwrap(), "api/Users/10");
/// ```
pub fn build_route(
    settings: &ConnectionSettings,
    descriptor: &RequestDescriptor,
) -> Result<String> {
    let endpoint = build_endpoint(descriptor)?;

    let mut route = [settings.resource_path(), settings.resource(), endpoint.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("/");

    if let Some(query) = build_query_string(&descriptor.query) {
        route.push_str(&query);
    }

    Ok(route)
}

/// Builds `?k1=v1&k2=v2` from query entries in insertion order.
///
/// Keys and values are concatenated as given; no percent-encoding is applied.
///
/// ```
/// use ferrapi::route::build_query_string;
///
/// let query = vec![
///     ("GivenName".to_string(), "John".to_string()),
///     ("LastName".to_string(), "Smith".to_string()),
/// ];
/// assert_eq!(build_query_string(&query).as_deref(), Some("?GivenName=John&LastName=Smith"));
/// assert_eq!(build_query_string(&[]), None);
/// ```
pub fn build_query_string(query: &[(String, String)]) -> Option<String> {
    if query.is_empty() {
        return None;
    }

    let pairs = query
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    Some(format!("?{}", pairs))
}

/// Replaces `{n}` placeholders. `{{` and `}}` are literal braces.
///
/// Returns `None` when a placeholder is malformed or out of range, or when a
/// parameter is left unused.
fn substitute(template: &str, parameters: &[String]) -> Option<String> {
    let mut output = String::with_capacity(template.len());
    let mut used = vec![false; parameters.len()];
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '{' => {
                let mut digits = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        d if d.is_ascii_digit() => digits.push(d),
                        _ => return None,
                    }
                }
                let index: usize = digits.parse().ok()?;
                output.push_str(parameters.get(index)?);
                used[index] = true;
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '}' => return None,
            other => output.push(other),
        }
    }

    if used.iter().all(|u| *u) {
        Some(output)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiMethod;
    use std::time::Duration;

    fn settings() -> ConnectionSettings {
        ConnectionSettings::new(
            "http://localhost",
            Some("Users"),
            Some("api/"),
            Duration::from_secs(30),
            0,
        )
        .unwrap()
    }

    fn descriptor(endpoint: Option<&str>, parameters: &[&str]) -> RequestDescriptor {
        let mut descriptor = RequestDescriptor::new(ApiMethod::Get);
        descriptor.endpoint = endpoint.map(str::to_string);
        descriptor.parameters = parameters.iter().map(|p| p.to_string()).collect();
        descriptor
    }

    #[test]
    fn test_route_without_endpoint() {
        let route = build_route(&settings(), &descriptor(None, &[])).unwrap();
        assert_eq!(route, "api/Users");
    }

    #[test]
    fn test_route_with_single_parameter() {
        let route = build_route(&settings(), &descriptor(None, &["10"])).unwrap();
        assert_eq!(route, "api/Users/10");
    }

    #[test]
    fn test_template_substitution() {
        let endpoint = build_endpoint(&descriptor(Some("{0}/Classes"), &["42"])).unwrap();
        assert_eq!(endpoint.as_deref(), Some("42/Classes"));

        let endpoint =
            build_endpoint(&descriptor(Some("{1}/Classes/{0}"), &["7", "42"])).unwrap();
        assert_eq!(endpoint.as_deref(), Some("42/Classes/7"));
    }

    #[test]
    fn test_multiple_parameters_without_template() {
        let result = build_endpoint(&descriptor(None, &["1", "2"]));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_single_parameter_falls_back_to_append() {
        let endpoint = build_endpoint(&descriptor(Some("Classes"), &["42"])).unwrap();
        assert_eq!(endpoint.as_deref(), Some("Classes/42"));

        let endpoint = build_endpoint(&descriptor(Some("Classes/{3}"), &["42"])).unwrap();
        assert_eq!(endpoint.as_deref(), Some("Classes/{3}/42"));
    }

    #[test]
    fn test_multiple_parameters_template_mismatch() {
        let result = build_endpoint(&descriptor(Some("{0}/Classes"), &["1", "2"]));
        assert!(matches!(result, Err(Error::Format(_))));

        let result = build_endpoint(&descriptor(Some("{0}/{5}"), &["1", "2"]));
        assert!(matches!(result, Err(Error::Format(_))));
    }

    #[test]
    fn test_template_without_parameters() {
        let route = build_route(&settings(), &descriptor(Some("/Active/"), &[])).unwrap();
        assert_eq!(route, "api/Users/Active");
    }

    #[test]
    fn test_escaped_braces() {
        let endpoint = build_endpoint(&descriptor(Some("{{x}}/{0}"), &["1"])).unwrap();
        assert_eq!(endpoint.as_deref(), Some("{x}/1"));
    }

    #[test]
    fn test_route_with_query() {
        let mut descriptor = descriptor(None, &["10"]);
        descriptor.query = vec![
            ("GivenName".to_string(), "John".to_string()),
            ("LastName".to_string(), "Smith".to_string()),
        ];
        let route = build_route(&settings(), &descriptor).unwrap();
        assert_eq!(route, "api/Users/10?GivenName=John&LastName=Smith");
    }

    #[test]
    fn test_single_query_entry() {
        let query = vec![("page".to_string(), "2".to_string())];
        assert_eq!(build_query_string(&query).as_deref(), Some("?page=2"));
    }

    #[test]
    fn test_route_without_resource() {
        let settings =
            ConnectionSettings::new("http://localhost", None, None, Duration::from_secs(1), 0)
                .unwrap();
        let route = build_route(&settings, &descriptor(Some("health"), &[])).unwrap();
        assert_eq!(route, "health");
    }
}
