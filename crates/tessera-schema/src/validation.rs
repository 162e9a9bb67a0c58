//! # Validation Rules
//!
//! Rules run on values that have already been coerced. They are applied in
//! a fixed order: enum, format, pattern, length, range. Every failing rule
//! is reported; a rule that does not apply to the value's kind is skipped.
//!
//! - **Length** counts characters for strings and entries for sequences
//!   and mappings.
//! - **Range** compares integers and numbers as doubles.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use tessera_core::{ValidationError, Value};

use crate::error::SchemaError;

/// A named string format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// RFC 3339 date-time.
    DateTime,
    /// `local@domain.tld`.
    Email,
    /// RFC 1123 host name.
    Hostname,
    /// Dotted-quad IPv4 address.
    Ipv4,
    /// IPv6 address.
    Ipv6,
    /// IPv4 or IPv6 address.
    Ip,
    /// Absolute URI.
    Uri,
    /// Hyphenated UUID.
    Uuid,
    /// A regular expression that compiles.
    Regexp,
}

impl Format {
    /// The descriptor name.
    pub fn name(&self) -> &'static str {
        match self {
            Format::DateTime => "date-time",
            Format::Email => "email",
            Format::Hostname => "hostname",
            Format::Ipv4 => "ipv4",
            Format::Ipv6 => "ipv6",
            Format::Ip => "ip",
            Format::Uri => "uri",
            Format::Uuid => "uuid",
            Format::Regexp => "regexp",
        }
    }

    /// Check `text` against this format.
    pub fn check(&self, text: &str) -> Result<(), String> {
        match self {
            Format::DateTime => chrono::DateTime::parse_from_rfc3339(text)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Format::Email => {
                if email_regex().is_some_and(|re| re.is_match(text)) {
                    Ok(())
                } else {
                    Err("not an email address".to_string())
                }
            }
            Format::Hostname => {
                if text.len() <= 253 && hostname_regex().is_some_and(|re| re.is_match(text)) {
                    Ok(())
                } else {
                    Err("not a valid host name".to_string())
                }
            }
            Format::Ipv4 => Ipv4Addr::from_str(text).map(|_| ()).map_err(|e| e.to_string()),
            Format::Ipv6 => Ipv6Addr::from_str(text).map(|_| ()).map_err(|e| e.to_string()),
            Format::Ip => IpAddr::from_str(text).map(|_| ()).map_err(|e| e.to_string()),
            Format::Uri => url::Url::parse(text).map(|_| ()).map_err(|e| e.to_string()),
            Format::Uuid => uuid::Uuid::parse_str(text).map(|_| ()).map_err(|e| e.to_string()),
            Format::Regexp => Regex::new(text).map(|_| ()).map_err(|e| e.to_string()),
        }
    }
}

impl FromStr for Format {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-time" | "datetime" => Ok(Format::DateTime),
            "email" => Ok(Format::Email),
            "hostname" => Ok(Format::Hostname),
            "ipv4" => Ok(Format::Ipv4),
            "ipv6" => Ok(Format::Ipv6),
            "ip" => Ok(Format::Ip),
            "uri" => Ok(Format::Uri),
            "uuid" => Ok(Format::Uuid),
            "regexp" => Ok(Format::Regexp),
            other => Err(SchemaError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn email_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .ok()
    })
    .as_ref()
}

fn hostname_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$")
            .ok()
    })
    .as_ref()
}

/// The compiled rule set of one attribute.
#[derive(Debug, Clone, Default)]
pub struct Rules {
    pub(crate) allowed: Option<Vec<Value>>,
    pub(crate) format: Option<Format>,
    pub(crate) pattern: Option<Regex>,
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
}

impl Rules {
    /// Returns true when no rule is declared.
    pub fn is_empty(&self) -> bool {
        self.allowed.is_none()
            && self.format.is_none()
            && self.pattern.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
    }

    /// The allowed set, if any.
    pub fn allowed(&self) -> Option<&[Value]> {
        self.allowed.as_deref()
    }

    /// The declared format, if any.
    pub fn format(&self) -> Option<Format> {
        self.format
    }

    /// The pattern source, if any.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    /// Declared `(min, max)` length bounds.
    pub fn length(&self) -> (Option<usize>, Option<usize>) {
        (self.min_length, self.max_length)
    }

    /// Declared `(minimum, maximum)` range bounds.
    pub fn range(&self) -> (Option<f64>, Option<f64>) {
        (self.minimum, self.maximum)
    }

    /// Check a coerced value against every rule, in order.
    pub fn check(&self, value: &Value) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if let Some(allowed) = &self.allowed {
            if !allowed.contains(value) {
                errors.push(ValidationError::Enum {
                    allowed: allowed.clone(),
                    received: value.clone(),
                });
            }
        }

        if let (Some(format), Value::String(text)) = (self.format, value) {
            if let Err(reason) = format.check(text) {
                errors.push(ValidationError::Format {
                    format: format.name().to_string(),
                    reason,
                    received: value.clone(),
                });
            }
        }

        if let (Some(pattern), Value::String(text)) = (&self.pattern, value) {
            if !pattern.is_match(text) {
                errors.push(ValidationError::Pattern {
                    pattern: pattern.as_str().to_string(),
                    received: value.clone(),
                });
            }
        }

        if let Some(actual) = measure(value) {
            if let Some(min) = self.min_length.filter(|min| actual < *min) {
                errors.push(ValidationError::MinLength {
                    min,
                    actual,
                    received: value.clone(),
                });
            }
            if let Some(max) = self.max_length.filter(|max| actual > *max) {
                errors.push(ValidationError::MaxLength {
                    max,
                    actual,
                    received: value.clone(),
                });
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.minimum.filter(|min| n < *min) {
                errors.push(ValidationError::Minimum {
                    min,
                    received: value.clone(),
                });
            }
            if let Some(max) = self.maximum.filter(|max| n > *max) {
                errors.push(ValidationError::Maximum {
                    max,
                    received: value.clone(),
                });
            }
        }

        errors
    }
}

fn measure(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Sequence(items) => Some(items.len()),
        Value::Mapping(map) => Some(map.len()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Rules {
        Rules::default()
    }

    #[test]
    fn test_enum() {
        let r = Rules {
            allowed: Some(vec![Value::from("red"), Value::from("blue")]),
            ..rules()
        };
        assert!(r.check(&Value::from("red")).is_empty());
        let errs = r.check(&Value::from("green"));
        assert!(matches!(errs[0], ValidationError::Enum { .. }));
    }

    #[test]
    fn test_length_counts_characters() {
        let r = Rules {
            max_length: Some(3),
            ..rules()
        };
        assert!(r.check(&Value::from("äöü")).is_empty());
        let errs = r.check(&Value::from("abcd"));
        assert!(matches!(errs[0], ValidationError::MaxLength { actual: 4, max: 3, .. }));
    }

    #[test]
    fn test_length_on_sequences() {
        let r = Rules {
            min_length: Some(2),
            ..rules()
        };
        let errs = r.check(&Value::Sequence(vec![Value::Int(1)]));
        assert!(matches!(errs[0], ValidationError::MinLength { actual: 1, .. }));
    }

    #[test]
    fn test_range() {
        let r = Rules {
            minimum: Some(1.0),
            maximum: Some(10.0),
            ..rules()
        };
        assert!(r.check(&Value::Int(5)).is_empty());
        let low = r.check(&Value::Int(0));
        assert!(low[0].to_string().contains("minimum"));
        let high = r.check(&Value::Float(10.5));
        assert!(matches!(high[0], ValidationError::Maximum { .. }));
    }

    #[test]
    fn test_rules_run_in_fixed_order() {
        let r = Rules {
            allowed: Some(vec![Value::from("ok")]),
            pattern: Some(Regex::new("^[a-z]+$").unwrap()),
            max_length: Some(2),
            ..rules()
        };
        let errs = r.check(&Value::from("NOPE"));
        let names: Vec<&str> = errs.iter().map(ValidationError::rule).collect();
        assert_eq!(names, vec!["enum", "pattern", "max_length"]);
    }

    #[test]
    fn test_rules_skip_inapplicable_kinds() {
        let r = Rules {
            pattern: Some(Regex::new("^x$").unwrap()),
            minimum: Some(3.0),
            ..rules()
        };
        assert!(r.check(&Value::Bool(true)).is_empty());
    }

    #[test]
    fn test_formats() {
        assert!(Format::Email.check("bob@example.com").is_ok());
        assert!(Format::Email.check("bob@").is_err());
        assert!(Format::Hostname.check("api.example.com").is_ok());
        assert!(Format::Hostname.check("-bad-.com").is_err());
        assert!(Format::Ipv4.check("10.0.0.1").is_ok());
        assert!(Format::Ipv4.check("::1").is_err());
        assert!(Format::Ipv6.check("::1").is_ok());
        assert!(Format::Ip.check("::1").is_ok());
        assert!(Format::Uri.check("https://example.com/a?b=c").is_ok());
        assert!(Format::Uri.check("not a uri").is_err());
        assert!(Format::Uuid.check("67e55044-10b1-426f-9247-bb680e5fe0c8").is_ok());
        assert!(Format::DateTime.check("2026-01-15T12:00:00Z").is_ok());
        assert!(Format::DateTime.check("yesterday").is_err());
        assert!(Format::Regexp.check("(unclosed").is_err());
    }

    #[test]
    fn test_format_names_round_trip() {
        for f in [Format::DateTime, Format::Email, Format::Ip, Format::Regexp] {
            assert_eq!(f.name().parse::<Format>().unwrap(), f);
        }
        assert!(matches!(
            "zip".parse::<Format>(),
            Err(SchemaError::UnknownFormat(_))
        ));
    }
}
