//! Ordered route rules and path pattern matching.
//!
//! A rule set maps request paths to an access requirement. Rules are
//! evaluated in declaration order and the first matching pattern wins;
//! paths matching no rule fall back to [`Requirement::Authenticated`].
//! Patterns are absolute paths whose segments are either literals or a
//! single-level wildcard `*` matching exactly one segment.
//!
//! Rule sets are parsed once at startup and immutable afterwards, so they
//! can be shared across concurrently handled requests without locking.

/// Access requirement attached to a route rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
}

impl Requirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Requirement::Public => "public",
            Requirement::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for Requirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Requirement {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Requirement::Public),
            "authenticated" => Ok(Requirement::Authenticated),
            _ => Err(RuleError::UnknownRequirement(s.to_string())),
        }
    }
}

/// Errors raised while compiling route rules. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("Empty pattern")]
    EmptyPattern,

    #[error("Pattern '{0}' must start with '/'")]
    NotAbsolute(String),

    #[error("Pattern '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("Pattern '{0}' mixes '*' with literal characters in a segment")]
    WildcardInSegment(String),

    #[error("Unknown requirement '{0}' (expected 'public' or 'authenticated')")]
    UnknownRequirement(String),

    #[error("Rule '{0}' is not of the form 'pattern=requirement'")]
    MalformedRule(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Wildcard,
}

/// Compiled path pattern: exact and single-level wildcard segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern string. Fails on anything that is not an
    /// absolute path of non-empty segments.
    pub fn parse(pattern: &str) -> Result<Self, RuleError> {
        if pattern.is_empty() {
            return Err(RuleError::EmptyPattern);
        }
        if !pattern.starts_with('/') {
            return Err(RuleError::NotAbsolute(pattern.to_string()));
        }

        let mut segments = Vec::new();
        if pattern != "/" {
            for segment in pattern[1..].split('/') {
                if segment.is_empty() {
                    return Err(RuleError::EmptySegment(pattern.to_string()));
                }
                if segment == "*" {
                    segments.push(Segment::Wildcard);
                } else if segment.contains('*') {
                    return Err(RuleError::WildcardInSegment(pattern.to_string()));
                } else {
                    segments.push(Segment::Literal(segment.to_string()));
                }
            }
        }

        Ok(PathPattern {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Whether `path` matches this pattern segment-for-segment.
    pub fn matches(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };

        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        if parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(parts.iter())
            .all(|(segment, part)| match segment {
                Segment::Literal(lit) => lit == part,
                Segment::Wildcard => true,
            })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// A path-pattern-to-access-requirement mapping.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub pattern: PathPattern,
    pub requirement: Requirement,
}

/// Ordered rule list with an implicit authenticated catch-all.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RouteRule>,
}

impl RuleSet {
    /// Parse a comma-separated `pattern=requirement` list, e.g.
    /// `/welcome=public,/api/*=authenticated`.
    pub fn parse(spec: &str) -> Result<Self, RuleError> {
        let mut rules = Vec::new();
        for entry in spec.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (pattern, requirement) = entry
                .split_once('=')
                .ok_or_else(|| RuleError::MalformedRule(entry.to_string()))?;
            rules.push(RouteRule {
                pattern: PathPattern::parse(pattern.trim())?,
                requirement: requirement.trim().parse()?,
            });
        }
        Ok(RuleSet { rules })
    }

    /// Append a public rule, e.g. for the login surface itself.
    pub fn push_public(&mut self, pattern: &str) -> Result<(), RuleError> {
        self.rules.push(RouteRule {
            pattern: PathPattern::parse(pattern)?,
            requirement: Requirement::Public,
        });
        Ok(())
    }

    /// Requirement of the first rule matching `path`; authenticated if
    /// none matches.
    pub fn requirement_for(&self, path: &str) -> Requirement {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| rule.requirement)
            .unwrap_or(Requirement::Authenticated)
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let pattern = PathPattern::parse("/welcome").unwrap();
        assert!(pattern.matches("/welcome"));
        assert!(!pattern.matches("/welcome/extra"));
        assert!(!pattern.matches("/other"));
        assert!(!pattern.matches("welcome"));
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/").unwrap();
        assert!(pattern.matches("/"));
        assert!(!pattern.matches("/welcome"));
    }

    #[test]
    fn test_wildcard_matches_single_segment() {
        let pattern = PathPattern::parse("/api/*").unwrap();
        assert!(pattern.matches("/api/status"));
        assert!(pattern.matches("/api/health"));
        assert!(!pattern.matches("/api"));
        assert!(!pattern.matches("/api/v1/status"));
    }

    #[test]
    fn test_wildcard_in_middle() {
        let pattern = PathPattern::parse("/users/*/profile").unwrap();
        assert!(pattern.matches("/users/alice/profile"));
        assert!(!pattern.matches("/users/profile"));
        assert!(!pattern.matches("/users/alice/settings"));
    }

    #[test]
    fn test_malformed_patterns() {
        assert!(matches!(
            PathPattern::parse(""),
            Err(RuleError::EmptyPattern)
        ));
        assert!(matches!(
            PathPattern::parse("welcome"),
            Err(RuleError::NotAbsolute(_))
        ));
        assert!(matches!(
            PathPattern::parse("/foo//bar"),
            Err(RuleError::EmptySegment(_))
        ));
        assert!(matches!(
            PathPattern::parse("/foo/ba*r"),
            Err(RuleError::WildcardInSegment(_))
        ));
    }

    #[test]
    fn test_parse_rule_set() {
        let rules = RuleSet::parse("/welcome=public, /api/*=authenticated").unwrap();
        assert_eq!(rules.rules().len(), 2);
        assert_eq!(rules.requirement_for("/welcome"), Requirement::Public);
        assert_eq!(
            rules.requirement_for("/api/status"),
            Requirement::Authenticated
        );
    }

    #[test]
    fn test_parse_rejects_malformed_entries() {
        assert!(matches!(
            RuleSet::parse("/welcome"),
            Err(RuleError::MalformedRule(_))
        ));
        assert!(matches!(
            RuleSet::parse("/welcome=banana"),
            Err(RuleError::UnknownRequirement(_))
        ));
        assert!(matches!(
            RuleSet::parse("relative=public"),
            Err(RuleError::NotAbsolute(_))
        ));
    }

    #[test]
    fn test_first_match_wins() {
        let rules = RuleSet::parse("/api/*=public,/api/secrets=authenticated").unwrap();
        // Declaration order decides: the wildcard shadows the later rule
        assert_eq!(rules.requirement_for("/api/secrets"), Requirement::Public);

        let rules = RuleSet::parse("/api/secrets=authenticated,/api/*=public").unwrap();
        assert_eq!(
            rules.requirement_for("/api/secrets"),
            Requirement::Authenticated
        );
        assert_eq!(rules.requirement_for("/api/status"), Requirement::Public);
    }

    #[test]
    fn test_default_is_authenticated() {
        let rules = RuleSet::parse("/welcome=public").unwrap();
        assert_eq!(
            rules.requirement_for("/restrictedArea"),
            Requirement::Authenticated
        );
        assert_eq!(rules.requirement_for("/"), Requirement::Authenticated);

        let empty = RuleSet::default();
        assert_eq!(
            empty.requirement_for("/anything"),
            Requirement::Authenticated
        );
    }

    #[test]
    fn test_push_public() {
        let mut rules = RuleSet::parse("/welcome=public").unwrap();
        rules.push_public("/login").unwrap();
        assert_eq!(rules.requirement_for("/login"), Requirement::Public);
        assert!(rules.push_public("no-slash").is_err());
    }

    #[test]
    fn test_empty_entries_ignored() {
        let rules = RuleSet::parse("/welcome=public,,").unwrap();
        assert_eq!(rules.rules().len(), 1);
    }
}
