//! Media-type negotiation.
//!
//! Parses RFC 7231-style weighted preference headers and selects the best
//! match from a server-supplied priority list.
//!
//! # Examples
//!
//! ```
//! use ligature_core::negotiation::Negotiator;
//!
//! let negotiator = Negotiator::new();
//! let priorities = vec![
//!     "application/json".to_string(),
//!     "application/xml".to_string(),
//! ];
//! let best = negotiator.negotiate(&priorities, Some("application/xml;q=0.9, text/html;q=0.5"));
//! assert_eq!(best.as_deref(), Some("application/xml"));
//! ```

use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Media Types
// ============================================================================

/// A media type, possibly containing wildcards (`*/*`, `type/*`).
///
/// Parameters other than the quality value are ignored: negotiation in this
/// layer operates on the type/subtype pair only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// The type (e.g., "application", "text")
    pub type_: String,
    /// The subtype (e.g., "json", "xml")
    pub subtype: String,
}

impl MediaType {
    /// Create a new media type.
    pub fn new(type_: impl Into<String>, subtype: impl Into<String>) -> Self {
        Self {
            type_: type_.into(),
            subtype: subtype.into(),
        }
    }

    /// Create `*/*` wildcard media type.
    pub fn any() -> Self {
        Self::new("*", "*")
    }

    /// Parse a media type from a string, dropping any parameters.
    pub fn parse(s: &str) -> Option<Self> {
        let type_subtype = s.trim().split(';').next()?.trim();
        let mut parts = type_subtype.splitn(2, '/');

        let type_ = parts.next()?.trim().to_lowercase();
        let subtype = parts.next()?.trim().to_lowercase();
        if type_.is_empty() || subtype.is_empty() {
            return None;
        }

        Some(Self { type_, subtype })
    }

    /// Check if this media type matches another (considering wildcards).
    pub fn matches(&self, other: &MediaType) -> bool {
        let type_matches = self.type_ == "*" || other.type_ == "*" || self.type_ == other.type_;
        let subtype_matches =
            self.subtype == "*" || other.subtype == "*" || self.subtype == other.subtype;
        type_matches && subtype_matches
    }

    /// Specificity score: exact pairs rank above `type/*`, which ranks above `*/*`.
    pub fn specificity(&self) -> u8 {
        let mut score = 0u8;
        if self.type_ != "*" {
            score += 2;
        }
        if self.subtype != "*" {
            score += 1;
        }
        score
    }

    /// Get the full MIME type string.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mime_type())
    }
}

// ============================================================================
// Accept Header
// ============================================================================

/// A parsed weighted-preference header (`Accept` or `Content-Type` style).
#[derive(Debug, Clone, Default)]
pub struct Accept {
    /// Media types with their quality values, in header order.
    pub media_types: Vec<(MediaType, f32)>,
}

impl Accept {
    /// Parse a weighted-preference header string.
    ///
    /// Entries are comma-separated, each optionally suffixed `;q=<float>`
    /// (default 1.0, clamped to 0.0..=1.0). Malformed entries are skipped.
    pub fn parse(header: &str) -> Self {
        let media_types = header
            .split(',')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }
                let (media_part, quality) = Self::extract_quality(part);
                MediaType::parse(media_part).map(|mt| (mt, quality))
            })
            .collect();

        Self { media_types }
    }

    /// Extract the quality value from a media type entry.
    fn extract_quality(s: &str) -> (&str, f32) {
        // ASCII lowercasing preserves byte offsets; full Unicode lowercasing
        // does not, and the index is used to slice the original string.
        if let Some(q_pos) = s.to_ascii_lowercase().find(";q=") {
            let media_part = &s[..q_pos];
            let q_part = &s[q_pos + 3..];

            let quality = q_part
                .split(';')
                .next()
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);

            (media_part, quality)
        } else {
            (s, 1.0)
        }
    }

    /// Best accepted entry matching `candidate`, as (specificity, quality).
    ///
    /// Entries with a quality of zero are excluded entirely.
    fn best_match(&self, candidate: &MediaType) -> Option<(u8, f32)> {
        let mut best: Option<(u8, f32)> = None;
        for (mt, quality) in &self.media_types {
            if *quality <= 0.0 || !mt.matches(candidate) {
                continue;
            }
            let specificity = mt.specificity();
            match best {
                None => best = Some((specificity, *quality)),
                Some((bs, bq)) => {
                    if specificity > bs || (specificity == bs && *quality > bq) {
                        best = Some((specificity, *quality));
                    }
                }
            }
        }
        best
    }
}

// ============================================================================
// Negotiator
// ============================================================================

/// Quality-weighted content negotiator.
///
/// Side-effect free; a single instance is safe to share across the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct Negotiator;

impl Negotiator {
    pub fn new() -> Self {
        Self
    }

    /// Negotiate the best value from `priorities` against a raw header.
    ///
    /// Fails closed (returns `None`) when `priorities` is empty, the header
    /// is absent, or the header trims to empty. Otherwise selects the single
    /// best match: an exactly-matched priority beats a wildcard-matched one,
    /// among equal specificity the higher declared weight wins, and remaining
    /// ties are broken by priorities-list order.
    pub fn negotiate(&self, priorities: &[String], header_value: Option<&str>) -> Option<String> {
        let header = header_value?;
        if priorities.is_empty() || header.trim().is_empty() {
            return None;
        }

        let accept = Accept::parse(header);
        let mut best: Option<(usize, u8, f32)> = None;
        for (index, candidate) in priorities.iter().enumerate() {
            let Some(media_type) = MediaType::parse(candidate) else {
                continue;
            };
            let Some((specificity, quality)) = accept.best_match(&media_type) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, bs, bq)) => match specificity.cmp(&bs) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => quality > bq,
                },
            };
            if better {
                best = Some((index, specificity, quality));
            }
        }

        best.map(|(index, _, _)| priorities[index].clone())
    }
}

// ============================================================================
// Negotiation Result
// ============================================================================

/// Result of a negotiation: a logical type key paired with the concrete
/// media-type value that was matched, e.g. `("json", "application/json")`.
///
/// Immutable value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationResult {
    name: String,
    value: String,
}

impl NegotiationResult {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Short name of the negotiated value (json, xml, ...)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concrete value matched in the request (application/json, text/xml, ...)
    pub fn value(&self) -> &str {
        &self.value
    }
}
