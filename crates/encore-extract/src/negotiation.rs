//! `Accept` header negotiation.
//!
//! Each type a resource can produce takes the quality of the most specific
//! media range naming it (exact type, then `type/*`, then `*/*`). Types rated
//! `q=0` are refused; the rest are ordered by quality, then by where their
//! range appears in the header. The outcome is either [`Negotiation::Free`] (no
//! preference stated) or the ordered list of supported types the client
//! accepts.

use encore_core::RequestEnv;
use http::header::ACCEPT;
use mime::Mime;
use std::cmp::Ordering;

/// Outcome of content negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// The client stated no preference; the server default applies.
    Free,
    /// Supported types the client accepts, most preferred first.
    ///
    /// Empty when nothing the resource produces is acceptable.
    Negotiated(Vec<Mime>),
}

impl Negotiation {
    /// Negotiates from the request's `Accept` header.
    #[must_use]
    pub fn from_env(env: &RequestEnv, supported: &[Mime]) -> Self {
        let accept = env
            .headers()
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        Self::from_accept(Some(accept.as_str()), supported)
    }

    /// Negotiates from an `Accept` header value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use encore_extract::Negotiation;
    ///
    /// let supported = [mime::APPLICATION_JSON, mime::TEXT_HTML];
    ///
    /// let html_first = Negotiation::from_accept(
    ///     Some("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
    ///     &supported,
    /// );
    /// assert_eq!(html_first.preferred(), Some(&mime::TEXT_HTML));
    ///
    /// assert_eq!(Negotiation::from_accept(None, &supported), Negotiation::Free);
    /// assert!(!Negotiation::from_accept(Some("image/png"), &supported).is_acceptable());
    /// ```
    #[must_use]
    pub fn from_accept(accept: Option<&str>, supported: &[Mime]) -> Self {
        let Some(accept) = accept.map(str::trim).filter(|a| !a.is_empty()) else {
            return Self::Free;
        };

        let ranges: Vec<(Mime, f32)> = accept
            .split(',')
            .map(str::trim)
            .filter(|range| !range.is_empty())
            .filter_map(parse_range)
            .collect();

        let mut rated: Vec<(f32, usize, &Mime)> = supported
            .iter()
            .filter_map(|candidate| {
                let (position, q) = effective_quality(&ranges, candidate)?;
                Some((q, position, candidate))
            })
            .filter(|(q, _, _)| *q > 0.0)
            .collect();
        rated.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        let mut negotiated: Vec<Mime> = Vec::new();
        for (_, _, candidate) in rated {
            if !negotiated
                .iter()
                .any(|n| n.essence_str() == candidate.essence_str())
            {
                negotiated.push(candidate.clone());
            }
        }
        Self::Negotiated(negotiated)
    }

    /// Returns the type a handler should produce first, if any.
    #[must_use]
    pub fn preferred(&self) -> Option<&Mime> {
        match self {
            Self::Free => None,
            Self::Negotiated(types) => types.first(),
        }
    }

    /// Returns false when the client accepts nothing the resource produces.
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        match self {
            Self::Free => true,
            Self::Negotiated(types) => !types.is_empty(),
        }
    }
}

fn parse_range(range: &str) -> Option<(Mime, f32)> {
    let mime: Mime = range.parse().ok()?;
    let q = match mime.get_param("q") {
        Some(value) => value.as_str().parse::<f32>().ok()?,
        None => 1.0,
    };
    if !(0.0..=1.0).contains(&q) {
        return None;
    }
    Some((mime, q))
}

/// How specifically `range` names `candidate`: exact, `type/*`, `*/*`.
fn specificity(range: &Mime, candidate: &Mime) -> Option<u8> {
    if range.type_() == mime::STAR {
        return Some(0);
    }
    if range.type_() != candidate.type_() {
        return None;
    }
    if range.subtype() == mime::STAR {
        Some(1)
    } else if range.subtype() == candidate.subtype() {
        Some(2)
    } else {
        None
    }
}

/// The quality of the most specific range naming `candidate`, with that
/// range's position in the header. Among equally specific ranges the first wins.
fn effective_quality(ranges: &[(Mime, f32)], candidate: &Mime) -> Option<(usize, f32)> {
    let mut best: Option<(u8, usize, f32)> = None;
    for (position, (range, q)) in ranges.iter().enumerate() {
        let Some(rank) = specificity(range, candidate) else {
            continue;
        };
        if !matches!(best, Some((best_rank, _, _)) if best_rank >= rank) {
            best = Some((rank, position, *q));
        }
    }
    best.map(|(_, position, q)| (position, q))
}
