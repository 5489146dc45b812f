//! Named field rules.
//!
//! Each bulletin field is one compiled pattern with a stable name, plus a
//! table of decode steps that apply a rule's captures to a draft record.
//! Adding a new bulletin quirk means adding a rule and a step; unrelated
//! fields are untouched.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub struct FieldRule {
    pub name: &'static str,
    pub(crate) regex: Lazy<Regex>,
}

/// Declare a `FieldRule` static compiled on first use
macro_rules! field_rule {
    ($(#[$meta:meta])* $vis:vis $ident:ident, $name:literal, $pattern:literal) => {
        $(#[$meta])*
        $vis static $ident: $crate::rules::FieldRule = $crate::rules::FieldRule {
            name: $name,
            regex: ::once_cell::sync::Lazy::new(|| {
                ::regex::Regex::new($pattern).expect(concat!("field rule ", $name))
            }),
        };
    };
}
pub(crate) use field_rule;

impl FieldRule {
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(text)
    }

    pub fn captures_iter<'r, 't>(&'r self, text: &'t str) -> regex::CaptureMatches<'r, 't> {
        self.regex.captures_iter(text)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl std::fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule")
            .field("name", &self.name)
            .field("pattern", &self.regex.as_str())
            .finish()
    }
}

/// One row of a decode table
pub struct FieldStep<D> {
    pub rule: &'static FieldRule,
    /// Apply to every match instead of the first only
    pub repeat: bool,
    pub apply: fn(&mut D, &Captures<'_>),
}

impl<D> FieldStep<D> {
    pub const fn once(rule: &'static FieldRule, apply: fn(&mut D, &Captures<'_>)) -> Self {
        Self {
            rule,
            repeat: false,
            apply,
        }
    }

    pub const fn each(rule: &'static FieldRule, apply: fn(&mut D, &Captures<'_>)) -> Self {
        Self {
            rule,
            repeat: true,
            apply,
        }
    }
}

/// Byte ranges of `text` consumed by rule matches
#[derive(Debug, Default)]
pub struct Coverage {
    spans: Vec<Range<usize>>,
}

impl Coverage {
    pub fn mark(&mut self, span: Range<usize>) {
        self.spans.push(span);
    }

    fn covers(&self, token: &Range<usize>) -> bool {
        self.spans
            .iter()
            .any(|s| s.start < token.end && token.start < s.end)
    }

    /// Whitespace-separated tokens of `text` that no rule touched
    pub fn remainder(&self, text: &str) -> Option<String> {
        let rest: Vec<&str> = tokens(text)
            .filter(|(range, _)| !self.covers(range))
            .map(|(_, tok)| tok)
            .collect();
        if rest.is_empty() {
            None
        } else {
            Some(rest.join(" "))
        }
    }
}

/// Tokens with their byte ranges in `text`
pub fn tokens(text: &str) -> impl Iterator<Item = (Range<usize>, &str)> {
    let base = text.as_ptr() as usize;
    text.split_whitespace().map(move |tok| {
        let start = tok.as_ptr() as usize - base;
        (start..start + tok.len(), tok)
    })
}

/// Run a decode table over `text`, recording matched spans
pub fn apply_steps<D>(text: &str, steps: &[FieldStep<D>], draft: &mut D) -> Coverage {
    let mut coverage = Coverage::default();
    for step in steps {
        if step.repeat {
            for caps in step.rule.captures_iter(text) {
                (step.apply)(draft, &caps);
                coverage.mark(match_span(&caps));
            }
        } else if let Some(caps) = step.rule.captures(text) {
            (step.apply)(draft, &caps);
            coverage.mark(match_span(&caps));
        }
    }
    coverage
}

fn match_span(caps: &Captures<'_>) -> Range<usize> {
    caps.get(0).map(|m| m.range()).unwrap_or(0..0)
}

/// Capture group `i` parsed as a number
pub fn num<T: std::str::FromStr>(caps: &Captures<'_>, i: usize) -> Option<T> {
    caps.get(i).and_then(|m| m.as_str().parse().ok())
}

pub fn text(caps: &Captures<'_>, i: usize) -> Option<String> {
    caps.get(i).map(|m| m.as_str().to_string())
}

/// `M12` -> -12, `05` -> 5
pub fn signed_m(token: &str) -> Option<i32> {
    match token.strip_prefix('M') {
        Some(rest) => rest.parse::<i32>().ok().map(|v| -v),
        None => token.parse().ok(),
    }
}

field_rule!(
    /// `(VRB|ddd)ff(Ggg)KT` at token start
    pub WIND, "wind", r"(?:^|\s)(VRB|\d{3})(\d{2,3})(?:G(\d{2,3}))?KT\b"
);
field_rule!(
    pub CLOUD, "cloud", r"\b(SKC|CLR|NSC|FEW|SCT|BKN|OVC)(\d{3})?(CB|TCU)?\b"
);
field_rule!(pub VERTICAL_VISIBILITY, "vertical_visibility", r"\bVV(\d{3})\b");
field_rule!(
    /// Intensity or proximity, descriptor, then one or more phenomena
    pub WEATHER,
    "weather",
    r"(?:^|\s)((?:[-+]|VC)?(?:(?:MI|PR|BC|DR|BL|SH|TS|FZ)(?:DZ|RA|SN|SG|IC|PL|GR|GS|UP|BR|FG|FU|VA|DU|SA|HZ|PY|PO|SQ|FC|SS|DS)*|(?:DZ|RA|SN|SG|IC|PL|GR|GS|UP|BR|FG|FU|VA|DU|SA|HZ|PY|PO|SQ|FC|SS|DS)+))\b"
);
field_rule!(
    /// Remarks marker; everything after it is free text
    pub REMARKS, "remarks", r"(?:^|\s)RMK(?:\s|$)"
);

/// Cloud layer from a `CLOUD` match
pub fn cloud_layer(caps: &Captures<'_>) -> Option<avwx_core::CloudLayer> {
    let coverage = avwx_core::CloudCoverage::from_code(caps.get(1)?.as_str())?;
    Some(avwx_core::CloudLayer {
        coverage,
        altitude_feet: num::<u32>(caps, 2).map(|h| h * 100),
        cloud_type: caps
            .get(3)
            .and_then(|m| avwx_core::CloudType::from_code(m.as_str())),
    })
}

/// Wind group fields: (direction, speed, gust, variable)
pub fn wind(caps: &Captures<'_>) -> (Option<u16>, Option<u16>, Option<u16>, bool) {
    let variable = caps.get(1).map_or(false, |m| m.as_str() == "VRB");
    let direction = if variable { None } else { num(caps, 1) };
    (direction, num(caps, 2), num(caps, 3), variable)
}

/// Split text at the first `RMK` into (body, remarks)
pub fn split_remarks(text: &str) -> (&str, Option<String>) {
    match REMARKS.regex().find(text) {
        Some(m) => {
            let remarks = text[m.end()..].trim();
            let remarks = (!remarks.is_empty()).then(|| remarks.to_string());
            (&text[..m.start()], remarks)
        }
        None => (text, None),
    }
}
