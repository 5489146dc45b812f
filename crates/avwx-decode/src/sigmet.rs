//! SIGMET decoding
//!
//! A text block holds any number of advisories terminated by `=`. Every
//! field of an advisory is optional and extracted on its own.

use avwx_core::{GeoPoint, ObservationKind, Phenomenon, SigmetChange, SigmetRecord};
use regex::Captures;

use crate::rules::{self, field_rule};

field_rule!(WMO_HEADING, "wmo_heading", r"\b(W[SCV][A-Z]{2}\d{2})\b");
field_rule!(FIR_SEQUENCE, "fir_sequence", r"\b([A-Z]{4})\s+SIGMET\s+([A-Z0-9]{1,4})\b");
field_rule!(SEQUENCE, "sequence", r"\bSIGMET\s+([A-Z0-9]{1,4})\b");
field_rule!(FIR_NAME, "fir_name", r"\b([A-Z]{4})\s+(?:[A-Z]+\s+)?FIR\b");
field_rule!(VALIDITY, "validity", r"\bVALID\s+(\d{6})/(\d{6})\b");
field_rule!(
    PHENOMENON,
    "phenomenon",
    r"\b(?:SEV\s+TURB|SEV\s+ICE\s+\(FZRA\)|SEV\s+ICE|SEV\s+MTW|(OBSC|EMBD|FRQ|SQL)\s+(TSGR|TS)|VA\s+ERUPTION(?:\s+MT\s+([A-Z][A-Z\-]*))?|VA\s+CLD|TC\s+([A-Z][A-Z\-]*)|RDOACT\s+CLD)"
);
field_rule!(OBSERVATION, "observation", r"\b(OBS|FCST)(?:\s+AT\s+(\d{4})Z)?\b");
field_rule!(
    LEVELS,
    "levels",
    r"\b(SFC/FL\d{3}|FL\d{3}/FL\d{3}|FL\d{3}/\d{3}|TOP\s+(?:ABV\s+)?FL\d{3})\b"
);
field_rule!(MOVEMENT, "movement", r"\b(MOV\s+[A-Z]{1,3}\s*\d{2,3}KT|STNR)\b");
field_rule!(CHANGE, "change", r"\b(NC|WKN|INTSF|DISS)\b");
field_rule!(AREA_START, "area_start", r"\bWI\b");
field_rule!(
    AREA_END,
    "area_end",
    r"\b(?:SFC/FL\d{3}|FL\d{3}/(?:FL)?\d{3}|TOP\s|MOV\b|STNR\b|NC\b|WKN\b|INTSF\b|DISS\b|RMK\b)"
);
field_rule!(
    COORDINATE,
    "coordinate",
    r"^([NS])(\d{2})(\d{2})([EW])(\d{3})(\d{2})$"
);

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn phenomenon(caps: &Captures<'_>) -> Option<Phenomenon> {
    if let (Some(qualifier), Some(ts)) = (caps.get(1), caps.get(2)) {
        return Some(Phenomenon::Thunderstorm(format!("{} {}", qualifier.as_str(), ts.as_str())));
    }
    if let Some(name) = caps.get(4) {
        return Some(Phenomenon::TropicalCyclone {
            name: name.as_str().to_string(),
        });
    }
    let whole = squash(caps.get(0)?.as_str());
    let found = match whole.as_str() {
        "SEV TURB" => Phenomenon::SevereTurbulence,
        "SEV ICE (FZRA)" => Phenomenon::SevereIcingFreezingRain,
        "SEV ICE" => Phenomenon::SevereIcing,
        "SEV MTW" => Phenomenon::SevereMountainWave,
        "VA CLD" => Phenomenon::VolcanicAshCloud,
        "RDOACT CLD" => Phenomenon::RadioactiveCloud,
        _ if whole.starts_with("VA ERUPTION") => Phenomenon::VolcanicAshEruption {
            mountain: caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
        },
        _ => return None,
    };
    Some(found)
}

/// Text between `WI` and the first level, movement or change keyword
fn area_description(advisory: &str) -> Option<String> {
    let start = AREA_START.regex().find(advisory)?.end();
    let rest = &advisory[start..];
    let end = AREA_END.regex().find(rest).map_or(rest.len(), |m| m.start());
    let area = rest[..end].trim().trim_end_matches(&['-', ' '][..]).trim();
    (!area.is_empty()).then(|| squash(area))
}

/// Decimal-degree points of a dash-separated coordinate chain
pub fn area_polygon(area: &str) -> Vec<GeoPoint> {
    area.replace('\u{2013}', "-")
        .split('-')
        .filter_map(|token| {
            let compact: String = token
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '/')
                .collect();
            coordinate(&compact)
        })
        .collect()
}

fn coordinate(token: &str) -> Option<GeoPoint> {
    let caps = COORDINATE.captures(token)?;
    let lat_deg: f64 = rules::num(&caps, 2)?;
    let lat_min: f64 = rules::num(&caps, 3)?;
    let lon_deg: f64 = rules::num(&caps, 5)?;
    let lon_min: f64 = rules::num(&caps, 6)?;
    let mut latitude = lat_deg + lat_min / 60.0;
    let mut longitude = lon_deg + lon_min / 60.0;
    if caps.get(1)?.as_str() == "S" {
        latitude = -latitude;
    }
    if caps.get(4)?.as_str() == "W" {
        longitude = -longitude;
    }
    Some(GeoPoint {
        latitude,
        longitude,
    })
}

/// Decode one advisory (no `=` terminator)
pub fn decode_advisory(advisory: &str) -> SigmetRecord {
    let advisory = advisory.trim();
    let fir_sequence = FIR_SEQUENCE.captures(advisory);
    let sequence = fir_sequence
        .as_ref()
        .and_then(|c| rules::text(c, 2))
        .or_else(|| SEQUENCE.captures(advisory).and_then(|c| rules::text(&c, 1)));
    let fir = fir_sequence
        .as_ref()
        .and_then(|c| rules::text(c, 1))
        .or_else(|| FIR_NAME.captures(advisory).and_then(|c| rules::text(&c, 1)));
    let identifier = WMO_HEADING
        .captures(advisory)
        .and_then(|c| rules::text(&c, 1))
        .or_else(|| sequence.as_ref().map(|s| format!("SIGMET {s}")));
    let validity = VALIDITY.captures(advisory);
    let observation = OBSERVATION.captures(advisory);
    let area_description = area_description(advisory);

    SigmetRecord {
        identifier,
        fir,
        sequence,
        phenomenon: PHENOMENON.captures(advisory).and_then(|c| phenomenon(&c)),
        observation_type: observation.as_ref().and_then(|c| match c.get(1)?.as_str() {
            "OBS" => Some(ObservationKind::Obs),
            _ => Some(ObservationKind::Fcst),
        }),
        observation_time: observation.as_ref().and_then(|c| rules::text(c, 2)),
        valid_from: validity.as_ref().and_then(|c| rules::text(c, 1)),
        valid_to: validity.as_ref().and_then(|c| rules::text(c, 2)),
        levels: LEVELS.captures(advisory).and_then(|c| rules::text(&c, 1)).map(|l| squash(&l)),
        movement: MOVEMENT.captures(advisory).and_then(|c| rules::text(&c, 1)).map(|m| squash(&m)),
        change: CHANGE
            .captures(advisory)
            .and_then(|c| SigmetChange::from_code(c.get(1)?.as_str())),
        area_polygon: area_description.as_deref().map(area_polygon).unwrap_or_default(),
        area_description,
        raw_text: advisory.to_string(),
    }
}

/// Split a block on `=` and decode every non-empty advisory
pub fn decode_block(raw_text: &str) -> Vec<SigmetRecord> {
    raw_text
        .split('=')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(decode_advisory)
        .collect()
}
