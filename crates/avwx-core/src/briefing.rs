//! Plain-English briefings for decoded records.
//!
//! Each function renders one record as a short sentence-style summary for
//! pilots and dispatchers. The text is derived only from decoded fields;
//! nothing here reads the raw bulletin.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{
    ChangeType, CloudCoverage, CloudLayer, MetarRecord, TafForecastPeriod, TafRecord,
    UpperWindLevel, UpperWindRecord,
};
use crate::time::DecodedTime;
use crate::units::hpa_to_inches_hg;

const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

const WEATHER_WORDS: [(&str, &str); 13] = [
    ("-RA", "light rain"),
    ("+RA", "heavy rain"),
    ("RA", "rain"),
    ("SHRA", "rain showers"),
    ("-SN", "light snow"),
    ("+SN", "heavy snow"),
    ("SN", "snow"),
    ("PL", "ice pellets"),
    ("TSRA", "thunderstorms with rain"),
    ("BR", "mist"),
    ("FG", "fog"),
    ("HZ", "haze"),
    ("DZ", "drizzle"),
];

/// Upper-wind altitudes quoted in a briefing
const WIND_PICKS: [u32; 5] = [3_000, 6_000, 9_000, 30_000, 34_000];
/// Levels at or above this altitude count as jet level
const JET_LEVEL_FEET: u32 = 30_000;
const JET_SPEED_KNOTS: u16 = 80;

/// At most this many cloud layers are named
const MAX_CLOUD_PARTS: usize = 2;

/// Sixteen-point compass name, or "variable" without a direction
pub fn cardinal(direction: Option<u16>) -> &'static str {
    match direction {
        Some(deg) => {
            let idx = ((f64::from(deg % 360) / 22.5 + 0.5) as usize) % CARDINALS.len();
            CARDINALS[idx]
        }
        None => "variable",
    }
}

/// Words for one present-weather code; unknown codes pass through
pub fn weather_words(code: &str) -> &str {
    WEATHER_WORDS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, words)| *words)
        .unwrap_or(code)
}

/// `12000` -> `12,000`
fn grouped(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn coverage_words(coverage: CloudCoverage) -> &'static str {
    match coverage {
        CloudCoverage::Skc | CloudCoverage::Clr => "clear skies",
        CloudCoverage::Nsc => "no significant cloud",
        CloudCoverage::Few => "few clouds",
        CloudCoverage::Sct => "scattered clouds",
        CloudCoverage::Bkn => "broken clouds",
        CloudCoverage::Ovc => "overcast",
    }
}

fn metar_visibility_words(token: &str) -> String {
    let token = token.trim();
    if let Some(miles) = token.strip_suffix('+') {
        return format!("greater than {miles} miles");
    }
    if let Some(miles) = token.strip_prefix('M') {
        return format!("less than {miles} miles");
    }
    match token {
        "" => "not reported".to_string(),
        "3/4" => "three-quarters of a mile".to_string(),
        "1/2" => "one-half mile".to_string(),
        _ => format!("{token} miles"),
    }
}

fn metar_clouds(layers: &[CloudLayer]) -> Option<String> {
    let parts: Vec<String> = layers
        .iter()
        .map(|layer| {
            let words = coverage_words(layer.coverage);
            match layer.altitude_feet {
                Some(feet) => format!("{words} at {} feet", grouped(feet)),
                None => words.to_string(),
            }
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts[..parts.len().min(MAX_CLOUD_PARTS)].join(", "))
}

/// One-paragraph reading of a METAR.
///
/// Wind comes first (calm when the speed is zero or missing), then
/// visibility with any present weather, the first two cloud layers,
/// temperature and dew point when both are known, altimeter, and the
/// flight category in parentheses.
pub fn metar_text(m: &MetarRecord) -> String {
    let wind = match m.wind_speed_knots {
        None | Some(0) => "Winds calm".to_string(),
        Some(speed) => {
            let heading = if m.wind_variable {
                "variable"
            } else {
                cardinal(m.wind_direction_degrees)
            };
            let mut wind = format!("Winds {heading} at {speed} knots");
            if let Some(gust) = m.wind_gust_knots {
                wind.push_str(&format!(" gusting {gust}"));
            }
            wind
        }
    };

    let mut text = format!("{wind}. Visibility {}", metar_visibility_words(&m.visibility));
    if !m.present_weather.is_empty() {
        let words: Vec<&str> = m.present_weather.iter().map(|wx| weather_words(wx)).collect();
        text.push_str(" with ");
        text.push_str(&words.join(" and "));
    }
    if let Some(clouds) = metar_clouds(&m.cloud_layers) {
        text.push_str(". ");
        text.push_str(&capitalize(&clouds));
    }
    if let (Some(t), Some(d)) = (m.temperature_celsius, m.dewpoint_celsius) {
        text.push_str(&format!(
            ". Temperature {}°C, dew point {}°C",
            t.round() as i64,
            d.round() as i64
        ));
    }
    text.push_str(&format!(", altimeter {:.2} inHg", hpa_to_inches_hg(m.altimeter_hpa)));
    text.push_str(&format!(". ({})", m.flight_category));
    text
}

fn taf_time(t: &DecodedTime) -> String {
    t.time.format("%d/%H%MZ").to_string()
}

fn taf_visibility_words(token: &str) -> String {
    match token.strip_suffix('+') {
        Some(miles) => format!("greater than {miles} SM"),
        None => format!("{token} SM"),
    }
}

fn taf_clouds(layers: &[CloudLayer]) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for layer in layers {
        let part = match layer.coverage {
            CloudCoverage::Skc | CloudCoverage::Clr => "clear skies".to_string(),
            CloudCoverage::Nsc => continue,
            coverage => {
                let word = match coverage {
                    CloudCoverage::Few => "few",
                    CloudCoverage::Sct => "scattered",
                    CloudCoverage::Bkn => "broken",
                    _ => "overcast",
                };
                match layer.altitude_feet {
                    Some(feet) => format!("{word} at {} ft", grouped(feet)),
                    None => word.to_string(),
                }
            }
        };
        if !parts.contains(&part) {
            parts.push(part);
        }
    }
    if parts.iter().any(|p| p == "clear skies") {
        return Some("clear skies".to_string());
    }
    parts.truncate(MAX_CLOUD_PARTS);
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn period_heading(p: &TafForecastPeriod) -> String {
    let (from, to) = (taf_time(&p.valid_from), taf_time(&p.valid_to));
    match p.change_type {
        ChangeType::Prob => format!(
            "{} percent probability {from}-{to}",
            p.probability_percent.unwrap_or_default()
        ),
        ChangeType::Tempo => format!("Temporarily {from}-{to}"),
        ChangeType::Becmg => format!("Becoming {from}-{to}"),
        ChangeType::Fm | ChangeType::Base => format!("From {from}"),
    }
}

fn period_body(p: &TafForecastPeriod) -> String {
    let mut parts = Vec::new();
    match p.wind_speed_knots {
        Some(0) => parts.push("winds calm".to_string()),
        Some(speed) => {
            let heading = if p.wind_variable {
                "variable"
            } else {
                cardinal(p.wind_direction_degrees)
            };
            let mut wind = format!("winds {heading} {speed} kt");
            if let Some(gust) = p.wind_gust_knots {
                wind.push_str(&format!(" gust {gust}"));
            }
            parts.push(wind);
        }
        None => {}
    }
    if !p.visibility.is_empty() {
        parts.push(format!("vis {}", taf_visibility_words(&p.visibility)));
    }
    if let Some(wx) = p.weather_phenomena.as_deref().filter(|wx| !wx.is_empty()) {
        let words: Vec<&str> = wx.split_whitespace().map(weather_words).collect();
        parts.push(words.join(" and "));
    }
    if let Some(clouds) = taf_clouds(&p.cloud_layers) {
        parts.push(clouds);
    }
    if parts.is_empty() {
        "no significant change".to_string()
    } else {
        parts.join(", ")
    }
}

/// Multi-line reading of a TAF: a validity header and one line per
/// forecast period in period order.
pub fn taf_text(t: &TafRecord) -> String {
    let mut lines = vec![format!(
        "{} TAF valid {}-{}:",
        t.station_id,
        taf_time(&t.valid_from),
        taf_time(&t.valid_to)
    )];
    for period in &t.forecast_periods {
        lines.push(format!("{}, {}.", period_heading(period), period_body(period)));
    }
    lines.join("\n")
}

/// Level with a reported speed nearest to `target`; the lower one wins ties
fn nearest_level(levels: &[UpperWindLevel], target: u32) -> Option<&UpperWindLevel> {
    levels
        .iter()
        .filter(|l| l.speed_knots.is_some())
        .min_by_key(|l| (l.altitude_feet.abs_diff(target), l.altitude_feet))
}

/// One-line winds-aloft summary for the first period that has data.
///
/// Quotes the levels nearest 3 000, 6 000, 9 000, 30 000 and 34 000 ft and
/// flags strong jet-level flow when any level at or above 30 000 ft
/// reaches 80 kt. `None` when no period carries a usable level.
pub fn upper_wind_text(record: &UpperWindRecord) -> Option<String> {
    let (period, levels) = record
        .levels()
        .find(|(_, levels)| levels.iter().any(|l| l.speed_knots.is_some()))?;

    let mut picked: Vec<&UpperWindLevel> = Vec::new();
    for target in WIND_PICKS {
        if let Some(level) = nearest_level(levels, target) {
            if !picked.iter().any(|p| p.altitude_feet == level.altitude_feet) {
                picked.push(level);
            }
        }
    }

    let parts: Vec<String> = picked
        .iter()
        .filter_map(|level| {
            let speed = level.speed_knots?;
            let heading = match level.direction_degrees {
                Some(deg) => format!("{deg:03}°"),
                None => "VRB".to_string(),
            };
            let temperature = level
                .temperature_celsius
                .map(|t| format!(", {t}°C"))
                .unwrap_or_default();
            Some(format!(
                "{} ft {heading} at {speed} kt{temperature}",
                grouped(level.altitude_feet)
            ))
        })
        .collect();

    let mut text = format!(
        "{} winds aloft valid {}: {}.",
        record.station_id,
        period.use_period,
        parts.join("; ")
    );
    let jet = levels
        .iter()
        .filter(|l| l.altitude_feet >= JET_LEVEL_FEET)
        .filter_map(|l| l.speed_knots)
        .max();
    if jet.map_or(false, |kt| kt >= JET_SPEED_KNOTS) {
        text.push_str(" Strong jet-level flow.");
    }
    Some(text)
}

/// Upper-wind record for an ICAO identifier. Upper-wind tables key
/// stations by three-letter code, with or without a one-letter prefix, so
/// both the full identifier and its last three letters are tried.
pub fn upper_wind_for<'a>(
    records: &'a BTreeMap<String, UpperWindRecord>,
    icao: &str,
) -> Option<&'a UpperWindRecord> {
    let icao = icao.trim().to_uppercase();
    let short = icao.get(icao.len().saturating_sub(3)..).unwrap_or("");
    records.get(&icao).or_else(|| records.get(short))
}

/// Briefing text for one station
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StationBriefing {
    pub station_id: String,
    pub metar: Option<String>,
    pub taf: Option<String>,
    pub upper_wind: Option<String>,
}

impl StationBriefing {
    pub fn new(
        station_id: &str,
        metar: Option<&MetarRecord>,
        taf: Option<&TafRecord>,
        upper_wind: Option<&UpperWindRecord>,
    ) -> Self {
        Self {
            station_id: station_id.to_string(),
            metar: metar.map(metar_text),
            taf: taf.map(taf_text),
            upper_wind: upper_wind.and_then(upper_wind_text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metar.is_none() && self.taf.is_none() && self.upper_wind.is_none()
    }
}
