//! TAF decoding
//!
//! A bulletin is read in two passes. The header gives the station, issue
//! time and overall validity window. The body is then cut into change-group
//! segments at `FMddhhmm`, `TEMPO`, `BECMG` and `PROBnn` tokens, and each
//! segment is decoded on its own into a forecast period. Periods are sorted
//! by start time once all of them are decoded.

use std::ops::Range;

use avwx_core::{
    classify, day_time, day_time_after, inches_hg_to_hpa, parse_timestamp, sky_coverage,
    visibility_statute_miles, ChangeType, CloudLayer, DecodedTime, HazardKind, IcingTurbulence,
    StationInfo, TafForecastPeriod, TafRecord, TemperatureForecast, TemperatureKind,
};
use chrono::{DateTime, Utc};
use regex::Captures;

use crate::context::DecodeContext;
use crate::metar::{visibility_token, VISIBILITY_SM};
use crate::rules::{
    self, apply_steps, field_rule, num, signed_m, split_remarks, tokens, FieldStep, CLOUD,
    VERTICAL_VISIBILITY, WEATHER, WIND,
};

field_rule!(
    HEADER,
    "taf_header",
    r"(?:^|\s)(?:TAF\s+)?(?:(?:AMD|COR)\s+)?([A-Z][A-Z0-9]{3})\s+(\d{2})(\d{2})(\d{2})Z\b"
);
field_rule!(STATION_ONLY, "taf_station", r"\bTAF\s+(?:(?:AMD|COR)\s+)?([A-Z][A-Z0-9]{3})\b");
field_rule!(LEADING_TAF, "taf_keyword", r"^\s*TAF(?:\s+(?:AMD|COR))?\b");
field_rule!(AMENDMENT, "amendment", r"\bTAF\s+(AMD|COR)\b");
field_rule!(VALIDITY, "validity", r"\b(\d{2})(\d{2})/(\d{2})(\d{2})\b");
field_rule!(MARKER_TOKEN, "change_marker", r"^(?:FM\d{6}|TEMPO|BECMG|PROB\d{2})$");
field_rule!(PROB_TOKEN, "probability_marker", r"^PROB\d{2}$");
field_rule!(
    CHANGE_GROUP,
    "change_group",
    r"^(?:FM(\d{2})(\d{2})(\d{2})|PROB(\d{2})(?:\s+(TEMPO|BECMG))?|(TEMPO|BECMG))\b"
);
field_rule!(WIND_SHEAR, "wind_shear", r"\bWS(\d{3})/(\d{3})(\d{2,3})KT\b");
field_rule!(ALTIMETER, "altimeter", r"\bQNH(\d{4})INS\b");
field_rule!(ICING, "icing", r"(?:^|\s)6(\d)(\d{3})(\d)\b");
field_rule!(TURBULENCE, "turbulence", r"(?:^|\s)5(\d)(\d{3})(\d)\b");
field_rule!(TEMPERATURE, "temperature_forecast", r"\b(TX|TN)(M?\d{2})/(\d{2})(\d{2})Z\b");
field_rule!(NO_SIGNIFICANT_WEATHER, "nsw", r"\bNSW\b");
field_rule!(CAVOK, "cavok", r"\bCAVOK\b");

/// Raw day/hour groups are resolved against the TAF window after the
/// table has run.
#[derive(Debug)]
struct PeriodDraft {
    change_type: ChangeType,
    probability: Option<u8>,
    from_group: Option<(u32, u32, u32)>,
    window_group: Option<(u32, u32, u32, u32)>,
    wind_direction: Option<u16>,
    wind_speed: Option<u16>,
    wind_gust: Option<u16>,
    wind_variable: bool,
    shear_height: Option<u32>,
    shear_direction: Option<u16>,
    shear_speed: Option<u16>,
    visibility: String,
    vertical_visibility: Option<u32>,
    weather: Option<String>,
    altimeter_hpa: Option<f64>,
    cloud_layers: Vec<CloudLayer>,
    hazards: Vec<IcingTurbulence>,
    temperatures: Vec<(TemperatureKind, i32, u32, u32)>,
}

impl Default for PeriodDraft {
    fn default() -> Self {
        Self {
            change_type: ChangeType::Base,
            probability: None,
            from_group: None,
            window_group: None,
            wind_direction: None,
            wind_speed: None,
            wind_gust: None,
            wind_variable: false,
            shear_height: None,
            shear_direction: None,
            shear_speed: None,
            visibility: "6+".to_string(),
            vertical_visibility: None,
            weather: None,
            altimeter_hpa: None,
            cloud_layers: Vec::new(),
            hazards: Vec::new(),
            temperatures: Vec::new(),
        }
    }
}

static PERIOD_STEPS: &[FieldStep<PeriodDraft>] = &[
    FieldStep::once(&CHANGE_GROUP, apply_change_group),
    FieldStep::once(&VALIDITY, apply_window),
    FieldStep::once(&WIND, apply_wind),
    FieldStep::once(&WIND_SHEAR, apply_wind_shear),
    FieldStep::once(&CAVOK, |_, _| {}),
    FieldStep::once(&VISIBILITY_SM, apply_visibility),
    FieldStep::once(&VERTICAL_VISIBILITY, apply_vertical_visibility),
    // first code only
    FieldStep::once(&WEATHER, apply_weather),
    FieldStep::once(&NO_SIGNIFICANT_WEATHER, |_, _| {}),
    FieldStep::once(&ALTIMETER, apply_altimeter),
    FieldStep::each(&CLOUD, apply_cloud),
    FieldStep::each(&ICING, apply_icing),
    FieldStep::each(&TURBULENCE, apply_turbulence),
    FieldStep::each(&TEMPERATURE, apply_temperature),
];

fn apply_change_group(d: &mut PeriodDraft, caps: &Captures<'_>) {
    if caps.get(1).is_some() {
        d.change_type = ChangeType::Fm;
        d.from_group = num(caps, 1).zip(num(caps, 2)).zip(num(caps, 3)).map(|((a, b), c)| (a, b, c));
    } else if caps.get(4).is_some() {
        d.change_type = ChangeType::Prob;
        d.probability = num(caps, 4);
    } else {
        d.change_type = match caps.get(6).map(|m| m.as_str()) {
            Some("BECMG") => ChangeType::Becmg,
            _ => ChangeType::Tempo,
        };
    }
}

fn apply_window(d: &mut PeriodDraft, caps: &Captures<'_>) {
    if let (Some(a), Some(b), Some(c), Some(e)) = (num(caps, 1), num(caps, 2), num(caps, 3), num(caps, 4)) {
        d.window_group = Some((a, b, c, e));
    }
}

fn apply_wind(d: &mut PeriodDraft, caps: &Captures<'_>) {
    (d.wind_direction, d.wind_speed, d.wind_gust, d.wind_variable) = rules::wind(caps);
}

fn apply_wind_shear(d: &mut PeriodDraft, caps: &Captures<'_>) {
    d.shear_height = num::<u32>(caps, 1).map(|h| h * 100);
    d.shear_direction = num(caps, 2);
    d.shear_speed = num(caps, 3);
}

fn apply_visibility(d: &mut PeriodDraft, caps: &Captures<'_>) {
    if let Some(token) = visibility_token(caps) {
        d.visibility = token;
    }
}

fn apply_vertical_visibility(d: &mut PeriodDraft, caps: &Captures<'_>) {
    d.vertical_visibility = num::<u32>(caps, 1).map(|h| h * 100);
}

fn apply_weather(d: &mut PeriodDraft, caps: &Captures<'_>) {
    d.weather = rules::text(caps, 1);
}

fn apply_altimeter(d: &mut PeriodDraft, caps: &Captures<'_>) {
    d.altimeter_hpa = num::<f64>(caps, 1).map(|hundredths| inches_hg_to_hpa(hundredths / 100.0));
}

fn apply_cloud(d: &mut PeriodDraft, caps: &Captures<'_>) {
    d.cloud_layers.extend(rules::cloud_layer(caps));
}

fn hazard(kind: HazardKind, caps: &Captures<'_>) -> Option<IcingTurbulence> {
    let base_feet = num::<u32>(caps, 2)? * 100;
    let thickness = num::<u32>(caps, 3)? * 1000;
    Some(IcingTurbulence {
        kind,
        intensity: num(caps, 1)?,
        base_feet,
        top_feet: base_feet + thickness,
    })
}

fn apply_icing(d: &mut PeriodDraft, caps: &Captures<'_>) {
    d.hazards.extend(hazard(HazardKind::Icing, caps));
}

fn apply_turbulence(d: &mut PeriodDraft, caps: &Captures<'_>) {
    d.hazards.extend(hazard(HazardKind::Turbulence, caps));
}

fn apply_temperature(d: &mut PeriodDraft, caps: &Captures<'_>) {
    let kind = match caps.get(1).map(|m| m.as_str()) {
        Some("TX") => TemperatureKind::Max,
        _ => TemperatureKind::Min,
    };
    let value = caps.get(2).and_then(|m| signed_m(m.as_str()));
    if let (Some(value), Some(day), Some(hour)) = (value, num(caps, 3), num(caps, 4)) {
        d.temperatures.push((kind, value, day, hour));
    }
}

/// Overall window used to anchor period times
#[derive(Debug, Clone, Copy)]
struct Window {
    from: DecodedTime,
    to: DecodedTime,
}

fn overlaps(spans: &[Range<usize>], token: &Range<usize>) -> bool {
    spans.iter().any(|s| s.start < token.end && token.start < s.end)
}

/// Cut the body into change-group segments. The first entry is the base
/// forecast with header tokens removed; it may be empty.
///
/// `TEMPO` or `BECMG` directly after `PROBnn` does not open a new segment,
/// so `PROB30 TEMPO ...` decodes as one PROB period carrying the
/// probability.
fn segments(body: &str, header: &[Range<usize>]) -> Vec<String> {
    let mut segments: Vec<Vec<&str>> = vec![Vec::new()];
    let mut after_prob = false;
    for (range, tok) in tokens(body) {
        if overlaps(header, &range) {
            continue;
        }
        let qualifies_prob = after_prob && (tok == "TEMPO" || tok == "BECMG");
        if MARKER_TOKEN.is_match(tok) && !qualifies_prob {
            segments.push(Vec::new());
        }
        after_prob = PROB_TOKEN.is_match(tok);
        if let Some(current) = segments.last_mut() {
            current.push(tok);
        }
    }
    segments.into_iter().map(|s| s.join(" ")).collect()
}

/// Byte ranges of header tokens that must not reach the base period
fn header_spans(body: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    for rule in [&LEADING_TAF, &HEADER, &STATION_ONLY] {
        if let Some(m) = rule.regex().find(body) {
            spans.push(m.range());
        }
    }
    let first_marker = tokens(body)
        .find(|(_, tok)| MARKER_TOKEN.is_match(tok))
        .map(|(range, _)| range.start)
        .unwrap_or(body.len());
    if let Some(m) = VALIDITY.regex().find(body) {
        if m.start() < first_marker {
            spans.push(m.range());
        }
    }
    spans
}

fn anchored(anchor: DateTime<Utc>, day: u32, hour: u32, minute: u32, now: DateTime<Utc>) -> DecodedTime {
    DecodedTime::or_fallback(day_time_after(anchor, day, hour, minute), now)
}

fn decode_period(ctx: &DecodeContext, text: &str, window: Window) -> TafForecastPeriod {
    let mut draft = PeriodDraft::default();
    let coverage = apply_steps(text, PERIOD_STEPS, &mut draft);
    let anchor = window.from.time;

    let (valid_from, valid_to) = match (draft.from_group, draft.window_group) {
        (Some((day, hour, minute)), _) => (anchored(anchor, day, hour, minute, ctx.now), window.to),
        (None, Some((d1, h1, d2, h2))) if draft.change_type != ChangeType::Base => {
            let from = anchored(anchor, d1, h1, 0, ctx.now);
            (from, anchored(from.time, d2, h2, 0, ctx.now))
        }
        _ => (window.from, window.to),
    };

    let temperature_forecasts = draft
        .temperatures
        .iter()
        .map(|&(kind, temperature_celsius, day, hour)| TemperatureForecast {
            kind,
            temperature_celsius,
            valid_time: day_time_after(anchor, day, hour, 0).map(DecodedTime::exact),
        })
        .collect();

    let flight_category = classify(
        visibility_statute_miles(&draft.visibility),
        &draft.cloud_layers,
        draft.vertical_visibility,
    );

    TafForecastPeriod {
        valid_from_timestamp: valid_from.timestamp(),
        valid_to_timestamp: valid_to.timestamp(),
        valid_from,
        valid_to,
        becomes_time: (draft.change_type == ChangeType::Becmg).then_some(valid_to),
        change_type: draft.change_type,
        probability_percent: draft.probability,
        wind_direction_degrees: draft.wind_direction,
        wind_speed_knots: draft.wind_speed,
        wind_gust_knots: draft.wind_gust,
        wind_variable: draft.wind_variable,
        wind_shear_height_feet: draft.shear_height,
        wind_shear_direction_degrees: draft.shear_direction,
        wind_shear_speed_knots: draft.shear_speed,
        visibility: draft.visibility,
        vertical_visibility_feet: draft.vertical_visibility,
        weather_phenomena: draft.weather,
        altimeter_hpa: draft.altimeter_hpa,
        sky_coverage: sky_coverage(&draft.cloud_layers),
        cloud_layers: draft.cloud_layers,
        icing_turbulence: draft.hazards,
        temperature_forecasts,
        flight_category,
        raw_text: text.to_string(),
        undecoded_remainder: coverage.remainder(text),
    }
}

fn overall_window(ctx: &DecodeContext, body: &str) -> Window {
    let groups = VALIDITY.captures(body).and_then(|caps| {
        Some((num(&caps, 1)?, num(&caps, 2)?, num(&caps, 3)?, num(&caps, 4)?))
    });
    let from = groups.and_then(|(d1, h1, _, _)| day_time(ctx.now, d1, h1, 0));
    let to = groups
        .zip(from)
        .and_then(|((_, _, d2, h2), from)| day_time_after(from, d2, h2, 0));
    if from.is_none() || to.is_none() {
        tracing::debug!("TAF validity window missing or invalid; using processing time");
    }
    Window {
        from: DecodedTime::or_fallback(from, ctx.now),
        to: DecodedTime::or_fallback(to, ctx.now),
    }
}

/// Decode one TAF bulletin
///
/// Like the METAR decoder this leaves `station` empty; station metadata is
/// attached by an enrichment step keyed on `station_id`.
pub fn decode(
    ctx: &DecodeContext,
    raw_bulletin: &str,
    station_id: Option<&str>,
    extraction_time: Option<&str>,
) -> TafRecord {
    let raw = raw_bulletin.trim();
    let (body, remarks) = split_remarks(raw);

    let header = HEADER.captures(body);
    let station_id = station_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| header.as_ref().and_then(|c| rules::text(c, 1)))
        .or_else(|| STATION_ONLY.captures(body).and_then(|c| rules::text(&c, 1)))
        .unwrap_or_default();
    let issued = header.as_ref().and_then(|caps| {
        day_time(ctx.now, num(caps, 2)?, num(caps, 3)?, num(caps, 4)?)
    });
    if issued.is_none() {
        tracing::debug!(station = %station_id, "TAF issue time missing or invalid");
    }
    let issue_time = DecodedTime::or_fallback(issued, ctx.now);
    let bulletin_time = parse_timestamp(extraction_time, ctx.now);
    let window = overall_window(ctx, body);

    let mut forecast_periods: Vec<TafForecastPeriod> = segments(body, &header_spans(body))
        .iter()
        .map(|segment| decode_period(ctx, segment, window))
        .collect();
    forecast_periods.sort_by_key(|p| p.valid_from.time);

    let mut fallback_times = Vec::new();
    for (name, t) in [
        ("bulletin_time", bulletin_time),
        ("issue_time", issue_time),
        ("valid_from", window.from),
        ("valid_to", window.to),
    ] {
        if t.is_fallback() {
            fallback_times.push(name.to_string());
        }
    }

    TafRecord {
        station_id,
        station: StationInfo::default(),
        amendment: AMENDMENT.captures(body).and_then(|c| rules::text(&c, 1)),
        bulletin_time,
        issue_time,
        valid_from: window.from,
        valid_to: window.to,
        valid_from_timestamp: window.from.timestamp(),
        valid_to_timestamp: window.to.timestamp(),
        forecast_periods,
        remarks,
        raw_text: raw.to_string(),
        fallback_times,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avwx_core::{CloudCoverage, FlightCategory};
    use chrono::TimeZone;

    fn ctx() -> DecodeContext {
        DecodeContext::at(Utc.with_ymd_and_hms(2025, 9, 26, 23, 30, 0).unwrap())
    }

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, d, h, m, 0).unwrap()
    }

    #[test]
    fn header_and_base_period() {
        let taf = decode(
            &ctx(),
            "TAF KORD 262320Z 2700/2806 20008KT P6SM FEW060",
            None,
            Some("2025-09-26T23:20:42Z"),
        );
        assert_eq!(taf.station_id, "KORD");
        assert_eq!(taf.issue_time.time, utc(26, 23, 20));
        assert_eq!(taf.valid_from.time, utc(27, 0, 0));
        assert_eq!(taf.valid_to.time, utc(28, 6, 0));
        assert_eq!(taf.validity_hours(), 30.0);
        assert_eq!(taf.forecast_periods.len(), 1);
        let base = &taf.forecast_periods[0];
        assert_eq!(base.change_type, ChangeType::Base);
        assert_eq!(base.raw_text, "20008KT P6SM FEW060");
        assert_eq!(base.undecoded_remainder, None);
        assert!(taf.fallback_times.is_empty());
    }

    #[test]
    fn segments_split_on_change_groups() {
        let body = "TAF CYVR 262340Z 2700/2806 VRB03KT P6SM FEW015 TEMPO 2700/2704 P6SM BKN015 \
                    FM271500 28010KT P6SM SCT040 BECMG 2718/2720 31012KT PROB30 2722/2802 1SM BR";
        let segs = segments(body, &header_spans(body));
        assert_eq!(
            segs,
            [
                "VRB03KT P6SM FEW015",
                "TEMPO 2700/2704 P6SM BKN015",
                "FM271500 28010KT P6SM SCT040",
                "BECMG 2718/2720 31012KT",
                "PROB30 2722/2802 1SM BR",
            ]
        );
    }

    #[test]
    fn prob_qualifies_following_tempo() {
        let body = "TAF KDEN 262320Z 2700/2806 25010KT P6SM SCT080 PROB30 TEMPO 2702/2706 3SM TSRA BKN050CB";
        let segs = segments(body, &header_spans(body));
        assert_eq!(segs.len(), 2);
        let taf = decode(&ctx(), body, None, None);
        let prob = &taf.forecast_periods[1];
        assert_eq!(prob.change_type, ChangeType::Prob);
        assert_eq!(prob.probability_percent, Some(30));
        assert_eq!(prob.valid_from.time, utc(27, 2, 0));
        assert_eq!(prob.valid_to.time, utc(27, 6, 0));
        assert_eq!(prob.weather_phenomena.as_deref(), Some("TSRA"));
        assert!(prob.is_significant_weather());
        assert_eq!(prob.flight_category, FlightCategory::Mvfr);
    }

    #[test]
    fn becmg_sets_becomes_time() {
        let taf = decode(
            &ctx(),
            "TAF KMSP 262320Z 2700/2724 18008KT P6SM SKC BECMG 2706/2708 27015G25KT",
            None,
            None,
        );
        let becmg = taf
            .forecast_periods
            .iter()
            .find(|p| p.change_type == ChangeType::Becmg)
            .unwrap();
        assert_eq!(becmg.becomes_time.map(|t| t.time), Some(utc(27, 8, 0)));
        assert_eq!(becmg.wind_gust_knots, Some(25));
        assert_eq!(taf.valid_to.time, utc(28, 0, 0));
    }

    #[test]
    fn extended_groups() {
        let taf = decode(
            &ctx(),
            "TAF KBOS 262320Z 2700/2806 WS020/27045KT 18012KT 4SM -RA VV008 620304 520004 \
             QNH2992INS TX18/2718Z TNM02/2806Z NOSIG",
            None,
            None,
        );
        let p = &taf.forecast_periods[0];
        assert_eq!(p.wind_shear_height_feet, Some(2000));
        assert_eq!(p.wind_shear_direction_degrees, Some(270));
        assert_eq!(p.wind_shear_speed_knots, Some(45));
        assert_eq!(p.wind_direction_degrees, Some(180));
        assert_eq!(p.visibility, "4");
        assert_eq!(p.vertical_visibility_feet, Some(800));
        assert_eq!(p.weather_phenomena.as_deref(), Some("-RA"));
        assert_eq!(p.icing_turbulence.len(), 2);
        assert_eq!(p.icing_turbulence[0].kind, HazardKind::Icing);
        assert_eq!(p.icing_turbulence[0].base_feet, 3000);
        assert_eq!(p.icing_turbulence[0].top_feet, 7000);
        assert_eq!(p.icing_turbulence[1].kind, HazardKind::Turbulence);
        assert!((p.altimeter_hpa.unwrap() - 29.92 * 33.8639).abs() < 1e-9);
        assert_eq!(p.temperature_forecasts.len(), 2);
        assert_eq!(p.temperature_forecasts[1].temperature_celsius, -2);
        assert_eq!(
            p.temperature_forecasts[1].valid_time.map(|t| t.time),
            Some(utc(28, 6, 0))
        );
        assert_eq!(p.flight_category, FlightCategory::Ifr);
        assert_eq!(p.undecoded_remainder.as_deref(), Some("NOSIG"));
    }

    #[test]
    fn remarks_are_split_off() {
        let taf = decode(
            &ctx(),
            "TAF CYYZ 262338Z 2700/2806 24010KT P6SM SCT030 RMK NXT FCST BY 270600Z",
            None,
            None,
        );
        assert_eq!(taf.remarks.as_deref(), Some("NXT FCST BY 270600Z"));
        assert_eq!(taf.forecast_periods[0].undecoded_remainder, None);
    }

    #[test]
    fn window_rolls_into_next_month() {
        let ctx = DecodeContext::at(Utc.with_ymd_and_hms(2025, 12, 31, 17, 0, 0).unwrap());
        let taf = decode(&ctx, "TAF KJFK 311720Z 3118/0124 31015KT P6SM FEW250", None, None);
        assert_eq!(
            taf.valid_from.time,
            Utc.with_ymd_and_hms(2025, 12, 31, 18, 0, 0).unwrap()
        );
        assert_eq!(
            taf.valid_to.time,
            Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn amendment_and_missing_header() {
        let taf = decode(&ctx(), "TAF AMD KORD 270105Z 2701/2806 VRB04KT P6SM SKC", None, None);
        assert_eq!(taf.amendment.as_deref(), Some("AMD"));
        assert_eq!(taf.station_id, "KORD");
        assert_eq!(taf.forecast_periods[0].sky_coverage, CloudCoverage::Skc);
        assert_eq!(taf.station, StationInfo::default());

        let empty = decode(&ctx(), "", None, None);
        assert_eq!(empty.station_id, "");
        assert_eq!(empty.forecast_periods.len(), 1);
        assert_eq!(empty.forecast_periods[0].change_type, ChangeType::Base);
        assert_eq!(
            empty.fallback_times,
            ["bulletin_time", "issue_time", "valid_from", "valid_to"]
        );
    }

    #[test]
    fn lowest_visibility_keeps_source_token() {
        let taf = decode(
            &ctx(),
            "TAF KBOS 262320Z 2700/2724 09012KT 3SM BR OVC008 FM270800 09010KT 1/2SM FG VV002",
            None,
            None,
        );
        assert_eq!(taf.lowest_visibility(), "1/2");
        let clear = decode(&ctx(), "TAF KPHX 262320Z 2700/2724 VRB03KT P6SM SKC", None, None);
        assert_eq!(clear.lowest_visibility(), "6+");
    }

    #[test]
    fn summary_helpers() {
        let taf = decode(
            &ctx(),
            "TAF KORD 262320Z 2700/2806 20008KT P6SM FEW060 TEMPO 2702/2706 2SM BR \
             FM271500 26021KT P6SM FEW060",
            None,
            None,
        );
        assert_eq!(taf.lowest_visibility(), "2");
        assert_eq!(taf.highest_wind_speed(), Some(21));
        assert!(taf.forecast_periods[1].has_low_visibility());
        assert_eq!(
            taf.period_at(utc(27, 1, 0)).map(|p| p.change_type),
            Some(ChangeType::Base)
        );
    }
}
