//! METAR / SPECI decoding
//!
//! Body fields are matched independently against the text before `RMK`;
//! the order of groups in the bulletin does not matter. Any group that does
//! not match leaves its field at the default.

use avwx_core::{
    classify, day_time, inches_hg_to_hpa, meters_to_statute_miles, parse_timestamp, sky_coverage,
    visibility_statute_miles, CloudLayer, DecodedTime, MetarRecord, StationInfo,
};
use regex::Captures;

use crate::context::DecodeContext;
use crate::rules::{
    self, apply_steps, field_rule, num, signed_m, split_remarks, FieldStep, CLOUD,
    VERTICAL_VISIBILITY, WEATHER, WIND,
};

field_rule!(REPORT_HEADER, "report_header", r"^(METAR|SPECI)(?:\s+COR)?\s+([A-Z][A-Z0-9]{3})\b");
field_rule!(BARE_STATION, "bare_station", r"^(?:COR\s+)?([A-Z][A-Z0-9]{3})\s+\d{6}Z\b");
field_rule!(CORRECTION, "correction", r"\bCOR\b");
field_rule!(OBSERVATION_TIME, "observation_time", r"\b(\d{2})(\d{2})(\d{2})Z\b");
field_rule!(
    pub(crate) VISIBILITY_SM,
    "visibility_sm",
    r"(?:^|\s)([PM])?(\d+\s\d/\d|\d+/\d+|\d+)SM\b"
);
field_rule!(VISIBILITY_METERS, "visibility_meters", r"(?:^|\s)(\d{4})(?:NDV)?(?:\s|$)");
field_rule!(TEMPERATURE, "temperature", r"(?:^|\s)(M?\d{2})/(M?\d{2})(?:\s|$)");
field_rule!(ALTIMETER_INHG, "altimeter_inhg", r"\bA(\d{4})\b");
field_rule!(ALTIMETER_HPA, "altimeter_hpa", r"\bQ(\d{4})\b");
field_rule!(SEA_LEVEL_PRESSURE, "sea_level_pressure", r"\bSLP(\d{3})\b");

/// Fields accumulated by the decode table
#[derive(Debug, Default)]
struct MetarDraft {
    wind_direction: Option<u16>,
    wind_speed: Option<u16>,
    wind_gust: Option<u16>,
    wind_variable: bool,
    visibility: Option<String>,
    visibility_meters: Option<u32>,
    temperature: Option<f64>,
    dewpoint: Option<f64>,
    altimeter_hpa: Option<f64>,
    vertical_visibility: Option<u32>,
    cloud_layers: Vec<CloudLayer>,
    present_weather: Vec<String>,
}

static BODY_STEPS: &[FieldStep<MetarDraft>] = &[
    FieldStep::once(&WIND, apply_wind),
    FieldStep::once(&VISIBILITY_SM, apply_visibility),
    FieldStep::once(&VISIBILITY_METERS, apply_visibility_meters),
    FieldStep::once(&TEMPERATURE, apply_temperature),
    FieldStep::once(&ALTIMETER_INHG, apply_altimeter_inhg),
    FieldStep::once(&ALTIMETER_HPA, apply_altimeter_hpa),
    FieldStep::each(&CLOUD, apply_cloud),
    FieldStep::once(&VERTICAL_VISIBILITY, apply_vertical_visibility),
    FieldStep::each(&WEATHER, apply_weather),
];

fn apply_wind(d: &mut MetarDraft, caps: &Captures<'_>) {
    (d.wind_direction, d.wind_speed, d.wind_gust, d.wind_variable) = rules::wind(caps);
}

/// `P6SM` -> "6+", `M1/4SM` -> "M1/4", `10SM` -> "10"
pub(crate) fn visibility_token(caps: &Captures<'_>) -> Option<String> {
    let value = caps.get(2)?.as_str();
    Some(match caps.get(1).map(|m| m.as_str()) {
        Some("P") => format!("{value}+"),
        Some("M") => format!("M{value}"),
        _ => value.to_string(),
    })
}

fn apply_visibility(d: &mut MetarDraft, caps: &Captures<'_>) {
    d.visibility = visibility_token(caps);
}

fn apply_visibility_meters(d: &mut MetarDraft, caps: &Captures<'_>) {
    d.visibility_meters = num(caps, 1);
}

fn apply_temperature(d: &mut MetarDraft, caps: &Captures<'_>) {
    d.temperature = caps.get(1).and_then(|m| signed_m(m.as_str())).map(f64::from);
    d.dewpoint = caps.get(2).and_then(|m| signed_m(m.as_str())).map(f64::from);
}

fn apply_altimeter_inhg(d: &mut MetarDraft, caps: &Captures<'_>) {
    d.altimeter_hpa = num::<f64>(caps, 1).map(|hundredths| inches_hg_to_hpa(hundredths / 100.0));
}

fn apply_altimeter_hpa(d: &mut MetarDraft, caps: &Captures<'_>) {
    if d.altimeter_hpa.is_none() {
        d.altimeter_hpa = num(caps, 1);
    }
}

fn apply_cloud(d: &mut MetarDraft, caps: &Captures<'_>) {
    d.cloud_layers.extend(rules::cloud_layer(caps));
}

fn apply_vertical_visibility(d: &mut MetarDraft, caps: &Captures<'_>) {
    d.vertical_visibility = num::<u32>(caps, 1).map(|h| h * 100);
}

fn apply_weather(d: &mut MetarDraft, caps: &Captures<'_>) {
    d.present_weather.extend(rules::text(caps, 1));
}

/// `SLPppp`: tenths of hPa with the leading 9 or 10 dropped
fn sea_level_pressure(remarks: &str) -> Option<f64> {
    let caps = SEA_LEVEL_PRESSURE.captures(remarks)?;
    let tenths: f64 = num(&caps, 1)?;
    let base = if tenths < 500.0 { 1000.0 } else { 900.0 };
    Some(base + tenths / 10.0)
}

fn station_from(raw: &str) -> Option<String> {
    REPORT_HEADER
        .captures(raw)
        .and_then(|c| rules::text(&c, 2))
        .or_else(|| BARE_STATION.captures(raw).and_then(|c| rules::text(&c, 1)))
}

fn observation_time(ctx: &DecodeContext, body: &str) -> DecodedTime {
    let built = OBSERVATION_TIME.captures(body).and_then(|caps| {
        day_time(ctx.now, num(&caps, 1)?, num(&caps, 2)?, num(&caps, 3)?)
    });
    if built.is_none() {
        tracing::debug!("METAR observation time missing or invalid; using processing time");
    }
    DecodedTime::or_fallback(built, ctx.now)
}

/// Decode one METAR or SPECI bulletin
///
/// `station` is left at [`StationInfo::default`]. Name, position and
/// elevation come from an enrichment step outside the decoder, such as a
/// station table lookup keyed on `station_id`.
pub fn decode(
    ctx: &DecodeContext,
    raw_bulletin: &str,
    station_id: Option<&str>,
    extraction_time: Option<&str>,
) -> MetarRecord {
    let raw = raw_bulletin.trim();
    let (body, remarks) = split_remarks(raw);

    let station_id = station_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| station_from(raw))
        .unwrap_or_default();
    let report_type = REPORT_HEADER
        .captures(raw)
        .and_then(|c| rules::text(&c, 1))
        .unwrap_or_else(|| "METAR".to_string());

    let observation_time = observation_time(ctx, body);
    let receipt_time = parse_timestamp(extraction_time, ctx.now);

    let mut draft = MetarDraft::default();
    apply_steps(body, BODY_STEPS, &mut draft);

    let visibility_sm = match (&draft.visibility, draft.visibility_meters) {
        (Some(token), _) => visibility_statute_miles(token),
        (None, Some(m)) => Some(meters_to_statute_miles(f64::from(m))),
        (None, None) => Some(10.0),
    };
    let flight_category = classify(visibility_sm, &draft.cloud_layers, draft.vertical_visibility);

    let mut fallback_times = Vec::new();
    if observation_time.is_fallback() {
        fallback_times.push("observation_time".to_string());
    }
    if receipt_time.is_fallback() {
        fallback_times.push("receipt_time".to_string());
    }

    MetarRecord {
        station_id,
        station: StationInfo::default(),
        report_type,
        corrected: CORRECTION.is_match(body),
        observation_timestamp: observation_time.timestamp(),
        observation_time,
        receipt_time,
        temperature_celsius: draft.temperature,
        dewpoint_celsius: draft.dewpoint,
        wind_direction_degrees: draft.wind_direction,
        wind_speed_knots: draft.wind_speed,
        wind_gust_knots: draft.wind_gust,
        wind_variable: draft.wind_variable,
        visibility: draft.visibility.unwrap_or_else(|| "10+".to_string()),
        visibility_meters: draft.visibility_meters,
        vertical_visibility_feet: draft.vertical_visibility,
        altimeter_hpa: draft.altimeter_hpa.unwrap_or(0.0),
        sea_level_pressure_hpa: remarks.as_deref().and_then(sea_level_pressure),
        sky_coverage: sky_coverage(&draft.cloud_layers),
        cloud_layers: draft.cloud_layers,
        flight_category,
        present_weather: draft.present_weather,
        remarks,
        raw_observation: raw.to_string(),
        fallback_times,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avwx_core::{CloudCoverage, CloudType, FlightCategory};
    use chrono::{TimeZone, Utc};

    fn ctx() -> DecodeContext {
        DecodeContext::at(Utc.with_ymd_and_hms(2025, 9, 27, 0, 10, 0).unwrap())
    }

    fn metar(raw: &str) -> MetarRecord {
        decode(&ctx(), raw, None, Some("2025-09-27T00:05:00Z"))
    }

    #[test]
    fn decodes_routine_report() {
        let m = metar("METAR KMCI 262353Z 17004KT 10SM CLR 24/13 A2990 RMK AO2 SLP132");
        assert_eq!(m.station_id, "KMCI");
        assert_eq!(m.report_type, "METAR");
        assert_eq!(
            m.observation_time.time,
            Utc.with_ymd_and_hms(2025, 9, 26, 23, 53, 0).unwrap()
        );
        assert_eq!(m.wind_direction_degrees, Some(170));
        assert_eq!(m.wind_speed_knots, Some(4));
        assert_eq!(m.visibility, "10");
        assert_eq!(m.temperature_celsius, Some(24.0));
        assert_eq!(m.dewpoint_celsius, Some(13.0));
        assert!((m.altimeter_hpa - 29.90 * 33.8639).abs() < 1e-9);
        assert!((m.sea_level_pressure_hpa.unwrap() - 1013.2).abs() < 1e-9);
        assert_eq!(m.remarks.as_deref(), Some("AO2 SLP132"));
        assert!(m.fallback_times.is_empty());
    }

    #[test]
    fn station_metadata_left_for_enrichment() {
        let m = metar("METAR CYVR 262300Z 27005KT 15SM FEW030 12/08 A3001");
        assert_eq!(m.station, StationInfo::default());
        assert!(m.station.station_name.is_empty());
    }

    #[test]
    fn gusts_weather_and_ceiling() {
        let m = metar("SPECI KORD 262351Z 36010G20KT 3/4SM -SHRA BR BKN004 OVC010CB M02/M05 Q1003");
        assert_eq!(m.report_type, "SPECI");
        assert_eq!(m.wind_gust_knots, Some(20));
        assert_eq!(m.visibility, "3/4");
        assert_eq!(m.present_weather, ["-SHRA", "BR"]);
        assert_eq!(m.sky_coverage, CloudCoverage::Ovc);
        assert_eq!(m.cloud_layers[1].cloud_type, Some(CloudType::Cb));
        assert_eq!(m.temperature_celsius, Some(-2.0));
        assert_eq!(m.dewpoint_celsius, Some(-5.0));
        assert_eq!(m.altimeter_hpa, 1003.0);
        assert_eq!(m.flight_category, FlightCategory::Lifr);
        assert!(m.has_precipitation());
        assert!(m.is_ifr());
    }

    #[test]
    fn variable_wind_and_unlimited_visibility() {
        let m = metar("METAR CYVR 262300Z VRB03KT P6SM FEW030 SCT250 12/08 A3001");
        assert!(m.wind_variable);
        assert_eq!(m.wind_direction_degrees, None);
        assert_eq!(m.visibility, "6+");
        assert_eq!(m.sky_coverage, CloudCoverage::Sct);
        assert_eq!(m.flight_category, FlightCategory::Vfr);
    }

    #[test]
    fn ceiling_overrides_good_visibility() {
        let m = metar("METAR KSEA 262353Z 18005KT 10SM BKN008 15/14 A3000");
        assert_eq!(m.flight_category, FlightCategory::Ifr);
        let m = metar("METAR KSEA 262353Z 18005KT 10SM OVC020 15/14 A3000");
        assert_eq!(m.flight_category, FlightCategory::Mvfr);
    }

    #[test]
    fn metric_visibility_and_vertical_visibility() {
        let m = metar("METAR EGLL 262350Z 24008KT 0300 FG VV001 08/08 Q1021");
        assert_eq!(m.visibility, "10+");
        assert_eq!(m.visibility_meters, Some(300));
        assert_eq!(m.vertical_visibility_feet, Some(100));
        assert_eq!(m.present_weather, ["FG"]);
        assert_eq!(m.flight_category, FlightCategory::Lifr);
    }

    #[test]
    fn station_override_and_bare_bulletin() {
        let m = decode(&ctx(), "CYYC 262300Z 27015KT 15SM FEW100 M01/M08 A2992", Some("CYYC"), None);
        assert_eq!(m.station_id, "CYYC");
        let m = decode(&ctx(), "CYYC 262300Z 27015KT 15SM", None, None);
        assert_eq!(m.station_id, "CYYC");
        assert_eq!(m.fallback_times, ["receipt_time"]);
    }

    #[test]
    fn impossible_day_falls_back_to_now() {
        // September has 30 days; no month rollover is attempted
        let m = metar("METAR KMCI 312353Z 17004KT 10SM CLR 24/13 A2990");
        assert!(m.observation_time.is_fallback());
        assert_eq!(m.observation_time.time, ctx().now);
        assert_eq!(m.fallback_times, ["observation_time"]);
    }

    #[test]
    fn high_sea_level_pressure_code() {
        assert!((sea_level_pressure("AO2 SLP982").unwrap() - 998.2).abs() < 1e-9);
        assert_eq!(sea_level_pressure("AO2 SLPNO"), None);
    }

    #[test]
    fn empty_input_defaults() {
        let m = decode(&ctx(), "", None, None);
        assert_eq!(m.station_id, "");
        assert_eq!(m.visibility, "10+");
        assert_eq!(m.altimeter_hpa, 0.0);
        assert_eq!(m.sky_coverage, CloudCoverage::Clr);
        assert_eq!(m.flight_category, FlightCategory::Vfr);
        assert_eq!(m.temperature_celsius, None);
    }

    #[test]
    fn remarks_do_not_feed_body_fields() {
        let m = metar("METAR KMCI 262353Z 17004KT 10SM CLR 24/13 A2990 RMK AO2 RAB15 OVC003");
        assert!(m.present_weather.is_empty());
        assert_eq!(m.cloud_layers.len(), 1);
    }
}
