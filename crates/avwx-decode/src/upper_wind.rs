//! Upper-wind (winds aloft) bulletins
//!
//! A bulletin holds one or more `VALID ddhhmmZ FOR USE <period>` blocks.
//! Each block carries an altitude header row followed by one row per
//! station, with `|`-separated cells aligned to the altitude columns.

use std::collections::BTreeMap;

use avwx_core::{decode_temperature_code, UpperWindLevel, UpperWindPeriod, UpperWindRecord};
use regex::Captures;

use crate::context::DecodeContext;
use crate::rules::{self, field_rule, num};

field_rule!(BLOCK_START, "block_start", r"\bVALID\s+\d{6}Z");
field_rule!(BLOCK_HEADER, "block_header", r"^VALID\s+(\d{6}Z)\s+FOR\s+USE\s+([\d\-]+)");
field_rule!(ALTITUDE_ROW, "altitude_row", r"^[\s|]*\d{4,5}(?:[\s|]+\d{4,5})+[\s|]*$");
field_rule!(ALTITUDE_CONTINUATION, "altitude_continuation", r"^[\s|]*\|[\s|]*\d{4,5}(?:[\s|]+\d{4,5})*[\s|]*$");
field_rule!(ALTITUDE, "altitude", r"\d{4,5}");
field_rule!(STATION_ROW, "station_row", r"^\s*([A-Z]{3,4})\s+(.+)$");
field_rule!(CALM_CELL, "calm_cell", r"^9900(?:\s*[+-]?\d{1,2})?$");
field_rule!(COMPACT_CELL, "compact_cell", r"^(\d{2,3})(\d{2})(?:\s*([+-]\d{1,3})|(\d{2}))?$");
field_rule!(SPACED_CELL, "spaced_cell", r"^(\d{1,3})\s+(\d{1,3})(?:\s+([+-]?\d{1,3}))?");

/// Altitude from which temperatures are always negative and sent unsigned
const HIGH_LEVEL_FEET: u32 = 24_000;
/// Lowest altitude that can carry a temperature
const LOWEST_TEMPERATURE_FEET: u32 = 3_000;
/// Encoded directions at or above this mark speeds of 100 kt or more.
/// Compact cells encode such winds with direction tens 51..=86, so the
/// offset applies from 500 rather than only above 680.
const HIGH_SPEED_OFFSET: u16 = 500;

/// The shapes a wind cell can take, tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellForm<'a> {
    /// `9900`: light and variable
    Calm,
    /// `DDDff`, `DDff`, optionally followed by a temperature
    Compact {
        direction: u16,
        speed: u16,
        temperature: Option<&'a str>,
    },
    /// `DDD ff [TT]`
    Spaced {
        direction: u16,
        speed: u16,
        temperature: Option<&'a str>,
    },
    /// Empty, placeholder or unreadable
    Absent,
}

impl<'a> CellForm<'a> {
    pub fn parse(cell: &'a str) -> Self {
        let cell = cell.trim();
        if cell.is_empty() {
            return Self::Absent;
        }
        if CALM_CELL.is_match(cell) {
            return Self::Calm;
        }
        if let Some(caps) = COMPACT_CELL.captures(cell) {
            if let Some(form) = compact(&caps) {
                return form;
            }
        }
        if let Some(caps) = SPACED_CELL.captures(cell) {
            if let (Some(direction), Some(speed)) = (num(&caps, 1), num(&caps, 2)) {
                return Self::Spaced {
                    direction,
                    speed,
                    temperature: caps.get(3).map(|m| m.as_str()),
                };
            }
        }
        Self::Absent
    }
}

fn compact<'a>(caps: &Captures<'a>) -> Option<CellForm<'a>> {
    let digits = caps.get(1)?.as_str();
    let mut direction: u16 = digits.parse().ok()?;
    // two-digit groups are tens of degrees
    if digits.len() == 2 {
        direction *= 10;
    }
    Some(CellForm::Compact {
        direction,
        speed: num(caps, 2)?,
        temperature: caps.get(3).or_else(|| caps.get(4)).map(|m| m.as_str()),
    })
}

/// Undo the high-speed offset; directions beyond 360 after decoding are
/// treated as missing.
fn wind(direction: u16, speed: u16) -> Option<(u16, u16)> {
    let (direction, speed) = if direction >= HIGH_SPEED_OFFSET {
        ((direction - HIGH_SPEED_OFFSET) / 10 * 10, speed + 100)
    } else {
        (direction, speed)
    };
    (direction <= 360).then_some((direction, speed))
}

fn temperature(altitude_feet: u32, token: Option<&str>) -> Option<i32> {
    let token = token?.trim();
    if altitude_feet < LOWEST_TEMPERATURE_FEET {
        return None;
    }
    if token.starts_with(['+', '-']) {
        return token.parse().ok();
    }
    if altitude_feet >= HIGH_LEVEL_FEET {
        token.parse::<i32>().ok().map(|t| -t)
    } else {
        decode_temperature_code(token)
    }
}

/// Decode one cell for the given altitude column
pub fn decode_cell(cell: &str, altitude_feet: u32) -> UpperWindLevel {
    let mut level = UpperWindLevel {
        altitude_feet,
        direction_degrees: None,
        speed_knots: None,
        temperature_celsius: None,
    };
    match CellForm::parse(cell) {
        CellForm::Calm => {
            level.direction_degrees = Some(0);
            level.speed_knots = Some(0);
        }
        CellForm::Compact {
            direction,
            speed,
            temperature: t,
        }
        | CellForm::Spaced {
            direction,
            speed,
            temperature: t,
        } => {
            if let Some((direction, speed)) = wind(direction, speed) {
                level.direction_degrees = Some(direction);
                level.speed_knots = Some(speed);
            }
            level.temperature_celsius = temperature(altitude_feet, t);
        }
        CellForm::Absent => {}
    }
    level
}

fn station_code(ctx: &DecodeContext, code: &str) -> String {
    match &ctx.short_code_prefix {
        Some(prefix) if code.len() == 3 => format!("{prefix}{code}"),
        _ => code.to_string(),
    }
}

/// Split the bulletin at every `VALID ddhhmmZ`
fn blocks(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = BLOCK_START.regex().find_iter(text).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

fn decode_block(ctx: &DecodeContext, block: &str) -> Option<UpperWindPeriod> {
    let header = BLOCK_HEADER.captures(block);
    let Some(header) = header else {
        tracing::debug!("upper-wind block without VALID .. FOR USE header");
        return None;
    };
    let valid_time = rules::text(&header, 1)?;
    let use_period = rules::text(&header, 2)?;

    let mut lines = block.lines().skip(1).peekable();
    let mut altitude_text = String::new();
    for line in lines.by_ref() {
        if ALTITUDE_ROW.is_match(line) {
            altitude_text.push_str(line);
            break;
        }
    }
    while let Some(line) = lines.peek() {
        if !ALTITUDE_CONTINUATION.is_match(line) {
            break;
        }
        altitude_text.push(' ');
        altitude_text.push_str(line);
        lines.next();
    }
    let altitudes: Vec<u32> = ALTITUDE
        .regex()
        .find_iter(&altitude_text)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    if altitudes.is_empty() {
        tracing::debug!(%valid_time, "upper-wind block without altitude row");
        return None;
    }

    let mut stations = BTreeMap::new();
    while let Some(line) = lines.next() {
        let Some(caps) = STATION_ROW.captures(line) else {
            continue;
        };
        let Some(code) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let mut rest = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() || STATION_ROW.is_match(next) {
                break;
            }
            rest.push(' ');
            rest.push_str(next.trim());
            lines.next();
        }
        let mut cells: Vec<&str> = rest.split('|').map(str::trim).collect();
        cells.resize(altitudes.len(), "");
        let levels = altitudes
            .iter()
            .zip(&cells)
            .map(|(&altitude, cell)| decode_cell(cell, altitude))
            .collect();
        stations.insert(station_code(ctx, code), levels);
    }

    Some(UpperWindPeriod {
        valid_time,
        use_period,
        stations,
    })
}

/// Every block of a bulletin, in source order
pub fn decode_blocks(ctx: &DecodeContext, raw_text: &str) -> Vec<UpperWindPeriod> {
    blocks(raw_text)
        .into_iter()
        .filter_map(|block| decode_block(ctx, block))
        .collect()
}

fn collect_into(records: &mut BTreeMap<String, UpperWindRecord>, periods: Vec<UpperWindPeriod>) {
    for period in periods {
        for (station, levels) in period.stations {
            let mut stations = BTreeMap::new();
            stations.insert(station.clone(), levels);
            records
                .entry(station.clone())
                .or_insert_with(|| UpperWindRecord {
                    station_id: station,
                    periods: Vec::new(),
                })
                .periods
                .push(UpperWindPeriod {
                    valid_time: period.valid_time.clone(),
                    use_period: period.use_period.clone(),
                    stations,
                });
        }
    }
}

/// Per-station records across every block of one bulletin
pub fn decode_bulletin(ctx: &DecodeContext, raw_text: &str) -> BTreeMap<String, UpperWindRecord> {
    let mut records = BTreeMap::new();
    collect_into(&mut records, decode_blocks(ctx, raw_text));
    records
}

/// Per-station records across several bulletins, periods in input order
pub fn merge<'a, I>(ctx: &DecodeContext, bulletins: I) -> BTreeMap<String, UpperWindRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut records = BTreeMap::new();
    for bulletin in bulletins {
        collect_into(&mut records, decode_blocks(ctx, bulletin));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(cell: &str, altitude: u32) -> (Option<u16>, Option<u16>, Option<i32>) {
        let l = decode_cell(cell, altitude);
        (l.direction_degrees, l.speed_knots, l.temperature_celsius)
    }

    #[test]
    fn cell_forms() {
        assert_eq!(CellForm::parse("9900"), CellForm::Calm);
        assert_eq!(CellForm::parse(""), CellForm::Absent);
        assert_eq!(CellForm::parse("////"), CellForm::Absent);
        assert!(matches!(CellForm::parse("73106"), CellForm::Compact { direction: 731, speed: 6, .. }));
        assert!(matches!(CellForm::parse("2815-03"), CellForm::Compact { direction: 280, speed: 15, temperature: Some("-03") }));
        assert!(matches!(CellForm::parse("30 118 -39"), CellForm::Spaced { direction: 30, speed: 118, temperature: Some("-39") }));
    }

    #[test]
    fn documented_cells() {
        assert_eq!(level("73106", 30000), (Some(230), Some(106), None));
        assert_eq!(level("731 06", 30000), (Some(230), Some(106), None));
        assert_eq!(level("9900", 3000), (Some(0), Some(0), None));
        assert_eq!(level("30 118 -39", 30000), (Some(30), Some(118), Some(-39)));
    }

    #[test]
    fn offset_applies_below_six_eighty() {
        assert_eq!(level("5120", 30000), (Some(10), Some(120), None));
        assert_eq!(level("6730", 30000), (Some(170), Some(130), None));
        assert_eq!(level("5000", 30000), (Some(0), Some(100), None));
    }

    #[test]
    fn temperatures_by_band() {
        assert_eq!(level("2815-03", 6000), (Some(280), Some(15), Some(-3)));
        assert_eq!(level("2815+05", 6000), (Some(280), Some(15), Some(5)));
        // offset code below 24000 ft
        assert_eq!(level("281555", 12000), (Some(280), Some(15), Some(-5)));
        // positive values are not representable in the offset code
        assert_eq!(level("281520", 12000), (Some(280), Some(15), None));
        // unsigned above 24000 ft is negative
        assert_eq!(level("281545", 30000), (Some(280), Some(15), Some(-45)));
        // nothing below the lowest temperature level
        assert_eq!(level("27 10 -05", 2000), (Some(27), Some(10), None));
    }

    #[test]
    fn out_of_range_direction_is_absent() {
        assert_eq!(level("999 10", 9000), (None, None, None));
        assert_eq!(level("400 10", 9000), (None, None, None));
    }

    const BULLETIN: &str = "\
VALID 131200Z FOR USE 06-18
     3000 | 6000 | 9000 | 12000
  | 18000
YVR 2710 | 2815-03 | 73106-15
  | 9900 | 30 118 -39
CYYC 9900 |  | 2920-10
VALID 131800Z FOR USE 18-06
3000 | 6000 | 9000 | 12000 | 18000
YVR 2512 | 2620-02 | 2730-08 | 2840-14 | 2950-25
";

    #[test]
    fn decodes_blocks_with_wrapped_rows() {
        let ctx = DecodeContext::at(chrono::Utc::now()).with_short_code_prefix("C");
        let periods = decode_blocks(&ctx, BULLETIN);
        assert_eq!(periods.len(), 2);
        let first = &periods[0];
        assert_eq!(first.valid_time, "131200Z");
        assert_eq!(first.use_period, "06-18");
        let yvr = first.levels_for("CYVR");
        assert_eq!(yvr.len(), 5);
        assert_eq!(yvr[0].altitude_feet, 3000);
        assert_eq!(yvr[0].direction_degrees, Some(270));
        assert_eq!(yvr[0].temperature_celsius, None);
        assert_eq!(yvr[1].temperature_celsius, Some(-3));
        assert_eq!(yvr[2].direction_degrees, Some(230));
        assert_eq!(yvr[2].speed_knots, Some(106));
        assert_eq!(yvr[3].speed_knots, Some(0));
        assert_eq!(yvr[4].altitude_feet, 18000);
        assert_eq!(yvr[4].direction_degrees, Some(30));
        let yyc = first.levels_for("CYYC");
        assert_eq!(yyc.len(), 5);
        assert_eq!(yyc[1].direction_degrees, None);
        assert_eq!(yyc[3].speed_knots, None);
    }

    fn render(levels: &[UpperWindLevel]) -> String {
        let cell = |v: Option<String>| v.unwrap_or_else(|| "-".into());
        levels
            .iter()
            .map(|l| {
                format!(
                    "{}:{}/{}/{}",
                    l.altitude_feet,
                    cell(l.direction_degrees.map(|d| d.to_string())),
                    cell(l.speed_knots.map(|s| s.to_string())),
                    cell(l.temperature_celsius.map(|t| t.to_string())),
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn rendered_rows() {
        let ctx = DecodeContext::at(chrono::Utc::now());
        let periods = decode_blocks(&ctx, BULLETIN);
        insta::assert_snapshot!(
            render(periods[0].levels_for("YVR")),
            @"3000:270/10/- 6000:280/15/-3 9000:230/106/-15 12000:0/0/- 18000:30/118/-39"
        );
        insta::assert_snapshot!(
            render(periods[1].levels_for("YVR")),
            @"3000:250/12/- 6000:260/20/-2 9000:270/30/-8 12000:280/40/-14 18000:290/50/-25"
        );
    }

    #[test]
    fn groups_periods_per_station() {
        let ctx = DecodeContext::at(chrono::Utc::now());
        let records = decode_bulletin(&ctx, BULLETIN);
        assert_eq!(records.keys().collect::<Vec<_>>(), ["CYYC", "YVR"]);
        let yvr = &records["YVR"];
        assert_eq!(yvr.periods.len(), 2);
        assert_eq!(yvr.valid_time(), "131200Z");
        assert_eq!(yvr.periods[1].use_period, "18-06");
        assert_eq!(yvr.periods[1].levels_for("YVR")[4].temperature_celsius, Some(-25));

        let merged = merge(&ctx, [BULLETIN, BULLETIN]);
        assert_eq!(merged["YVR"].periods.len(), 4);
    }

    #[test]
    fn missing_anchors_give_nothing() {
        let ctx = DecodeContext::at(chrono::Utc::now());
        assert!(decode_bulletin(&ctx, "").is_empty());
        assert!(decode_bulletin(&ctx, "VALID 131200Z\nYVR 2710").is_empty());
        assert!(decode_bulletin(&ctx, "VALID 131200Z FOR USE 06-18\nYVR 2710 | 2815").is_empty());
    }
}
