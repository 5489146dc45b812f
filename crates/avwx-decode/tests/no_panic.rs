//! Decoding never panics, whatever the input

use avwx_decode::{
    decode_metar_with, decode_sigmet_block, decode_taf_with, decode_upper_wind_bulletin_with,
    DecodeContext,
};
use chrono::{TimeZone, Utc};

/// Small deterministic generator so failures reproduce
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

const TOKENS: &[&str] = &[
    "METAR", "SPECI", "TAF", "AMD", "COR", "KMCI", "CYVR", "YVR", "262353Z", "3112Z", "999999Z",
    "2700/2806", "3224/0100", "FM270200", "FM99", "TEMPO", "BECMG", "PROB30", "PROB", "17004KT",
    "VRB04KT", "36099G150KT", "P6SM", "M1/4SM", "1 1/2SM", "10SM", "9999", "0000", "CLR", "SKC",
    "FEW", "BKN000", "OVC010CB", "VV001", "VV", "24/13", "M05/M10", "/", "A2990", "Q1013",
    "QNH2992INS", "WS010/31030KT", "620304", "530005", "TX25/2718Z", "TNM05/2806Z", "RMK", "SLP",
    "SLP999", "-RA", "+TSRA", "VCSH", "FZFG", "SIGMET", "VALID", "261915/262315", "WI", "N6700",
    "W13500", "-", "–", "N4500W07800", "FL220/340", "SFC/FL250", "TOP", "ABV", "FL450", "MOV",
    "STNR", "NC", "INTSF", "SEV", "TURB", "VA", "ERUPTION", "MT", "TC", "=", "FOR", "USE", "06-18",
    "3000", "|", "9900", "73106", "731", "06", "-39", "+05", "99999", "\n", "  ",
];

fn soup(rng: &mut Lcg) -> String {
    let n = rng.below(40);
    let mut out = String::new();
    for _ in 0..n {
        out.push_str(TOKENS[rng.below(TOKENS.len())]);
        if rng.below(4) != 0 {
            out.push(' ');
        }
    }
    out
}

fn printable(rng: &mut Lcg) -> String {
    let n = rng.below(120);
    (0..n).map(|_| (0x20 + rng.below(0x5f) as u8) as char).collect()
}

fn decode_all(ctx: &DecodeContext, text: &str) {
    let metar = decode_metar_with(ctx, text, None, Some(text));
    let taf = decode_taf_with(ctx, text, Some("KXYZ"), None);
    let sigmets = decode_sigmet_block(text);
    let winds = decode_upper_wind_bulletin_with(ctx, text);

    // records always serialize
    serde_json::to_string(&metar).unwrap();
    serde_json::to_string(&taf).unwrap();
    serde_json::to_string(&sigmets).unwrap();
    serde_json::to_string(&winds).unwrap();

    let sorted = taf
        .forecast_periods
        .windows(2)
        .all(|w| w[0].valid_from.time <= w[1].valid_from.time);
    assert!(sorted, "unsorted periods for {text:?}");
    for record in winds.values() {
        for (_, levels) in record.levels() {
            for level in levels {
                assert!(level.direction_degrees.map_or(true, |d| d <= 360), "{text:?}");
            }
        }
    }
}

fn contexts() -> Vec<DecodeContext> {
    vec![
        DecodeContext::at(Utc.with_ymd_and_hms(2025, 2, 28, 23, 59, 0).unwrap()),
        DecodeContext::at(Utc.with_ymd_and_hms(2024, 12, 31, 12, 0, 0).unwrap())
            .with_short_code_prefix("C"),
    ]
}

#[test]
fn empty_and_blank_input() {
    for ctx in contexts() {
        for text in ["", " ", "\n", "=", "|", "RMK", "VALID", "TAF", "METAR"] {
            decode_all(&ctx, text);
        }
        let taf = decode_taf_with(&ctx, "", None, None);
        assert_eq!(taf.forecast_periods.len(), 1);
        assert!(decode_sigmet_block("").is_empty());
        assert!(decode_upper_wind_bulletin_with(&ctx, "").is_empty());
    }
}

#[test]
fn printable_ascii_sweep() {
    let mut rng = Lcg(0x5eed);
    for ctx in contexts() {
        for _ in 0..1500 {
            decode_all(&ctx, &printable(&mut rng));
        }
    }
}

#[test]
fn token_soup_sweep() {
    let mut rng = Lcg(42);
    for ctx in contexts() {
        for _ in 0..3000 {
            decode_all(&ctx, &soup(&mut rng));
        }
    }
}
