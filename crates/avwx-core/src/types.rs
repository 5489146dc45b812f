//! Decoded bulletin records
//!
//! Every record serializes to a flat, stable field-name map: timestamps
//! render as ISO-8601 strings and enums as their short bulletin codes.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::time::DecodedTime;

/// Sky cover reported for one cloud layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudCoverage {
    Skc,
    #[default]
    Clr,
    Nsc,
    Few,
    Sct,
    Bkn,
    Ovc,
}

impl CloudCoverage {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "SKC" => Some(Self::Skc),
            "CLR" => Some(Self::Clr),
            "NSC" => Some(Self::Nsc),
            "FEW" => Some(Self::Few),
            "SCT" => Some(Self::Sct),
            "BKN" => Some(Self::Bkn),
            "OVC" => Some(Self::Ovc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skc => "SKC",
            Self::Clr => "CLR",
            Self::Nsc => "NSC",
            Self::Few => "FEW",
            Self::Sct => "SCT",
            Self::Bkn => "BKN",
            Self::Ovc => "OVC",
        }
    }

    /// BKN and OVC layers form a ceiling
    pub fn is_ceiling(&self) -> bool {
        matches!(self, Self::Bkn | Self::Ovc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudType {
    Cb,
    Tcu,
}

impl CloudType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CB" => Some(Self::Cb),
            "TCU" => Some(Self::Tcu),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CloudLayer {
    pub coverage: CloudCoverage,
    pub altitude_feet: Option<u32>,
    pub cloud_type: Option<CloudType>,
}

/// Flight category, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FlightCategory {
    #[default]
    Vfr,
    Mvfr,
    Ifr,
    Lifr,
}

impl FlightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vfr => "VFR",
            Self::Mvfr => "MVFR",
            Self::Ifr => "IFR",
            Self::Lifr => "LIFR",
        }
    }
}

impl fmt::Display for FlightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Station metadata filled in by an enrichment step; empty after decoding
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StationInfo {
    pub station_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_meters: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetarRecord {
    pub station_id: String,
    #[serde(flatten)]
    pub station: StationInfo,
    /// METAR or SPECI
    pub report_type: String,
    pub corrected: bool,
    pub observation_time: DecodedTime,
    pub receipt_time: DecodedTime,
    pub observation_timestamp: i64,
    pub temperature_celsius: Option<f64>,
    pub dewpoint_celsius: Option<f64>,
    pub wind_direction_degrees: Option<u16>,
    pub wind_speed_knots: Option<u16>,
    pub wind_gust_knots: Option<u16>,
    pub wind_variable: bool,
    /// Statute miles as reported; "10+" when absent, "6+" for P6SM
    pub visibility: String,
    pub visibility_meters: Option<u32>,
    pub vertical_visibility_feet: Option<u32>,
    pub altimeter_hpa: f64,
    pub sea_level_pressure_hpa: Option<f64>,
    pub sky_coverage: CloudCoverage,
    pub cloud_layers: Vec<CloudLayer>,
    pub flight_category: FlightCategory,
    pub present_weather: Vec<String>,
    pub remarks: Option<String>,
    pub raw_observation: String,
    /// Names of timestamp fields that fell back to the processing clock
    pub fallback_times: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Base,
    Fm,
    Becmg,
    Tempo,
    Prob,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "BASE",
            Self::Fm => "FM",
            Self::Becmg => "BECMG",
            Self::Tempo => "TEMPO",
            Self::Prob => "PROB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Icing,
    Turbulence,
}

/// Forecast icing (`6IhhhT`) or turbulence (`5BhhhT`) layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IcingTurbulence {
    #[serde(rename = "type")]
    pub kind: HazardKind,
    pub intensity: u8,
    pub base_feet: u32,
    pub top_feet: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemperatureKind {
    /// TX group
    Max,
    /// TN group
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TemperatureForecast {
    #[serde(rename = "type")]
    pub kind: TemperatureKind,
    pub temperature_celsius: i32,
    pub valid_time: Option<DecodedTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TafForecastPeriod {
    pub valid_from: DecodedTime,
    pub valid_to: DecodedTime,
    pub valid_from_timestamp: i64,
    pub valid_to_timestamp: i64,
    pub becomes_time: Option<DecodedTime>,
    pub change_type: ChangeType,
    pub probability_percent: Option<u8>,
    pub wind_direction_degrees: Option<u16>,
    pub wind_speed_knots: Option<u16>,
    pub wind_gust_knots: Option<u16>,
    pub wind_variable: bool,
    pub wind_shear_height_feet: Option<u32>,
    pub wind_shear_direction_degrees: Option<u16>,
    pub wind_shear_speed_knots: Option<u16>,
    /// Statute miles; a leading `P` becomes a `+` suffix ("6+")
    pub visibility: String,
    pub vertical_visibility_feet: Option<u32>,
    pub weather_phenomena: Option<String>,
    pub altimeter_hpa: Option<f64>,
    pub sky_coverage: CloudCoverage,
    pub cloud_layers: Vec<CloudLayer>,
    pub icing_turbulence: Vec<IcingTurbulence>,
    pub temperature_forecasts: Vec<TemperatureForecast>,
    pub flight_category: FlightCategory,
    pub raw_text: String,
    pub undecoded_remainder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TafRecord {
    pub station_id: String,
    #[serde(flatten)]
    pub station: StationInfo,
    /// AMD or COR
    pub amendment: Option<String>,
    pub bulletin_time: DecodedTime,
    pub issue_time: DecodedTime,
    pub valid_from: DecodedTime,
    pub valid_to: DecodedTime,
    pub valid_from_timestamp: i64,
    pub valid_to_timestamp: i64,
    pub forecast_periods: Vec<TafForecastPeriod>,
    pub remarks: Option<String>,
    pub raw_text: String,
    pub fallback_times: Vec<String>,
}

/// Hazard named by a SIGMET
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Phenomenon {
    SevereTurbulence,
    SevereIcing,
    SevereIcingFreezingRain,
    SevereMountainWave,
    /// Qualified thunderstorm code, e.g. `EMBD TS` or `FRQ TSGR`
    Thunderstorm(String),
    /// Mountain name is empty when the bulletin omits `MT <name>`
    VolcanicAshEruption { mountain: String },
    VolcanicAshCloud,
    TropicalCyclone { name: String },
    RadioactiveCloud,
}

impl Phenomenon {
    /// Short text code as written in the bulletin
    pub fn code(&self) -> String {
        match self {
            Self::SevereTurbulence => "SEV TURB".to_string(),
            Self::SevereIcing => "SEV ICE".to_string(),
            Self::SevereIcingFreezingRain => "SEV ICE (FZRA)".to_string(),
            Self::SevereMountainWave => "SEV MTW".to_string(),
            Self::Thunderstorm(code) => code.clone(),
            Self::VolcanicAshEruption { mountain } if mountain.is_empty() => "VA ERUPTION".to_string(),
            Self::VolcanicAshEruption { mountain } => format!("VA ERUPTION MT {mountain}"),
            Self::VolcanicAshCloud => "VA CLD".to_string(),
            Self::TropicalCyclone { name } => format!("TC {name}"),
            Self::RadioactiveCloud => "RDOACT CLD".to_string(),
        }
    }
}

impl Serialize for Phenomenon {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObservationKind {
    Obs,
    Fcst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigmetChange {
    Nc,
    Wkn,
    Intsf,
    Diss,
}

impl SigmetChange {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "NC" => Some(Self::Nc),
            "WKN" => Some(Self::Wkn),
            "INTSF" => Some(Self::Intsf),
            "DISS" => Some(Self::Diss),
            _ => None,
        }
    }
}

/// Decimal-degree position; south and west are negative
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SigmetRecord {
    pub identifier: Option<String>,
    pub fir: Option<String>,
    pub sequence: Option<String>,
    pub phenomenon: Option<Phenomenon>,
    pub observation_type: Option<ObservationKind>,
    /// HHMM
    pub observation_time: Option<String>,
    /// DDHHMM
    pub valid_from: Option<String>,
    /// DDHHMM
    pub valid_to: Option<String>,
    pub levels: Option<String>,
    pub movement: Option<String>,
    pub change: Option<SigmetChange>,
    pub area_description: Option<String>,
    pub area_polygon: Vec<GeoPoint>,
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UpperWindLevel {
    pub altitude_feet: u32,
    /// Absent for light and variable or missing data
    pub direction_degrees: Option<u16>,
    pub speed_knots: Option<u16>,
    pub temperature_celsius: Option<i32>,
}

/// One `VALID ... FOR USE ...` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpperWindPeriod {
    /// DDHHMMZ
    pub valid_time: String,
    /// e.g. "1800-0000"
    pub use_period: String,
    pub stations: BTreeMap<String, Vec<UpperWindLevel>>,
}

impl UpperWindPeriod {
    pub fn levels_for(&self, station: &str) -> &[UpperWindLevel] {
        self.stations.get(station).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// All periods one station appears in. Each period's `stations` map holds
/// only this station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpperWindRecord {
    pub station_id: String,
    pub periods: Vec<UpperWindPeriod>,
}

impl UpperWindRecord {
    /// Valid time of the first period, or empty
    pub fn valid_time(&self) -> &str {
        self.periods.first().map(|p| p.valid_time.as_str()).unwrap_or("")
    }

    pub fn use_period(&self) -> &str {
        self.periods.first().map(|p| p.use_period.as_str()).unwrap_or("")
    }

    /// (period, levels) pairs in period order
    pub fn levels(&self) -> impl Iterator<Item = (&UpperWindPeriod, &[UpperWindLevel])> {
        self.periods
            .iter()
            .map(move |p| (p, p.levels_for(&self.station_id)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Metar,
    Taf,
    Sigmet,
    UpperWind,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metar => "metar",
            Self::Taf => "taf",
            Self::Sigmet => "sigmet",
            Self::UpperWind => "upper_wind",
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "metar" => Ok(Self::Metar),
            "taf" => Ok(Self::Taf),
            "sigmet" => Ok(Self::Sigmet),
            "upper_wind" | "upper-wind" | "upperwind" => Ok(Self::UpperWind),
            other => Err(format!("unknown record kind: {other}")),
        }
    }
}

/// Any decoded record, tagged by kind when serialized
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedRecord {
    Metar(MetarRecord),
    Taf(TafRecord),
    Sigmet(SigmetRecord),
    UpperWind(UpperWindRecord),
}

impl DecodedRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Metar(_) => RecordKind::Metar,
            Self::Taf(_) => RecordKind::Taf,
            Self::Sigmet(_) => RecordKind::Sigmet,
            Self::UpperWind(_) => RecordKind::UpperWind,
        }
    }

    /// Station id, or the FIR for SIGMETs
    pub fn station(&self) -> Option<&str> {
        match self {
            Self::Metar(m) => Some(m.station_id.as_str()),
            Self::Taf(t) => Some(t.station_id.as_str()),
            Self::Sigmet(s) => s.fir.as_deref(),
            Self::UpperWind(u) => Some(u.station_id.as_str()),
        }
    }
}
