//! Batches captured by the acquisition layer
//!
//! The scraper writes one JSON document per run:
//!
//! ```json
//! {"weather_data": {
//!    "METAR": {"CYVR": [{"bulletin": "...", "extraction_time": "..."}]},
//!    "TAF":   {"CYVR": [{"bulletin": "...", "extraction_time": "..."}]},
//!    "Upper_Wind": [{"bulletin": "..."}],
//!    "SIGMET": [{"bulletin": "..."}, "..."]}}
//! ```
//!
//! Sections the decoders do not handle (NOTAM, per-station upper-wind
//! copies) are ignored.

use std::collections::BTreeMap;

use avwx_core::{DecodedRecord, MetarRecord, SigmetRecord, TafRecord, UpperWindRecord};
use serde::{Deserialize, Serialize};

use crate::context::DecodeContext;
use crate::{metar, sigmet, taf, upper_wind};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulletinEntry {
    pub bulletin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_time: Option<String>,
}

/// SIGMET entries come either wrapped like the others or as bare text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SigmetEntry {
    Entry(BulletinEntry),
    Text(String),
}

impl SigmetEntry {
    pub fn text(&self) -> &str {
        match self {
            Self::Entry(entry) => &entry.bulletin,
            Self::Text(text) => text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    #[serde(rename = "METAR", default)]
    pub metar: BTreeMap<String, Vec<BulletinEntry>>,
    #[serde(rename = "TAF", default)]
    pub taf: BTreeMap<String, Vec<BulletinEntry>>,
    #[serde(rename = "Upper_Wind", default)]
    pub upper_wind: Vec<BulletinEntry>,
    #[serde(rename = "SIGMET", default)]
    pub sigmet: Vec<SigmetEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapePayload {
    #[serde(default)]
    pub weather_data: WeatherData,
}

/// Decoded contents of one scrape, grouped per station
#[derive(Debug, Clone, Default, Serialize)]
pub struct DecodedBatch {
    pub metar: BTreeMap<String, Vec<MetarRecord>>,
    pub taf: BTreeMap<String, Vec<TafRecord>>,
    pub sigmet: Vec<SigmetRecord>,
    pub upper_wind: BTreeMap<String, UpperWindRecord>,
}

impl DecodedBatch {
    /// Number of records across all sections
    pub fn len(&self) -> usize {
        self.metar.values().map(Vec::len).sum::<usize>()
            + self.taf.values().map(Vec::len).sum::<usize>()
            + self.sigmet.len()
            + self.upper_wind.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into sink records: METAR, TAF, SIGMET, then upper wind
    pub fn records(&self) -> Vec<DecodedRecord> {
        let mut records = Vec::with_capacity(self.len());
        records.extend(self.metar.values().flatten().cloned().map(DecodedRecord::Metar));
        records.extend(self.taf.values().flatten().cloned().map(DecodedRecord::Taf));
        records.extend(self.sigmet.iter().cloned().map(DecodedRecord::Sigmet));
        records.extend(self.upper_wind.values().cloned().map(DecodedRecord::UpperWind));
        records
    }
}

/// Run every decoder over a scrape payload
pub fn decode(ctx: &DecodeContext, payload: &ScrapePayload) -> DecodedBatch {
    let data = &payload.weather_data;
    let mut batch = DecodedBatch::default();

    for (station, entries) in &data.metar {
        let records = entries
            .iter()
            .filter(|e| !e.bulletin.trim().is_empty())
            .map(|e| metar::decode(ctx, &e.bulletin, Some(station), e.extraction_time.as_deref()))
            .collect::<Vec<_>>();
        if !records.is_empty() {
            batch.metar.insert(station.clone(), records);
        }
    }

    for (station, entries) in &data.taf {
        let records = entries
            .iter()
            .filter(|e| !e.bulletin.trim().is_empty())
            .map(|e| taf::decode(ctx, &e.bulletin, Some(station), e.extraction_time.as_deref()))
            .collect::<Vec<_>>();
        if !records.is_empty() {
            batch.taf.insert(station.clone(), records);
        }
    }

    batch.sigmet = data
        .sigmet
        .iter()
        .flat_map(|entry| sigmet::decode_block(entry.text()))
        .collect();

    batch.upper_wind = upper_wind::merge(ctx, data.upper_wind.iter().map(|e| e.bulletin.as_str()));

    tracing::debug!(
        metar = batch.metar.len(),
        taf = batch.taf.len(),
        sigmet = batch.sigmet.len(),
        upper_wind = batch.upper_wind.len(),
        "decoded scrape batch"
    );
    batch
}
