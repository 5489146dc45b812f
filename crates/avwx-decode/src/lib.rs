//! Decoders for aviation weather bulletins
//!
//! Every field is a named rule (see `rules`) matched independently against
//! the bulletin text, so a malformed group only loses that field. Decoding
//! never fails: the worst outcome is a record of defaults with
//! `fallback_times` flagging the timestamps that could not be read.

pub mod context;
pub mod metar;
mod rules;
pub mod scrape;
pub mod sigmet;
pub mod taf;
pub mod upper_wind;

use std::collections::BTreeMap;

use avwx_core::{MetarRecord, SigmetRecord, TafRecord, UpperWindRecord};

pub use context::DecodeContext;
pub use scrape::{DecodedBatch, ScrapePayload};
pub use upper_wind::decode_cell;

/// Decode a METAR/SPECI on the wall clock
pub fn decode_metar(raw_bulletin: &str, station_id: Option<&str>, extraction_time: Option<&str>) -> MetarRecord {
    metar::decode(&DecodeContext::current(), raw_bulletin, station_id, extraction_time)
}

pub fn decode_metar_with(
    ctx: &DecodeContext,
    raw_bulletin: &str,
    station_id: Option<&str>,
    extraction_time: Option<&str>,
) -> MetarRecord {
    metar::decode(ctx, raw_bulletin, station_id, extraction_time)
}

/// Decode a TAF on the wall clock
pub fn decode_taf(raw_bulletin: &str, station_id: Option<&str>, extraction_time: Option<&str>) -> TafRecord {
    taf::decode(&DecodeContext::current(), raw_bulletin, station_id, extraction_time)
}

pub fn decode_taf_with(
    ctx: &DecodeContext,
    raw_bulletin: &str,
    station_id: Option<&str>,
    extraction_time: Option<&str>,
) -> TafRecord {
    taf::decode(ctx, raw_bulletin, station_id, extraction_time)
}

/// Decode every `=`-terminated advisory in a SIGMET block
pub fn decode_sigmet_block(raw_text: &str) -> Vec<SigmetRecord> {
    sigmet::decode_block(raw_text)
}

/// Decode an upper-wind bulletin into per-station records
pub fn decode_upper_wind_bulletin(raw_text: &str) -> BTreeMap<String, UpperWindRecord> {
    upper_wind::decode_bulletin(&DecodeContext::current(), raw_text)
}

pub fn decode_upper_wind_bulletin_with(ctx: &DecodeContext, raw_text: &str) -> BTreeMap<String, UpperWindRecord> {
    upper_wind::decode_bulletin(ctx, raw_text)
}

/// Decode several upper-wind bulletins into one per-station map
pub fn merge_upper_wind<'a, I>(ctx: &DecodeContext, bulletins: I) -> BTreeMap<String, UpperWindRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    upper_wind::merge(ctx, bulletins)
}

/// Decode a whole scrape payload
pub fn decode_scrape(ctx: &DecodeContext, payload: &ScrapePayload) -> DecodedBatch {
    scrape::decode(ctx, payload)
}
