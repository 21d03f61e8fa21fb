//! BAM encoding of simulated reads.

use noodles::sam;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::record_buf::{QualityScores, RecordBuf, Sequence};
use noodles::sam::header::record::value::{Map, map::Program};

/// Integer tag carrying the number of injected T>C conversions of a read.
pub const CONVERSION_TAG: [u8; 2] = *b"TC";

const BASE_QUALITY: u8 = 30;

pub fn unmapped_header() -> sam::Header {
    sam::Header::builder()
        .set_header(Default::default())
        .add_program(env!("CARGO_PKG_NAME"), Map::<Program>::default())
        .build()
}

pub fn unmapped_record(name: &str, sequence: &[u8], conversions: u32) -> RecordBuf {
    let mut record = RecordBuf::default();
    record.name_mut().replace(name.into());
    *record.flags_mut() = Flags::UNMAPPED;
    *record.sequence_mut() = Sequence::from(sequence.to_vec());
    *record.quality_scores_mut() = QualityScores::from(vec![BASE_QUALITY; sequence.len()]);
    record.data_mut().insert(
        Tag::from(CONVERSION_TAG),
        Value::Int32(conversions as i32),
    );
    record
}

/// Integer value of the conversion tag, whatever width it was stored with.
#[cfg(test)]
pub fn conversion_count(record: &RecordBuf) -> Option<i64> {
    match record.data().get(&Tag::from(CONVERSION_TAG))? {
        Value::Int8(n) => Some(*n as i64),
        Value::UInt8(n) => Some(*n as i64),
        Value::Int16(n) => Some(*n as i64),
        Value::UInt16(n) => Some(*n as i64),
        Value::Int32(n) => Some(*n as i64),
        Value::UInt32(n) => Some(*n as i64),
        _ => None,
    }
}
