//! Inspection and decoding tools for bitser streams.
//!
//! bitser streams carry no framing or type information, so the only way to
//! look inside one is to replay the reads its writer's counterpart would make.
//! This crate provides:
//!
//! - Bit dumps of raw files
//! - A JSON read plan format and a decoder that replays it against a stream
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to see what the codec wrote.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use codec::{Session, SessionConfig, TypeRegistry, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An ordered list of reads to replay against a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadPlan {
    pub steps: Vec<PlanStep>,
}

/// One read, optionally labelled for the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub op: ReadOp,
}

/// The session read a plan step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ReadOp {
    UnsignedBits { bits: u32 },
    UnsignedMax { max: u32 },
    SignedBits { bits: u32 },
    SignedMax { max: u32 },
    Bool,
    F32,
    F64,
    SkipToByte,
    StringAscii,
    StringCompressed,
    StringMinimal,
    /// Object graph without custom types.
    Object,
}

impl ReadOp {
    /// Returns the plan name of this operation.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UnsignedBits { .. } => "unsigned_bits",
            Self::UnsignedMax { .. } => "unsigned_max",
            Self::SignedBits { .. } => "signed_bits",
            Self::SignedMax { .. } => "signed_max",
            Self::Bool => "bool",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::SkipToByte => "skip_to_byte",
            Self::StringAscii => "string_ascii",
            Self::StringCompressed => "string_compressed",
            Self::StringMinimal => "string_minimal",
            Self::Object => "object",
        }
    }
}

/// A decoded plan step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub op: &'static str,
    /// Bit offset the read started at.
    pub offset: usize,
    pub value: serde_json::Value,
}

/// Result of replaying a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeReport {
    pub fields: Vec<DecodedField>,
    pub bits_read: usize,
    pub bits_total: usize,
}

/// Replays `plan` against `bytes`.
///
/// Fails on the first read that fails, naming the step.
pub fn decode_with_plan(
    bytes: &[u8],
    plan: &ReadPlan,
    config: &SessionConfig,
) -> Result<DecodeReport> {
    let registry = TypeRegistry::new();
    let mut session = Session::new(config.clone());
    session
        .start_deserializing_with(bytes)
        .context("start deserializing")?;

    let mut fields = Vec::with_capacity(plan.steps.len());
    for (index, step) in plan.steps.iter().enumerate() {
        let offset = session.bit_position();
        let value = read_step(&mut session, step.op, &registry).with_context(|| {
            let label = step.name.as_deref().unwrap_or("unnamed");
            format!("step {index} ({label}: {}) at bit {offset}", step.op.name())
        })?;
        debug!(index, op = step.op.name(), offset, "decoded step");
        fields.push(DecodedField {
            name: step.name.clone(),
            op: step.op.name(),
            offset,
            value,
        });
    }

    let bits_read = session.bit_position();
    let bits_total = session.bits_written();
    session
        .finish_deserializing()
        .context("finish deserializing")?;
    Ok(DecodeReport {
        fields,
        bits_read,
        bits_total,
    })
}

fn read_step(
    session: &mut Session,
    op: ReadOp,
    registry: &TypeRegistry,
) -> codec::SessionResult<serde_json::Value> {
    let value = match op {
        ReadOp::UnsignedBits { bits } => session.get_unsigned_bits(bits)?.into(),
        ReadOp::UnsignedMax { max } => session.get_unsigned_max(max)?.into(),
        ReadOp::SignedBits { bits } => session.get_signed_bits(bits)?.into(),
        ReadOp::SignedMax { max } => session.get_signed_max(max)?.into(),
        ReadOp::Bool => session.get_bool()?.into(),
        ReadOp::F32 => session.get_f32()?.into(),
        ReadOp::F64 => session.get_f64()?.into(),
        ReadOp::SkipToByte => session.get_to_next_byte()?.into(),
        ReadOp::StringAscii => session.get_string_ascii()?.into(),
        ReadOp::StringCompressed => session.get_string_compressed()?.into(),
        ReadOp::StringMinimal => session.get_string_minimal()?.into(),
        ReadOp::Object => graph_to_json(&session.get_object(registry)?),
    };
    Ok(value)
}

/// Converts a decoded graph to JSON.
///
/// Arrays become JSON arrays and strings become JSON strings. Sets become
/// `{"set": [...]}` and mappings `{"mapping": [[key, value], ...]}` since
/// their keys need not be strings.
pub fn graph_to_json(value: &Value) -> serde_json::Value {
    use serde_json::json;

    match value {
        Value::Array(items) => items.iter().map(graph_to_json).collect(),
        Value::Set(items) => json!({ "set": items.iter().map(graph_to_json).collect::<Vec<_>>() }),
        Value::Mapping(entries) => json!({
            "mapping": entries
                .iter()
                .map(|(key, value)| json!([graph_to_json(key), graph_to_json(value)]))
                .collect::<Vec<_>>()
        }),
        Value::String(text) => text.as_str().into(),
        Value::Custom(object) => json!({ "custom": object.class_name() }),
    }
}

/// Renders a report as aligned text lines.
pub fn format_decode_pretty(report: &DecodeReport) -> String {
    let width = report
        .fields
        .iter()
        .map(|field| field.name.as_deref().map_or(0, str::len))
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for field in &report.fields {
        let name = field.name.as_deref().unwrap_or("");
        let _ = writeln!(
            out,
            "{:>6}  {name:<width$}  {:<17} {}",
            field.offset, field.op, field.value
        );
    }
    let _ = writeln!(
        out,
        "read {} of {} bits ({} unread)",
        report.bits_read,
        report.bits_total,
        report.bits_total - report.bits_read
    );
    out
}

/// Renders bytes as bits, one space between bytes and `bytes_per_line` bytes per line.
pub fn format_bits(bytes: &[u8], bytes_per_line: usize) -> String {
    let mut out = String::with_capacity(bytes.len() * 9);
    for (index, chunk) in bytes.chunks(bytes_per_line.max(1)).enumerate() {
        let _ = write!(out, "{:08x}:", index * bytes_per_line.max(1));
        for byte in chunk {
            let _ = write!(out, " {byte:08b}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stream() -> Vec<u8> {
        let mut session = Session::default();
        session.start_serializing().unwrap();
        session.add_unsigned_max(5, 7).unwrap();
        session.add_string_compressed("hi").unwrap();
        session
            .add_object(&Value::array([Value::from("a"), Value::set([Value::from("b")])]))
            .unwrap();
        session.finalize_serializing().unwrap().into_bytes()
    }

    #[test]
    fn plan_parses_from_json() {
        let plan: ReadPlan = serde_json::from_str(
            r#"{"steps": [
                {"op": "unsigned_max", "max": 7, "name": "kind"},
                {"op": "string_compressed"},
                {"op": "object"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.steps[0].op, ReadOp::UnsignedMax { max: 7 });
        assert_eq!(plan.steps[0].name.as_deref(), Some("kind"));
        assert_eq!(plan.steps[2].op, ReadOp::Object);
    }

    #[test]
    fn decode_replays_plan() {
        let plan = ReadPlan {
            steps: vec![
                PlanStep {
                    name: Some("kind".into()),
                    op: ReadOp::UnsignedMax { max: 7 },
                },
                PlanStep {
                    name: None,
                    op: ReadOp::StringCompressed,
                },
                PlanStep {
                    name: None,
                    op: ReadOp::Object,
                },
            ],
        };
        let report = decode_with_plan(&sample_stream(), &plan, &SessionConfig::default()).unwrap();
        assert_eq!(report.fields[0].value, serde_json::json!(5));
        assert_eq!(report.fields[1].value, serde_json::json!("hi"));
        assert_eq!(report.fields[1].offset, 3);
        assert_eq!(
            report.fields[2].value,
            serde_json::json!(["a", { "set": ["b"] }])
        );
        assert!(report.bits_read <= report.bits_total);
        assert!(format_decode_pretty(&report).contains("kind"));
    }

    #[test]
    fn decode_failure_names_step() {
        let plan = ReadPlan {
            steps: vec![PlanStep {
                name: Some("huge".into()),
                op: ReadOp::UnsignedBits { bits: 32 },
            }],
        };
        let err = decode_with_plan(&[0xFF], &plan, &SessionConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("step 0 (huge: unsigned_bits)"));
    }

    #[test]
    fn bits_are_grouped_by_byte() {
        assert_eq!(
            format_bits(&[0b1011_0000, 0xFF, 0x01], 2),
            "00000000: 10110000 11111111\n00000002: 00000001\n"
        );
    }
}
