//! Single-line share strings for player-authored levels.
//!
//! A share string reads `BC1.<body>.<checksum>`. The body is URL-safe,
//! unpadded base64 of a JSON envelope `{"version":1,"level":{...}}` and the
//! checksum is the FNV-1a hash of the body as eight lowercase hex digits.

use std::ops::RangeInclusive;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use prismatic_core::Difficulty;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::format::{LevelFile, GRID_MODE};

/// Prefix identifying the share format.
pub const SHARE_PREFIX: &str = "BC1";
/// Envelope version written and accepted.
pub const SHARE_VERSION: u32 = 1;
/// Longest share string accepted, in bytes.
pub const MAX_SHARE_LENGTH: usize = 12_000;
/// Accepted grid width and height.
pub const GRID_RANGE: RangeInclusive<u32> = 4..=24;
/// Most fixed pieces a shared level may carry.
pub const MAX_FIXED: usize = 240;
/// Most walls a shared level may carry.
pub const MAX_WALLS: usize = 360;

const TICK_RANGE: RangeInclusive<u32> = 40..=800;
const BOUNCE_RANGE: RangeInclusive<u32> = 8..=512;

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

const DEFAULT_ID: &str = "CUST";
const DEFAULT_TITLE: &str = "Custom level";
const DEFAULT_SUBTITLE: &str = "Created by a player";
const DEFAULT_OBJECTIVE: &str = "Light every receiver and satisfy the rules";
const DEFAULT_HINT: &str = "Connect first, then tune the timing";
const DEFAULT_DESIGNER_NOTE: &str = "Shared custom level";

#[derive(Serialize, Deserialize)]
struct Envelope {
    version: u32,
    level: LevelFile,
}

/// Errors raised while producing or reading share strings.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The input was empty.
    #[error("share string is empty")]
    Empty,
    /// The input exceeded [`MAX_SHARE_LENGTH`].
    #[error("share string is {0} bytes, the limit is 12000")]
    TooLong(usize),
    /// The input is not `BC1.<body>.<checksum>`.
    #[error("share string is not of the form BC1.<body>.<checksum>")]
    Malformed,
    /// The checksum does not match the body.
    #[error("share checksum {found} does not match {expected}")]
    ChecksumMismatch {
        /// Checksum carried by the string.
        found: String,
        /// Checksum computed from the body.
        expected: String,
    },
    /// The body is not valid base64.
    #[error("could not decode share body: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded body is not a valid envelope.
    #[error("could not parse share payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The envelope carries another version.
    #[error("share version {0} is not supported")]
    UnsupportedVersion(u32),
    /// The level uses a grid mode other than D8.
    #[error("grid mode '{0}' is not supported, expected D8")]
    UnsupportedMode(String),
    /// The grid is smaller than 4 or larger than 24 on a side.
    #[error("grid {width}x{height} is outside 4..=24")]
    GridOutOfRange {
        /// Columns.
        width: u32,
        /// Rows.
        height: u32,
    },
    /// More than [`MAX_FIXED`] fixed pieces.
    #[error("{0} fixed pieces exceed the limit of 240")]
    TooManyFixed(usize),
    /// More than [`MAX_WALLS`] walls.
    #[error("{0} walls exceed the limit of 360")]
    TooManyWalls(usize),
    /// The level could not be serialized.
    #[error("could not serialize level: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Normalizes `level` and encodes it as a share string.
pub fn encode_share(level: &LevelFile) -> Result<String, ShareError> {
    let envelope = Envelope {
        version: SHARE_VERSION,
        level: validate_and_normalize(level.clone())?,
    };
    let json = serde_json::to_vec(&envelope).map_err(ShareError::Serialize)?;
    let body = URL_SAFE_NO_PAD.encode(json);
    let checksum = fnv1a(&body);
    Ok(format!("{SHARE_PREFIX}.{body}.{checksum}"))
}

/// Decodes a share string into a normalized level.
///
/// Surrounding whitespace is ignored, but counts toward the length limit.
pub fn parse_share(value: &str) -> Result<LevelFile, ShareError> {
    if value.is_empty() {
        return Err(ShareError::Empty);
    }
    if value.len() > MAX_SHARE_LENGTH {
        return Err(ShareError::TooLong(value.len()));
    }

    let mut parts = value.trim().split('.');
    let (Some(prefix), Some(body), Some(checksum)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ShareError::Malformed);
    };
    if prefix != SHARE_PREFIX || body.is_empty() || checksum.is_empty() {
        return Err(ShareError::Malformed);
    }

    let expected = fnv1a(body);
    if checksum != expected {
        return Err(ShareError::ChecksumMismatch {
            found: checksum.to_owned(),
            expected,
        });
    }

    let bytes = URL_SAFE_NO_PAD.decode(body.as_bytes())?;
    let envelope: Envelope = serde_json::from_slice(&bytes).map_err(ShareError::InvalidPayload)?;
    if envelope.version != SHARE_VERSION {
        return Err(ShareError::UnsupportedVersion(envelope.version));
    }
    validate_and_normalize(envelope.level)
}

/// Checks the structural limits of a shared level and fills its defaults.
///
/// Shared levels are always custom, their fixed pieces are locked, and
/// their budgets are clamped into the ranges the catalog supports.
pub fn validate_and_normalize(mut level: LevelFile) -> Result<LevelFile, ShareError> {
    if level.mode != GRID_MODE {
        return Err(ShareError::UnsupportedMode(level.mode));
    }
    let (width, height) = (level.grid.w, level.grid.h);
    if !GRID_RANGE.contains(&width) || !GRID_RANGE.contains(&height) {
        return Err(ShareError::GridOutOfRange { width, height });
    }
    if level.fixed.len() > MAX_FIXED {
        return Err(ShareError::TooManyFixed(level.fixed.len()));
    }
    if level.walls.len() > MAX_WALLS {
        return Err(ShareError::TooManyWalls(level.walls.len()));
    }

    fill(&mut level.id, DEFAULT_ID);
    fill(&mut level.title, DEFAULT_TITLE);
    fill_optional(&mut level.subtitle, DEFAULT_SUBTITLE);
    fill_optional(&mut level.objective, DEFAULT_OBJECTIVE);
    fill_optional(&mut level.hint, DEFAULT_HINT);
    fill_optional(&mut level.designer_note, DEFAULT_DESIGNER_NOTE);
    level.difficulty = Difficulty::Custom;

    for (index, piece) in level.fixed.iter_mut().enumerate() {
        if piece.id.as_deref().map_or(true, str::is_empty) {
            piece.id = Some(format!("custom-fixed-{index}"));
        }
        piece.fixed = Some(true);
        piece.locked = Some(true);
    }
    if level.blocked_cells.is_none() {
        level.blocked_cells = Some(Vec::new());
    }

    let mut rules = level.rules.take().unwrap_or_default();
    rules.max_ticks = rules.max_ticks.clamp(*TICK_RANGE.start(), *TICK_RANGE.end());
    rules.max_bounces = rules
        .max_bounces
        .clamp(*BOUNCE_RANGE.start(), *BOUNCE_RANGE.end());
    level.rules = Some(rules);

    Ok(level)
}

fn fill(field: &mut String, default: &str) {
    if field.is_empty() {
        *field = default.to_owned();
    }
}

fn fill_optional(field: &mut Option<String>, default: &str) {
    if field.as_deref().map_or(true, str::is_empty) {
        *field = Some(default.to_owned());
    }
}

fn fnv1a(body: &str) -> String {
    let hash = body.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    format!("{hash:08x}")
}

#[cfg(test)]
mod tests {
    use prismatic_core::PieceType;

    use super::*;
    use crate::format::{GridRecord, PieceRecord, RulesRecord};

    fn custom_level() -> LevelFile {
        let mut level = LevelFile::from_json(r#"{"grid":{"w":6,"h":5},"mode":"D8"}"#)
            .unwrap_or_else(|error| panic!("literal level should parse: {error}"));
        level.fixed = vec![
            PieceRecord::new(PieceType::Source, 0, 2, 0),
            PieceRecord::new(PieceType::RecvR, 5, 2, 4),
        ];
        level
    }

    #[test]
    fn checksum_matches_reference_values() {
        assert_eq!(fnv1a(""), "811c9dc5");
        assert_eq!(fnv1a("a"), "e40c292c");
        assert_eq!(fnv1a("foobar"), "bf9cf968");
    }

    #[test]
    fn share_round_trip_normalizes_the_level() {
        let share = encode_share(&custom_level())
            .unwrap_or_else(|error| panic!("encode should succeed: {error}"));
        assert!(share.starts_with("BC1."));
        assert!(
            !share.contains(|c| matches!(c, '+' | '/' | '=')),
            "body must be URL safe"
        );

        let decoded =
            parse_share(&share).unwrap_or_else(|error| panic!("decode should succeed: {error}"));
        assert_eq!(decoded.id, "CUST");
        assert_eq!(decoded.title, "Custom level");
        assert_eq!(decoded.hint.as_deref(), Some("Connect first, then tune the timing"));
        assert_eq!(decoded.difficulty, Difficulty::Custom);
        assert_eq!(decoded.fixed[1].id.as_deref(), Some("custom-fixed-1"));
        assert!(decoded
            .fixed
            .iter()
            .all(|piece| piece.fixed == Some(true) && piece.locked == Some(true)));
        assert_eq!(decoded.rules, Some(RulesRecord::default()));
    }

    #[test]
    fn only_empty_texts_fall_back_to_defaults() {
        let mut level = custom_level();
        level.title = "  ".to_owned();
        level.hint = Some(String::new());
        level.subtitle = Some(" ".to_owned());

        let normalized = validate_and_normalize(level)
            .unwrap_or_else(|error| panic!("level should validate: {error}"));
        assert_eq!(normalized.title, "  ", "whitespace titles are kept as given");
        assert_eq!(normalized.subtitle.as_deref(), Some(" "));
        assert_eq!(
            normalized.hint.as_deref(),
            Some("Connect first, then tune the timing")
        );
        assert_eq!(normalized.id, "CUST");
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let share = encode_share(&custom_level())
            .unwrap_or_else(|error| panic!("encode should succeed: {error}"));
        assert!(parse_share(&format!("  {share}\n")).is_ok());
    }

    #[test]
    fn tampered_body_fails_the_checksum() {
        let share = encode_share(&custom_level())
            .unwrap_or_else(|error| panic!("encode should succeed: {error}"));
        let mut parts: Vec<String> = share.split('.').map(str::to_owned).collect();
        let flipped = if parts[1].ends_with('A') { 'B' } else { 'A' };
        let _ = parts[1].pop();
        parts[1].push(flipped);

        let result = parse_share(&parts.join("."));
        assert!(matches!(result, Err(ShareError::ChecksumMismatch { .. })));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert!(matches!(parse_share(""), Err(ShareError::Empty)));
        assert!(matches!(parse_share("BC1.abc"), Err(ShareError::Malformed)));
        assert!(matches!(parse_share("BC2.abc.def"), Err(ShareError::Malformed)));
        assert!(matches!(parse_share("BC1..811c9dc5"), Err(ShareError::Malformed)));
        let long = "x".repeat(MAX_SHARE_LENGTH + 1);
        assert!(matches!(parse_share(&long), Err(ShareError::TooLong(12_001))));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let body = URL_SAFE_NO_PAD.encode(
            r#"{"version":2,"level":{"grid":{"w":6,"h":6},"mode":"D8"}}"#.as_bytes(),
        );
        let share = format!("BC1.{body}.{}", fnv1a(&body));
        assert!(matches!(
            parse_share(&share),
            Err(ShareError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn structural_limits_are_enforced() {
        let mut level = custom_level();
        level.grid = GridRecord { w: 3, h: 10 };
        assert!(matches!(
            validate_and_normalize(level),
            Err(ShareError::GridOutOfRange {
                width: 3,
                height: 10
            })
        ));

        let mut level = custom_level();
        level.fixed = vec![PieceRecord::new(PieceType::Mirror, 1, 1, 0); MAX_FIXED + 1];
        assert!(matches!(
            validate_and_normalize(level),
            Err(ShareError::TooManyFixed(241))
        ));

        let mut level = custom_level();
        level.mode = "D4".to_owned();
        assert!(matches!(
            validate_and_normalize(level),
            Err(ShareError::UnsupportedMode(_))
        ));
    }

    #[test]
    fn budgets_are_clamped() {
        let mut level = custom_level();
        level.rules = Some(RulesRecord {
            max_ticks: 5_000,
            max_bounces: 1,
            ..RulesRecord::default()
        });
        let normalized = validate_and_normalize(level)
            .unwrap_or_else(|error| panic!("level should normalize: {error}"));
        let rules = normalized.rules.unwrap_or_default();
        assert_eq!(rules.max_ticks, 800);
        assert_eq!(rules.max_bounces, 8);
    }
}
