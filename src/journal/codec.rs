//! Two-phase event codec: phase 1 tolerantly peeks `{timestamp, event,
//! ScanType?}`; phase 2 re-parses the same line into the concrete record for
//! that tag. Unrecognised tags are accepted and ignored, never rejected.

use time::OffsetDateTime;

use super::events::*;
use crate::error::CodecError;

/// A parsed line: its timestamp plus the concrete event payload, or
/// `Unrecognised` for any tag outside the recognised set.
#[derive(Clone, Debug)]
pub struct JournalEvent {
    pub timestamp: OffsetDateTime,
    pub kind: EventKind,
}

#[derive(Clone, Debug)]
pub enum EventKind {
    FsdTarget(FsdTargetEvent),
    StartJump(StartJumpEvent),
    FsdJump(FsdJumpEvent),
    Location(LocationEvent),
    FssDiscoveryScan(FssDiscoveryScanEvent),
    FssBodySignals(FssBodySignalsEvent),
    SaaSignalsFound(SaaSignalsFoundEvent),
    FssAllBodiesFound(FssAllBodiesFoundEvent),
    Scan(ScanEvent),
    ScanBaryCentre(ScanBaryCentreEvent),
    SaaScanComplete(SaaScanCompleteEvent),
    FuelScoop(FuelScoopEvent),
    Loadout(LoadoutEvent),
    Cargo(CargoEvent),
    MissionAccepted(MissionAcceptedEvent),
    MissionCompleted(MissionStatusChangeEvent),
    MissionFailed(MissionStatusChangeEvent),
    MissionAbandoned(MissionStatusChangeEvent),
    MissionRedirected(MissionRedirectedEvent),
    Missions(MissionsEvent),
    NavRoute(NavRouteEvent),
    NavRouteClear,
    Unrecognised(String),
}

fn excerpt_around(line: &str, offset: usize) -> String {
    const RADIUS: usize = 40;
    let start = offset.saturating_sub(RADIUS);
    let end = (offset + RADIUS).min(line.len());
    let start = line.floor_char_boundary(start);
    let end = line.ceil_char_boundary(end.max(start));
    line[start..end].to_string()
}

trait FloorCeilCharBoundary {
    fn floor_char_boundary(&self, idx: usize) -> usize;
    fn ceil_char_boundary(&self, idx: usize) -> usize;
}

impl FloorCeilCharBoundary for str {
    fn floor_char_boundary(&self, mut idx: usize) -> usize {
        while idx > 0 && !self.is_char_boundary(idx) {
            idx -= 1;
        }
        idx
    }

    fn ceil_char_boundary(&self, mut idx: usize) -> usize {
        while idx < self.len() && !self.is_char_boundary(idx) {
            idx += 1;
        }
        idx
    }
}

fn schema_mismatch(tag: &str, source: serde_json::Error) -> CodecError {
    CodecError::SchemaMismatch { tag: tag.to_string(), source }
}

/// Parses one journal line into a `JournalEvent`. Malformed JSON yields
/// `CodecError::MalformedJson`; a recognised tag whose fields don't coerce
/// yields `CodecError::SchemaMismatch`; any other tag becomes
/// `EventKind::Unrecognised` rather than an error.
pub fn parse_line(line: &str) -> Result<JournalEvent, CodecError> {
    let generic: GenericEvent = serde_json::from_str(line).map_err(|e| CodecError::MalformedJson {
        offset: e.column(),
        excerpt: excerpt_around(line, e.column()),
    })?;

    let kind = match generic.event.as_str() {
        "FSDTarget" => EventKind::FsdTarget(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "StartJump" => EventKind::StartJump(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "FSDJump" => EventKind::FsdJump(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "Location" => EventKind::Location(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "FSSDiscoveryScan" => EventKind::FssDiscoveryScan(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "FSSBodySignals" => EventKind::FssBodySignals(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "SAASignalsFound" => EventKind::SaaSignalsFound(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "FSSAllBodiesFound" => EventKind::FssAllBodiesFound(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "Scan" => EventKind::Scan(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "ScanBaryCentre" => EventKind::ScanBaryCentre(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "SAAScanComplete" => EventKind::SaaScanComplete(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "FuelScoop" => EventKind::FuelScoop(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "Loadout" => EventKind::Loadout(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "Cargo" => EventKind::Cargo(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "MissionAccepted" => EventKind::MissionAccepted(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "MissionCompleted" => EventKind::MissionCompleted(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "MissionFailed" => EventKind::MissionFailed(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "MissionAbandoned" => EventKind::MissionAbandoned(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "MissionRedirected" => EventKind::MissionRedirected(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "Missions" => EventKind::Missions(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "NavRoute" => EventKind::NavRoute(
            serde_json::from_str(line).map_err(|e| schema_mismatch(&generic.event, e))?,
        ),
        "NavRouteClear" => EventKind::NavRouteClear,
        other => EventKind::Unrecognised(other.to_string()),
    };

    Ok(JournalEvent { timestamp: generic.timestamp, kind })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognised_tag_is_silently_ignored() {
        let line = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"SomeFutureEventWeDontKnowAbout","Extra":123}"#;
        let parsed = parse_line(line).unwrap();
        assert!(matches!(parsed.kind, EventKind::Unrecognised(tag) if tag == "SomeFutureEventWeDontKnowAbout"));
    }

    #[test]
    fn malformed_json_reports_offset_and_excerpt() {
        let line = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"FSDTarget","#;
        let err = parse_line(line).unwrap_err();
        assert!(matches!(err, CodecError::MalformedJson { .. }));
    }

    #[test]
    fn recognised_tag_with_bad_fields_is_schema_mismatch() {
        let line = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"FSDTarget","SystemAddress":"not-a-number","StarClass":"K","name":"Sys"}"#;
        let err = parse_line(line).unwrap_err();
        assert!(matches!(err, CodecError::SchemaMismatch { tag, .. } if tag == "FSDTarget"));
    }

    #[test]
    fn scan_event_parses_star_and_planet_shapes() {
        let star_line = r#"{"timestamp":"2024-01-01T00:00:00Z","event":"Scan","BodyName":"Sys A","BodyID":0,"SystemAddress":42,"StarSystem":"Sys","DistanceFromArrivalLS":0.0,"StarType":"K","Radius":1.0}"#;
        let parsed = parse_line(star_line).unwrap();
        match parsed.kind {
            EventKind::Scan(scan) => assert!(scan.is_star()),
            other => panic!("expected Scan, got {other:?}"),
        }
    }
}
