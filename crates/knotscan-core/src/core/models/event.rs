use super::core_range::KnotCore;
use super::knot::KnotType;
use serde::Serialize;
use std::collections::BTreeMap;

const NO_LOOP_RATING: &str =
    "No rating. The knot core range of the native form of the structure was not given.";

/// How the knot was tied at its formation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormationMechanism {
    /// A free tail first threads the loop and is then pulled back through it.
    Slipknot,
    Direct,
}

impl FormationMechanism {
    pub fn code(self) -> u8 {
        match self {
            FormationMechanism::Slipknot => 0,
            FormationMechanism::Direct => 1,
        }
    }
}

/// Position of the knotted loop at formation, relative to a reference core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopBehavior {
    Tightens,
    InPlace,
    Expands,
}

impl LoopBehavior {
    pub fn code(self) -> u8 {
        match self {
            LoopBehavior::Tightens => 0,
            LoopBehavior::InPlace => 1,
            LoopBehavior::Expands => 2,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LoopBehavior::Tightens => "loop tightens",
            LoopBehavior::InPlace => "loop is in place",
            LoopBehavior::Expands => "loop expands",
        }
    }
}

/// A confirmed knotting event, keyed by the frame in which the knot formed.
///
/// Events start out tentative (type and unknotting frame only) and are enriched
/// by later pipeline stages. Stages replace records rather than mutating shared
/// state, so re-keying an event is just building a new record with another frame.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotEvent {
    pub formation_frame: usize,
    pub knot_type: KnotType,
    /// `None` means the knot persists to the end of the trajectory.
    pub unknotting_frame: Option<usize>,
    pub core: Option<KnotCore>,
    pub mechanism: Option<FormationMechanism>,
    pub loop_behavior: Option<LoopBehavior>,
}

impl KnotEvent {
    pub fn tentative(
        formation_frame: usize,
        knot_type: KnotType,
        unknotting_frame: Option<usize>,
    ) -> Self {
        Self {
            formation_frame,
            knot_type,
            unknotting_frame,
            core: None,
            mechanism: None,
            loop_behavior: None,
        }
    }

    /// Last frame covered by the event: the unknotting frame, or `max_frame` if it persists.
    #[inline]
    pub fn end_frame(&self, max_frame: usize) -> usize {
        self.unknotting_frame.unwrap_or(max_frame)
    }

    #[inline]
    pub fn duration(&self, max_frame: usize) -> usize {
        self.end_frame(max_frame)
            .saturating_sub(self.formation_frame)
    }

    pub fn rekeyed(self, formation_frame: usize) -> Self {
        Self {
            formation_frame,
            ..self
        }
    }

    pub fn with_core(self, core: Option<KnotCore>) -> Self {
        Self { core, ..self }
    }

    pub fn to_compact(&self) -> CompactEvent {
        CompactEvent(
            self.knot_type.clone(),
            self.unknotting_frame,
            self.core,
            self.mechanism.map(FormationMechanism::code),
            self.loop_behavior.map(LoopBehavior::code),
        )
    }

    pub fn to_detailed(&self) -> DetailedEvent {
        DetailedEvent {
            knot_type: self.knot_type.clone(),
            unknotting_frame: self.unknotting_frame,
            core: self.core,
            via_slipknot: self
                .mechanism
                .map(|m| m == FormationMechanism::Slipknot),
            loop_behavior: self
                .loop_behavior
                .map(LoopBehavior::description)
                .unwrap_or(NO_LOOP_RATING)
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Positional tuples with numeric mechanism and loop codes.
    #[default]
    Compact,
    /// Labeled records with human-readable values.
    Detailed,
}

/// `[knot type, unknotting frame, core, mechanism code, loop code]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompactEvent(
    pub KnotType,
    pub Option<usize>,
    pub Option<KnotCore>,
    pub Option<u8>,
    pub Option<u8>,
);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailedEvent {
    #[serde(rename = "Knot type")]
    pub knot_type: KnotType,
    #[serde(rename = "Unknotting frame")]
    pub unknotting_frame: Option<usize>,
    #[serde(rename = "Knot core range")]
    pub core: Option<KnotCore>,
    #[serde(rename = "Knotting via slipknot")]
    pub via_slipknot: Option<bool>,
    #[serde(rename = "Loop behavior")]
    pub loop_behavior: String,
}

/// Events keyed by formation frame, rendered in the requested [`OutputFormat`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KnotReport {
    Compact(BTreeMap<usize, CompactEvent>),
    Detailed(BTreeMap<usize, DetailedEvent>),
}

impl KnotReport {
    pub fn from_events(events: &[KnotEvent], format: OutputFormat) -> Self {
        match format {
            OutputFormat::Compact => KnotReport::Compact(
                events
                    .iter()
                    .map(|e| (e.formation_frame, e.to_compact()))
                    .collect(),
            ),
            OutputFormat::Detailed => KnotReport::Detailed(
                events
                    .iter()
                    .map(|e| (e.formation_frame, e.to_detailed()))
                    .collect(),
            ),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            KnotReport::Compact(map) => map.len(),
            KnotReport::Detailed(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished_event() -> KnotEvent {
        KnotEvent {
            formation_frame: 402,
            knot_type: KnotType::Trefoil,
            unknotting_frame: None,
            core: Some(KnotCore::new(10, 80)),
            mechanism: Some(FormationMechanism::Slipknot),
            loop_behavior: Some(LoopBehavior::InPlace),
        }
    }

    #[test]
    fn duration_uses_max_frame_for_persisting_knots() {
        let mut event = KnotEvent::tentative(400, KnotType::Trefoil, None);
        assert_eq!(event.duration(999), 599);
        event.unknotting_frame = Some(790);
        assert_eq!(event.duration(999), 390);
    }

    #[test]
    fn rekeying_carries_existing_fields() {
        let event = KnotEvent::tentative(400, KnotType::Trefoil, Some(800)).rekeyed(403);
        assert_eq!(event.formation_frame, 403);
        assert_eq!(event.unknotting_frame, Some(800));
        assert_eq!(event.knot_type, KnotType::Trefoil);
    }

    #[test]
    fn compact_report_serializes_positional_tuples() {
        let report = KnotReport::from_events(&[finished_event()], OutputFormat::Compact);
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json, r#"{"402":["3_1",null,[10,80],0,1]}"#);
    }

    #[test]
    fn detailed_report_uses_labels() {
        let report = KnotReport::from_events(&[finished_event()], OutputFormat::Detailed);
        let json = serde_json::to_value(&report).unwrap();
        let entry = &json["402"];
        assert_eq!(entry["Knot type"], "3_1");
        assert_eq!(entry["Knotting via slipknot"], true);
        assert_eq!(entry["Loop behavior"], "loop is in place");
    }

    #[test]
    fn detailed_report_notes_missing_reference() {
        let mut event = finished_event();
        event.loop_behavior = None;
        let detailed = event.to_detailed();
        assert!(detailed.loop_behavior.starts_with("No rating"));
    }
}
