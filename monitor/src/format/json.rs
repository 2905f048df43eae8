use super::LineFormatter;
use crate::{
    FleetError,
    Metric,
    StatField,
    StatLine,
};
use chrono::SecondsFormat;
use serde::{
    ser::SerializeMap as _,
    Serialize,
    Serializer,
};
use strum::IntoEnumIterator as _;

/// One JSON object per stat line, one line per object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineFormatter;

impl LineFormatter for JsonLineFormatter {
    fn format(&mut self, lines: &[StatLine]) -> Result<String, FleetError> {
        let mut out = String::new();
        for line in lines {
            let record = serde_json::to_string(&JsonLine(line)).map_err(FleetError::Format)?;
            out.push_str(&record);
            out.push('\n');
        }
        Ok(out)
    }
}

struct JsonLine<'a>(&'a StatLine);

impl Serialize for JsonLine<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let line = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("host", &line.host)?;
        map.serialize_entry("time", &line.time.to_rfc3339_opts(SecondsFormat::Secs, true))?;
        if let Some(set) = &line.replica_set {
            map.serialize_entry("set", set)?;
        }
        if let Some(role) = &line.role {
            map.serialize_entry("repl", &role.to_string())?;
        }

        if let Some(error) = &line.error {
            map.serialize_entry("error", &error.to_string())?;
            return map.end();
        }
        for field in StatField::iter() {
            match line.metric(field) {
                Metric::Absolute(value) => map.serialize_entry(field.name(), &value)?,
                Metric::Rate(value) => map.serialize_entry(field.name(), &value)?,
                Metric::Unavailable => map.serialize_entry(field.name(), &())?,
            }
        }
        map.end()
    }
}
