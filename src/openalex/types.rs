use serde::Deserialize;

/// The parts of `GET /works/pmid:{pmid}` that enrichment reads.
#[derive(Deserialize, Debug)]
pub struct Work {
    pub id: Option<String>,
    #[serde(default)]
    pub ids: WorkIds,
}

/// External identifiers of a work. `mag` has been served both as a string and
/// as a bare number.
#[derive(Deserialize, Debug, Default)]
pub struct WorkIds {
    pub mag: Option<serde_json::Value>,
}

impl Work {
    /// Microsoft Academic Graph id, if OpenAlex knows one.
    pub fn mag_id(&self) -> Option<String> {
        match self.ids.mag.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
