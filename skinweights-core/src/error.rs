use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkinError {
    #[error("no object selected")]
    NoSelection,

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("no shape connected to {0}")]
    NoShapeConnected(String),

    #[error("no skin binding connected to {0}")]
    NoBindingFound(String),

    #[error("vert count mismatch: {found} != {expected}")]
    VertCountMismatch { expected: usize, found: usize },

    #[error("influence not found on binding: {0}")]
    UnknownInfluence(String),

    #[error("source and target influence are the same: {0}")]
    SameInfluence(String),

    #[error("percent must be within [0, 100], got {0}")]
    PercentOutOfRange(f64),

    #[error("vertex {index} out of range (vertex count {count})")]
    VertexOutOfRange { index: usize, count: usize },

    #[error("malformed skin record: {0}")]
    MalformedRecord(String),

    #[error("malformed scene: {0}")]
    MalformedScene(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SkinError>;

/// Non-fatal correspondence gaps collected while an operation runs.
///
/// Fuzzy imports, mirroring and copying never abort on a missing vertex or influence
/// counterpart; they record it here and the caller reports the aggregate afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationReport {
    /// Vertices that received new weights.
    pub written: usize,
    pub unmatched_vertices: Vec<usize>,
    pub unmatched_influences: Vec<String>,
}

impl OperationReport {
    pub fn unmatched_vertex(&mut self, index: usize) {
        self.unmatched_vertices.push(index);
    }

    pub fn unmatched_influence(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.unmatched_influences.contains(&name) {
            self.unmatched_influences.push(name);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.unmatched_vertices.is_empty() && self.unmatched_influences.is_empty()
    }

    /// Emit the aggregate warnings for whatever went unmatched.
    pub fn log_gaps(&self, operation: &str) {
        if !self.unmatched_influences.is_empty() {
            log::warn!(
                "{}: {} influence(s) had no counterpart and were skipped: {}",
                operation,
                self.unmatched_influences.len(),
                self.unmatched_influences.join(", ")
            );
        }
        if !self.unmatched_vertices.is_empty() {
            log::warn!("{}: no match for {} vertices", operation, self.unmatched_vertices.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmatched_influences_are_deduplicated() {
        let mut report = OperationReport::default();
        report.unmatched_influence("L_arm");
        report.unmatched_influence("L_arm");
        report.unmatched_influence("spine");
        assert_eq!(report.unmatched_influences, vec!["L_arm", "spine"]);
        assert!(!report.is_complete());
    }

    #[test]
    fn mismatch_message_names_both_counts() {
        let err = SkinError::VertCountMismatch { expected: 8, found: 6 };
        assert_eq!(err.to_string(), "vert count mismatch: 6 != 8");
    }
}
