pub mod schema;

use crate::error::Result;
pub use schema::SkinConfig;

pub fn load_from_yaml_str(s: &str) -> Result<SkinConfig> {
    let config: SkinConfig = serde_yaml::from_str(s)?;
    Ok(config)
}

pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<SkinConfig> {
    let data = std::fs::read_to_string(path)?;
    load_from_yaml_str(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::MirrorSide;
    use crate::geometry::Axis;

    #[test]
    fn empty_document_uses_defaults() {
        let config = load_from_yaml_str("{}").unwrap();
        assert_eq!(config, SkinConfig::default());
        assert_eq!(config.markers.left, "L_");
        assert_eq!(config.import.world_threshold, 0.0);
    }

    #[test]
    fn partial_overrides() {
        let yaml = r#"
markers:
  left: "lf_"
mirror:
  axis: z
  side: both
import:
  world_threshold: 0.01
"#;
        let config = load_from_yaml_str(yaml).unwrap();
        assert_eq!(config.markers.left, "lf_");
        assert_eq!(config.markers.right, "R_");
        assert_eq!(config.mirror.axis, Axis::Z);
        assert_eq!(config.mirror.side, MirrorSide::Both);
        assert_eq!(config.import.world_threshold, 0.01);
        assert_eq!(config.mirror_options().axis, Axis::Z);
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skin.yaml");
        std::fs::write(&path, "normalize:\n  epsilon: 0.001\n").unwrap();
        let config = load_from_path(&path).unwrap();
        assert_eq!(config.normalize.epsilon, 0.001);
    }

    #[test]
    fn rejects_unknown_axis() {
        assert!(load_from_yaml_str("mirror:\n  axis: w\n").is_err());
    }
}
