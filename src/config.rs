//! Run configuration, assembled from the command line.

use crate::model::families::FamilyRules;
use crate::model::plan::WarningMarkers;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Overrides the name carried by the feed.
    pub name: Option<String>,
    pub family: FamilyRules,
    pub markers: WarningMarkers,
    /// Call stack frames whose class contains one of these are dropped.
    pub ignored_frame_classes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: None,
            family: FamilyRules::default(),
            markers: WarningMarkers::default(),
            ignored_frame_classes: vec!["JLog".to_string()],
        }
    }
}
