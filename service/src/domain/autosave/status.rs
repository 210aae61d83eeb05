use serde::Serialize;

/// Where the draft stands relative to the remote store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum ReconciliationStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    /// last save was rejected; cleared by the next successful save
    Failed(String),
}

impl ReconciliationStatus {
    pub fn is_saving(&self) -> bool {
        matches!(self, ReconciliationStatus::Saving)
    }
}

/// Flags the authoring form renders its spinner and "saved" badge from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveIndicator {
    pub saving: bool,
    pub saved: bool,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&ReconciliationStatus> for SaveIndicator {
    fn from(status: &ReconciliationStatus) -> Self {
        match status {
            ReconciliationStatus::Idle => SaveIndicator::default(),
            ReconciliationStatus::Saving => SaveIndicator {
                saving: true,
                ..SaveIndicator::default()
            },
            ReconciliationStatus::Saved => SaveIndicator {
                saved: true,
                ..SaveIndicator::default()
            },
            ReconciliationStatus::Failed(message) => SaveIndicator {
                failed: true,
                message: Some(message.clone()),
                ..SaveIndicator::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_status_is_visible() {
        let indicator = SaveIndicator::from(&ReconciliationStatus::Failed("offline".into()));

        assert!(indicator.failed);
        assert!(!indicator.saved);
        assert_eq!(indicator.message.as_deref(), Some("offline"));
    }

    #[test]
    fn test_idle_and_failed_are_distinct() {
        assert_ne!(
            SaveIndicator::from(&ReconciliationStatus::Idle),
            SaveIndicator::from(&ReconciliationStatus::Failed(String::new()))
        );
    }
}
