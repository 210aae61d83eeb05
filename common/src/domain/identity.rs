use nutype::nutype;

/// Server assigned article id
#[nutype(
    validate(greater = 0),
    derive(
        Clone,
        Copy,
        Debug,
        Display,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Hash,
        Serialize,
        Deserialize
    )
)]
pub struct ArticleId(i32);

/// Whether the draft already has a persisted counterpart.
/// Once assigned it never goes back to `Unassigned`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemoteIdentity {
    #[default]
    Unassigned,
    Assigned(ArticleId),
}

impl RemoteIdentity {
    pub fn id(&self) -> Option<ArticleId> {
        match self {
            RemoteIdentity::Unassigned => None,
            RemoteIdentity::Assigned(id) => Some(*id),
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, RemoteIdentity::Assigned(_))
    }

    /// Returns false and keeps the current id when one is already assigned
    pub fn assign(&mut self, id: ArticleId) -> bool {
        match self {
            RemoteIdentity::Unassigned => {
                *self = RemoteIdentity::Assigned(id);
                true
            }
            RemoteIdentity::Assigned(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_id_must_be_positive() {
        assert!(ArticleId::try_new(0).is_err());
        assert!(ArticleId::try_new(-4).is_err());
        assert_eq!(ArticleId::try_new(42).unwrap().into_inner(), 42);
    }

    #[test]
    fn test_identity_is_assigned_only_once() {
        let first = ArticleId::try_new(42).unwrap();
        let second = ArticleId::try_new(43).unwrap();

        let mut identity = RemoteIdentity::default();
        assert_eq!(identity.id(), None);

        assert!(identity.assign(first));
        assert!(!identity.assign(second));
        assert_eq!(identity, RemoteIdentity::Assigned(first));
    }
}
