use crate::error::FieldError;

/// A single user's vote on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

impl From<VoteValue> for i32 {
    fn from(value: VoteValue) -> Self {
        value.as_i32()
    }
}

impl TryFrom<i32> for VoteValue {
    type Error = FieldError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            _ => Err(FieldError::new("value", "vote value must be 1 or -1")),
        }
    }
}

/// The current vote row for a (user, post) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    pub user_id: i32,
    pub post_id: i32,
    pub value: VoteValue,
}

/// What casting a vote changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Inserted,
    Flipped,
    Unchanged,
}

/// Writes needed to move from the stored vote to the requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePlan {
    Insert { delta: i32 },
    Flip { delta: i32 },
    Keep,
}

impl VotePlan {
    pub fn decide(existing: Option<VoteValue>, requested: VoteValue) -> Self {
        match existing {
            None => Self::Insert {
                delta: requested.as_i32(),
            },
            Some(current) if current != requested => Self::Flip {
                delta: 2 * requested.as_i32(),
            },
            Some(_) => Self::Keep,
        }
    }

    pub fn outcome(self) -> VoteOutcome {
        match self {
            Self::Insert { .. } => VoteOutcome::Inserted,
            Self::Flip { .. } => VoteOutcome::Flipped,
            Self::Keep => VoteOutcome::Unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_value_parsing() {
        assert_eq!(VoteValue::try_from(1).unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);

        for bad in [0, 2, -2, i32::MAX] {
            let err = VoteValue::try_from(bad).unwrap_err();
            assert_eq!(err.field, "value");
        }
    }

    #[test]
    fn test_first_vote_inserts_with_unit_delta() {
        assert_eq!(
            VotePlan::decide(None, VoteValue::Up),
            VotePlan::Insert { delta: 1 }
        );
        assert_eq!(
            VotePlan::decide(None, VoteValue::Down),
            VotePlan::Insert { delta: -1 }
        );
    }

    #[test]
    fn test_flip_moves_score_by_two() {
        assert_eq!(
            VotePlan::decide(Some(VoteValue::Up), VoteValue::Down),
            VotePlan::Flip { delta: -2 }
        );
        assert_eq!(
            VotePlan::decide(Some(VoteValue::Down), VoteValue::Up),
            VotePlan::Flip { delta: 2 }
        );
    }

    #[test]
    fn test_same_vote_is_kept() {
        let plan = VotePlan::decide(Some(VoteValue::Down), VoteValue::Down);
        assert_eq!(plan, VotePlan::Keep);
        assert_eq!(plan.outcome(), VoteOutcome::Unchanged);
    }
}
