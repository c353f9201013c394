use crate::domain::{Decision, UserId};

/// Inline keyboard (buttons attached to a message).
#[derive(Clone, Debug)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            callback_data: action.encode(),
        }
    }
}

impl InlineKeyboard {
    /// Single-row keyboard.
    pub fn row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }
}

/// Typed callback payloads carried in button data.
///
/// Wire form: `apply`, `approve:<user_id>`, `reject:<user_id>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Apply,
    Decide {
        decision: Decision,
        applicant: UserId,
    },
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Apply => "apply".to_string(),
            CallbackAction::Decide {
                decision: Decision::Approve,
                applicant,
            } => format!("approve:{}", applicant.0),
            CallbackAction::Decide {
                decision: Decision::Reject,
                applicant,
            } => format!("reject:{}", applicant.0),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        if data == "apply" {
            return Some(CallbackAction::Apply);
        }

        let (verb, id) = data.split_once(':')?;
        let applicant = UserId(id.parse::<i64>().ok()?);
        let decision = match verb {
            "approve" => Decision::Approve,
            "reject" => Decision::Reject,
            _ => return None,
        };
        Some(CallbackAction::Decide {
            decision,
            applicant,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_round_trip() {
        let cases = [
            CallbackAction::Apply,
            CallbackAction::Decide {
                decision: Decision::Approve,
                applicant: UserId(42),
            },
            CallbackAction::Decide {
                decision: Decision::Reject,
                applicant: UserId(-100123),
            },
        ];
        for action in cases {
            assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
        }
    }

    #[test]
    fn callback_rejects_garbage() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("approve"), None);
        assert_eq!(CallbackAction::parse("approve:abc"), None);
        assert_eq!(CallbackAction::parse("ban:42"), None);
    }
}
