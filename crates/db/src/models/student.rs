//! The `students` collection.
//!
//! Only the identity fields the allocation core needs. Cumulative progress
//! is never stored here; see `models::reservation::credited_minutes`.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub email: String,
}

/// Payload for creating a student record.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct CreateStudent {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email)]
    pub email: String,
}

impl CreateStudent {
    pub fn into_student(self) -> Student {
        Student {
            name: self.name,
            email: self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn valid_student_passes() {
        let payload = CreateStudent {
            name: "Aoi Tanaka".to_string(),
            email: "aoi@example.ac.jp".to_string(),
        };
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn bad_email_is_rejected() {
        let payload = CreateStudent {
            name: "Aoi Tanaka".to_string(),
            email: "not-an-email".to_string(),
        };
        assert!(payload.validate().is_err());
    }
}
