//! Migration steps and the set bundled into the binary.
//!
//! Each step lives in `migrations/<N>_step.sql` and is embedded at compile
//! time. Adding a step means adding the file, appending it to `EMBEDDED`
//! and bumping `SCHEMA_VERSION`; the array length ties the two together.

use std::borrow::Cow;

use crate::error::MigrationError;

/// Schema version this binary expects the database to reach.
pub const SCHEMA_VERSION: u32 = 1;

const EMBEDDED: [&str; SCHEMA_VERSION as usize] = [include_str!("../migrations/1_step.sql")];

/// One ordered unit of schema change. Its SQL is executed verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    seq: u32,
    sql: Cow<'static, str>,
}

impl Step {
    pub fn new(seq: u32, sql: impl Into<Cow<'static, str>>) -> Self {
        Self {
            seq,
            sql: sql.into(),
        }
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Conventional resource name of this step.
    pub fn file_name(&self) -> String {
        format!("migrations/{}_step.sql", self.seq)
    }
}

/// Steps bundled with the binary, ordered 1..=SCHEMA_VERSION.
pub fn embedded_steps() -> Vec<Step> {
    EMBEDDED
        .iter()
        .zip(1..)
        .map(|(sql, seq)| Step::new(seq, *sql))
        .collect()
}

/// Steps must be numbered 1, 2, 3, ... in list order and carry some SQL.
pub(crate) fn validate_steps(steps: &[Step]) -> Result<(), MigrationError> {
    for (idx, step) in steps.iter().enumerate() {
        let expected = idx as u32 + 1;
        if step.seq != expected {
            return Err(MigrationError::InvalidSteps(format!(
                "expected step {expected} at position {idx}, found step {}",
                step.seq
            )));
        }
        if step.sql.trim().is_empty() {
            return Err(MigrationError::InvalidSteps(format!(
                "{} is empty",
                step.file_name()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_steps_are_contiguous_and_reach_target() {
        let steps = embedded_steps();
        assert_eq!(steps.len() as u32, SCHEMA_VERSION);
        validate_steps(&steps).unwrap();
        assert_eq!(steps.last().map(Step::seq), Some(SCHEMA_VERSION));
    }

    #[test]
    fn file_name_follows_convention() {
        assert_eq!(Step::new(12, "SELECT 1").file_name(), "migrations/12_step.sql");
    }

    #[test]
    fn rejects_gap() {
        let steps = vec![Step::new(1, "SELECT 1"), Step::new(3, "SELECT 1")];
        let err = validate_steps(&steps).unwrap_err();
        assert!(err.to_string().contains("expected step 2"), "{err}");
    }

    #[test]
    fn rejects_out_of_order_and_zero() {
        let reordered = vec![Step::new(2, "SELECT 1"), Step::new(1, "SELECT 1")];
        assert!(validate_steps(&reordered).is_err());

        let zero = vec![Step::new(0, "SELECT 1")];
        assert!(validate_steps(&zero).is_err());
    }

    #[test]
    fn rejects_blank_sql() {
        let steps = vec![Step::new(1, "  \n")];
        let err = validate_steps(&steps).unwrap_err();
        assert!(err.to_string().contains("migrations/1_step.sql"), "{err}");
    }

    #[test]
    fn empty_set_is_valid() {
        validate_steps(&[]).unwrap();
    }
}
