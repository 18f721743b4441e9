//! Suspension checkpoints
//!
//! A checkpoint is the serialized continuation of a suspended execution:
//! the cursor into the stored order, the armed breakpoint, and the
//! single-use token that authorizes the next resume. The continuation is
//! data, not captured control flow.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Index into the stored node order of the next node to process
    pub cursor: usize,

    /// Armed breakpoint line, carried across resume segments
    pub breakpoint: Option<u32>,

    /// Valid for exactly one resume call
    pub resume_token: String,

    /// Length of the action log when this checkpoint was written; a resume
    /// segment returns only records past this mark
    pub log_watermark: usize,
}

impl Checkpoint {
    pub fn new(cursor: usize, breakpoint: Option<u32>, log_watermark: usize) -> Self {
        Self {
            cursor,
            breakpoint,
            resume_token: Uuid::new_v4().to_string(),
            log_watermark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_per_checkpoint() {
        let a = Checkpoint::new(0, None, 0);
        let b = Checkpoint::new(0, None, 0);
        assert_ne!(a.resume_token, b.resume_token);
    }
}
