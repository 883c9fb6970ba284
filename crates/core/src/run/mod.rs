pub mod event;
pub mod request;
pub mod sequence;

pub use event::{CanonicalEvent, MessageRole};
pub use request::{ExecutionRequest, ExecutionResponse};
pub use sequence::{check_event_sequence, SequenceViolation};
