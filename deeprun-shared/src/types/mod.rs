mod action;
mod log;
mod receipt;
mod submission;

pub use action::{ActionInput, EquipObjective};
pub use log::{DecodedLog, WorldEvent};
pub use receipt::{ActionReceipt, ReceiptDetails, StageLatency};
pub use submission::{ActionStatus, ActionSubmission};
