//! This module defines the `ActionQueue` trait, which provides an interface
//! for interacting with the underlying data store for queued game actions.
//! It abstracts enqueueing, claiming, and terminal status transitions.
use deeprun_shared::types::{ActionInput, ActionReceipt, ActionSubmission};
use uuid::Uuid;

use crate::errors::ActionQueueError;

/// A trait that defines the interface for interacting with the action queue.
///
/// Implementors of this trait provide methods for enqueueing submissions,
/// claiming the next runnable submission, and recording execution outcomes.
#[async_trait::async_trait]
pub trait ActionQueue: Send + Sync {
    /// Enqueues an action for a signer, deduplicating on the idempotency key.
    ///
    /// This asynchronous method persists a new submission in `queued` status.
    /// When the signer has already enqueued an action under the same
    /// idempotency key, the existing submission is returned unchanged instead
    /// of inserting a duplicate.
    ///
    /// # Arguments
    ///
    /// * `signer` - The wallet address submitting the action.
    /// * `idempotency_key` - Optional client-chosen deduplication key. A fresh
    ///   UUID is generated when absent.
    /// * `action` - The typed action payload to execute.
    ///
    /// # Returns
    ///
    /// A `Result` containing the stored `ActionSubmission` or an
    /// `ActionQueueError` if the insertion fails.
    async fn enqueue(
        &self,
        signer: &str,
        idempotency_key: Option<&str>,
        action: &ActionInput,
    ) -> Result<ActionSubmission, ActionQueueError>;

    /// Claims the next runnable submission and moves it to `running`.
    ///
    /// This asynchronous method selects the oldest submission in `queued` or
    /// `retry` status whose conflict key has no running occupant and no older
    /// waiting submission, locks it with `FOR UPDATE SKIP LOCKED`, and
    /// increments its attempt counter. Concurrent callers never receive the
    /// same submission.
    ///
    /// # Returns
    ///
    /// A `Result` containing `Some(ActionSubmission)` when a claim succeeded,
    /// `None` when nothing is runnable, or an `ActionQueueError` if the claim
    /// query fails.
    async fn claim_next(&self) -> Result<Option<ActionSubmission>, ActionQueueError>;

    /// Records a successful execution.
    ///
    /// This asynchronous method transitions the submission to `succeeded`,
    /// stores the receipt and its transaction hashes, and clears any error
    /// fields left over from earlier attempts.
    ///
    /// # Arguments
    ///
    /// * `action_id` - Identifier of the claimed submission.
    /// * `receipt` - The execution receipt to persist.
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or an `ActionQueueError` if the update fails.
    async fn mark_succeeded(
        &self,
        action_id: Uuid,
        receipt: &ActionReceipt,
    ) -> Result<(), ActionQueueError>;

    /// Schedules a failed execution for another attempt.
    ///
    /// This asynchronous method transitions the submission back to `retry`
    /// with the classification of the failure, making it claimable again.
    ///
    /// # Arguments
    ///
    /// * `action_id` - Identifier of the claimed submission.
    /// * `error_code` - Stable taxonomy code for the failure.
    /// * `error_message` - Human-readable failure detail.
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or an `ActionQueueError` if the update fails.
    async fn mark_retry(
        &self,
        action_id: Uuid,
        error_code: &str,
        error_message: &str,
    ) -> Result<(), ActionQueueError>;

    /// Records a terminal failure.
    ///
    /// This asynchronous method transitions the submission to `failed` with
    /// the classification of the failure. Failed submissions are never
    /// reclaimed.
    ///
    /// # Arguments
    ///
    /// * `action_id` - Identifier of the claimed submission.
    /// * `error_code` - Stable taxonomy code for the failure.
    /// * `error_message` - Human-readable failure detail.
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or an `ActionQueueError` if the update fails.
    async fn mark_failed(
        &self,
        action_id: Uuid,
        error_code: &str,
        error_message: &str,
    ) -> Result<(), ActionQueueError>;

    /// Fetches a submission by its identifier.
    async fn get_by_id(&self, action_id: Uuid) -> Result<Option<ActionSubmission>, ActionQueueError>;

    /// Fetches a submission by its signer and idempotency key.
    async fn get_by_signer_and_key(
        &self,
        signer: &str,
        idempotency_key: &str,
    ) -> Result<Option<ActionSubmission>, ActionQueueError>;

    /// Fetches the most recently enqueued submission targeting a character.
    async fn get_latest_by_character(
        &self,
        character_id: i64,
    ) -> Result<Option<ActionSubmission>, ActionQueueError>;
}
