/// Suspends the calling task once, handing control back to the scheduler so other tasks on
/// the same thread (repaints, input handling) get to run before training resumes.
pub async fn next_frame() {
    tokio::task::yield_now().await;
}
