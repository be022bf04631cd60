/// Aggregate over a trailing window of present quote samples.
///
/// Samples arrive oldest first with missing trading days already removed, so
/// the slice may be shorter than the requested period or empty.
pub trait WindowIndicator {
    /// Name used in Gondola text
    fn alias(&self) -> &'static str;

    /// Value of the aggregate over `samples`.
    fn calculate(&self, samples: &[f64]) -> f64;
}
