use gosafe_common::ids::ReportId;
use gosafe_common::types::{Coordinate, Report, ReportCategory};
use gosafe_common::GoSafeError;

/// Modal workflow turning an anchored selection into a report.
///
/// The composer only builds reports; the session appends them and clears
/// its selection.
#[derive(Debug)]
pub struct ReportComposer {
    anchor: Option<Coordinate>,
    next_id: ReportId,
}

impl ReportComposer {
    pub fn new() -> Self {
        Self {
            anchor: None,
            next_id: ReportId::FIRST,
        }
    }

    /// Open the form for `selection`. Re-opening moves the anchor.
    pub fn open(&mut self, selection: Coordinate) {
        self.anchor = Some(selection);
    }

    pub fn is_open(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<Coordinate> {
        self.anchor
    }

    /// Build a report at the anchor and close the form.
    ///
    /// Fails with `NoActiveSelection` when the form was never opened.
    pub fn submit(
        &mut self,
        category: ReportCategory,
        note: Option<String>,
    ) -> Result<Report, GoSafeError> {
        let anchor = self.anchor.take().ok_or(GoSafeError::NoActiveSelection)?;

        let id = self.next_id;
        self.next_id = id.next();

        Ok(Report::new(id, anchor, category, note))
    }

    /// Close the form, discarding input. Returns the anchor it was open for.
    pub fn cancel(&mut self) -> Option<Coordinate> {
        self.anchor.take()
    }
}

impl Default for ReportComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_without_open_fails() {
        let mut composer = ReportComposer::new();
        let err = composer
            .submit(ReportCategory::Danger, Some("test".into()))
            .unwrap_err();
        assert!(matches!(err, GoSafeError::NoActiveSelection));
        assert!(!composer.is_open());
    }

    #[test]
    fn test_submit_closes_and_issues_monotonic_ids() {
        let mut composer = ReportComposer::new();
        let here = Coordinate::new(43.8806, 12.9956);

        composer.open(here);
        let first = composer.submit(ReportCategory::Danger, Some("test".into())).unwrap();
        assert_eq!(first.coordinate, here);
        assert_eq!(first.category, ReportCategory::Danger);
        assert_eq!(first.note.as_deref(), Some("test"));
        assert!(!composer.is_open());

        composer.open(here);
        let second = composer.submit(ReportCategory::Weather, None).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_cancel_discards() {
        let mut composer = ReportComposer::new();
        let here = Coordinate::new(1.0, 2.0);
        composer.open(here);
        assert_eq!(composer.cancel(), Some(here));
        assert!(composer.submit(ReportCategory::Stray, None).is_err());
        assert_eq!(composer.cancel(), None);
    }
}
