//! Page cursor and request tickets.

use crate::error::{FeedError, FeedResult};
use std::fmt;

/// Which page a load targets, relative to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The page after the current one.
    Next,
    /// The page before the current one.
    Previous,
    /// The current page again.
    Current,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Next => "next",
            Direction::Previous => "previous",
            Direction::Current => "current",
        };
        f.write_str(name)
    }
}

/// Identifies one issued page request.
///
/// Only the ticket with the latest generation may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    /// Page requested.
    pub page: u32,
    /// Generation of the request.
    pub generation: u64,
}

/// Tracks the position within the remote paginated collection.
///
/// `current_page` moves as soon as a navigation is issued; `loaded_page` is
/// the page whose content the store actually holds. A failed latest request
/// moves `current_page` back to `loaded_page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    current_page: u32,
    page_size: u32,
    loaded_page: Option<u32>,
    generation: u64,
    in_flight: Option<u64>,
}

impl PageCursor {
    /// Creates a cursor on page 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            loaded_page: None,
            generation: 0,
            in_flight: None,
        }
    }

    /// Returns the current page (1-indexed).
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Returns the page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the page whose content is loaded, if any.
    pub fn loaded_page(&self) -> Option<u32> {
        self.loaded_page
    }

    /// Returns true while a request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Returns the last page for a collection of `total_count` posts.
    pub fn last_page(&self, total_count: u64) -> u32 {
        let pages = total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Issues a request for the page in `direction`.
    ///
    /// Moves `current_page` immediately and supersedes any outstanding
    /// request.
    pub fn begin(&mut self, direction: Direction, total_count: u64) -> FeedResult<PageTicket> {
        let page = match direction {
            Direction::Current => self.current_page,
            Direction::Next => {
                let last_page = self.last_page(total_count);
                let requested = i64::from(self.current_page) + 1;
                if requested > i64::from(last_page) {
                    return Err(FeedError::PageOutOfRange {
                        requested,
                        last_page,
                    });
                }
                self.current_page + 1
            }
            Direction::Previous => {
                if self.current_page <= 1 {
                    return Err(FeedError::PageOutOfRange {
                        requested: i64::from(self.current_page) - 1,
                        last_page: self.last_page(total_count),
                    });
                }
                self.current_page - 1
            }
        };

        self.current_page = page;
        self.generation += 1;
        self.in_flight = Some(self.generation);

        Ok(PageTicket {
            page,
            generation: self.generation,
        })
    }

    /// Issues a request for page 1, wherever the cursor currently is.
    pub fn restart(&mut self) -> PageTicket {
        self.current_page = 1;
        self.generation += 1;
        self.in_flight = Some(self.generation);

        PageTicket {
            page: 1,
            generation: self.generation,
        }
    }

    /// Returns true if `ticket` is the outstanding latest request.
    pub fn is_latest(&self, ticket: &PageTicket) -> bool {
        self.in_flight == Some(ticket.generation)
    }

    /// Settles a successful request. Returns false if it was superseded.
    pub fn complete(&mut self, ticket: &PageTicket) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.in_flight = None;
        self.loaded_page = Some(ticket.page);
        true
    }

    /// Settles a failed request. Returns false if it was superseded.
    pub fn fail(&mut self, ticket: &PageTicket) -> bool {
        if !self.is_latest(ticket) {
            return false;
        }
        self.in_flight = None;
        self.current_page = self.loaded_page.unwrap_or(1);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_rounds_up() {
        let cursor = PageCursor::new(2);
        assert_eq!(cursor.last_page(0), 0);
        assert_eq!(cursor.last_page(1), 1);
        assert_eq!(cursor.last_page(2), 1);
        assert_eq!(cursor.last_page(3), 2);
    }

    #[test]
    fn next_and_previous_move_immediately() {
        let mut cursor = PageCursor::new(2);
        let ticket = cursor.begin(Direction::Next, 6).unwrap();

        assert_eq!(ticket.page, 2);
        assert_eq!(cursor.current_page(), 2);
        assert!(cursor.is_loading());
        assert!(cursor.complete(&ticket));
        assert_eq!(cursor.loaded_page(), Some(2));

        let ticket = cursor.begin(Direction::Previous, 6).unwrap();
        assert_eq!(ticket.page, 1);
        assert_eq!(cursor.current_page(), 1);
    }

    #[test]
    fn bounds_are_enforced() {
        let mut cursor = PageCursor::new(2);
        let err = cursor.begin(Direction::Previous, 4).unwrap_err();
        assert_eq!(
            err,
            FeedError::PageOutOfRange {
                requested: 0,
                last_page: 2
            }
        );

        let ticket = cursor.begin(Direction::Next, 4).unwrap();
        cursor.complete(&ticket);
        assert!(matches!(
            cursor.begin(Direction::Next, 4),
            Err(FeedError::PageOutOfRange { requested: 3, .. })
        ));
        assert_eq!(cursor.current_page(), 2);
        assert!(!cursor.is_loading());
    }

    #[test]
    fn newer_request_supersedes_older() {
        let mut cursor = PageCursor::new(2);
        let first = cursor.begin(Direction::Next, 10).unwrap();
        let second = cursor.begin(Direction::Next, 10).unwrap();

        assert!(!cursor.is_latest(&first));
        assert!(!cursor.complete(&first));
        assert_eq!(cursor.loaded_page(), None);

        assert!(cursor.complete(&second));
        assert_eq!(cursor.loaded_page(), Some(3));
        assert!(!cursor.complete(&second));
    }

    #[test]
    fn failure_reverts_to_loaded_page() {
        let mut cursor = PageCursor::new(2);
        let initial = cursor.begin(Direction::Current, 0).unwrap();
        cursor.complete(&initial);

        let ticket = cursor.begin(Direction::Next, 6).unwrap();
        assert_eq!(cursor.current_page(), 2);
        assert!(cursor.fail(&ticket));
        assert_eq!(cursor.current_page(), 1);
        assert!(!cursor.is_loading());
    }

    #[test]
    fn restart_returns_to_first_page() {
        let mut cursor = PageCursor::new(2);
        let ticket = cursor.begin(Direction::Next, 10).unwrap();
        cursor.complete(&ticket);

        let restart = cursor.restart();
        assert_eq!(restart.page, 1);
        assert_eq!(cursor.current_page(), 1);
        assert!(cursor.is_latest(&restart));
    }

    #[test]
    fn stale_failure_is_ignored() {
        let mut cursor = PageCursor::new(2);
        let first = cursor.begin(Direction::Next, 10).unwrap();
        let _second = cursor.begin(Direction::Next, 10).unwrap();

        assert!(!cursor.fail(&first));
        assert_eq!(cursor.current_page(), 3);
        assert!(cursor.is_loading());
    }
}
