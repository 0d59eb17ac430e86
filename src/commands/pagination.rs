use crate::domain::{Service, Track};
use crate::error::ServiceError;

/// Page size used when walking every page.
pub const CONTINUOUS_PAGE_SIZE: u32 = 50;

/// Which loved tracks a command works on, built once from `--limit` and `--page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    limit: u32,
    page: u32,
    continuous: bool,
}

impl Pagination {
    /// A limit of 0 means every page from `page` on, fetched [`CONTINUOUS_PAGE_SIZE`] at a time.
    pub fn new(limit: u32, page: u32) -> Self {
        let page = page.max(1);
        if limit == 0 {
            Self {
                limit: CONTINUOUS_PAGE_SIZE,
                page,
                continuous: true,
            }
        } else {
            Self {
                limit,
                page,
                continuous: false,
            }
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn pages(&self) -> LovedTrackPages {
        LovedTrackPages {
            pagination: *self,
            page: self.page,
            done: false,
        }
    }
}

/// Walks the loved tracks of a service page by page.
#[derive(Debug)]
pub struct LovedTrackPages {
    pagination: Pagination,
    page: u32,
    done: bool,
}

impl LovedTrackPages {
    /// Fetch the next page, or `None` once the walk is over. A continuous walk ends after the
    /// first page shorter than the limit, that page included.
    pub async fn next_page(
        &mut self,
        service: &mut dyn Service,
    ) -> Result<Option<Vec<Track>>, ServiceError> {
        if self.done {
            return Ok(None);
        }

        let limit = self.pagination.limit();
        log::debug!("Fetching page {} of {} loved tracks", self.page, service.name());
        let tracks = service.loved_tracks(limit, self.page).await?;

        match self.page.checked_add(1) {
            Some(next) if self.pagination.is_continuous() && tracks.len() >= limit as usize => {
                self.page = next;
            }
            _ => self.done = true,
        }

        Ok(Some(tracks))
    }
}
