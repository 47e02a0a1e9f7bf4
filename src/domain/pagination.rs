use super::PaginationError;

/// ページ指定（オフセットと件数）
///
/// 不変条件：offset >= 0, limit > 0。コンストラクタで保証する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    offset: i64,
    limit: i64,
}

impl Page {
    pub fn new(offset: i64, limit: i64) -> Result<Self, PaginationError> {
        if offset < 0 {
            return Err(PaginationError::NegativeOffset(offset));
        }
        if limit <= 0 {
            return Err(PaginationError::NonPositiveLimit(limit));
        }
        Ok(Self { offset, limit })
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// インメモリでのskip/take用
    pub fn bounds(&self) -> (usize, usize) {
        (
            usize::try_from(self.offset).unwrap_or(usize::MAX),
            usize::try_from(self.limit).unwrap_or(usize::MAX),
        )
    }
}
