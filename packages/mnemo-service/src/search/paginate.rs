/// Page size bounds applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
	pub default_limit: u32,
	pub max_limit: u32,
}
impl PageLimits {
	pub fn from_config(cfg: &mnemo_config::Search) -> Self {
		Self { default_limit: cfg.default_limit, max_limit: cfg.max_limit }
	}

	pub fn resolve_limit(&self, requested: Option<i64>) -> usize {
		let max = i64::from(self.max_limit.max(1));

		requested.map(|limit| limit.clamp(1, max)).unwrap_or(i64::from(self.default_limit)) as usize
	}
}
impl Default for PageLimits {
	fn default() -> Self {
		Self { default_limit: 20, max_limit: mnemo_config::MAX_PAGE_LIMIT }
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pagination<'a, T> {
	pub results: &'a [T],
	pub total: usize,
	pub has_more: bool,
	pub next_offset: Option<usize>,
}

/// Slices one page out of a totally ordered list. Pages taken at `0, limit, 2 * limit, ...`
/// partition the list exactly.
pub fn paginate<'a, T>(
	ranked: &'a [T],
	offset: Option<i64>,
	limit: Option<i64>,
	limits: &PageLimits,
) -> Pagination<'a, T> {
	let total = ranked.len();
	let limit = limits.resolve_limit(limit);
	let offset = offset.unwrap_or(0).clamp(0, total as i64) as usize;
	let end = offset.saturating_add(limit).min(total);
	let has_more = offset + limit < total;

	Pagination {
		results: &ranked[offset..end],
		total,
		has_more,
		next_offset: has_more.then_some(offset + limit),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ranked(n: usize) -> Vec<usize> {
		(0..n).collect()
	}

	#[test]
	fn first_page_of_47_has_more() {
		let items = ranked(47);
		let page = paginate(&items, Some(0), Some(20), &PageLimits::default());

		assert_eq!(page.results.len(), 20);
		assert_eq!(page.total, 47);
		assert!(page.has_more);
		assert_eq!(page.next_offset, Some(20));
	}

	#[test]
	fn last_page_of_47_is_partial() {
		let items = ranked(47);
		let page = paginate(&items, Some(40), Some(20), &PageLimits::default());

		assert_eq!(page.results, &items[40..]);
		assert!(!page.has_more);
		assert_eq!(page.next_offset, None);
	}

	#[test]
	fn sequential_pages_partition_the_list() {
		let items = ranked(103);
		let limits = PageLimits::default();
		let mut collected = Vec::new();
		let mut offset = Some(0);

		while let Some(next) = offset {
			let page = paginate(&items, Some(next as i64), Some(20), &limits);

			collected.extend_from_slice(page.results);
			offset = page.next_offset;
		}

		assert_eq!(collected, items);
	}

	#[test]
	fn limit_and_offset_are_clamped() {
		let items = ranked(150);
		let limits = PageLimits::default();

		assert_eq!(paginate(&items, None, None, &limits).results.len(), 20);
		assert_eq!(paginate(&items, None, Some(0), &limits).results.len(), 1);
		assert_eq!(paginate(&items, None, Some(-5), &limits).results.len(), 1);
		assert_eq!(paginate(&items, None, Some(1_000), &limits).results.len(), 100);
		assert_eq!(paginate(&items, Some(-3), Some(10), &limits).results[0], 0);

		let past_end = paginate(&items, Some(500), Some(10), &limits);

		assert!(past_end.results.is_empty());
		assert!(!past_end.has_more);
		assert_eq!(past_end.next_offset, None);
	}

	#[test]
	fn empty_list_is_a_valid_page() {
		let items: Vec<usize> = Vec::new();
		let page = paginate(&items, Some(0), Some(20), &PageLimits::default());

		assert!(page.results.is_empty());
		assert_eq!(page.total, 0);
		assert!(!page.has_more);
	}
}
