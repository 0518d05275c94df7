//! Request-local interleaving of backend lanes into one ordered list.
//!
//! Nothing here outlives a request. Deep pages are reached by replaying the placement rule from
//! position zero, so every request with the same inputs places the same records.

use std::collections::VecDeque;

use crate::{
	CallKind, RawRecord, ResultSet,
	dispatch::Dispatcher,
	fetch::{BackendFailure, BackendTarget},
};

/// A message a backend attached to one of its responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BackendMessage {
	pub(crate) backend_id: String,
	pub(crate) label: String,
	pub(crate) message: String,
}

pub(crate) struct MergeOutput {
	pub(crate) placed: Vec<RawRecord>,
	pub(crate) failures: Vec<BackendFailure>,
	pub(crate) messages: Vec<BackendMessage>,
}

struct Lane {
	target: BackendTarget,
	total: usize,
	/// Records from this lane already placed.
	offset: usize,
	/// Fetched records not yet placed, starting at `offset`.
	buffer: VecDeque<RawRecord>,
	disabled: bool,
}
impl Lane {
	fn has_more(&self) -> bool {
		!self.disabled && self.offset < self.total
	}
}

pub(crate) struct MergeEngine<'a> {
	dispatcher: &'a Dispatcher,
	lanes: Vec<Lane>,
	available: Vec<String>,
	pinned: Vec<String>,
	block_size: usize,
	placed: Vec<RawRecord>,
	failures: Vec<BackendFailure>,
	messages: Vec<BackendMessage>,
}
impl<'a> MergeEngine<'a> {
	pub(crate) fn new(
		dispatcher: &'a Dispatcher,
		sets: Vec<(BackendTarget, ResultSet)>,
		block_size: usize,
		initial_results: &[String],
	) -> Self {
		let mut lanes = Vec::with_capacity(sets.len());
		let mut messages = Vec::new();

		for (target, set) in sets {
			collect_messages(&mut messages, &target, &set.errors);

			let buffer = retag(&target.id, set.records).collect();

			lanes.push(Lane { total: set.total, offset: 0, buffer, disabled: false, target });
		}

		let available: Vec<String> = lanes.iter().map(|lane| lane.target.id.clone()).collect();
		let pinned = initial_results.iter().filter(|id| available.contains(id)).cloned().collect();

		Self {
			dispatcher,
			lanes,
			available,
			pinned,
			block_size: block_size.max(1),
			placed: Vec::new(),
			failures: Vec::new(),
			messages,
		}
	}

	/// Places prefetched records until `fetch_limit` positions are filled or the preferred lane
	/// runs dry. Performs no I/O.
	pub(crate) fn seed(&mut self, fetch_limit: usize) {
		while self.placed.len() < fetch_limit {
			let Some(index) = self.preferred_lane(self.placed.len()) else {
				break;
			};
			let Some(record) = self.lanes[index].buffer.pop_front() else {
				break;
			};

			self.placed.push(record);
		}
	}

	/// Rebuilds each lane's consumed count from the placed records.
	pub(crate) fn replay(&mut self) {
		for lane in &mut self.lanes {
			lane.offset = 0;
		}

		for record in &self.placed {
			if let Some(lane) = self.lanes.iter_mut().find(|lane| lane.target.id == record.backend_id)
			{
				lane.offset += 1;
			}
		}
	}

	/// Places records up to position `end`, fetching pages on demand. Stops early once every lane
	/// is exhausted.
	pub(crate) async fn fill(&mut self, end: usize) {
		while self.placed.len() < end {
			let preferred = self.preferred_lane(self.placed.len());
			let mut record = match preferred {
				Some(index) => self.next_record(index).await,
				None => None,
			};

			if record.is_none() {
				for index in 0..self.lanes.len() {
					if Some(index) == preferred {
						continue;
					}

					record = self.next_record(index).await;

					if record.is_some() {
						break;
					}
				}
			}

			let Some(record) = record else {
				break;
			};

			self.placed.push(record);
		}
	}

	pub(crate) fn placed_len(&self) -> usize {
		self.placed.len()
	}

	pub(crate) fn finish(self) -> MergeOutput {
		MergeOutput { placed: self.placed, failures: self.failures, messages: self.messages }
	}

	fn preferred_lane(&self, position: usize) -> Option<usize> {
		let id = preferred_backend(position, self.block_size, &self.available, &self.pinned)?;

		self.lanes.iter().position(|lane| lane.target.id == id)
	}

	async fn next_record(&mut self, index: usize) -> Option<RawRecord> {
		if !self.lanes[index].has_more() {
			return None;
		}
		if self.lanes[index].buffer.is_empty() {
			self.fetch_page(index).await;
		}

		let lane = &mut self.lanes[index];
		let record = lane.buffer.pop_front()?;

		lane.offset += 1;

		Some(record)
	}

	async fn fetch_page(&mut self, index: usize) {
		let lane = &self.lanes[index];
		let offset = lane.offset;
		let limit = self.block_size;

		tracing::debug!(backend_id = %lane.target.id, offset, limit, "Fetching on-demand page.");

		let result = self
			.dispatcher
			.call(
				&lane.target.id,
				lane.target.backend.as_ref(),
				CallKind::Search { offset, limit },
				&lane.target.query,
				&lane.target.params,
			)
			.await;
		let lane = &mut self.lanes[index];

		match result {
			Ok(set) => {
				collect_messages(&mut self.messages, &lane.target, &set.errors);

				if set.records.is_empty() {
					lane.total = lane.offset;
				} else {
					lane.buffer.extend(retag(&lane.target.id, set.records));
				}
			},
			Err(error) => {
				tracing::warn!(
					backend_id = %lane.target.id,
					offset,
					error = %error,
					"On-demand page fetch failed; disabling backend."
				);

				lane.disabled = true;

				self.failures.push(BackendFailure {
					backend_id: lane.target.id.clone(),
					label: lane.target.label.clone(),
					error,
				});
			},
		}
	}
}

/// Backend preferred for `position`: the pinned backend inside the pinned prefix, otherwise the
/// backend owning the position's block in rotation.
pub(crate) fn preferred_backend<'b>(
	position: usize,
	block_size: usize,
	available: &'b [String],
	pinned: &'b [String],
) -> Option<&'b str> {
	if let Some(id) = pinned.get(position) {
		return Some(id);
	}
	if available.is_empty() || block_size == 0 {
		return None;
	}

	available.get((position / block_size) % available.len()).map(String::as_str)
}

fn retag(backend_id: &str, records: Vec<RawRecord>) -> impl Iterator<Item = RawRecord> + '_ {
	records.into_iter().map(move |mut record| {
		if record.backend_id != backend_id {
			record.backend_id = backend_id.to_string();
		}

		record
	})
}

fn collect_messages(messages: &mut Vec<BackendMessage>, target: &BackendTarget, errors: &[String]) {
	for message in errors {
		messages.push(BackendMessage {
			backend_id: target.id.clone(),
			label: target.label.clone(),
			message: message.clone(),
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ids(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn rotates_blocks_across_backends() {
		let available = ids(&["a", "b"]);
		let order = (0..8)
			.map(|position| preferred_backend(position, 2, &available, &[]).unwrap_or_default())
			.collect::<Vec<_>>();

		assert_eq!(order, vec!["a", "a", "b", "b", "a", "a", "b", "b"]);
	}

	#[test]
	fn pinned_prefix_overrides_rotation() {
		let available = ids(&["a", "b", "c"]);
		let pinned = ids(&["c", "b"]);

		assert_eq!(preferred_backend(0, 10, &available, &pinned), Some("c"));
		assert_eq!(preferred_backend(1, 10, &available, &pinned), Some("b"));
		assert_eq!(preferred_backend(2, 10, &available, &pinned), Some("a"));
		assert_eq!(preferred_backend(10, 10, &available, &pinned), Some("b"));
	}

	#[test]
	fn no_backends_means_no_preference() {
		assert_eq!(preferred_backend(0, 10, &[], &[]), None);
	}
}
