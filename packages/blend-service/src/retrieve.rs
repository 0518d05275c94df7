use crate::{BLENDER_SOURCE_ID, Blender, CallKind, Error, ParamBag, Query, Result, ResultSet};

impl Blender {
	/// Fetches one record by trying backends in declared order.
	///
	/// Returns the first non-empty result. When every backend answers empty, returns the last
	/// empty result. Errors only when no backend answered at all.
	pub async fn retrieve(&self, id: &str, params: &ParamBag) -> Result<ResultSet> {
		let query = Query::default();
		let mut last_empty = None;
		let mut first_error = None;

		for registered in self.registry.iter() {
			let result = self
				.dispatcher
				.call(
					&registered.id,
					registered.backend.as_ref(),
					CallKind::Retrieve { id: id.to_string() },
					&query,
					params,
				)
				.await;

			match result {
				Ok(set) if !set.is_empty() => return Ok(set),
				Ok(set) => last_empty = Some(set),
				Err(error) => {
					tracing::warn!(
						backend_id = %registered.id,
						record_id = %id,
						error = %error,
						"Backend retrieve failed."
					);

					if first_error.is_none() {
						first_error = Some((registered.id.clone(), error));
					}
				},
			}
		}

		if let Some(set) = last_empty {
			return Ok(set);
		}

		match first_error {
			Some((backend_id, source)) => Err(Error::Backend { backend_id, source }),
			None => Ok(ResultSet::empty(BLENDER_SOURCE_ID)),
		}
	}
}
