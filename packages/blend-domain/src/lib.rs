pub mod params;
pub mod query;
pub mod record;

pub use params::ParamBag;
pub use query::Query;
pub use record::{RawRecord, ResultSet};
