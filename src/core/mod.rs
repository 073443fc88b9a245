pub mod etl;
pub mod extract;
pub mod load;
pub mod query;
pub mod transform;

pub use crate::domain::model::{BankRecord, ConvertedBankRecord, NamedQuery, QueryResult};
pub use crate::domain::ports::{ConfigProvider, HttpSource, ProgressLog};
pub use crate::utils::error::Result;
