//! mpc-stats: two-party secure statistics over private columns.
//!
//! Each party holds one value per column. The parties jointly compute the
//! per-column sum, average, maximum or minimum over both inputs, and learn only
//! the result; the average also reveals the column sums and total weights.
//! Inputs are additively secret shared in `Z_2^64` as fixed-point numbers;
//! comparisons use Beaver triples generated with OT extension.
//!
//! # Example: mean salary
//!
//! Both parties compute the mean salary per department without revealing their
//! salaries. The code for both parties is in the `demos` directory.
//!
//! ```no_run
#![doc = include_str!("../demos/mean_salary_party0.rs")]
//! ```

pub mod arithmetic;
mod channel;
pub mod config;
mod context;
mod error;
mod fixed_point;
mod mpc_executor;
mod ot;
mod triple_provider;
mod types;

pub use channel::{Channel, TcpChannel, ThreadChannel};
pub use context::{random_id, Context, Node, TaskInfo, TaskRequest};
pub use error::{Error, Result};
pub use fixed_point::{EmbedFixedPoint, ToFixedPoint, FIXED_POINT_PRECISION};
pub use mpc_executor::{MPCExecutor, StatisticsOp};
pub use triple_provider::{OtTripleProvider, Triple, TripleProvider, TRIPLE_BATCH_SIZE};
pub use types::{Id, Share};
