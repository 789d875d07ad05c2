pub mod error;
pub mod config;
pub mod runtime;

pub mod enumerator;
pub mod constructors;
pub mod sequential;
pub mod fan_in;
pub mod buffering;
pub mod cache;
pub mod source;
pub mod parallel;
pub mod blocking;
pub mod aseq_ext;

// Core protocol and ambient types at the crate root
pub use enumerator::{AsyncSeq, Enumerator, SeqStream, Step};
pub use error::{SeqError, SeqResult};
pub use config::{BufferConfig, ParallelConfig, WorkerPoolConfig};
pub use runtime::{ExecutionContext, Job, JobHandle, Timer, TokioTimer, TokioWorkerPool, WorkerPool};
pub use source::{Source, SourceState, SourceStats};
pub use blocking::{to_blocking_iter, BlockingIter};
pub use aseq_ext::AsyncSeqExt;

// Combinators as free functions
pub use constructors::*;
pub use sequential::*;
pub use fan_in::*;
pub use buffering::*;
pub use cache::cache;
pub use parallel::*;
