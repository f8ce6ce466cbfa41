pub mod content;
pub mod job;
pub mod loaders;
pub mod output_format;

pub use content::{ContentBlock, ExtractedContent, PageMetadata};
pub use job::{
    BatchReport, ExpansionJob, JobResult, JobState, JobStatus, ProgressTracker, RunningJob,
    StateBoard,
};
pub use loaders::{load_batch_file, parse_batch_lines, SourceLine};
pub use output_format::OutputFormat;
